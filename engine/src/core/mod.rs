//! Core logic: credential selection, retry planning and result validation.
//!
//! Everything here is synchronous and free of I/O so it can be tested without
//! servers, sockets or clocks.

pub mod flow;
pub mod pool;
pub mod validator;

pub use flow::{next_action, AttemptPolicy, NextAction};
pub use pool::CredentialPool;
pub use validator::{ensure_minimum_size, validate_image, DecodedImage};
