//! Unit tests for backend services

mod pollinations;
