use std::time::Duration;

use crate::config::PollinationsConfig;
use crate::services::pollinations::PollinationsBackend;
use crate::traits::ImageBackend;
use crate::types::{AuthRequirement, BackendFailure};

fn backend(width: Option<u32>, height: Option<u32>, min_bytes: usize) -> PollinationsBackend {
    let config = PollinationsConfig {
        base_url: "https://image.pollinations.ai/".to_string(),
        timeout: Duration::from_secs(5),
        width,
        height,
        via_proxy: false,
    };
    PollinationsBackend::new(&config, min_bytes, reqwest::Client::new())
}

#[test]
fn test_prompt_url_percent_encodes_prompt() {
    let url = backend(None, None, 4000).prompt_url("a red apple / 100% natural");
    assert_eq!(
        url,
        "https://image.pollinations.ai/prompt/a%20red%20apple%20%2F%20100%25%20natural"
    );
}

#[test]
fn test_prompt_url_appends_dimensions_when_configured() {
    assert_eq!(
        backend(Some(1024), Some(768), 4000).prompt_url("apple"),
        "https://image.pollinations.ai/prompt/apple?width=1024&height=768"
    );
    assert_eq!(
        backend(Some(512), None, 4000).prompt_url("apple"),
        "https://image.pollinations.ai/prompt/apple?width=512"
    );
}

#[test]
fn test_small_bodies_are_placeholders() {
    let b = backend(None, None, 4000);
    assert_eq!(
        b.accept_body(vec![0u8; 3999]),
        Err(BackendFailure::Placeholder { size: 3999 })
    );

    let accepted = b.accept_body(vec![0u8; 4000]).unwrap();
    assert_eq!(accepted.len(), 4000);
}

#[test]
fn test_descriptor_is_keyless() {
    let descriptor = backend(None, None, 4000).descriptor();
    assert_eq!(descriptor.name, "pollinations");
    assert_eq!(descriptor.auth, AuthRequirement::None);
    assert_eq!(descriptor.endpoint, "https://image.pollinations.ai");
}
