//! Shared fixtures for engine integration tests

use std::io::Cursor;

use image::{ImageFormat, Rgb, RgbImage};

use engine::Credential;

pub struct TestFixtures;

impl TestFixtures {
    /// Small but valid PNG, decodes as 8x8
    pub fn png() -> Vec<u8> {
        let img = RgbImage::from_pixel(8, 8, Rgb([200, 30, 30]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    /// PNG with per-pixel noise so the encoded size clears the placeholder
    /// threshold; the noise source is a fixed LCG to keep fixtures stable.
    pub fn large_png(width: u32, height: u32) -> Vec<u8> {
        let mut seed = 0x2545_f491u32;
        let img = RgbImage::from_fn(width, height, |_, _| {
            seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            let bytes = seed.to_le_bytes();
            Rgb([bytes[0], bytes[1], bytes[2]])
        });
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    pub fn credential(name: &str) -> Credential {
        Credential::new(name, format!("token-for-{name}"))
    }
}
