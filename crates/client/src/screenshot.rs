//! Screenshot payload probing.
//!
//! The crawler returns screenshots as base64-encoded PNGs. The gateway
//! reports their pixel dimensions without pulling in an image decoder:
//! a PNG's IHDR chunk carries width and height as big-endian u32s at
//! fixed offsets right after the 8-byte signature.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use waypost_core::models::ScreenshotSize;

const PNG_SIGNATURE: &[u8; 8] = b"\x89PNG\r\n\x1a\n";

/// Probe the pixel dimensions of a base64-encoded PNG.
///
/// Returns `None` for anything that is not a well-formed PNG header;
/// callers fall back to the requested viewport dimensions.
pub fn probe_png_dimensions(screenshot_base64: &str) -> Option<ScreenshotSize> {
    let bytes = STANDARD.decode(screenshot_base64).ok()?;
    png_dimensions(&bytes)
}

fn png_dimensions(data: &[u8]) -> Option<ScreenshotSize> {
    // signature (8) + IHDR length/type (8) + width (4) + height (4)
    if data.len() < 24 || &data[..8] != PNG_SIGNATURE {
        return None;
    }

    let width = u32::from_be_bytes(data[16..20].try_into().ok()?);
    let height = u32::from_be_bytes(data[20..24].try_into().ok()?);

    Some(ScreenshotSize { width, height })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic_png(width: u32, height: u32) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(PNG_SIGNATURE);
        data.extend_from_slice(&13u32.to_be_bytes()); // IHDR length
        data.extend_from_slice(b"IHDR");
        data.extend_from_slice(&width.to_be_bytes());
        data.extend_from_slice(&height.to_be_bytes());
        data.extend_from_slice(&[8, 6, 0, 0, 0]); // bit depth, color type, etc.
        data
    }

    #[test]
    fn test_probe_valid_png() {
        let encoded = STANDARD.encode(synthetic_png(1920, 1080));
        let size = probe_png_dimensions(&encoded).unwrap();
        assert_eq!(size, ScreenshotSize { width: 1920, height: 1080 });
    }

    #[test]
    fn test_probe_rejects_bad_signature() {
        let mut data = synthetic_png(100, 100);
        data[0] = 0;
        assert!(png_dimensions(&data).is_none());
    }

    #[test]
    fn test_probe_rejects_truncated_data() {
        let data = synthetic_png(100, 100);
        assert!(png_dimensions(&data[..20]).is_none());
    }

    #[test]
    fn test_probe_rejects_invalid_base64() {
        assert!(probe_png_dimensions("not valid base64!!!").is_none());
    }
}
