//! Binary-format sniffing for inbound frames.
//!
//! The client sends raw container bytes with no envelope, so content type is
//! derived solely from a fixed-length magic-number prefix. Declared metadata
//! does not exist on this transport and would not be trusted if it did.

/// Content kind of an inbound binary frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    /// WebM/EBML audio clip (one discrete user utterance).
    Audio,
    /// JPEG camera capture.
    CameraImage,
    /// PNG screen capture.
    ScreenImage,
    /// Unrecognized prefix; logged and dropped, never forwarded.
    Unknown,
}

/// JPEG start-of-image marker.
pub const JPEG_MAGIC: [u8; 3] = [0xFF, 0xD8, 0xFF];

/// WebM/EBML container header.
pub const WEBM_MAGIC: [u8; 4] = [0x1A, 0x45, 0xDF, 0xA3];

/// PNG signature prefix.
pub const PNG_MAGIC: [u8; 4] = [0x89, 0x50, 0x4E, 0x47];

/// Classify a raw byte buffer by its magic-number prefix.
///
/// Inspects at most the first 4 bytes and allocates nothing. Buffers shorter
/// than the shortest magic number, or matching none, are `Unknown`.
///
/// This is a deliberately lossy classifier: it trusts container framing over
/// anything the client might claim about the payload.
pub fn classify(bytes: &[u8]) -> ContentKind {
    if bytes.starts_with(&JPEG_MAGIC) {
        ContentKind::CameraImage
    } else if bytes.starts_with(&WEBM_MAGIC) {
        ContentKind::Audio
    } else if bytes.starts_with(&PNG_MAGIC) {
        ContentKind::ScreenImage
    } else {
        ContentKind::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_prefixes_classify() {
        assert_eq!(classify(&[0xFF, 0xD8, 0xFF, 0xE0]), ContentKind::CameraImage);
        assert_eq!(classify(&[0x1A, 0x45, 0xDF, 0xA3, 0x00]), ContentKind::Audio);
        assert_eq!(classify(b"\x89PNG\r\n\x1a\n"), ContentKind::ScreenImage);
    }

    #[test]
    fn short_buffers_are_unknown() {
        assert_eq!(classify(&[]), ContentKind::Unknown);
        assert_eq!(classify(&[0xFF]), ContentKind::Unknown);
        assert_eq!(classify(&[0xFF, 0xD8]), ContentKind::Unknown);
        // Exactly three bytes is enough for JPEG
        assert_eq!(classify(&[0xFF, 0xD8, 0xFF]), ContentKind::CameraImage);
        // But not for the four-byte magics
        assert_eq!(classify(&[0x1A, 0x45, 0xDF]), ContentKind::Unknown);
        assert_eq!(classify(&[0x89, 0x50, 0x4E]), ContentKind::Unknown);
    }

    #[test]
    fn unmatched_prefixes_are_unknown() {
        assert_eq!(classify(b"GIF89a"), ContentKind::Unknown);
        assert_eq!(classify(b"hello world"), ContentKind::Unknown);
        assert_eq!(classify(&[0x00, 0x00, 0x00, 0x00]), ContentKind::Unknown);
    }

    #[cfg(test)]
    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn buffers_under_three_bytes_are_always_unknown(bytes in proptest::collection::vec(any::<u8>(), 0..3)) {
                prop_assert_eq!(classify(&bytes), ContentKind::Unknown);
            }

            #[test]
            fn classification_ignores_trailing_content(trailer in proptest::collection::vec(any::<u8>(), 0..256)) {
                let mut jpeg = JPEG_MAGIC.to_vec();
                jpeg.extend_from_slice(&trailer);
                prop_assert_eq!(classify(&jpeg), ContentKind::CameraImage);

                let mut webm = WEBM_MAGIC.to_vec();
                webm.extend_from_slice(&trailer);
                prop_assert_eq!(classify(&webm), ContentKind::Audio);

                let mut png = PNG_MAGIC.to_vec();
                png.extend_from_slice(&trailer);
                prop_assert_eq!(classify(&png), ContentKind::ScreenImage);
            }

            #[test]
            fn classification_is_prefix_determined(bytes in proptest::collection::vec(any::<u8>(), 4..64)) {
                // The result for any buffer equals the result for its 4-byte prefix
                prop_assert_eq!(classify(&bytes), classify(&bytes[..4]));
            }
        }
    }
}
