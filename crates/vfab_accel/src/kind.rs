//! Accelerator types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The function an accelerator implements; segments are matched to
/// accelerators by this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcceleratorType {
    /// Image filtering and transforms.
    ImageProcessing,
    /// Symmetric or asymmetric encryption.
    Encryption,
    /// Fast Fourier transform.
    Fft,
    /// Video encode/decode.
    VideoProcessing,
}

impl fmt::Display for AcceleratorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AcceleratorType::ImageProcessing => "image_processing",
            AcceleratorType::Encryption => "encryption",
            AcceleratorType::Fft => "fft",
            AcceleratorType::VideoProcessing => "video_processing",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&AcceleratorType::ImageProcessing).unwrap();
        assert_eq!(json, "\"image_processing\"");
        let back: AcceleratorType = serde_json::from_str("\"fft\"").unwrap();
        assert_eq!(back, AcceleratorType::Fft);
    }

    #[test]
    fn display_matches_serde_name() {
        assert_eq!(format!("{}", AcceleratorType::VideoProcessing), "video_processing");
    }
}
