//! Declared text encodings
//!
//! The store always holds bytes. An encoding is applied only at the read
//! boundary, when a caller asks for text.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use thiserror::Error;

/// Decode failure at the read boundary
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("content is not valid utf-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// How object bytes become text on read
///
/// `Base64` and `Hex` render the raw bytes as an ASCII transfer form, the
/// way callers of the emulated API expect for binary content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Encoding {
    #[default]
    Utf8,
    Latin1,
    Base64,
    Hex,
}

impl Encoding {
    /// Decode object bytes into text
    ///
    /// Only `Utf8` can fail; the other encodings accept any byte sequence.
    pub fn decode(self, data: &[u8]) -> Result<String, DecodeError> {
        match self {
            Self::Utf8 => Ok(String::from_utf8(data.to_vec())?),
            Self::Latin1 => Ok(data.iter().map(|&b| char::from(b)).collect()),
            Self::Base64 => Ok(BASE64.encode(data)),
            Self::Hex => Ok(hex::encode(data)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_decode() {
        assert_eq!(Encoding::Utf8.decode(b"hello").unwrap(), "hello");
        assert_eq!(
            Encoding::Utf8.decode("grüß".as_bytes()).unwrap(),
            "grüß"
        );
    }

    #[test]
    fn test_utf8_rejects_invalid_bytes() {
        let result = Encoding::Utf8.decode(&[0xff, 0xfe]);
        assert!(matches!(result, Err(DecodeError::Utf8(_))));
    }

    #[test]
    fn test_latin1_accepts_any_bytes() {
        assert_eq!(Encoding::Latin1.decode(&[0xff, 0x41]).unwrap(), "ÿA");
    }

    #[test]
    fn test_base64_decode() {
        assert_eq!(Encoding::Base64.decode(&[0xff, 0x00]).unwrap(), "/wA=");
    }

    #[test]
    fn test_hex_decode() {
        assert_eq!(Encoding::Hex.decode(&[0xff, 0x00]).unwrap(), "ff00");
    }

    #[test]
    fn test_default_is_utf8() {
        assert_eq!(Encoding::default(), Encoding::Utf8);
    }
}
