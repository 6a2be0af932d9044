//! data URL（`data:<mime>;base64,<payload>`）の生成と分解

use crate::error::{FractureAssistError, Result};
use base64::{engine::general_purpose::STANDARD, Engine};

pub fn encode(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

pub fn is_data_url(value: &str) -> bool {
    value.starts_with("data:")
}

/// (MIME, バイト列) に分解する。base64 以外のエンコードは扱わない
pub fn decode(url: &str) -> Result<(String, Vec<u8>)> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| FractureAssistError::ImageDecode("data URL ではありません".into()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| FractureAssistError::ImageDecode("data URL にペイロードがありません".into()))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| FractureAssistError::ImageDecode("base64 以外の data URL です".into()))?;

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| FractureAssistError::ImageDecode(e.to_string()))?;
    Ok((mime.to_string(), bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode() {
        let url = encode("image/png", b"\x89PNG");
        assert!(url.starts_with("data:image/png;base64,"));
        let (mime, bytes) = decode(&url).unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(bytes, b"\x89PNG");
    }

    #[test]
    fn test_decode_rejects_invalid() {
        assert!(decode("https://example.com/x.png").is_err());
        assert!(decode("data:image/png;base64").is_err());
        assert!(decode("data:text/plain,hello").is_err());
        assert!(decode("data:image/png;base64,@@@").is_err());
    }
}
