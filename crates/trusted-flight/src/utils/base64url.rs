//! Unpadded Base64URL (RFC 4648 §5) for token segments
//!
//! The engine is strict: no padding and canonical trailing bits, so an
//! accepted segment re-encodes to exactly the bytes it was decoded from.

use crate::error::{Error, Result};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

pub(crate) fn decode_bytes(segment: &[u8], limit: usize) -> Result<Vec<u8>> {
    // Every 4 symbols carry 3 bytes
    let floor = segment.len() / 4 * 3;
    if floor > limit {
        return Err(Error::FormatInvalidBase64(format!(
            "segment of {} symbols decodes past {limit} bytes",
            segment.len()
        )));
    }

    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| Error::FormatInvalidBase64(e.to_string()))?;
    if bytes.len() > limit {
        return Err(Error::FormatInvalidBase64(format!(
            "decoded {} bytes, limit is {limit}",
            bytes.len()
        )));
    }
    Ok(bytes)
}

pub(crate) fn encode_bytes(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}
