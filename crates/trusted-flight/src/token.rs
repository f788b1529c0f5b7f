//! Token decoder
//!
//! Turns the raw artifact into its three wire segments and then into decoded
//! header and payload mappings plus signature bytes. Nothing here looks at
//! claim values; every failure in this module is a format failure.
//!
//! ```text
//! RawToken ──split──▶ TokenSegments ──decode──▶ DecodedToken
//!   bytes               header.payload.signature   header map, payload map, signature
//! ```

use crate::claims::DecodedPayload;
use crate::error::{Error, Result};
use crate::header::DecodedHeader;
use crate::limits::{
    MAX_DECODED_HEADER_SIZE, MAX_DECODED_PAYLOAD_SIZE, MAX_DECODED_SIGNATURE_SIZE,
    MAX_TOKEN_LENGTH,
};
use crate::utils::base64url;
use miniserde::json::{Object, Value};

const SEGMENT_DELIMITER: u8 = b'.';

/// Token bytes exactly as provisioned, minus trailing whitespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawToken {
    bytes: Vec<u8>,
}

impl RawToken {
    /// Normalize an artifact read from storage
    ///
    /// Returns `None` when nothing but whitespace is left.
    pub fn from_artifact(mut bytes: Vec<u8>) -> Option<Self> {
        let trimmed_len = bytes.trim_ascii_end().len();
        bytes.truncate(trimmed_len);
        if bytes.is_empty() {
            None
        } else {
            Some(Self { bytes })
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// The three wire segments of a token, borrowed from the raw bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSegments<'a> {
    raw: &'a [u8],
    header: &'a [u8],
    payload: &'a [u8],
    signature: &'a [u8],
}

impl<'a> TokenSegments<'a> {
    /// Split on the delimiter; exactly three non-empty segments are required
    pub fn split(raw: &'a RawToken) -> Result<Self> {
        let raw = raw.as_bytes();
        if raw.len() > MAX_TOKEN_LENGTH {
            return Err(Error::TokenTooLarge {
                size: raw.len(),
                max: MAX_TOKEN_LENGTH,
            });
        }

        let parts: Vec<&[u8]> = raw.split(|b| *b == SEGMENT_DELIMITER).collect();
        let [header, payload, signature] = parts[..] else {
            return Err(Error::FormatInvalid { found: parts.len() });
        };

        if header.is_empty() {
            return Err(Error::FormatEmptySegment("header"));
        }
        if payload.is_empty() {
            return Err(Error::FormatEmptySegment("payload"));
        }
        if signature.is_empty() {
            return Err(Error::SignatureMissing);
        }

        Ok(Self {
            raw,
            header,
            payload,
            signature,
        })
    }

    pub fn header(&self) -> &'a [u8] {
        self.header
    }

    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }

    pub fn signature(&self) -> &'a [u8] {
        self.signature
    }

    /// The exact signed wire bytes: `header.payload`
    pub fn signing_input(&self) -> &'a [u8] {
        &self.raw[..self.header.len() + 1 + self.payload.len()]
    }
}

/// A token whose segments decoded into well-formed JSON objects and signature bytes
#[derive(Debug)]
pub struct DecodedToken<'a> {
    segments: TokenSegments<'a>,
    header: DecodedHeader,
    payload: DecodedPayload,
    signature: Vec<u8>,
}

impl<'a> DecodedToken<'a> {
    /// Run the whole decoder over a raw token
    pub fn decode(raw: &'a RawToken) -> Result<Self> {
        let segments = TokenSegments::split(raw)?;

        let header = decode_segment(segments.header(), MAX_DECODED_HEADER_SIZE)
            .and_then(|bytes| parse_json("header", &bytes))
            .map(DecodedHeader::new)?;

        let payload = decode_segment(segments.payload(), MAX_DECODED_PAYLOAD_SIZE)
            .and_then(|bytes| parse_json("payload", &bytes))
            .map(DecodedPayload::new)?;

        let signature = decode_segment(segments.signature(), MAX_DECODED_SIGNATURE_SIZE)?;
        if signature.is_empty() {
            return Err(Error::SignatureMissing);
        }

        Ok(Self {
            segments,
            header,
            payload,
            signature,
        })
    }

    pub fn segments(&self) -> &TokenSegments<'a> {
        &self.segments
    }

    pub fn header(&self) -> &DecodedHeader {
        &self.header
    }

    pub fn payload(&self) -> &DecodedPayload {
        &self.payload
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }
}

/// Reverse the transport encoding of one segment
pub fn decode_segment(segment: &[u8], max_size: usize) -> Result<Vec<u8>> {
    base64url::decode_bytes(segment, max_size)
}

/// Apply the transport encoding to one segment
pub fn encode_segment(bytes: &[u8]) -> String {
    base64url::encode_bytes(bytes)
}

/// Parse a decoded segment into a key/value mapping
pub fn parse_json(segment: &'static str, bytes: &[u8]) -> Result<Object> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| Error::FormatInvalidJson(format!("Invalid UTF-8 in {segment}: {e}")))?;

    match miniserde::json::from_str::<Value>(text) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(_) => Err(Error::FormatNotAnObject(segment)),
        Err(e) => Err(Error::FormatInvalidJson(format!(
            "Failed to parse {segment}: {e}"
        ))),
    }
}
