//! Value Codec Module
//!
//! Pluggable encoding between stored values and file payloads.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{de::DeserializeOwned, Serialize};

/// Converts values to and from the bytes written to an entry file.
///
/// Implementations must round-trip: `decode(encode(v)) == v`.
pub trait ValueCodec: Send + Sync {
    /// Encodes a value into a payload.
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, String>;

    /// Decodes a payload read back from disk.
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, String>;
}

// == JSON ==
/// Plain JSON payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl ValueCodec for JsonCodec {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, String> {
        serde_json::to_vec(value).map_err(|e| e.to_string())
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, String> {
        serde_json::from_slice(bytes).map_err(|e| e.to_string())
    }
}

// == Base64 JSON ==
/// JSON wrapped in standard base64, keeping entry files text-safe.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64JsonCodec;

impl ValueCodec for Base64JsonCodec {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, String> {
        let json = JsonCodec.encode(value)?;
        Ok(STANDARD.encode(json).into_bytes())
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, String> {
        let text = std::str::from_utf8(bytes).map_err(|e| e.to_string())?;
        let json = STANDARD
            .decode(text.trim())
            .map_err(|e| format!("invalid base64 payload: {}", e))?;
        JsonCodec.decode(&json)
    }
}
