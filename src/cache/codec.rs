//! Codec Module
//!
//! Turns cache values into transport bytes and back. Binary fields are
//! base64 encoded so the value can travel as JSON; the JSON is optionally
//! zlib compressed.

use std::collections::BTreeMap;
use std::io::{Read, Write};

use base64::{engine::general_purpose, Engine as _};
use flate2::{read::ZlibDecoder, write::ZlibEncoder, Compression};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::Result;

/// Field name that carries a raw binary payload.
pub const BINARY_FIELD: &str = "image_data";

/// A cached value: string field names mapped to fields.
pub type CacheValue = BTreeMap<String, Field>;

// == Field ==
/// One field of a cached value.
///
/// A JSON object held as `Json` compares equal to the `Map` it decodes to.
#[derive(Debug, Clone)]
pub enum Field {
    /// Raw bytes, stored base64 encoded
    Bytes(Vec<u8>),
    /// Nested mapping, walked recursively
    Map(CacheValue),
    /// Any other JSON value, passed through unchanged
    Json(Value),
}

impl PartialEq for Field {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Field::Bytes(a), Field::Bytes(b)) => a == b,
            (Field::Map(a), Field::Map(b)) => a == b,
            (Field::Json(a), Field::Json(b)) => a == b,
            (Field::Map(map), Field::Json(Value::Object(object)))
            | (Field::Json(Value::Object(object)), Field::Map(map)) => {
                map.len() == object.len()
                    && object.iter().all(|(key, value)| {
                        map.get(key)
                            .is_some_and(|field| *field == Field::from(value.clone()))
                    })
            }
            _ => false,
        }
    }
}

impl From<Vec<u8>> for Field {
    fn from(bytes: Vec<u8>) -> Self {
        Field::Bytes(bytes)
    }
}

impl From<&str> for Field {
    fn from(text: &str) -> Self {
        Field::Json(Value::String(text.to_string()))
    }
}

impl From<String> for Field {
    fn from(text: String) -> Self {
        Field::Json(Value::String(text))
    }
}

impl From<CacheValue> for Field {
    fn from(map: CacheValue) -> Self {
        Field::Map(map)
    }
}

impl From<Value> for Field {
    /// JSON objects become nested mappings so they survive a round trip.
    fn from(value: Value) -> Self {
        match value {
            Value::Object(object) => Field::Map(
                object
                    .into_iter()
                    .map(|(key, value)| (key, Field::from(value)))
                    .collect(),
            ),
            other => Field::Json(other),
        }
    }
}

impl Field {
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Field::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Field::Json(Value::String(text)) => Some(text),
            _ => None,
        }
    }
}

// == Codec ==
/// Encoder/decoder pair. The compression flag is store-wide.
#[derive(Debug, Clone, Copy)]
pub struct Codec {
    compression: bool,
}

impl Codec {
    pub fn new(compression: bool) -> Self {
        Self { compression }
    }

    pub fn compression(&self) -> bool {
        self.compression
    }

    // == Encode ==
    /// Serializes a value to transport bytes.
    pub fn encode(&self, value: &CacheValue) -> Result<Vec<u8>> {
        let json = serde_json::to_vec(&encode_map(value))?;
        if !self.compression {
            return Ok(json);
        }

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&json)?;
        Ok(encoder.finish()?)
    }

    // == Decode ==
    /// Restores a value from transport bytes.
    ///
    /// Compressed input that fails to inflate is retried as plain JSON, so
    /// entries written before a configuration flip remain readable. Returns
    /// `None` when the bytes are not a JSON object at all.
    pub fn decode(&self, bytes: &[u8]) -> Option<CacheValue> {
        if bytes.is_empty() {
            return None;
        }

        let inflated = if self.compression {
            let mut inflated = Vec::new();
            ZlibDecoder::new(bytes)
                .read_to_end(&mut inflated)
                .ok()
                .and_then(|_| serde_json::from_slice::<Value>(&inflated).ok())
        } else {
            None
        };

        let json = match inflated {
            Some(json) => json,
            None => match serde_json::from_slice::<Value>(bytes) {
                Ok(json) => json,
                Err(e) => {
                    warn!("Discarding undecodable cache payload: {}", e);
                    return None;
                }
            },
        };

        match json {
            Value::Object(object) => Some(decode_map(object)),
            _ => {
                warn!("Discarding cache payload that is not a mapping");
                None
            }
        }
    }
}

impl Default for Codec {
    fn default() -> Self {
        Self::new(true)
    }
}

fn encode_map(value: &CacheValue) -> Value {
    let object: Map<String, Value> = value
        .iter()
        .map(|(key, field)| {
            let json = match field {
                Field::Bytes(bytes) => Value::String(general_purpose::STANDARD.encode(bytes)),
                Field::Map(nested) => encode_map(nested),
                Field::Json(json) => json.clone(),
            };
            (key.clone(), json)
        })
        .collect();
    Value::Object(object)
}

fn decode_map(object: Map<String, Value>) -> CacheValue {
    object
        .into_iter()
        .map(|(key, value)| {
            let field = match value {
                Value::String(text) if key == BINARY_FIELD => {
                    match general_purpose::STANDARD.decode(&text) {
                        Ok(bytes) => Field::Bytes(bytes),
                        // Keep the text rather than fail the whole read
                        Err(_) => Field::Json(Value::String(text)),
                    }
                }
                Value::Object(nested) => Field::Map(decode_map(nested)),
                other => Field::Json(other),
            };
            (key, field)
        })
        .collect()
}
