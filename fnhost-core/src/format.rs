//! Body formats and the format-driven codec
//!
//! A [`Format`] governs both directions: decoding an inbound request body
//! into a [`Payload`] and encoding an outbound payload into response bytes.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body format tag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Structured data, parsed/produced as JSON text
    Json,
    /// UTF-8 string
    Text,
    /// Opaque byte sequence; the default when no format is declared
    #[default]
    Binary,
}

impl Format {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Text => "text",
            Self::Binary => "binary",
        }
    }

    /// Decode an accumulated request body according to this format.
    ///
    /// Decoding never fails: malformed JSON is recoverable by design and is
    /// delivered as the raw text wrapped in a JSON string value, and invalid
    /// UTF-8 is decoded lossily.
    pub fn decode(self, buffer: Bytes) -> Payload {
        match self {
            Self::Json => {
                let text = String::from_utf8_lossy(&buffer).into_owned();
                match serde_json::from_str(&text) {
                    Ok(value) => Payload::Json(value),
                    Err(_) => Payload::Json(Value::String(text)),
                }
            }
            Self::Text => Payload::Text(String::from_utf8_lossy(&buffer).into_owned()),
            Self::Binary => Payload::Binary(buffer),
        }
    }

    /// Encode an outbound payload according to this format.
    pub fn encode(self, payload: &Payload) -> Bytes {
        match self {
            Self::Json => Bytes::from(serde_json::to_vec(&payload.as_json()).unwrap_or_default()),
            Self::Text => Bytes::from(payload.as_text().into_bytes()),
            Self::Binary => match payload {
                Payload::Binary(bytes) => bytes.clone(),
                other => Bytes::from(other.as_text().into_bytes()),
            },
        }
    }
}

impl std::str::FromStr for Format {
    type Err = crate::EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(Self::Json),
            "text" => Ok(Self::Text),
            "binary" | "buffer" => Ok(Self::Binary),
            other => Err(crate::EngineError::UnknownFormat(other.to_string())),
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded body value
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Text(String),
    Binary(Bytes),
}

impl Payload {
    /// Empty payload, used for bodiless completions
    pub fn empty() -> Self {
        Self::Text(String::new())
    }

    /// JSON representation of this payload
    pub fn as_json(&self) -> Value {
        match self {
            Self::Json(value) => value.clone(),
            Self::Text(text) => Value::String(text.clone()),
            Self::Binary(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        }
    }

    /// Plain-text form; JSON payloads render as compact JSON text
    pub fn as_text(&self) -> String {
        match self {
            Self::Json(value) => serde_json::to_string(value).unwrap_or_default(),
            Self::Text(text) => text.clone(),
            Self::Binary(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        }
    }

    /// Best-effort stringification for the access log
    pub fn log_form(&self) -> String {
        self.as_text()
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<Bytes> for Payload {
    fn from(bytes: Bytes) -> Self {
        Self::Binary(bytes)
    }
}
