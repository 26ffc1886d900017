//! Defines the JSON representation of the "checksum" module.

use super::hex_bytes::HexBytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::convert::TryFrom;

/// Used for ensuring serde only decodes an empty json object.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct EmptyMap;

impl Into<Value> for EmptyMap {
    fn into(self) -> Value {
        Value::Object(Map::default())
    }
}

impl TryFrom<Value> for EmptyMap {
    type Error = &'static str;

    fn try_from(v: Value) -> Result<Self, Self::Error> {
        match v {
            Value::Object(map) if map.is_empty() => Ok(Self),
            _ => Err("checksum params must be an empty object"),
        }
    }
}

/// Checksum module representation.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ChecksumModule {
    pub function: Sha256Checksum,
    pub params: EmptyMap,
    pub message: HexBytes,
}

impl ChecksumModule {
    pub fn sha256(message: HexBytes) -> Self {
        Self {
            function: Sha256Checksum::Sha256,
            params: EmptyMap,
            message,
        }
    }
}

/// Used for ensuring that serde only decodes valid checksum functions.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Sha256Checksum {
    Sha256,
}

impl Into<String> for Sha256Checksum {
    fn into(self) -> String {
        "sha256".into()
    }
}

impl TryFrom<String> for Sha256Checksum {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.as_ref() {
            "sha256" => Ok(Sha256Checksum::Sha256),
            other => Err(format!("Unsupported checksum function: {}", other)),
        }
    }
}
