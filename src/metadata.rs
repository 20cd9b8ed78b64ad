// Copyright 2024 lsgcodec contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

//! The context metadata blob: a UTF-8 JSON object with shape
//! `{"sampling":{"dt":<number>,"t0":<string>},"unit":<string>}`. Only
//! these three fields are interpreted; any additional keys, at either
//! the top level or within `sampling`, are preserved verbatim on
//! round-trip but have no semantic effect.

use crate::error::{CodecError, CodecResult};
use serde::de::Error as DeError;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Sampling interval, start timestamp, and unit, plus any unrecognized
/// fields carried through unchanged.
#[derive(Clone, Debug, PartialEq)]
pub struct ContextMetadata {
    /// Sampling interval in seconds.
    pub dt: f64,
    /// Opaque start timestamp; ISO-8601 is recommended but not validated.
    pub t0: String,
    /// Opaque unit string.
    pub unit: String,
    /// Unrecognized keys inside the `sampling` object, preserved verbatim.
    pub sampling_extra: Map<String, Value>,
    /// Unrecognized top-level keys, preserved verbatim.
    pub extra: Map<String, Value>,
}

impl ContextMetadata {
    pub fn new(dt: f64, t0: impl Into<String>, unit: impl Into<String>) -> ContextMetadata {
        ContextMetadata {
            dt,
            t0: t0.into(),
            unit: unit.into(),
            sampling_extra: Map::new(),
            extra: Map::new(),
        }
    }

    /// Encodes this metadata as minified JSON bytes with stable key order
    /// `sampling.dt`, `sampling.t0`, `unit`.
    pub fn to_json_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("ContextMetadata serialization cannot fail")
    }

    /// Decodes metadata from JSON bytes. Any valid JSON object containing
    /// `sampling.dt`, `sampling.t0`, and `unit` is accepted.
    pub fn from_json_bytes(bytes: &[u8]) -> CodecResult<ContextMetadata> {
        serde_json::from_slice(bytes)
            .map_err(|e| CodecError::InvalidFormat(format!("invalid metadata JSON: {}", e)))
    }
}

impl Serialize for ContextMetadata {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut sampling = Map::new();
        sampling.insert("dt".to_string(), serde_json::json!(self.dt));
        sampling.insert("t0".to_string(), Value::String(self.t0.clone()));
        for (k, v) in &self.sampling_extra {
            sampling.entry(k.clone()).or_insert_with(|| v.clone());
        }

        let mut map = serializer.serialize_map(Some(2 + self.extra.len()))?;
        map.serialize_entry("sampling", &sampling)?;
        map.serialize_entry("unit", &self.unit)?;
        for (k, v) in &self.extra {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ContextMetadata {
    fn deserialize<D>(deserializer: D) -> Result<ContextMetadata, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut top = Map::deserialize(deserializer)?;

        let sampling_value = top
            .remove("sampling")
            .ok_or_else(|| D::Error::missing_field("sampling"))?;
        let mut sampling = match sampling_value {
            Value::Object(m) => m,
            _ => return Err(D::Error::custom("\"sampling\" must be an object")),
        };

        let dt = sampling
            .remove("dt")
            .ok_or_else(|| D::Error::missing_field("dt"))?
            .as_f64()
            .ok_or_else(|| D::Error::custom("\"sampling.dt\" must be a number"))?;

        let t0 = match sampling
            .remove("t0")
            .ok_or_else(|| D::Error::missing_field("t0"))?
        {
            Value::String(s) => s,
            _ => return Err(D::Error::custom("\"sampling.t0\" must be a string")),
        };

        let unit = match top
            .remove("unit")
            .ok_or_else(|| D::Error::missing_field("unit"))?
        {
            Value::String(s) => s,
            _ => return Err(D::Error::custom("\"unit\" must be a string")),
        };

        Ok(ContextMetadata {
            dt,
            t0,
            unit,
            sampling_extra: sampling,
            extra: top,
        })
    }
}
