//! Format codecs: text in, UDM out, and back.
//!
//! Only JSON ships with the core. In JSON, keys starting with `@` carry
//! object attributes so XML-shaped data survives a round trip.

use serde_json::{Map, Number, Value};

use crate::udm::{Object, Udm};

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("invalid {format} input: {source}")]
    Decode {
        format: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("cannot encode {0} as {1}")]
    Unsupported(&'static str, &'static str),
    #[error("{0}")]
    Encode(#[from] serde_json::Error),
}

/// A data format that can be read into and written from UDM.
pub trait Codec: Send + Sync {
    /// Format name as written in `input`/`output` directives.
    fn format(&self) -> &'static str;

    fn decode(&self, text: &str) -> Result<Udm, CodecError>;

    fn encode(&self, value: &Udm, pretty: bool) -> Result<String, CodecError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn format(&self) -> &'static str {
        "json"
    }

    fn decode(&self, text: &str) -> Result<Udm, CodecError> {
        let value: Value = serde_json::from_str(text).map_err(|source| CodecError::Decode {
            format: "json",
            source,
        })?;
        Ok(json_to_udm(value))
    }

    fn encode(&self, value: &Udm, pretty: bool) -> Result<String, CodecError> {
        let json = udm_to_json(value)?;
        let text = if pretty {
            serde_json::to_string_pretty(&json)?
        } else {
            serde_json::to_string(&json)?
        };
        Ok(text)
    }
}

/// Convert a `serde_json::Value` into UDM.
pub fn json_to_udm(value: Value) -> Udm {
    match value {
        Value::Null => Udm::Null,
        Value::Bool(b) => Udm::Boolean(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Udm::Integer(i),
            None => n.as_f64().map(Udm::Float).unwrap_or(Udm::Null),
        },
        Value::String(s) => Udm::String(s),
        Value::Array(items) => Udm::Array(items.into_iter().map(json_to_udm).collect()),
        Value::Object(map) => {
            let mut object = Object::new();
            for (key, value) in map {
                let attribute = key.strip_prefix('@').map(str::to_string);
                object = match (attribute, value) {
                    (Some(name), Value::String(text)) => object.with_attribute(name, text),
                    (Some(name), value @ (Value::Number(_) | Value::Bool(_))) => {
                        object.with_attribute(name, value.to_string())
                    }
                    (_, value) => object.with_property(key, json_to_udm(value)),
                };
            }
            Udm::Object(object)
        }
    }
}

/// Convert UDM into a `serde_json::Value`. Attributes come first, as `@name`.
pub fn udm_to_json(value: &Udm) -> Result<Value, CodecError> {
    let json = match value {
        Udm::Null => Value::Null,
        Udm::Boolean(b) => Value::Bool(*b),
        Udm::Integer(i) => Value::Number((*i).into()),
        Udm::Float(f) => Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Udm::String(s) => Value::String(s.clone()),
        Udm::DateTime(dt) => Value::String(dt.to_rfc3339()),
        Udm::Date(d) => Value::String(d.to_string()),
        Udm::Time(t) => Value::String(t.to_string()),
        Udm::Binary(binary) => Value::String(binary.encode()),
        Udm::Array(items) => Value::Array(
            items
                .iter()
                .map(udm_to_json)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Udm::Object(object) => {
            let mut map = Map::new();
            for (name, text) in object.attributes.iter() {
                map.insert(format!("@{}", name), Value::String(text.clone()));
            }
            for (key, value) in object.properties.iter() {
                map.insert(key.to_string(), udm_to_json(value)?);
            }
            Value::Object(map)
        }
        Udm::Lambda(_) => return Err(CodecError::Unsupported("function", "json")),
    };
    Ok(json)
}
