//! Request bodies.

use serde_json::Value;

use crate::binding::shape::TypeShape;
use crate::error::TransportError;

pub const APPLICATION_JSON: &str = "application/json";
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// A body payload together with its full declared shape.
///
/// Keeping the shape (type arguments included) lets a transport pick an
/// encoding that matches what the interface declared.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub payload: Value,
    pub shape: TypeShape,
}

impl Entity {
    pub fn new(payload: Value, shape: TypeShape) -> Self {
        Self { payload, shape }
    }

    /// Encode the payload for `content_type`.
    ///
    /// JSON unless the media type says otherwise: `text/*` sends strings
    /// verbatim and form-urlencoded flattens an object into pairs.
    pub fn encode(&self, content_type: Option<&str>) -> Result<Vec<u8>, TransportError> {
        let essence = content_type
            .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_ascii_lowercase())
            .unwrap_or_default();

        if essence.starts_with("text/") {
            return Ok(text_of(&self.payload).into_bytes());
        }

        if essence == FORM_URLENCODED {
            let Value::Object(fields) = &self.payload else {
                return Err(TransportError::InvalidRequest(format!(
                    "form body must be an object, got `{}`",
                    self.shape
                )));
            };
            let mut form = url::form_urlencoded::Serializer::new(String::new());
            for (name, value) in fields {
                match value {
                    Value::Null => {}
                    Value::Array(items) => {
                        for item in items {
                            form.append_pair(name, &text_of(item));
                        }
                    }
                    other => {
                        form.append_pair(name, &text_of(other));
                    }
                }
            }
            return Ok(form.finish().into_bytes());
        }

        serde_json::to_vec(&self.payload)
            .map_err(|e| TransportError::InvalidRequest(format!("body encoding failed: {e}")))
    }
}

/// Textual form of an argument value.
///
/// Strings are used verbatim, scalars via `Display`, anything else as
/// compact JSON.
pub fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
