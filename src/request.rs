use serde_json::{Map, Value};

/// Loosely-typed options of a single call, as handed over by the host bridge.
///
/// Getters are forgiving: a key holding a value of the wrong type reads as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallOptions {
    data: Map<String, Value>,
}

impl CallOptions {
    pub fn new(data: Map<String, Value>) -> Self {
        Self { data }
    }

    /// Parse options from a JSON object. Anything that is not an object yields empty options.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(json)?;
        Ok(Self::from(value))
    }

    pub fn has(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.data.get(key).and_then(Value::as_bool)
    }

    /// Set a value, returning self so options can be built inline.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }
}

impl From<Value> for CallOptions {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::new(map),
            _ => Self::default(),
        }
    }
}

impl From<Map<String, Value>> for CallOptions {
    fn from(map: Map<String, Value>) -> Self {
        Self::new(map)
    }
}
