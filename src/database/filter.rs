use serde_json::{Map, Value};

/// Field-equality where clause over top-level document fields.
///
/// An empty clause matches every document in the collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterData {
    pub where_clause: Map<String, Value>,
}

impl FilterData {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::default().and_eq(field, value)
    }

    pub fn and_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.where_clause.insert(field.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.where_clause.is_empty()
    }

    pub fn matches(&self, body: &Value) -> bool {
        self.where_clause
            .iter()
            .all(|(field, expected)| body.get(field) == Some(expected))
    }

    /// JSON object suitable for a JSONB containment (`@>`) test.
    pub fn to_json(&self) -> Value {
        Value::Object(self.where_clause.clone())
    }
}
