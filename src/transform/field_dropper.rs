//! Field dropper transform
//!
//! Removes top-level fields from JSON objects before they are written.

use serde_json::Value;

/// Drops the named top-level fields from JSON objects
///
/// Values that are not objects pass through untouched.
///
/// # Example
/// ```
/// use etl_chain::transform::FieldDropper;
/// use serde_json::json;
///
/// let dropper = FieldDropper::new(["updated_at"]);
/// let output = dropper.apply(json!({"id": "a", "updated_at": "2024-01-01"}));
/// assert_eq!(output, json!({"id": "a"}));
/// ```
#[derive(Debug, Clone, Default)]
pub struct FieldDropper {
    fields: Vec<String>,
}

impl FieldDropper {
    /// Create a new field dropper with the specified fields to remove
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Drop fields from a single value
    pub fn apply(&self, mut input: Value) -> Value {
        if let Some(obj) = input.as_object_mut() {
            for field in &self.fields {
                obj.remove(field);
            }
        }
        input
    }

    /// Drop fields from every value
    pub fn apply_many(&self, inputs: Vec<Value>) -> Vec<Value> {
        if self.is_empty() {
            return inputs;
        }
        inputs.into_iter().map(|v| self.apply(v)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_drop_fields() {
        let dropper = FieldDropper::new(["created_at", "version"]);
        let input = json!({
            "id": "test",
            "created_at": "2024-01-01",
            "version": "1.0",
            "title": "My Object"
        });

        let output = dropper.apply(input);
        let obj = output.as_object().unwrap();

        assert!(!obj.contains_key("created_at"));
        assert!(!obj.contains_key("version"));
        assert_eq!(output["id"], "test");
        assert_eq!(output["title"], "My Object");
    }

    #[test]
    fn test_non_objects_untouched() {
        let dropper = FieldDropper::new(["a"]);
        assert_eq!(dropper.apply(json!([1, 2])), json!([1, 2]));
        assert_eq!(dropper.apply(json!("a")), json!("a"));
    }

    #[test]
    fn test_apply_many() {
        let dropper = FieldDropper::new(vec!["temp".to_string()]);
        let inputs = vec![
            json!({"id": "1", "temp": "remove"}),
            json!({"id": "2", "temp": "remove"}),
        ];

        let outputs = dropper.apply_many(inputs);

        assert_eq!(outputs, vec![json!({"id": "1"}), json!({"id": "2"})]);
    }
}
