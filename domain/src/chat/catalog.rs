//! Model catalog parsing

use serde_json::Value;

/// Models offered by the backend, plus its configured default.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModelCatalog {
    pub models: Vec<String>,
    pub default_model: Option<String>,
}

impl ModelCatalog {
    /// Parse a `/api/models` response body.
    ///
    /// The backend has shipped both a flat shape
    /// (`{"models": [...], "default_model": "..."}`) and a nested one
    /// (`{"models": {"models": [...], "default_model": "..."}}`). Entries may
    /// be plain names or objects with a `name` field. Anything else yields an
    /// empty catalog.
    pub fn from_json(body: &Value) -> Self {
        let Some(models) = body.get("models") else {
            return Self::default();
        };

        let (list, nested_default) = match models {
            Value::Array(list) => (Some(list), None),
            Value::Object(_) => (
                models.get("models").and_then(Value::as_array),
                models.get("default_model").and_then(Value::as_str),
            ),
            _ => (None, None),
        };

        let names: Vec<String> = list
            .map(|entries| entries.iter().filter_map(model_name).collect())
            .unwrap_or_default();

        let default_model = body
            .get("default_model")
            .and_then(Value::as_str)
            .or(nested_default)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Self {
            models: names,
            default_model,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn contains(&self, model: &str) -> bool {
        self.models.iter().any(|m| m == model)
    }

    /// Model to preselect: the requested one if offered, else the backend
    /// default, else the first listed model.
    pub fn resolve(&self, preferred: Option<&str>) -> Option<String> {
        preferred
            .filter(|m| self.contains(m))
            .map(str::to_string)
            .or_else(|| self.default_model.clone())
            .or_else(|| self.models.first().cloned())
    }
}

fn model_name(entry: &Value) -> Option<String> {
    match entry {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(_) => entry
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_flat_shape() {
        let catalog = ModelCatalog::from_json(&json!({
            "models": ["llama2", "mistral"],
            "default_model": "llama2"
        }));
        assert_eq!(catalog.models, vec!["llama2", "mistral"]);
        assert_eq!(catalog.default_model.as_deref(), Some("llama2"));
    }

    #[test]
    fn parses_nested_shape() {
        let catalog = ModelCatalog::from_json(&json!({
            "models": {"models": ["phi3"], "default_model": "phi3"}
        }));
        assert_eq!(catalog.models, vec!["phi3"]);
        assert_eq!(catalog.default_model.as_deref(), Some("phi3"));
    }

    #[test]
    fn accepts_object_entries() {
        let catalog = ModelCatalog::from_json(&json!({
            "models": [{"name": "qwen2", "size": 123}, {"size": 1}, 7]
        }));
        assert_eq!(catalog.models, vec!["qwen2"]);
        assert_eq!(catalog.default_model, None);
    }

    #[test]
    fn missing_models_is_empty() {
        assert!(ModelCatalog::from_json(&json!({})).is_empty());
        assert!(ModelCatalog::from_json(&json!({"models": "nope"})).is_empty());
    }

    #[test]
    fn resolve_prefers_offered_model() {
        let catalog = ModelCatalog {
            models: vec!["a".to_string(), "b".to_string()],
            default_model: Some("b".to_string()),
        };
        assert_eq!(catalog.resolve(Some("a")).as_deref(), Some("a"));
        assert_eq!(catalog.resolve(Some("zzz")).as_deref(), Some("b"));
        assert_eq!(catalog.resolve(None).as_deref(), Some("b"));

        let no_default = ModelCatalog {
            models: vec!["x".to_string()],
            default_model: None,
        };
        assert_eq!(no_default.resolve(None).as_deref(), Some("x"));
        assert_eq!(ModelCatalog::default().resolve(None), None);
    }
}
