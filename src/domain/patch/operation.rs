//! Patch operations addressed by JSON pointer

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Single structural edit at a JSON-pointer path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOperation {
    Add { path: String, value: Value },
    Remove { path: String },
    Replace { path: String, value: Value },
}

impl PatchOperation {
    pub fn add(path: impl Into<String>, value: Value) -> Self {
        Self::Add {
            path: path.into(),
            value,
        }
    }

    pub fn remove(path: impl Into<String>) -> Self {
        Self::Remove { path: path.into() }
    }

    pub fn replace(path: impl Into<String>, value: Value) -> Self {
        Self::Replace {
            path: path.into(),
            value,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Self::Add { path, .. } | Self::Remove { path } | Self::Replace { path, .. } => path,
        }
    }
}

/// Append a reference token to a pointer, escaping `~` and `/`
pub fn pointer_join(base: &str, token: &str) -> String {
    let escaped = token.replace('~', "~0").replace('/', "~1");
    format!("{}/{}", base, escaped)
}

/// Split a pointer into unescaped reference tokens; `None` when malformed
pub fn pointer_tokens(pointer: &str) -> Option<Vec<String>> {
    if pointer.is_empty() {
        return Some(Vec::new());
    }

    let rest = pointer.strip_prefix('/')?;

    Some(
        rest.split('/')
            .map(|token| token.replace("~1", "/").replace("~0", "~"))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_operation_wire_format() {
        let op = PatchOperation::add("/users/1", json!({"id": "u3"}));
        let value = serde_json::to_value(&op).unwrap();

        assert_eq!(value, json!({"op": "add", "path": "/users/1", "value": {"id": "u3"}}));

        let remove: PatchOperation =
            serde_json::from_value(json!({"op": "remove", "path": "/users/0"})).unwrap();
        assert_eq!(remove, PatchOperation::remove("/users/0"));
    }

    #[test]
    fn test_pointer_escaping() {
        let pointer = pointer_join("/extension", "a/b~c");
        assert_eq!(pointer, "/extension/a~1b~0c");
        assert_eq!(
            pointer_tokens(&pointer),
            Some(vec!["extension".to_string(), "a/b~c".to_string()])
        );
    }

    #[test]
    fn test_pointer_tokens_malformed() {
        assert_eq!(pointer_tokens(""), Some(vec![]));
        assert_eq!(pointer_tokens("users/0"), None);
    }
}
