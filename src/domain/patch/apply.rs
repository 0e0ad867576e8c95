//! Apply patch operations to a JSON document

use serde_json::Value;
use thiserror::Error;

use super::operation::{pointer_tokens, PatchOperation};

/// Errors raised while applying a patch
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PatchError {
    #[error("Invalid pointer '{0}'")]
    InvalidPath(String),

    #[error("Path '{0}' does not exist")]
    PathNotFound(String),

    #[error("Index {index} out of bounds at '{path}'")]
    IndexOutOfBounds { path: String, index: usize },

    #[error("Cannot remove the document root")]
    RemoveRoot,
}

/// Apply operations in order; the document is left partially patched on error
pub fn apply(document: &mut Value, ops: &[PatchOperation]) -> Result<(), PatchError> {
    for op in ops {
        apply_one(document, op)?;
    }

    Ok(())
}

fn apply_one(document: &mut Value, op: &PatchOperation) -> Result<(), PatchError> {
    let path = op.path();
    let mut tokens =
        pointer_tokens(path).ok_or_else(|| PatchError::InvalidPath(path.to_string()))?;

    let Some(last) = tokens.pop() else {
        return match op {
            PatchOperation::Add { value, .. } | PatchOperation::Replace { value, .. } => {
                *document = value.clone();
                Ok(())
            }
            PatchOperation::Remove { .. } => Err(PatchError::RemoveRoot),
        };
    };

    let parent = resolve_mut(document, &tokens, path)?;

    match (op, parent) {
        (PatchOperation::Add { value, .. }, Value::Object(map)) => {
            map.insert(last, value.clone());
        }
        (PatchOperation::Add { value, .. }, Value::Array(items)) => {
            if last == "-" {
                items.push(value.clone());
            } else {
                let index = parse_index(&last, path)?;
                if index > items.len() {
                    return Err(PatchError::IndexOutOfBounds {
                        path: path.to_string(),
                        index,
                    });
                }
                items.insert(index, value.clone());
            }
        }
        (PatchOperation::Remove { .. }, Value::Object(map)) => {
            map.remove(&last)
                .ok_or_else(|| PatchError::PathNotFound(path.to_string()))?;
        }
        (PatchOperation::Remove { .. }, Value::Array(items)) => {
            let index = existing_index(&last, items.len(), path)?;
            items.remove(index);
        }
        (PatchOperation::Replace { value, .. }, Value::Object(map)) => {
            let slot = map
                .get_mut(&last)
                .ok_or_else(|| PatchError::PathNotFound(path.to_string()))?;
            *slot = value.clone();
        }
        (PatchOperation::Replace { value, .. }, Value::Array(items)) => {
            let index = existing_index(&last, items.len(), path)?;
            items[index] = value.clone();
        }
        _ => return Err(PatchError::PathNotFound(path.to_string())),
    }

    Ok(())
}

fn resolve_mut<'a>(
    document: &'a mut Value,
    tokens: &[String],
    path: &str,
) -> Result<&'a mut Value, PatchError> {
    let mut current = document;

    for token in tokens {
        current = match current {
            Value::Object(map) => map
                .get_mut(token)
                .ok_or_else(|| PatchError::PathNotFound(path.to_string()))?,
            Value::Array(items) => {
                let index = existing_index(token, items.len(), path)?;
                &mut items[index]
            }
            _ => return Err(PatchError::PathNotFound(path.to_string())),
        };
    }

    Ok(current)
}

fn parse_index(token: &str, path: &str) -> Result<usize, PatchError> {
    token
        .parse::<usize>()
        .map_err(|_| PatchError::InvalidPath(path.to_string()))
}

fn existing_index(token: &str, len: usize, path: &str) -> Result<usize, PatchError> {
    let index = parse_index(token, path)?;

    if index >= len {
        return Err(PatchError::IndexOutOfBounds {
            path: path.to_string(),
            index,
        });
    }

    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_add_to_object_and_array() {
        let mut doc = json!({"users": [{"id": "u1"}]});

        apply(
            &mut doc,
            &[
                PatchOperation::add("/users/-", json!({"id": "u2"})),
                PatchOperation::add("/users/0", json!({"id": "u0"})),
                PatchOperation::add("/description", json!("team")),
            ],
        )
        .unwrap();

        assert_eq!(
            doc,
            json!({"users": [{"id": "u0"}, {"id": "u1"}, {"id": "u2"}], "description": "team"})
        );
    }

    #[test]
    fn test_remove_and_replace_nested() {
        let mut doc = json!({"users": [{"id": "u1", "name": "a"}, {"id": "u2"}]});

        apply(
            &mut doc,
            &[
                PatchOperation::replace("/users/0/name", json!("b")),
                PatchOperation::remove("/users/1"),
            ],
        )
        .unwrap();

        assert_eq!(doc, json!({"users": [{"id": "u1", "name": "b"}]}));
    }

    #[test]
    fn test_replace_root() {
        let mut doc = json!({"a": 1});
        apply(&mut doc, &[PatchOperation::replace("", json!([1]))]).unwrap();
        assert_eq!(doc, json!([1]));
    }

    #[test]
    fn test_errors() {
        let mut doc = json!({"users": []});

        assert_eq!(
            apply(&mut doc, &[PatchOperation::remove("/users/0")]),
            Err(PatchError::IndexOutOfBounds {
                path: "/users/0".to_string(),
                index: 0
            })
        );
        assert_eq!(
            apply(&mut doc, &[PatchOperation::replace("/missing", json!(1))]),
            Err(PatchError::PathNotFound("/missing".to_string()))
        );
        assert_eq!(
            apply(&mut doc, &[PatchOperation::remove("users")]),
            Err(PatchError::InvalidPath("users".to_string()))
        );
        assert_eq!(
            apply(&mut doc, &[PatchOperation::remove("")]),
            Err(PatchError::RemoveRoot)
        );
    }
}
