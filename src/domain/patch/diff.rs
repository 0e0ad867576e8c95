//! Minimal structural diff between two JSON documents

use serde_json::{Map, Value};
use similar::{capture_diff_slices, Algorithm, DiffOp};

use super::operation::{pointer_join, PatchOperation};

/// Compute the edit script turning `before` into `after`
///
/// Objects are compared key by key in key order. Arrays are aligned with a
/// Myers diff over their serialized elements, so appending or dropping a
/// member yields a single add or remove instead of a cascade of replaces.
/// Operations are meant to be applied in order.
pub fn diff(before: &Value, after: &Value) -> Vec<PatchOperation> {
    let mut ops = Vec::new();
    diff_values("", before, after, &mut ops);
    ops
}

fn diff_values(path: &str, before: &Value, after: &Value, ops: &mut Vec<PatchOperation>) {
    if before == after {
        return;
    }

    match (before, after) {
        (Value::Object(before), Value::Object(after)) => diff_objects(path, before, after, ops),
        (Value::Array(before), Value::Array(after)) => diff_arrays(path, before, after, ops),
        _ => ops.push(PatchOperation::replace(path, after.clone())),
    }
}

fn diff_objects(
    path: &str,
    before: &Map<String, Value>,
    after: &Map<String, Value>,
    ops: &mut Vec<PatchOperation>,
) {
    for (key, old) in before {
        let child = pointer_join(path, key);

        match after.get(key) {
            Some(new) => diff_values(&child, old, new, ops),
            None => ops.push(PatchOperation::remove(child)),
        }
    }

    for (key, new) in after {
        if !before.contains_key(key) {
            ops.push(PatchOperation::add(pointer_join(path, key), new.clone()));
        }
    }
}

fn diff_arrays(path: &str, before: &[Value], after: &[Value], ops: &mut Vec<PatchOperation>) {
    let old_keys: Vec<String> = before.iter().map(Value::to_string).collect();
    let new_keys: Vec<String> = after.iter().map(Value::to_string).collect();

    // Each step sees new[..new_index] followed by old[old_index..].
    for step in capture_diff_slices(Algorithm::Myers, &old_keys, &new_keys) {
        match step {
            DiffOp::Equal { .. } => {}
            DiffOp::Delete {
                old_len, new_index, ..
            } => {
                for _ in 0..old_len {
                    ops.push(PatchOperation::remove(index_path(path, new_index)));
                }
            }
            DiffOp::Insert {
                new_index, new_len, ..
            } => {
                for offset in 0..new_len {
                    let index = new_index + offset;
                    ops.push(PatchOperation::add(
                        index_path(path, index),
                        after[index].clone(),
                    ));
                }
            }
            DiffOp::Replace {
                old_index,
                old_len,
                new_index,
                new_len,
            } => {
                let paired = old_len.min(new_len);

                for offset in 0..paired {
                    diff_values(
                        &index_path(path, new_index + offset),
                        &before[old_index + offset],
                        &after[new_index + offset],
                        ops,
                    );
                }

                for _ in paired..old_len {
                    ops.push(PatchOperation::remove(index_path(path, new_index + paired)));
                }

                for offset in paired..new_len {
                    let index = new_index + offset;
                    ops.push(PatchOperation::add(
                        index_path(path, index),
                        after[index].clone(),
                    ));
                }
            }
        }
    }
}

fn index_path(path: &str, index: usize) -> String {
    pointer_join(path, &index.to_string())
}
