//! Path operations on the in-memory JSON tree.
//!
//! Every mutating helper returns whether the tree actually changed, so the
//! caller only wakes subscribers for real modifications.

use super::StoreError;
use serde_json::{Map, Value};
use tally_types::{validate_key, DataPath};

/// Returns the node at `path`, or `None` if any segment is missing.
pub(crate) fn get_at<'a>(root: &'a Value, path: &DataPath) -> Option<&'a Value> {
    path.segments()
        .iter()
        .try_fold(root, |node, key| node.as_object()?.get(key))
        .filter(|node| !node.is_null())
}

/// Writes `value` at `path`, creating intermediate objects.
///
/// A non-object intermediate node is replaced by an object. Writing `null`
/// removes the node.
pub(crate) fn set_at(root: &mut Value, path: &DataPath, value: Value) -> bool {
    if value.is_null() {
        return remove_at(root, path);
    }
    let Some((last, parents)) = path.segments().split_last() else {
        if *root == value {
            return false;
        }
        *root = value;
        return true;
    };

    let mut node = root;
    for key in parents {
        node = &mut object_or_replace(node)[key.as_str()];
    }
    let slot = &mut object_or_replace(node)[last.as_str()];
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

/// Removes the node at `path`. Missing nodes are a no-op.
pub(crate) fn remove_at(root: &mut Value, path: &DataPath) -> bool {
    let Some((last, parents)) = path.segments().split_last() else {
        if root.is_null() {
            return false;
        }
        *root = Value::Null;
        return true;
    };

    let mut node = root;
    for key in parents {
        match node.as_object_mut().and_then(|map| map.get_mut(key)) {
            Some(child) => node = child,
            None => return false,
        }
    }
    node.as_object_mut()
        .is_some_and(|map| map.remove(last).is_some())
}

/// Merges `fields` into the object at `path`.
///
/// `null` field values delete the field.
///
/// # Errors
///
/// [`StoreError::NotFound`] if nothing exists at `path`,
/// [`StoreError::NotAnObject`] if the node is not an object.
pub(crate) fn merge_at(
    root: &mut Value,
    path: &DataPath,
    fields: Map<String, Value>,
) -> Result<bool, StoreError> {
    let node = path
        .segments()
        .iter()
        .try_fold(&mut *root, |node, key| node.as_object_mut()?.get_mut(key))
        .filter(|node| !node.is_null())
        .ok_or_else(|| StoreError::not_found(path))?;
    let target = node
        .as_object_mut()
        .ok_or_else(|| StoreError::not_an_object(path))?;

    let mut changed = false;
    for (key, value) in fields {
        if value.is_null() {
            changed |= target.remove(&key).is_some();
        } else if target.get(&key) != Some(&value) {
            target.insert(key, value);
            changed = true;
        }
    }
    Ok(changed)
}

/// Checks that every object key inside `value` is a valid path segment.
///
/// # Errors
///
/// Returns [`StoreError::InvalidKey`] for the first invalid key found.
pub(crate) fn validate_keys(value: &Value) -> Result<(), StoreError> {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                validate_key(key)?;
                validate_keys(child)?;
            }
            Ok(())
        }
        Value::Array(items) => items.iter().try_for_each(validate_keys),
        _ => Ok(()),
    }
}

// Non-object nodes are replaced so that string indexing cannot panic.
fn object_or_replace(node: &mut Value) -> &mut Value {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    node
}
