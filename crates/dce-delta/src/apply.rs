//! Replace-only patch application
//!
//! Operations are applied to a deep clone; the base is never touched.
//! Only `replace` is honoured, every other `op` is skipped. Indexes must
//! address an existing element or the slot just past the end.

use crate::error::PatchError;
use dce_model::{Draft, PatchOperation, PatchPath, Segment};
use serde_json::{Map, Value};

/// Apply `ops` to a copy of `base`
///
/// Intermediate objects and arrays are created as needed: an index segment
/// turns a non-array cursor into `[]`, a key segment turns a non-object
/// cursor into `{}`. Missing or `null` intermediate slots become `{}`.
/// An index may address an existing element or append one at the end;
/// arrays are never padded.
///
/// # Errors
/// Returns [`PatchError::EmptyPath`] for a `replace` whose path has no
/// segments, and [`PatchError::IndexOutOfRange`] when an index lies past
/// the end of its array
pub fn apply_patch(base: &Value, ops: &[PatchOperation]) -> Result<Value, PatchError> {
    let mut doc = base.clone();
    for (index, op) in ops.iter().enumerate() {
        if !op.is_replace() {
            tracing::debug!(op = %op.op, path = %op.path, "skipping unsupported patch operation");
            continue;
        }
        let path = op.target();
        replace_at(&mut doc, &path, op.value.clone()).map_err(|fault| match fault {
            Fault::EmptyPath => PatchError::empty_path(index, &op.path),
            Fault::OutOfRange { position, len } => {
                PatchError::index_out_of_range(index, &op.path, position, len)
            }
        })?;
    }
    Ok(doc)
}

/// Apply `ops` to a draft, returning the untyped result
///
/// The result is left untyped because a patch may produce a value that no
/// longer satisfies the draft shape; callers re-validate it.
///
/// # Errors
/// Returns error if the draft cannot be serialized or a path is invalid
pub fn apply_to_draft(base: &Draft, ops: &[PatchOperation]) -> Result<Value, PatchError> {
    let value = base.to_value()?;
    apply_patch(&value, ops)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fault {
    EmptyPath,
    OutOfRange { position: usize, len: usize },
}

fn replace_at(root: &mut Value, path: &PatchPath, value: Value) -> Result<(), Fault> {
    let (last, parents) = path.split_last().ok_or(Fault::EmptyPath)?;
    let mut cursor = root;
    for segment in parents {
        cursor = descend(cursor, segment)?;
    }
    *slot(cursor, last)? = value;
    Ok(())
}

fn descend<'a>(cursor: &'a mut Value, segment: &Segment) -> Result<&'a mut Value, Fault> {
    let next = slot(cursor, segment)?;
    if next.is_null() {
        *next = Value::Object(Map::new());
    }
    Ok(next)
}

fn slot<'a>(cursor: &'a mut Value, segment: &Segment) -> Result<&'a mut Value, Fault> {
    match segment {
        Segment::Index(position) => {
            if !cursor.is_array() {
                *cursor = Value::Array(Vec::new());
            }
            if let Value::Array(items) = cursor {
                let len = items.len();
                if *position > len {
                    return Err(Fault::OutOfRange {
                        position: *position,
                        len,
                    });
                }
                if *position == len {
                    items.push(Value::Null);
                }
            }
            Ok(&mut cursor[*position])
        }
        Segment::Key(key) => {
            if !cursor.is_object() {
                *cursor = Value::Object(Map::new());
            }
            Ok(&mut cursor[key.as_str()])
        }
    }
}
