//! Conversion from untyped catalog entries to typed pool taints.
//!
//! The catalog holds pools written by anyone, so a [`PoolObject`] body is
//! only trusted as far as it can be decoded. Decoding is lenient per taint:
//! one bad taint does not hide the good ones next to it.

use serde_json::Value;
use thiserror::Error;

use poolsmith_state::PoolObject;

/// JSON pointer to the taint list inside a pool document.
const TAINTS_POINTER: &str = "/spec/template/spec/taints";

/// A taint as read back from the catalog.
///
/// Only `value` is required. `key` and `effect` may be absent on pools
/// poolsmith did not create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedTaint {
    pub key: Option<String>,
    pub value: String,
    pub effect: Option<String>,
}

/// Why part of a catalog entry could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedEntry {
    #[error("taints field not found")]
    MissingTaints,

    #[error("taints field is not a list")]
    TaintsNotList,

    #[error("taint {index} is not an object")]
    TaintNotObject { index: usize },

    #[error("taint {index} has no string value")]
    MissingValue { index: usize },
}

/// Decode the taint list of a catalog entry.
///
/// The outer error means the entry has no usable taint list at all. Inner
/// errors mark individual taints that could not be read.
pub fn decode_taints(
    object: &PoolObject,
) -> Result<Vec<Result<ObservedTaint, MalformedEntry>>, MalformedEntry> {
    let taints = object
        .body
        .pointer(TAINTS_POINTER)
        .ok_or(MalformedEntry::MissingTaints)?
        .as_array()
        .ok_or(MalformedEntry::TaintsNotList)?;

    Ok(taints
        .iter()
        .enumerate()
        .map(|(index, taint)| decode_taint(index, taint))
        .collect())
}

fn decode_taint(index: usize, taint: &Value) -> Result<ObservedTaint, MalformedEntry> {
    let map = taint
        .as_object()
        .ok_or(MalformedEntry::TaintNotObject { index })?;
    let value = map
        .get("value")
        .and_then(Value::as_str)
        .ok_or(MalformedEntry::MissingValue { index })?;
    let field = |name: &str| map.get(name).and_then(Value::as_str).map(str::to_string);

    Ok(ObservedTaint {
        key: field("key"),
        value: value.to_string(),
        effect: field("effect"),
    })
}
