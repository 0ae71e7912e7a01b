//! Tri-state fields for partial updates.
//!
//! With `#[serde(default, deserialize_with = "double_option")]` an
//! `Option<Option<T>>` field reads as:
//! - key absent: `None` (leave unchanged)
//! - `null`: `Some(None)` (clear)
//! - a value: `Some(Some(v))` (set)

use serde::{Deserialize, Deserializer};

pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
