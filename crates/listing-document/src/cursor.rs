//! Dotted-path access into a raw service document.
//!
//! The service wraps most payloads as `{"value": <payload>, ...metadata}`.
//! When a segment is not found on a map, the cursor looks inside that map's
//! `value` wrapper before giving up, so `copyright.value` and
//! `appReviewInfo.firstName.value` resolve the same way regardless of whether
//! the caller spells out every wrapper.

use serde_json::{Map, Value};

use crate::error::DocumentError;

/// Key under which the service stores the payload of a value wrapper.
pub const WRAPPER_KEY: &str = "value";

/// Result of reading a path. Keeps "key absent" apart from "key present but
/// null", which the service uses with different meanings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Leaf<'a> {
    Absent,
    Null,
    Present(&'a Value),
}

impl<'a> Leaf<'a> {
    #[must_use]
    pub fn is_absent(self) -> bool {
        matches!(self, Self::Absent)
    }

    #[must_use]
    pub fn is_present(self) -> bool {
        matches!(self, Self::Present(_))
    }

    #[must_use]
    pub fn value(self) -> Option<&'a Value> {
        match self {
            Self::Present(value) => Some(value),
            Self::Absent | Self::Null => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> Option<&'a str> {
        self.value().and_then(Value::as_str)
    }
}

fn step<'a>(current: &'a Value, segment: &str) -> Option<&'a Value> {
    let map = current.as_object()?;
    if let Some(next) = map.get(segment) {
        return Some(next);
    }
    if segment == WRAPPER_KEY {
        return None;
    }
    map.get(WRAPPER_KEY)?.as_object()?.get(segment)
}

fn unwraps_to(map: &Map<String, Value>, segment: &str) -> bool {
    !map.contains_key(segment)
        && segment != WRAPPER_KEY
        && map
            .get(WRAPPER_KEY)
            .and_then(Value::as_object)
            .is_some_and(|inner| inner.contains_key(segment))
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('.').filter(|segment| !segment.is_empty())
}

/// Read the value at `path`.
#[must_use]
pub fn lookup<'a>(document: &'a Value, path: &str) -> Leaf<'a> {
    let mut current = document;
    for segment in segments(path) {
        match step(current, segment) {
            Some(next) => current = next,
            None => return Leaf::Absent,
        }
    }

    if current.is_null() {
        Leaf::Null
    } else {
        Leaf::Present(current)
    }
}

/// Read the value at `path`, failing with the first missing segment.
///
/// # Errors
/// Returns [`DocumentError::MissingSegment`] when any segment is absent.
pub fn require<'a>(document: &'a Value, path: &str) -> Result<&'a Value, DocumentError> {
    let mut current = document;
    for segment in segments(path) {
        current = step(current, segment).ok_or_else(|| DocumentError::missing(path, segment))?;
    }
    Ok(current)
}

/// Mutable counterpart of [`require`].
///
/// # Errors
/// Returns [`DocumentError::MissingSegment`] when any segment is absent.
pub fn require_mut<'a>(
    document: &'a mut Value,
    path: &str,
) -> Result<&'a mut Value, DocumentError> {
    let mut current = document;
    for segment in segments(path) {
        current = descend(current, segment, path, false)?;
    }
    Ok(current)
}

/// Write `value` at `path`.
///
/// Intermediate maps are only created when `create_missing` is set; the
/// final key is always inserted into its parent map.
///
/// # Errors
/// Returns [`DocumentError::MissingSegment`] when an intermediate segment is
/// absent and may not be created, or [`DocumentError::NotAMap`] when a
/// segment resolves to something other than a map.
pub fn assign(
    document: &mut Value,
    path: &str,
    value: Value,
    create_missing: bool,
) -> Result<(), DocumentError> {
    let (parent, leaf) = match path.rsplit_once('.') {
        Some((parent, leaf)) => (Some(parent), leaf),
        None => (None, path),
    };

    let mut current = document;
    if let Some(parent) = parent {
        for segment in segments(parent) {
            current = descend(current, segment, path, create_missing)?;
        }
    }
    if create_missing && current.is_null() {
        *current = Value::Object(Map::new());
    }

    let Value::Object(map) = current else {
        return Err(DocumentError::not_a_map(path, leaf));
    };
    let map = if unwraps_to(map, leaf) {
        map.get_mut(WRAPPER_KEY)
            .and_then(Value::as_object_mut)
            .ok_or_else(|| DocumentError::not_a_map(path, WRAPPER_KEY))?
    } else {
        map
    };
    map.insert(leaf.to_string(), value);
    Ok(())
}

fn descend<'a>(
    current: &'a mut Value,
    segment: &str,
    path: &str,
    create_missing: bool,
) -> Result<&'a mut Value, DocumentError> {
    if current.is_null() && create_missing {
        *current = Value::Object(Map::new());
    }
    let map = match current {
        Value::Object(map) => map,
        Value::Null => return Err(DocumentError::missing(path, segment)),
        _ => return Err(DocumentError::not_a_map(path, segment)),
    };

    let map = if unwraps_to(map, segment) {
        map.get_mut(WRAPPER_KEY)
            .and_then(Value::as_object_mut)
            .ok_or_else(|| DocumentError::not_a_map(path, WRAPPER_KEY))?
    } else {
        map
    };

    if !map.contains_key(segment) {
        if !create_missing {
            return Err(DocumentError::missing(path, segment));
        }
        map.insert(segment.to_string(), Value::Object(Map::new()));
    }

    map.get_mut(segment)
        .ok_or_else(|| DocumentError::missing(path, segment))
}
