//! Field paths and field-level validation errors.
//!
//! A [`FieldPath`] names a location inside a schema document. Paths are
//! immutable; [`child`](FieldPath::child), [`key`](FieldPath::key) and
//! [`index`](FieldPath::index) return extended copies.
//!
//! ```
//! use structural_schema_core::FieldPath;
//!
//! let path = FieldPath::root().child("properties").key("spec").child("items");
//! assert_eq!(path.to_string(), "properties[spec].items");
//!
//! let path = FieldPath::from_dotted("spec.validation").child("anyOf").index(1);
//! assert_eq!(path.to_string(), "spec.validation.anyOf[1]");
//! ```

use std::fmt;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Child(String),
    Key(String),
    Index(usize),
}

/// Location of a field inside a schema document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldPath {
    segments: Vec<Segment>,
}

impl FieldPath {
    /// The empty path.
    pub fn root() -> Self {
        Self::default()
    }

    /// A path with a single child segment.
    pub fn new(name: impl Into<String>) -> Self {
        Self::root().child(name)
    }

    /// Builds a path from dot-separated child names. Empty names are skipped,
    /// so `""` yields the root path.
    pub fn from_dotted(raw: &str) -> Self {
        raw.split('.')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .fold(Self::root(), |path, name| path.child(name))
    }

    /// Returns `true` for the empty path.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Extends the path with a named field (`.name`).
    pub fn child(&self, name: impl Into<String>) -> Self {
        self.extended(Segment::Child(name.into()))
    }

    /// Extends the path with a map key (`[key]`).
    pub fn key(&self, key: impl Into<String>) -> Self {
        self.extended(Segment::Key(key.into()))
    }

    /// Extends the path with a sequence index (`[i]`).
    pub fn index(&self, index: usize) -> Self {
        self.extended(Segment::Index(index))
    }

    fn extended(&self, segment: Segment) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend(self.segments.iter().cloned());
        segments.push(segment);
        Self { segments }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Child(name) if i == 0 => write!(f, "{name}")?,
                Segment::Child(name) => write!(f, ".{name}")?,
                Segment::Key(key) => write!(f, "[{key}]")?,
                Segment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

/// Category of a [`FieldError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// A mandatory field is absent.
    Required,
    /// A field holds a disallowed value.
    Invalid,
    /// A field must not be set at all.
    Forbidden,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required => f.write_str("Required value"),
            Self::Invalid => f.write_str("Invalid value"),
            Self::Forbidden => f.write_str("Forbidden"),
        }
    }
}

/// A single violation, attributed to a field path.
///
/// # Examples
///
/// ```
/// use structural_schema_core::{ErrorKind, FieldError, FieldPath};
///
/// let err = FieldError::invalid(&FieldPath::new("type"), "string", "must be object at the root");
/// assert_eq!(err.kind(), ErrorKind::Invalid);
/// assert_eq!(err.to_string(), r#"type: Invalid value: "string": must be object at the root"#);
/// ```
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind")]
pub enum FieldError {
    #[error("{field}: Required value: {detail}")]
    Required { field: String, detail: String },
    #[error("{field}: Invalid value: {value}: {detail}")]
    Invalid {
        field: String,
        value: Value,
        detail: String,
    },
    #[error("{field}: Forbidden: {detail}")]
    Forbidden { field: String, detail: String },
}

/// Errors accumulated over a whole schema tree.
pub type ErrorList = Vec<FieldError>;

impl FieldError {
    pub fn required(path: &FieldPath, detail: impl Into<String>) -> Self {
        Self::Required {
            field: path.to_string(),
            detail: detail.into(),
        }
    }

    pub fn invalid(path: &FieldPath, value: impl Into<Value>, detail: impl Into<String>) -> Self {
        Self::Invalid {
            field: path.to_string(),
            value: value.into(),
            detail: detail.into(),
        }
    }

    pub fn forbidden(path: &FieldPath, detail: impl Into<String>) -> Self {
        Self::Forbidden {
            field: path.to_string(),
            detail: detail.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Required { .. } => ErrorKind::Required,
            Self::Invalid { .. } => ErrorKind::Invalid,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
        }
    }

    /// The rendered field path.
    pub fn field(&self) -> &str {
        match self {
            Self::Required { field, .. } | Self::Invalid { field, .. } | Self::Forbidden { field, .. } => {
                field
            }
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            Self::Required { detail, .. }
            | Self::Invalid { detail, .. }
            | Self::Forbidden { detail, .. } => detail,
        }
    }

    /// The offending value. Only [`FieldError::Invalid`] carries one.
    pub fn bad_value(&self) -> Option<&Value> {
        match self {
            Self::Invalid { value, .. } => Some(value),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_path_renders_empty() {
        assert_eq!(FieldPath::root().to_string(), "");
        assert!(FieldPath::from_dotted("").is_root());
    }

    #[test]
    fn test_path_segments_render_like_field_paths() {
        let path = FieldPath::new("spec")
            .child("versions")
            .index(0)
            .child("schema")
            .child("properties")
            .key("foo.bar");
        assert_eq!(path.to_string(), "spec.versions[0].schema.properties[foo.bar]");
    }

    #[test]
    fn test_child_does_not_mutate_parent() {
        let parent = FieldPath::new("items");
        let _child = parent.child("type");
        assert_eq!(parent.to_string(), "items");
    }

    #[test]
    fn test_error_display_per_kind() {
        let path = FieldPath::new("anyOf").index(0).child("type");
        assert_eq!(
            FieldError::forbidden(&path, "must be empty to be structural").to_string(),
            "anyOf[0].type: Forbidden: must be empty to be structural"
        );
        assert_eq!(
            FieldError::required(&FieldPath::new("type"), "must not be empty at the root").to_string(),
            "type: Required value: must not be empty at the root"
        );
        assert_eq!(
            FieldError::invalid(&FieldPath::new("x-kubernetes-embedded-resource"), true, "nope")
                .to_string(),
            "x-kubernetes-embedded-resource: Invalid value: true: nope"
        );
    }

    #[test]
    fn test_error_serializes_with_kind_tag() {
        let err = FieldError::required(&FieldPath::new("properties"), "missing");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"kind": "Required", "field": "properties", "detail": "missing"})
        );
    }

    #[test]
    fn test_accessors() {
        let err = FieldError::invalid(&FieldPath::new("type"), "string", "bad");
        assert_eq!(err.field(), "type");
        assert_eq!(err.detail(), "bad");
        assert_eq!(err.bad_value(), Some(&Value::from("string")));
        assert_eq!(FieldError::forbidden(&FieldPath::new("title"), "x").bad_value(), None);
    }
}
