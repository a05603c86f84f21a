//! Structural schema checks for OpenAPI v3 custom resource schemas.
//!
//! A structural schema avoids generic schema features that make pruning of
//! unknown fields, defaulting and schema merging ambiguous. This crate
//! provides:
//!
//! - [`Structural`], [`Generic`], [`Extensions`], [`ValueValidation`] and
//!   [`NestedValueValidation`]: the in-memory schema tree.
//! - [`decode_schema`] / [`Structural::from_json_str`]: building the tree
//!   from OpenAPI v3 JSON.
//! - [`validate_structural`]: the invariant checker, returning every
//!   violation as a [`FieldError`] attributed to a [`FieldPath`].
//!
//! # Example
//!
//! ```
//! use structural_schema_core::*;
//!
//! let schema = Structural::from_json_str(
//!     r#"{
//!         "type": "object",
//!         "properties": {
//!             "port": {
//!                 "x-kubernetes-int-or-string": true,
//!                 "anyOf": [{"type": "integer"}, {"type": "string"}]
//!             },
//!             "labels": {"anyOf": [{"type": "object"}]}
//!         }
//!     }"#,
//! )
//! .unwrap();
//!
//! let errors = validate_structural(&schema, &FieldPath::new("openAPIV3Schema"));
//! assert_eq!(errors.len(), 2);
//! assert_eq!(errors[0].field(), "openAPIV3Schema.properties[labels].anyOf[0].type");
//! assert_eq!(errors[1].field(), "openAPIV3Schema.properties[labels].type");
//! ```

mod decode;
mod field;
mod types;
mod validate;

pub use decode::{DecodeError, decode_schema};
pub use field::{ErrorKind, ErrorList, FieldError, FieldPath};
pub use types::*;
pub use validate::validate_structural;
