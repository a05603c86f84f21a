//! Structural invariant checks.
//!
//! A schema is structural when:
//!
//! - every combinator fragment (`anyOf`, `allOf`, `oneOf`, `not`) leaves all
//!   plain attributes and extension flags unset, except for the two
//!   int-or-string shapes below;
//! - every node with `x-kubernetes-embedded-resource: true` has
//!   `type: object`, and either `properties` or
//!   `x-kubernetes-preserve-unknown-fields: true`;
//! - `x-kubernetes-int-or-string` is not combined with
//!   `x-kubernetes-preserve-unknown-fields` or `x-kubernetes-embedded-resource`;
//! - every specified schema has a `type`, unless int-or-string or
//!   preserve-unknown-fields is set, and the root `type` is `object`;
//! - `additionalProperties` is not used at the root.
//!
//! With `x-kubernetes-int-or-string: true` a node may carry one of:
//!
//! ```yaml
//! anyOf:
//! - type: integer
//! - type: string
//! ```
//!
//! ```yaml
//! allOf:
//! - anyOf:
//!   - type: integer
//!   - type: string
//! - ... zero or more
//! ```
//!
//! # Examples
//!
//! ```
//! use structural_schema_core::*;
//!
//! let schema = Structural::typed("object").with_property("x", Structural::typed("integer"));
//! assert!(validate_structural(&schema, &FieldPath::root()).is_empty());
//!
//! let errors = validate_structural(&Structural::typed("string"), &FieldPath::root());
//! assert_eq!(errors.len(), 1);
//! assert_eq!(errors[0].kind(), ErrorKind::Invalid);
//! ```

use tracing::debug;

use crate::field::{ErrorList, FieldError, FieldPath};
use crate::types::{Extensions, Generic, NestedValueValidation, OBJECT_TYPE, Structural, ValueValidation};

/// Position of a node in the schema tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Root,
    Item,
    Field,
}

const PRESERVE_UNKNOWN_FIELDS: &str = "x-kubernetes-preserve-unknown-fields";
const EMBEDDED_RESOURCE: &str = "x-kubernetes-embedded-resource";
const INT_OR_STRING: &str = "x-kubernetes-int-or-string";

/// Validates that `schema` is a structural schema.
///
/// All violations in the tree are returned; an empty list means the schema
/// is structural. Errors under `properties` follow field-name order.
pub fn validate_structural(schema: &Structural, path: &FieldPath) -> ErrorList {
    validate_structural_invariants(Some(schema), Level::Root, path)
}

/// The `anyOf` shape blessed for int-or-string nodes.
fn int_or_string_any_of() -> [NestedValueValidation; 2] {
    [
        NestedValueValidation::typed("integer"),
        NestedValueValidation::typed("string"),
    ]
}

fn is_int_or_string_any_of(any_of: &[NestedValueValidation]) -> bool {
    any_of == int_or_string_any_of().as_slice()
}

fn validate_structural_invariants(schema: Option<&Structural>, level: Level, path: &FieldPath) -> ErrorList {
    let Some(schema) = schema else {
        return ErrorList::new();
    };

    let mut errors = ErrorList::new();

    errors.extend(validate_structural_invariants(
        schema.items.as_deref(),
        Level::Item,
        &path.child("items"),
    ));
    for (name, property) in schema.properties.iter().flatten() {
        errors.extend(validate_structural_invariants(
            Some(property),
            Level::Field,
            &path.child("properties").key(name.as_str()),
        ));
    }
    errors.extend(validate_generic(&schema.generic, level, path));
    errors.extend(validate_extensions(&schema.extensions, path));

    let mut skip_any_of = false;
    let mut skip_first_all_of_any_of = false;
    if schema.extensions.x_int_or_string {
        if let Some(value_validation) = &schema.value_validation {
            if is_int_or_string_any_of(&value_validation.any_of) {
                debug!(path = %path, "int-or-string anyOf exempted");
                skip_any_of = true;
            } else if value_validation
                .all_of
                .first()
                .is_some_and(|first| is_int_or_string_any_of(&first.value_validation.any_of))
            {
                debug!(path = %path, "int-or-string allOf[0].anyOf exempted");
                skip_first_all_of_any_of = true;
            }
        }
    }

    errors.extend(validate_value_validation(
        schema.value_validation.as_ref(),
        skip_any_of,
        skip_first_all_of_any_of,
        path,
    ));

    let type_ = schema.generic.type_.as_str();
    let extensions = &schema.extensions;

    if extensions.x_embedded_resource && type_ != OBJECT_TYPE {
        let detail = format!("must be object if {EMBEDDED_RESOURCE} is true");
        if type_.is_empty() {
            errors.push(FieldError::required(&path.child("type"), detail));
        } else {
            errors.push(FieldError::invalid(&path.child("type"), type_, detail));
        }
    } else if type_.is_empty() && !extensions.x_int_or_string && !extensions.x_preserve_unknown_fields {
        let detail = match level {
            Level::Root => "must not be empty at the root",
            Level::Item => "must not be empty for specified array items",
            Level::Field => "must not be empty for specified object fields",
        };
        errors.push(FieldError::required(&path.child("type"), detail));
    }

    if level == Level::Root && !type_.is_empty() && type_ != OBJECT_TYPE {
        errors.push(FieldError::invalid(&path.child("type"), type_, "must be object at the root"));
    }

    if extensions.x_embedded_resource && !extensions.x_preserve_unknown_fields && schema.properties.is_none() {
        errors.push(FieldError::required(
            &path.child("properties"),
            format!("must not be empty if {EMBEDDED_RESOURCE} is true without {PRESERVE_UNKNOWN_FIELDS}"),
        ));
    }

    errors
}

fn validate_generic(generic: &Generic, level: Level, path: &FieldPath) -> ErrorList {
    let mut errors = ErrorList::new();

    if let Some(additional_properties) = &generic.additional_properties {
        if level == Level::Root {
            errors.push(FieldError::forbidden(
                &path.child("additionalProperties"),
                "must not be used at the root",
            ));
        }
        if let Some(schema) = additional_properties.schema() {
            errors.extend(validate_structural_invariants(
                Some(schema),
                Level::Field,
                &path.child("additionalProperties"),
            ));
        }
    }

    errors
}

fn validate_extensions(extensions: &Extensions, path: &FieldPath) -> ErrorList {
    let mut errors = ErrorList::new();
    let detail = format!("must be false if {INT_OR_STRING} is true");

    if extensions.x_int_or_string && extensions.x_preserve_unknown_fields {
        errors.push(FieldError::invalid(
            &path.child(PRESERVE_UNKNOWN_FIELDS),
            extensions.x_preserve_unknown_fields,
            detail.as_str(),
        ));
    }
    if extensions.x_int_or_string && extensions.x_embedded_resource {
        errors.push(FieldError::invalid(
            &path.child(EMBEDDED_RESOURCE),
            extensions.x_embedded_resource,
            detail.as_str(),
        ));
    }

    errors
}

fn validate_value_validation(
    value_validation: Option<&ValueValidation>,
    skip_any_of: bool,
    skip_first_all_of_any_of: bool,
    path: &FieldPath,
) -> ErrorList {
    let Some(value_validation) = value_validation else {
        return ErrorList::new();
    };

    let mut errors = ErrorList::new();

    if !skip_any_of {
        for (i, nested) in value_validation.any_of.iter().enumerate() {
            errors.extend(validate_nested_value_validation(
                Some(nested),
                false,
                false,
                &path.child("anyOf").index(i),
            ));
        }
    }

    for (i, nested) in value_validation.all_of.iter().enumerate() {
        errors.extend(validate_nested_value_validation(
            Some(nested),
            skip_first_all_of_any_of && i == 0,
            false,
            &path.child("allOf").index(i),
        ));
    }

    for (i, nested) in value_validation.one_of.iter().enumerate() {
        errors.extend(validate_nested_value_validation(
            Some(nested),
            false,
            false,
            &path.child("oneOf").index(i),
        ));
    }

    errors.extend(validate_nested_value_validation(
        value_validation.not.as_deref(),
        false,
        false,
        &path.child("not"),
    ));

    errors
}

/// Checks a fragment under a logical combinator. The skip signals apply to
/// the fragment's own combinators only, never to its `items` or `properties`.
fn validate_nested_value_validation(
    nested: Option<&NestedValueValidation>,
    skip_any_of: bool,
    skip_all_of_any_of: bool,
    path: &FieldPath,
) -> ErrorList {
    let Some(nested) = nested else {
        return ErrorList::new();
    };

    let mut errors = ErrorList::new();

    errors.extend(validate_value_validation(
        Some(&nested.value_validation),
        skip_any_of,
        skip_all_of_any_of,
        path,
    ));
    errors.extend(validate_nested_value_validation(
        nested.items.as_deref(),
        false,
        false,
        &path.child("items"),
    ));
    for (name, property) in nested.properties.iter().flatten() {
        errors.extend(validate_nested_value_validation(
            Some(property),
            false,
            false,
            &path.child("properties").key(name.as_str()),
        ));
    }

    let generics = &nested.forbidden_generics;
    if !generics.type_.is_empty() {
        errors.push(FieldError::forbidden(&path.child("type"), "must be empty to be structural"));
    }
    if generics.additional_properties.is_some() {
        errors.push(FieldError::forbidden(
            &path.child("additionalProperties"),
            "must be undefined to be structural",
        ));
    }
    if generics.default.is_some() {
        errors.push(FieldError::forbidden(&path.child("default"), "must be undefined to be structural"));
    }
    if !generics.title.is_empty() {
        errors.push(FieldError::forbidden(&path.child("title"), "must be empty to be structural"));
    }
    if !generics.description.is_empty() {
        errors.push(FieldError::forbidden(&path.child("description"), "must be empty to be structural"));
    }
    if generics.nullable {
        errors.push(FieldError::forbidden(&path.child("nullable"), "must be false to be structural"));
    }

    let extensions = &nested.forbidden_extensions;
    if extensions.x_preserve_unknown_fields {
        errors.push(FieldError::forbidden(
            &path.child(PRESERVE_UNKNOWN_FIELDS),
            "must be false to be structural",
        ));
    }
    if extensions.x_embedded_resource {
        errors.push(FieldError::forbidden(&path.child(EMBEDDED_RESOURCE), "must be false to be structural"));
    }
    if extensions.x_int_or_string {
        errors.push(FieldError::forbidden(&path.child(INT_OR_STRING), "must be false to be structural"));
    }

    errors
}
