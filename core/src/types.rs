//! Structural schema tree definitions.
//!
//! A [`Structural`] is the in-memory form of an OpenAPI v3 schema after it has
//! been split into its plain attributes ([`Generic`]), the Kubernetes vendor
//! extensions ([`Extensions`]) and its logical combinators
//! ([`ValueValidation`]). Fragments under `anyOf`/`allOf`/`oneOf`/`not` are
//! kept as [`NestedValueValidation`], where every plain attribute lands in a
//! `forbidden_*` slot that a structural schema must leave empty.
//!
//! Every child is exclusively owned by its parent, so a tree is always
//! acyclic.

use std::collections::BTreeMap;

use serde_json::Value;

/// The only `type` accepted at the root of a structural schema.
pub const OBJECT_TYPE: &str = "object";

/// A structural schema node.
///
/// # Examples
///
/// ```
/// use structural_schema_core::Structural;
///
/// let schema = Structural::typed("object")
///     .with_property("replicas", Structural::typed("integer"))
///     .with_property("tags", Structural::typed("array").with_items(Structural::typed("string")));
///
/// assert_eq!(schema.properties.as_ref().map(|p| p.len()), Some(2));
/// assert!(schema.value_validation.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Structural {
    /// Plain OpenAPI attributes.
    pub generic: Generic,
    /// Kubernetes vendor extensions.
    pub extensions: Extensions,
    /// Object fields. `None` means `properties` was not specified at all,
    /// which differs from an empty map.
    pub properties: Option<BTreeMap<String, Structural>>,
    /// Array element schema.
    pub items: Option<Box<Structural>>,
    /// Logical combinators.
    pub value_validation: Option<ValueValidation>,
}

/// Plain schema attributes shared by structural nodes and combinator
/// fragments.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Generic {
    /// The `type` keyword. Empty when unspecified.
    pub type_: String,
    pub title: String,
    pub description: String,
    pub nullable: bool,
    /// The `default` keyword. A JSON `null` default is treated as absent.
    pub default: Option<Value>,
    pub additional_properties: Option<AdditionalProperties>,
}

/// The two forms `additionalProperties` may take.
#[derive(Debug, Clone, PartialEq)]
pub enum AdditionalProperties {
    /// `additionalProperties: true` or `false`.
    Allows(bool),
    /// `additionalProperties: { ... }`.
    Schema(Box<Structural>),
}

impl AdditionalProperties {
    /// Returns the nested schema, if this is the schema form.
    pub fn schema(&self) -> Option<&Structural> {
        match self {
            Self::Allows(_) => None,
            Self::Schema(schema) => Some(schema),
        }
    }
}

/// Kubernetes vendor extensions (`x-kubernetes-*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Extensions {
    /// `x-kubernetes-preserve-unknown-fields`
    pub x_preserve_unknown_fields: bool,
    /// `x-kubernetes-embedded-resource`
    pub x_embedded_resource: bool,
    /// `x-kubernetes-int-or-string`
    pub x_int_or_string: bool,
}

impl Extensions {
    /// Returns `true` if no extension flag is set.
    pub fn is_empty(&self) -> bool {
        !self.x_preserve_unknown_fields && !self.x_embedded_resource && !self.x_int_or_string
    }
}

/// Value constraints of a schema: the logical combinators plus the scalar
/// keywords (`format`, `pattern`, `maximum`, `enum`, ...).
///
/// Scalar keywords are kept verbatim in `keywords` so that two fragments only
/// compare equal when every constraint matches.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValueValidation {
    pub any_of: Vec<NestedValueValidation>,
    pub all_of: Vec<NestedValueValidation>,
    pub one_of: Vec<NestedValueValidation>,
    pub not: Option<Box<NestedValueValidation>>,
    /// Scalar value-validation keywords by their OpenAPI name.
    pub keywords: BTreeMap<String, Value>,
}

impl ValueValidation {
    /// Returns `true` if neither a combinator nor a scalar keyword is set.
    pub fn is_empty(&self) -> bool {
        self.any_of.is_empty()
            && self.all_of.is_empty()
            && self.one_of.is_empty()
            && self.not.is_none()
            && self.keywords.is_empty()
    }
}

/// A schema fragment below a logical combinator.
///
/// Combinators may still describe structure (`items`, `properties`) and nest
/// further combinators, but every plain attribute and every extension flag
/// must stay unset for the enclosing schema to be structural.
///
/// # Examples
///
/// ```
/// use structural_schema_core::NestedValueValidation;
///
/// let branch = NestedValueValidation::typed("integer");
/// assert_eq!(branch.forbidden_generics.type_, "integer");
/// assert!(branch.forbidden_extensions.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NestedValueValidation {
    pub value_validation: ValueValidation,
    pub items: Option<Box<NestedValueValidation>>,
    pub properties: Option<BTreeMap<String, NestedValueValidation>>,
    pub forbidden_generics: Generic,
    pub forbidden_extensions: Extensions,
}

impl Structural {
    /// Creates a node with the given `type` and nothing else set.
    pub fn typed(type_: impl Into<String>) -> Self {
        Self {
            generic: Generic {
                type_: type_.into(),
                ..Generic::default()
            },
            ..Self::default()
        }
    }

    /// Adds (or replaces) an object field.
    pub fn with_property(mut self, name: impl Into<String>, schema: Structural) -> Self {
        self.properties
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), schema);
        self
    }

    /// Sets the array element schema.
    pub fn with_items(mut self, schema: Structural) -> Self {
        self.items = Some(Box::new(schema));
        self
    }

    /// Sets `additionalProperties` to a nested schema.
    pub fn with_additional_properties(mut self, schema: Structural) -> Self {
        self.generic.additional_properties = Some(AdditionalProperties::Schema(Box::new(schema)));
        self
    }

    /// Sets the logical combinators.
    pub fn with_value_validation(mut self, value_validation: ValueValidation) -> Self {
        self.value_validation = Some(value_validation);
        self
    }

    /// Sets the vendor extensions.
    pub fn with_extensions(mut self, extensions: Extensions) -> Self {
        self.extensions = extensions;
        self
    }
}

impl NestedValueValidation {
    /// Creates a fragment that only sets `type`.
    pub fn typed(type_: impl Into<String>) -> Self {
        Self {
            forbidden_generics: Generic {
                type_: type_.into(),
                ..Generic::default()
            },
            ..Self::default()
        }
    }

    /// Creates a fragment that only carries an `anyOf`.
    pub fn any_of(branches: Vec<NestedValueValidation>) -> Self {
        Self {
            value_validation: ValueValidation {
                any_of: branches,
                ..ValueValidation::default()
            },
            ..Self::default()
        }
    }
}
