//! Decoding OpenAPI v3 JSON into a [`Structural`] tree.
//!
//! Top-level keywords land in [`Generic`] and [`Extensions`]; keywords inside
//! `anyOf`/`allOf`/`oneOf`/`not` land in the `forbidden_*` slots of
//! [`NestedValueValidation`]. Scalar value-validation keywords (`format`,
//! `pattern`, `enum`, ...) are kept in [`ValueValidation::keywords`]; any
//! other unknown key is dropped.
//!
//! ```
//! use structural_schema_core::Structural;
//!
//! let schema = Structural::from_json_str(
//!     r#"{"x-kubernetes-int-or-string": true, "anyOf": [{"type": "integer"}, {"type": "string"}]}"#,
//! )
//! .unwrap();
//! assert!(schema.extensions.x_int_or_string);
//! let any_of = &schema.value_validation.as_ref().unwrap().any_of;
//! assert_eq!(any_of[0].forbidden_generics.type_, "integer");
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::de::value::{MapAccessDeserializer, SeqAccessDeserializer};
use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

use crate::field::FieldPath;
use crate::types::{
    AdditionalProperties, Extensions, Generic, NestedValueValidation, Structural, ValueValidation,
};

/// Errors raised while turning a JSON document into a schema tree.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The document does not have the shape of a schema.
    #[error("malformed schema at {path}: {message}")]
    Malformed { path: String, message: String },
    /// `$ref` is present; references are not resolved.
    #[error("unsupported $ref at {path}")]
    UnsupportedRef { path: String },
    /// `items` is an array of schemas (tuple form).
    #[error("items at {path} must be a single schema")]
    ItemsArray { path: String },
}

/// Scalar value-validation keywords carried into [`ValueValidation::keywords`].
const VALUE_VALIDATION_KEYWORDS: &[&str] = &[
    "format",
    "maximum",
    "exclusiveMaximum",
    "minimum",
    "exclusiveMinimum",
    "maxLength",
    "minLength",
    "pattern",
    "maxItems",
    "minItems",
    "uniqueItems",
    "multipleOf",
    "enum",
    "maxProperties",
    "minProperties",
    "required",
];

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSchema {
    #[serde(rename = "type")]
    type_: Option<String>,
    title: Option<String>,
    description: Option<String>,
    nullable: Option<bool>,
    default: Option<Value>,
    additional_properties: Option<RawSchemaOrBool>,
    properties: Option<BTreeMap<String, RawSchema>>,
    items: Option<RawSchemaOrArray>,
    any_of: Option<Vec<RawSchema>>,
    all_of: Option<Vec<RawSchema>>,
    one_of: Option<Vec<RawSchema>>,
    not: Option<Box<RawSchema>>,
    #[serde(rename = "$ref")]
    reference: Option<String>,
    #[serde(rename = "x-kubernetes-preserve-unknown-fields")]
    x_preserve_unknown_fields: Option<bool>,
    #[serde(rename = "x-kubernetes-embedded-resource")]
    x_embedded_resource: Option<bool>,
    #[serde(rename = "x-kubernetes-int-or-string")]
    x_int_or_string: Option<bool>,
    #[serde(flatten)]
    other: BTreeMap<String, Value>,
}

#[derive(Debug)]
enum RawSchemaOrBool {
    Bool(bool),
    Schema(Box<RawSchema>),
}

#[derive(Debug)]
enum RawSchemaOrArray {
    Array(Vec<RawSchema>),
    Schema(Box<RawSchema>),
}

// Not `#[serde(untagged)]`: buffered input loses the inner error path.

impl<'de> Deserialize<'de> for RawSchemaOrBool {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SchemaOrBoolVisitor;

        impl<'de> Visitor<'de> for SchemaOrBoolVisitor {
            type Value = RawSchemaOrBool;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a boolean or a schema object")
            }

            fn visit_bool<E: de::Error>(self, allows: bool) -> Result<Self::Value, E> {
                Ok(RawSchemaOrBool::Bool(allows))
            }

            fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Self::Value, A::Error> {
                let schema = RawSchema::deserialize(MapAccessDeserializer::new(map))?;
                Ok(RawSchemaOrBool::Schema(Box::new(schema)))
            }
        }

        deserializer.deserialize_any(SchemaOrBoolVisitor)
    }
}

impl<'de> Deserialize<'de> for RawSchemaOrArray {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SchemaOrArrayVisitor;

        impl<'de> Visitor<'de> for SchemaOrArrayVisitor {
            type Value = RawSchemaOrArray;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a schema object or an array of schemas")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, seq: A) -> Result<Self::Value, A::Error> {
                let schemas = Vec::<RawSchema>::deserialize(SeqAccessDeserializer::new(seq))?;
                Ok(RawSchemaOrArray::Array(schemas))
            }

            fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Self::Value, A::Error> {
                let schema = RawSchema::deserialize(MapAccessDeserializer::new(map))?;
                Ok(RawSchemaOrArray::Schema(Box::new(schema)))
            }
        }

        deserializer.deserialize_any(SchemaOrArrayVisitor)
    }
}

impl Structural {
    /// Decodes a schema from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Malformed`] for invalid JSON or a document that
    /// is not shaped like a schema, and the other [`DecodeError`] variants
    /// for unsupported constructs.
    pub fn from_json_str(src: &str) -> Result<Self, DecodeError> {
        let mut de = serde_json::Deserializer::from_str(src);
        let raw = serde_path_to_error::deserialize::<_, RawSchema>(&mut de).map_err(malformed)?;
        de.end().map_err(|err| DecodeError::Malformed {
            path: describe(&FieldPath::root()),
            message: err.to_string(),
        })?;
        structural_from_raw(raw, &FieldPath::root())
    }
}

/// Decodes a schema from an already parsed JSON value.
///
/// Error paths are relative to `value`.
pub fn decode_schema(value: &Value) -> Result<Structural, DecodeError> {
    let raw = serde_path_to_error::deserialize::<_, RawSchema>(value).map_err(malformed)?;
    structural_from_raw(raw, &FieldPath::root())
}

fn malformed(err: serde_path_to_error::Error<serde_json::Error>) -> DecodeError {
    DecodeError::Malformed {
        path: err.path().to_string(),
        message: err.into_inner().to_string(),
    }
}

fn describe(path: &FieldPath) -> String {
    if path.is_root() {
        "<root>".to_string()
    } else {
        path.to_string()
    }
}

/// Splits the plain attributes off a raw schema.
fn split_generic(raw: &mut RawSchema, path: &FieldPath) -> Result<(Generic, Extensions), DecodeError> {
    if raw.reference.is_some() {
        return Err(DecodeError::UnsupportedRef { path: describe(path) });
    }

    let additional_properties = match raw.additional_properties.take() {
        None => None,
        Some(RawSchemaOrBool::Bool(allows)) => Some(AdditionalProperties::Allows(allows)),
        Some(RawSchemaOrBool::Schema(schema)) => Some(AdditionalProperties::Schema(Box::new(
            structural_from_raw(*schema, &path.child("additionalProperties"))?,
        ))),
    };

    let generic = Generic {
        type_: raw.type_.take().unwrap_or_default(),
        title: raw.title.take().unwrap_or_default(),
        description: raw.description.take().unwrap_or_default(),
        nullable: raw.nullable.unwrap_or(false),
        default: raw.default.take(),
        additional_properties,
    };
    let extensions = Extensions {
        x_preserve_unknown_fields: raw.x_preserve_unknown_fields.unwrap_or(false),
        x_embedded_resource: raw.x_embedded_resource.unwrap_or(false),
        x_int_or_string: raw.x_int_or_string.unwrap_or(false),
    };
    Ok((generic, extensions))
}

fn single_items(items: Option<RawSchemaOrArray>, path: &FieldPath) -> Result<Option<RawSchema>, DecodeError> {
    match items {
        None => Ok(None),
        Some(RawSchemaOrArray::Schema(schema)) => Ok(Some(*schema)),
        Some(RawSchemaOrArray::Array(_)) => Err(DecodeError::ItemsArray { path: describe(path) }),
    }
}

/// Null, `false` and `""` are the unset forms of the scalar keywords.
fn is_unset(value: &Value) -> bool {
    matches!(value, Value::Null | Value::Bool(false)) || value.as_str() == Some("")
}

fn value_validation_from_raw(raw: &mut RawSchema, path: &FieldPath) -> Result<ValueValidation, DecodeError> {
    let branches = |list: Option<Vec<RawSchema>>, name: &str| -> Result<Vec<NestedValueValidation>, DecodeError> {
        list.unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(i, branch)| nested_from_raw(branch, &path.child(name).index(i)))
            .collect()
    };

    Ok(ValueValidation {
        any_of: branches(raw.any_of.take(), "anyOf")?,
        all_of: branches(raw.all_of.take(), "allOf")?,
        one_of: branches(raw.one_of.take(), "oneOf")?,
        not: raw
            .not
            .take()
            .map(|not| nested_from_raw(*not, &path.child("not")).map(Box::new))
            .transpose()?,
        keywords: std::mem::take(&mut raw.other)
            .into_iter()
            .filter(|(name, value)| VALUE_VALIDATION_KEYWORDS.contains(&name.as_str()) && !is_unset(value))
            .collect(),
    })
}

fn structural_from_raw(mut raw: RawSchema, path: &FieldPath) -> Result<Structural, DecodeError> {
    let (generic, extensions) = split_generic(&mut raw, path)?;

    let items = single_items(raw.items.take(), &path.child("items"))?
        .map(|items| structural_from_raw(items, &path.child("items")).map(Box::new))
        .transpose()?;

    let properties = raw
        .properties
        .take()
        .map(|properties| {
            properties
                .into_iter()
                .map(|(name, property)| {
                    let child = structural_from_raw(property, &path.child("properties").key(name.as_str()))?;
                    Ok::<_, DecodeError>((name, child))
                })
                .collect::<Result<BTreeMap<_, _>, _>>()
        })
        .transpose()?;

    let value_validation = value_validation_from_raw(&mut raw, path)?;

    Ok(Structural {
        generic,
        extensions,
        properties,
        items,
        value_validation: (!value_validation.is_empty()).then_some(value_validation),
    })
}

fn nested_from_raw(mut raw: RawSchema, path: &FieldPath) -> Result<NestedValueValidation, DecodeError> {
    let (forbidden_generics, forbidden_extensions) = split_generic(&mut raw, path)?;

    let items = single_items(raw.items.take(), &path.child("items"))?
        .map(|items| nested_from_raw(items, &path.child("items")).map(Box::new))
        .transpose()?;

    let properties = raw
        .properties
        .take()
        .map(|properties| {
            properties
                .into_iter()
                .map(|(name, property)| {
                    let child = nested_from_raw(property, &path.child("properties").key(name.as_str()))?;
                    Ok::<_, DecodeError>((name, child))
                })
                .collect::<Result<BTreeMap<_, _>, _>>()
        })
        .transpose()?;

    Ok(NestedValueValidation {
        value_validation: value_validation_from_raw(&mut raw, path)?,
        items,
        properties,
        forbidden_generics,
        forbidden_extensions,
    })
}
