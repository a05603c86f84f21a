//! Schema file discovery, document loading and per-file reports.
//!
//! Input files hold either bare OpenAPI v3 schemas or
//! `CustomResourceDefinition` manifests. YAML files may contain several
//! documents separated by `---`.
//!
//! ```no_run
//! use std::path::PathBuf;
//!
//! use structural_schema_loader::{CheckConfig, collect_schema_paths, validate_file};
//!
//! let config = CheckConfig::default();
//! let paths = collect_schema_paths(&[PathBuf::from("deploy/crds")], &config).unwrap();
//! for path in &paths {
//!     let report = validate_file(path, &config).unwrap();
//!     println!("{}: {} violation(s)", path.display(), report.error_count());
//! }
//! ```

use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use structural_schema_core::{DecodeError, ErrorList, FieldPath, decode_schema, validate_structural};
use tracing::debug;

use crate::config::CheckConfig;
use crate::error::{LoaderError, Result};

const CRD_KIND: &str = "CustomResourceDefinition";

/// Extensions accepted for schema files.
pub const SCHEMA_EXTENSIONS: &[&str] = &["json", "yaml", "yml"];

/// Violations found in one schema of a document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaReport {
    /// Index of the document within its file.
    pub document: usize,
    /// Location of the schema within the document.
    pub field_path: String,
    pub errors: ErrorList,
}

/// Violations found in one file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub schemas: Vec<SchemaReport>,
}

impl FileReport {
    /// Total number of violations across all schemas in the file.
    pub fn error_count(&self) -> usize {
        self.schemas.iter().map(|schema| schema.errors.len()).sum()
    }

    /// Returns `true` if every schema in the file is structural.
    pub fn is_structural(&self) -> bool {
        self.schemas.iter().all(|schema| schema.errors.is_empty())
    }
}

fn has_schema_extension(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| SCHEMA_EXTENSIONS.contains(&ext))
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| ext == "yaml" || ext == "yml")
}

/// Resolves files and directories to a sorted list of schema files.
///
/// Directories contribute their `.json`, `.yaml` and `.yml` files (not
/// recursively), minus the names excluded by `config`.
///
/// # Errors
///
/// Returns [`LoaderError::InvalidInput`] if no inputs are given, a path does
/// not exist, a file has an unsupported extension, or nothing is found.
pub fn collect_schema_paths(inputs: &[PathBuf], config: &CheckConfig) -> Result<Vec<PathBuf>> {
    if inputs.is_empty() {
        return Err(LoaderError::InvalidInput(
            "No schema paths were provided".to_string(),
        ));
    }

    let mut paths = BTreeSet::new();

    for input in inputs {
        if input.is_dir() {
            for entry in fs::read_dir(input)? {
                let path = entry?.path();
                let excluded = path
                    .file_name()
                    .and_then(OsStr::to_str)
                    .is_some_and(|name| config.is_excluded(name));
                if path.is_file() && has_schema_extension(&path) && !excluded {
                    paths.insert(path);
                }
            }
            continue;
        }

        if input.is_file() {
            if !has_schema_extension(input) {
                return Err(LoaderError::InvalidInput(format!(
                    "Schema file '{}' must end in .json, .yaml or .yml",
                    input.display()
                )));
            }
            paths.insert(input.clone());
            continue;
        }

        return Err(LoaderError::InvalidInput(format!(
            "Schema path '{}' does not exist",
            input.display(),
        )));
    }

    if paths.is_empty() {
        return Err(LoaderError::InvalidInput(
            "No schema files found in provided paths".to_string(),
        ));
    }

    Ok(paths.into_iter().collect())
}

/// Parses JSON or YAML text into documents. Empty YAML documents are
/// dropped.
///
/// # Errors
///
/// Returns [`LoaderError::JsonError`] or [`LoaderError::YamlError`] when the
/// text does not parse.
pub fn parse_documents(raw: &str, yaml: bool) -> Result<Vec<Value>> {
    if !yaml {
        return Ok(vec![serde_json::from_str(raw)?]);
    }

    let mut documents = Vec::new();
    for document in serde_yaml::Deserializer::from_str(raw) {
        let value = Value::deserialize(document)?;
        if !value.is_null() {
            documents.push(value);
        }
    }
    Ok(documents)
}

/// Reads all documents of a schema file.
///
/// `.yaml`/`.yml` files are parsed as YAML streams, everything else as JSON.
pub fn load_documents(path: &Path) -> Result<Vec<Value>> {
    let raw = fs::read_to_string(path)?;
    let documents = parse_documents(&raw, is_yaml(path))?;
    debug!(path = %path.display(), documents = documents.len(), "loaded schema file");
    Ok(documents)
}

/// Locates the schemas held by a document.
///
/// For a `CustomResourceDefinition` these are
/// `spec.versions[i].schema.openAPIV3Schema` and the legacy
/// `spec.validation.openAPIV3Schema`. Any other document is itself a schema
/// located at `root`.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use structural_schema_core::FieldPath;
/// use structural_schema_loader::extract_schemas;
///
/// let crd = json!({
///     "kind": "CustomResourceDefinition",
///     "spec": {"versions": [
///         {"name": "v1", "schema": {"openAPIV3Schema": {"type": "object"}}},
///         {"name": "v2"}
///     ]}
/// });
/// let schemas = extract_schemas(&crd, &FieldPath::root());
/// assert_eq!(schemas.len(), 1);
/// assert_eq!(schemas[0].0.to_string(), "spec.versions[0].schema.openAPIV3Schema");
/// ```
pub fn extract_schemas<'a>(document: &'a Value, root: &FieldPath) -> Vec<(FieldPath, &'a Value)> {
    if document.get("kind").and_then(Value::as_str) != Some(CRD_KIND) {
        return vec![(root.clone(), document)];
    }

    let spec_path = FieldPath::new("spec");
    let mut schemas = Vec::new();

    if let Some(schema) = document.pointer("/spec/validation/openAPIV3Schema") {
        schemas.push((
            spec_path.child("validation").child("openAPIV3Schema"),
            schema,
        ));
    }

    let versions = document
        .pointer("/spec/versions")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    for (i, version) in versions.iter().enumerate() {
        if let Some(schema) = version.pointer("/schema/openAPIV3Schema") {
            schemas.push((
                spec_path
                    .child("versions")
                    .index(i)
                    .child("schema")
                    .child("openAPIV3Schema"),
                schema,
            ));
        }
    }

    if schemas.is_empty() {
        debug!("CustomResourceDefinition without schemas");
    }
    schemas
}

/// Decodes and validates every schema in `document`.
///
/// Errors from the decoder carry the schema location but no file; see
/// [`validate_documents`] for the file-aware variant.
pub fn validate_document(
    index: usize,
    document: &Value,
    root: &FieldPath,
) -> std::result::Result<Vec<SchemaReport>, (FieldPath, DecodeError)> {
    let mut reports = Vec::new();
    for (field_path, value) in extract_schemas(document, root) {
        let schema = decode_schema(value).map_err(|err| (field_path.clone(), err))?;
        let errors = validate_structural(&schema, &field_path);
        reports.push(SchemaReport {
            document: index,
            field_path: field_path.to_string(),
            errors,
        });
    }
    Ok(reports)
}

/// Validates parsed documents originating from `file`.
///
/// # Errors
///
/// Returns [`LoaderError::Decode`] if a schema cannot be decoded.
pub fn validate_documents(file: &Path, documents: &[Value], config: &CheckConfig) -> Result<FileReport> {
    let root = config.root_field_path();
    let mut schemas = Vec::new();

    for (index, document) in documents.iter().enumerate() {
        let reports = validate_document(index, document, &root).map_err(|(field_path, source)| {
            LoaderError::Decode {
                file: file.to_path_buf(),
                schema: field_path.to_string(),
                source,
            }
        })?;
        schemas.extend(reports);
    }

    let report = FileReport {
        path: file.to_path_buf(),
        schemas,
    };
    debug!(
        path = %file.display(),
        schemas = report.schemas.len(),
        errors = report.error_count(),
        "validated schema file"
    );
    Ok(report)
}

/// Loads a schema file and validates every schema it contains.
///
/// # Errors
///
/// Returns a [`LoaderError`] if the file cannot be read, parsed or decoded.
/// Structural violations are reported in the returned [`FileReport`].
pub fn validate_file(path: &Path, config: &CheckConfig) -> Result<FileReport> {
    let documents = load_documents(path)?;
    validate_documents(path, &documents, config)
}
