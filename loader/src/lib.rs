//! Loading and reporting for structural schema checks.
//!
//! This crate turns files on disk into [`FileReport`]s:
//!
//! - [`collect_schema_paths`] resolves files and directories to schema files.
//! - [`load_documents`] parses JSON files and multi-document YAML streams.
//! - [`extract_schemas`] finds the schemas inside `CustomResourceDefinition`
//!   manifests, or treats a document as a bare schema.
//! - [`validate_file`] decodes and validates every schema in a file.
//!
//! Settings come from a YAML [`CheckConfig`].
//!
//! # Quick start
//!
//! ```no_run
//! use std::path::Path;
//!
//! use structural_schema_loader::{CheckConfig, validate_file};
//!
//! let config = CheckConfig::load(".structural-check.yml").unwrap();
//! let report = validate_file(Path::new("crds/widgets.yaml"), &config).unwrap();
//! for schema in &report.schemas {
//!     for error in &schema.errors {
//!         println!("{}: {error}", report.path.display());
//!     }
//! }
//! ```

mod config;
mod error;
mod loader;

pub use config::{CheckConfig, OutputConfig, OutputFormat};
pub use error::{LoaderError, Result};
pub use loader::{
    FileReport, SCHEMA_EXTENSIONS, SchemaReport, collect_schema_paths, extract_schemas,
    load_documents, parse_documents, validate_document, validate_documents, validate_file,
};
