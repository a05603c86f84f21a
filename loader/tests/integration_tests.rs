use std::fs;
use std::path::{Path, PathBuf};

use structural_schema_core::ErrorKind;
use structural_schema_loader::{
    CheckConfig, LoaderError, collect_schema_paths, load_documents, validate_file,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn test_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("ss_loader_integ_{name}_{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

const WIDGET_CRD: &str = r#"
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: widgets.example.com
spec:
  group: example.com
  names:
    kind: Widget
    plural: widgets
  scope: Namespaced
  versions:
    - name: v1
      served: true
      storage: true
      schema:
        openAPIV3Schema:
          type: object
          properties:
            spec:
              type: object
              properties:
                port:
                  x-kubernetes-int-or-string: true
                  anyOf:
                    - type: integer
                    - type: string
                replicas:
                  type: integer
                template:
                  type: object
                  x-kubernetes-embedded-resource: true
                  x-kubernetes-preserve-unknown-fields: true
"#;

const BROKEN_CRD: &str = r#"
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: gadgets.example.com
spec:
  versions:
    - name: v1
      schema:
        openAPIV3Schema:
          type: object
          additionalProperties: true
          properties:
            size:
              oneOf:
                - type: integer
                  description: a number
"#;

// ---------------------------------------------------------------------------
// Path collection
// ---------------------------------------------------------------------------

#[test]
fn test_collect_schema_paths_from_directory() {
    let dir = test_dir("collect");
    write(&dir, "b.yaml", "type: object\n");
    write(&dir, "a.json", r#"{"type": "object"}"#);
    write(&dir, "c.yml", "type: object\n");
    write(&dir, "notes.txt", "ignored");
    write(&dir, "kustomization.yaml", "resources: []\n");

    let config: CheckConfig = serde_yaml::from_str("version: \"1.0\"\nexclude: [kustomization.yaml]\n").unwrap();
    let paths = collect_schema_paths(&[dir.clone()], &config).unwrap();
    let names: Vec<&str> = paths
        .iter()
        .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
        .collect();
    assert_eq!(names, vec!["a.json", "b.yaml", "c.yml"]);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_collect_schema_paths_rejects_bad_inputs() {
    let dir = test_dir("collect_bad");
    let txt = write(&dir, "schema.txt", "{}");
    let config = CheckConfig::default();

    let err = collect_schema_paths(&[txt], &config).unwrap_err();
    assert!(matches!(err, LoaderError::InvalidInput(_)));

    let err = collect_schema_paths(&[dir.join("missing.json")], &config).unwrap_err();
    assert!(matches!(err, LoaderError::InvalidInput(_)));

    let empty = test_dir("collect_empty");
    let err = collect_schema_paths(&[empty.clone()], &config).unwrap_err();
    assert!(matches!(err, LoaderError::InvalidInput(_)));

    assert!(collect_schema_paths(&[], &config).is_err());

    fs::remove_dir_all(&dir).ok();
    fs::remove_dir_all(&empty).ok();
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[test]
fn test_structural_crd_has_no_violations() {
    let dir = test_dir("structural_crd");
    let path = write(&dir, "widgets.yaml", WIDGET_CRD);

    let report = validate_file(&path, &CheckConfig::default()).unwrap();
    assert_eq!(report.schemas.len(), 1);
    assert_eq!(
        report.schemas[0].field_path,
        "spec.versions[0].schema.openAPIV3Schema"
    );
    assert!(report.is_structural(), "unexpected errors: {:?}", report.schemas);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_broken_crd_reports_every_violation() {
    let dir = test_dir("broken_crd");
    let path = write(&dir, "gadgets.yaml", BROKEN_CRD);

    let report = validate_file(&path, &CheckConfig::default()).unwrap();
    let errors = &report.schemas[0].errors;
    let found: Vec<(ErrorKind, String)> = errors
        .iter()
        .map(|e| (e.kind(), e.field().to_string()))
        .collect();
    let prefix = "spec.versions[0].schema.openAPIV3Schema";
    assert_eq!(
        found,
        vec![
            (ErrorKind::Forbidden, format!("{prefix}.properties[size].oneOf[0].type")),
            (ErrorKind::Forbidden, format!("{prefix}.properties[size].oneOf[0].description")),
            (ErrorKind::Required, format!("{prefix}.properties[size].type")),
            (ErrorKind::Forbidden, format!("{prefix}.additionalProperties")),
        ]
    );
    assert_eq!(report.error_count(), 4);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_bare_schema_uses_configured_root_path() {
    let dir = test_dir("bare_root");
    let path = write(&dir, "schema.json", r#"{"type": "string"}"#);

    let config: CheckConfig =
        serde_yaml::from_str("version: \"1.0\"\nroot_path: spec.validation.openAPIV3Schema\n").unwrap();
    let report = validate_file(&path, &config).unwrap();
    assert_eq!(
        report.schemas[0].errors[0].field(),
        "spec.validation.openAPIV3Schema.type"
    );

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_multi_document_yaml() {
    let dir = test_dir("multi_doc");
    let path = write(
        &dir,
        "schemas.yaml",
        &format!("type: object\n---\n{WIDGET_CRD}\n---\ntype: \"\"\n"),
    );

    assert_eq!(load_documents(&path).unwrap().len(), 3);

    let report = validate_file(&path, &CheckConfig::default()).unwrap();
    assert_eq!(report.schemas.len(), 3);
    let documents: Vec<usize> = report.schemas.iter().map(|s| s.document).collect();
    assert_eq!(documents, vec![0, 1, 2]);
    assert_eq!(report.error_count(), 1);
    assert_eq!(report.schemas[2].errors[0].kind(), ErrorKind::Required);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_decode_error_names_file_and_schema() {
    let dir = test_dir("decode_error");
    let path = write(
        &dir,
        "tuple.json",
        r#"{"type": "object", "properties": {"pair": {"type": "array", "items": [{"type": "string"}]}}}"#,
    );

    let err = validate_file(&path, &CheckConfig::default()).unwrap_err();
    let message = err.to_string();
    assert!(matches!(err, LoaderError::Decode { .. }));
    assert!(message.contains("tuple.json"), "{message}");
    assert!(message.contains("properties[pair].items"), "{message}");

    fs::remove_dir_all(&dir).ok();
}
