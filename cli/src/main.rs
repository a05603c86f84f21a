use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use rayon::prelude::*;
use structural_schema_loader::{
    CheckConfig, FileReport, OutputFormat, collect_schema_paths, parse_documents,
    validate_documents, validate_file,
};
use tracing_subscriber::EnvFilter;

const STDIN_NAME: &str = "<stdin>";

/// CLI-specific output format enum with clap argument parsing support.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOutputFormat {
    Text,
    Json,
    Yaml,
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(fmt: CliOutputFormat) -> Self {
        match fmt {
            CliOutputFormat::Text => Self::Text,
            CliOutputFormat::Json => Self::Json,
            CliOutputFormat::Yaml => Self::Yaml,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "structural-check")]
#[command(about = "Check that OpenAPI v3 schemas and CRDs are structural")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate schema files and/or directories of schema files.
    Validate(ValidateArgs),
    /// Validate a single JSON or YAML stream read from stdin.
    ValidateStdin(ValidateStdinArgs),
}

#[derive(Debug, Args)]
struct OverrideArgs {
    /// Path to a YAML check configuration.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Output format (overrides the configuration).
    #[arg(long)]
    format: Option<CliOutputFormat>,
    /// Dotted path prefix for bare schemas, e.g. spec.validation.openAPIV3Schema.
    #[arg(long)]
    root_path: Option<String>,
}

#[derive(Debug, Args)]
struct ValidateArgs {
    /// Schema files and/or directories containing schema files.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    #[command(flatten)]
    overrides: OverrideArgs,
    /// Stop after the first file with violations.
    #[arg(long)]
    fail_fast: bool,
    /// Number of parallel validation jobs (default: number of CPUs).
    #[arg(long)]
    jobs: Option<usize>,
}

#[derive(Debug, Args)]
struct ValidateStdinArgs {
    /// Parse stdin as YAML instead of JSON.
    #[arg(long)]
    yaml: bool,
    #[command(flatten)]
    overrides: OverrideArgs,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Validate(args) => run_validate(args),
        Command::ValidateStdin(args) => run_validate_stdin(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(overrides: &OverrideArgs) -> Result<CheckConfig, String> {
    let mut config = match &overrides.config {
        Some(path) => CheckConfig::load(path)
            .map_err(|e| format!("Failed to load config '{}': {e}", path.display()))?,
        None => CheckConfig::default(),
    };
    apply_overrides(&mut config, overrides);
    Ok(config)
}

fn apply_overrides(config: &mut CheckConfig, overrides: &OverrideArgs) {
    if let Some(format) = overrides.format {
        config.output.format = format.into();
    }
    if let Some(root_path) = &overrides.root_path {
        config.root_path = Some(root_path.clone());
    }
}

fn run_validate(args: ValidateArgs) -> Result<(), String> {
    let mut config = load_config(&args.overrides)?;
    config.fail_fast |= args.fail_fast;

    let paths = collect_schema_paths(&args.inputs, &config).map_err(|e| e.to_string())?;
    tracing::info!(files = paths.len(), "validating schema files");

    let results = if config.fail_fast {
        validate_until_first_failure(&paths, &config)
    } else {
        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(jobs) = args.jobs {
            builder = builder.num_threads(jobs);
        }
        let pool = builder
            .build()
            .map_err(|e| format!("Failed to create thread pool: {e}"))?;
        pool.install(|| {
            paths
                .par_iter()
                .map(|path| validate_file(path, &config).map_err(|e| e.to_string()))
                .collect::<Vec<_>>()
        })
    };

    let mut reports = Vec::with_capacity(results.len());
    let mut failures = 0usize;
    for result in results {
        match result {
            Ok(report) => reports.push(report),
            Err(err) => {
                eprintln!("error: {err}");
                failures += 1;
            }
        }
    }

    finish(&reports, failures, config.output.format)
}

fn validate_until_first_failure(paths: &[PathBuf], config: &CheckConfig) -> Vec<Result<FileReport, String>> {
    let mut results = Vec::new();
    for path in paths {
        let result = validate_file(path, config).map_err(|e| e.to_string());
        let failed = result.as_ref().map_or(true, |report| !report.is_structural());
        results.push(result);
        if failed {
            tracing::info!(path = %path.display(), "stopping at first failing file");
            break;
        }
    }
    results
}

fn run_validate_stdin(args: ValidateStdinArgs) -> Result<(), String> {
    let config = load_config(&args.overrides)?;

    let mut raw = String::new();
    std::io::stdin()
        .read_to_string(&mut raw)
        .map_err(|err| format!("Failed to read stdin: {err}"))?;

    let documents = parse_documents(&raw, args.yaml).map_err(|e| e.to_string())?;
    let report =
        validate_documents(Path::new(STDIN_NAME), &documents, &config).map_err(|e| e.to_string())?;

    finish(&[report], 0, config.output.format)
}

/// Prints the reports and turns violations or load failures into an error.
fn finish(reports: &[FileReport], failures: usize, format: OutputFormat) -> Result<(), String> {
    let violations: usize = reports.iter().map(FileReport::error_count).sum();
    let failing_files = reports.iter().filter(|report| !report.is_structural()).count();

    match format {
        OutputFormat::Text => {
            print!("{}", format_text(reports));
            println!(
                "Checked {} schema(s) in {} file(s): {violations} violation(s).",
                reports.iter().map(|report| report.schemas.len()).sum::<usize>(),
                reports.len()
            );
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(reports)
                .map_err(|e| format!("Failed to serialize report: {e}"))?;
            println!("{json}");
        }
        OutputFormat::Yaml => {
            let yaml = serde_yaml::to_string(reports)
                .map_err(|e| format!("Failed to serialize report: {e}"))?;
            print!("{yaml}");
        }
    }

    if failures > 0 {
        return Err(format!("{failures} file(s) could not be checked"));
    }
    if violations > 0 {
        return Err(format!(
            "{violations} violation(s) in {failing_files} file(s); schemas are not structural"
        ));
    }
    Ok(())
}

fn format_text(reports: &[FileReport]) -> String {
    let mut out = String::new();
    for report in reports {
        for schema in &report.schemas {
            for error in &schema.errors {
                out.push_str(&format!("{}: {error}\n", report.path.display()));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use structural_schema_core::{FieldError, FieldPath};
    use structural_schema_loader::SchemaReport;

    use super::*;

    fn overrides(format: Option<CliOutputFormat>, root_path: Option<&str>) -> OverrideArgs {
        OverrideArgs {
            config: None,
            format,
            root_path: root_path.map(String::from),
        }
    }

    #[test]
    fn test_apply_overrides_replaces_config_values() {
        let mut config = CheckConfig::default();
        apply_overrides(&mut config, &overrides(Some(CliOutputFormat::Json), Some("spec.schema")));
        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(config.root_path.as_deref(), Some("spec.schema"));
    }

    #[test]
    fn test_apply_overrides_keeps_config_when_unset() {
        let mut config = CheckConfig {
            root_path: Some("spec".to_string()),
            ..CheckConfig::default()
        };
        config.output.format = OutputFormat::Yaml;
        apply_overrides(&mut config, &overrides(None, None));
        assert_eq!(config.output.format, OutputFormat::Yaml);
        assert_eq!(config.root_path.as_deref(), Some("spec"));
    }

    #[test]
    fn test_format_text_prefixes_file() {
        let report = FileReport {
            path: PathBuf::from("crd.yaml"),
            schemas: vec![SchemaReport {
                document: 0,
                field_path: String::new(),
                errors: vec![FieldError::required(&FieldPath::new("type"), "must not be empty at the root")],
            }],
        };
        assert_eq!(
            format_text(&[report]),
            "crd.yaml: type: Required value: must not be empty at the root\n"
        );
    }

    #[test]
    fn test_finish_fails_on_violations() {
        let report = FileReport {
            path: PathBuf::from("crd.yaml"),
            schemas: vec![SchemaReport {
                document: 0,
                field_path: String::new(),
                errors: vec![FieldError::forbidden(&FieldPath::new("additionalProperties"), "x")],
            }],
        };
        assert!(finish(&[report], 0, OutputFormat::Json).is_err());
        assert!(finish(&[], 0, OutputFormat::Json).is_ok());
        assert!(finish(&[], 1, OutputFormat::Json).is_err());
    }
}
