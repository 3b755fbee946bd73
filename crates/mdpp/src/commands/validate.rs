//! `mdpp validate` command implementation.

use std::path::{Path, PathBuf};

use clap::Args;
use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use mdpp_config::{CliSettings, Config};
use mdpp_core::{Processor, ProcessorConfig};
use mdpp_diagnostics::{Diagnostic, DiagnosticCode, Severity};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the validate command.
#[derive(Args)]
pub(crate) struct ValidateArgs {
    /// Markdown++ files to validate.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Treat warnings as errors.
    #[arg(long)]
    strict: bool,

    /// Emit a JSON report instead of human-readable output.
    #[arg(long)]
    json: bool,

    /// Report valid files as well as invalid ones.
    #[arg(short, long)]
    pub(crate) verbose: bool,

    /// Project root for include resolution (overrides config).
    #[arg(long)]
    root: Option<PathBuf>,

    /// Path to configuration file (default: auto-discover mdpp.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// Per-file validation outcome for reporting.
///
/// In strict mode warnings are folded into `errors` and the `warnings` list
/// is empty, matching the report consumers already parse.
#[derive(Serialize)]
struct FileReport {
    file: PathBuf,
    valid: bool,
    errors: Vec<Diagnostic>,
    warnings: Vec<Diagnostic>,
}

impl ValidateArgs {
    /// Execute the validate command.
    ///
    /// Returns the process exit code: 0 when every file is valid, 1 when a
    /// file could not be read (MDPP000), 3 when validation errors were found.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or report writing fails.
    pub(crate) fn execute(self) -> Result<i32, CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            root: self.root.clone(),
            strict: self.strict.then_some(true),
            ..Default::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let strict = config.validate.strict;

        let processor = Processor::with_config(
            ProcessorConfig::new(&config.project_resolved.root)
                .with_max_include_depth(config.includes.max_depth)
                .with_max_includes(config.includes.max_total),
        );

        info!(files = self.files.len(), strict, "validating documents");
        let reports: Vec<FileReport> = self
            .files
            .par_iter()
            .map(|file| report_for(&processor, file, strict))
            .collect();

        if self.json {
            let stdout = std::io::stdout().lock();
            serde_json::to_writer_pretty(stdout, &reports)?;
        } else {
            print_reports(&output, &reports, self.verbose);
        }

        Ok(exit_code(&reports))
    }
}

/// Validate one file and split its ranked diagnostics by severity.
fn report_for(processor: &Processor, file: &Path, strict: bool) -> FileReport {
    let result = processor.process_file(file);
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    for diagnostic in result.diagnostics.ranked() {
        match diagnostic.severity {
            Severity::Error => errors.push(diagnostic.clone()),
            Severity::Warning => warnings.push(diagnostic.clone()),
        }
    }
    if strict {
        errors.append(&mut warnings);
    }
    FileReport {
        file: file.to_path_buf(),
        valid: result.is_valid(strict),
        errors,
        warnings,
    }
}

/// Exit code over all reports: 1 when any file was unreadable (MDPP000),
/// 3 when validation errors were found, 0 otherwise.
fn exit_code(reports: &[FileReport]) -> i32 {
    let file_error = reports.iter().any(|r| {
        r.errors
            .iter()
            .any(|d| d.code == DiagnosticCode::FileError)
    });
    if file_error {
        1
    } else if reports.iter().any(|r| !r.valid) {
        3
    } else {
        0
    }
}

fn print_reports(output: &Output, reports: &[FileReport], verbose: bool) {
    for report in reports {
        if verbose && report.valid && report.errors.is_empty() && report.warnings.is_empty() {
            output.success(&format!("{}: OK", report.file.display()));
        }
        for diagnostic in report.errors.iter().chain(&report.warnings) {
            let line = diagnostic.to_string();
            match diagnostic.severity {
                Severity::Error => output.error(&line),
                Severity::Warning => output.warning(&line),
            }
        }
    }

    let errors: usize = reports.iter().map(|r| r.errors.len()).sum();
    let warnings: usize = reports.iter().map(|r| r.warnings.len()).sum();
    let invalid = reports.iter().filter(|r| !r.valid).count();
    let summary = format!(
        "{} file(s) checked, {invalid} invalid, {errors} error(s), {warnings} warning(s)",
        reports.len()
    );
    if invalid == 0 {
        output.success(&summary);
    } else {
        output.info(&summary);
    }
}
