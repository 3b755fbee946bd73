//! `mdpp expand` command implementation.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;

use mdpp_config::{CliSettings, Config};
use mdpp_core::{Processor, ProcessorConfig, write_expanded};
use mdpp_diagnostics::{DiagnosticCode, Severity};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the expand command.
#[derive(Args)]
pub(crate) struct ExpandArgs {
    /// Markdown++ file to expand.
    file: PathBuf,

    /// Write the expanded document here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Treat warnings as errors.
    #[arg(long)]
    strict: bool,

    /// Project root for include resolution (overrides config).
    #[arg(long)]
    root: Option<PathBuf>,

    /// Path to configuration file (default: auto-discover mdpp.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl ExpandArgs {
    /// Execute the expand command.
    ///
    /// Diagnostics go to stderr; the expanded document goes to stdout or the
    /// `--output` file. A fatal finding suppresses output; exit codes match
    /// `validate`: 1 for an unreadable file, 3 for validation errors.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or output writing fails.
    pub(crate) fn execute(self) -> Result<i32, CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            root: self.root.clone(),
            strict: self.strict.then_some(true),
            ..Default::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        let processor = Processor::with_config(
            ProcessorConfig::new(&config.project_resolved.root)
                .with_max_include_depth(config.includes.max_depth)
                .with_max_includes(config.includes.max_total),
        );
        let result = processor.process_file(&self.file);

        for diagnostic in result.diagnostics.ranked() {
            let line = diagnostic.to_string();
            match diagnostic.severity {
                Severity::Error => output.error(&line),
                Severity::Warning => output.warning(&line),
            }
        }
        let file_error = result
            .diagnostics
            .iter()
            .any(|d| d.code == DiagnosticCode::FileError);
        if result.fatal {
            output.error(&format!(
                "{}: fatal errors, no output written",
                self.file.display()
            ));
            return Ok(if file_error { 1 } else { 3 });
        }

        let expanded = write_expanded(&result.tokens);
        match &self.output {
            Some(path) => {
                std::fs::write(path, expanded).map_err(|source| CliError::Write {
                    path: path.clone(),
                    source,
                })?;
            }
            None => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(expanded.as_bytes())?;
            }
        }

        Ok(if result.is_valid(config.validate.strict) {
            0
        } else {
            3
        })
    }
}
