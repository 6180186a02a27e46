//! CLI application entry point and configuration.
//!
//! This module provides the main CLI application logic, including argument parsing,
//! configuration loading, and command dispatch.

use crate::commands::{AnalyzeArgs, Cli, Commands, ConfigArgs, OutputFormat, SampleArgs};
use crate::error::{CliError, Result};
use crate::report;
use crate::sample::{generate_sample_chat, SampleOptions};
use clap::{Parser, ValueEnum};
use groupscope_analysis::parsers::TranscriptParser;
use groupscope_analysis::pipeline::analyze_with_parser;
use groupscope_core::config::LogLevel;
use groupscope_core::GroupscopeConfig;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Main CLI application.
#[derive(Debug)]
pub struct App {
    /// Effective configuration (file values, before CLI overrides).
    pub config: GroupscopeConfig,
    /// File the configuration was loaded from, if any.
    pub config_path: Option<PathBuf>,
    /// Parsed CLI arguments.
    pub cli: Cli,
}

impl App {
    /// Create a new application instance from command line arguments.
    pub fn new() -> Result<Self> {
        Self::from_cli(Cli::parse())
    }

    /// Create an application instance from already parsed arguments.
    pub fn from_cli(cli: Cli) -> Result<Self> {
        let (config, config_path) = Self::load_config(&cli)?;
        Ok(Self {
            config,
            config_path,
            cli,
        })
    }

    /// Load configuration from `--config`/`GROUPSCOPE_CONFIG`, falling back
    /// to the default location and then to built-in defaults.
    fn load_config(cli: &Cli) -> Result<(GroupscopeConfig, Option<PathBuf>)> {
        if let Some(config_path) = &cli.config {
            if !config_path.exists() {
                return Err(CliError::Config(format!(
                    "Configuration file not found: {}",
                    config_path.display()
                )));
            }
            let config = GroupscopeConfig::load(config_path)?;
            return Ok((config, Some(config_path.clone())));
        }

        match GroupscopeConfig::default_path() {
            Ok(path) if path.exists() => {
                let config = GroupscopeConfig::load(&path)?;
                Ok((config, Some(path)))
            }
            _ => Ok((GroupscopeConfig::default(), None)),
        }
    }

    /// Run the application.
    pub fn run(self) -> Result<()> {
        self.setup_logging();
        if let Some(path) = &self.config_path {
            debug!(path = %path.display(), "Loaded configuration");
        }

        match &self.cli.command {
            Commands::Analyze(args) => self.handle_analyze(args),
            Commands::Sample(args) => self.handle_sample(args),
            Commands::Config(args) => self.handle_config(args),
        }
    }

    /// Set up logging from `-v` or the configured level; `RUST_LOG` wins.
    fn setup_logging(&self) {
        let level = match self.cli.verbose {
            0 => self.config.logging.level,
            1 => LogLevel::Info,
            2 => LogLevel::Debug,
            _ => LogLevel::Trace,
        };

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(level.as_directive()));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init()
            .ok(); // Ignore errors if a subscriber is already installed
    }

    fn handle_analyze(&self, args: &AnalyzeArgs) -> Result<()> {
        let mut analysis = self.config.analysis.clone();
        if let Some(clusters) = args.clusters {
            analysis.n_clusters = clusters;
        }
        if let Some(random_state) = args.random_state {
            analysis.random_state = random_state;
        }

        let format = match args.format {
            Some(format) => format,
            None => OutputFormat::from_str(&self.config.report.format, true).map_err(|_| {
                CliError::Config(format!(
                    "unknown report format '{}', expected text, json or csv",
                    self.config.report.format
                ))
            })?,
        };

        let bytes = fs::read(&args.input).map_err(|e| {
            CliError::FileSystem(format!("Failed to read {}: {}", args.input.display(), e))
        })?;
        let text = String::from_utf8_lossy(&bytes);

        let parser = match args.date_order {
            Some(order) => TranscriptParser::new().with_date_order(order.into()),
            None => TranscriptParser::new(),
        };
        let analysis_report = analyze_with_parser(&parser, &text, &analysis)?;

        let rendered = report::render(
            &analysis_report,
            format,
            self.config.report.decimals,
            args.summary,
        )?;
        write_output(args.output.as_deref(), &rendered)?;

        if let Some(path) = &args.output {
            info!(path = %path.display(), users = analysis_report.rows.len(), "Report written");
        }
        Ok(())
    }

    fn handle_sample(&self, args: &SampleArgs) -> Result<()> {
        if args.messages == 0 {
            return Err(CliError::Argument(
                "--messages must be at least 1".to_string(),
            ));
        }
        let options = SampleOptions {
            seed: args.seed,
            users: args.users,
            messages: args.messages,
            ..SampleOptions::default()
        };
        let text = generate_sample_chat(&options);
        write_output(Some(&args.output), &text)?;
        info!(
            path = %args.output.display(),
            messages = args.messages,
            "Sample transcript written"
        );
        Ok(())
    }

    fn handle_config(&self, args: &ConfigArgs) -> Result<()> {
        match &args.output {
            Some(path) => {
                self.config.save(path)?;
                info!(path = %path.display(), "Configuration written");
                Ok(())
            }
            None => write_output(None, &self.config.to_toml()?),
        }
    }
}

fn write_output(path: Option<&Path>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            fs::write(path, content).map_err(|e| {
                CliError::FileSystem(format!("Failed to write {}: {}", path.display(), e))
            })
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            stdout.flush()?;
            Ok(())
        }
    }
}

/// Parse command line arguments and run the application.
pub fn run() -> Result<()> {
    let app = App::new()?;
    app.run()
}
