use std::{
    ffi::OsString,
    io::ErrorKind as IoErrorKind,
    path::{Path, PathBuf},
};

use clap::{
    CommandFactory, FromArgMatches,
    error::{ErrorKind as ClapErrorKind, Result as ClapResult},
};
use docprobe_core::{export::Placement, generate::GeneratorConfig};
use serde::Deserialize;

const CONFIG_FILE_NAME: &str = ".docprobe.toml";

#[derive(Debug)]
pub struct Main {
    pub verbose: bool,
    pub command: Command,
}

impl Main {
    #[inline]
    pub fn parse() -> ClapResult<Main> {
        Self::parse_from(std::env::args_os())
    }

    pub fn parse_from(args: impl IntoIterator<Item = impl Into<OsString> + Clone>) -> ClapResult<Main> {
        let mut cmd = MainArgs::command();
        let mut matches = cmd
            .try_get_matches_from_mut(args)
            .map_err(|err| err.format(&mut cmd))?;
        let args =
            MainArgs::from_arg_matches_mut(&mut matches).map_err(|err| err.format(&mut cmd))?;

        let command = match args.command {
            CommandArgs::Extract(ExtractArgs {
                input,
                config,
                base_url,
            }) => {
                let file = ConfigFile::find(&mut cmd, &input, config.as_deref())?;
                let mut generator = file.generator.unwrap_or_default();
                if let Some(base_url) = base_url {
                    generator.default_base_url = base_url;
                }
                Command::Extract(Extract { input, generator })
            }
            CommandArgs::Generate(GenerateArgs {
                input,
                output,
                config,
                generator,
                export,
            }) => {
                let file = ConfigFile::find(&mut cmd, &input, config.as_deref())?;
                let export_file = file.export.unwrap_or_default();
                Command::Generate(Generate {
                    input,
                    output,
                    generator: generator.merge(file.generator.unwrap_or_default()),
                    format: export.format.or(export_file.format).unwrap_or_default(),
                    placement: export
                        .placement
                        .or(export_file.placement)
                        .unwrap_or_default()
                        .into(),
                })
            }
        };

        Ok(Main {
            verbose: args.verbose,
            command,
        })
    }
}

#[derive(Debug)]
pub enum Command {
    Extract(Extract),
    Generate(Generate),
}

#[derive(Debug)]
pub struct Extract {
    pub input: PathBuf,
    pub generator: GeneratorConfig,
}

#[derive(Debug)]
pub struct Generate {
    pub input: PathBuf,
    pub output: PathBuf,
    pub generator: GeneratorConfig,
    pub format: ExportFormat,
    pub placement: Placement,
}

#[derive(Debug, clap::Parser)]
#[command(version, about, long_about = None)]
struct MainArgs {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: CommandArgs,
}

#[derive(Debug, clap::Subcommand)]
enum CommandArgs {
    /// Print the API described by a document as JSON.
    Extract(ExtractArgs),
    /// Generate test cases from a document.
    Generate(GenerateArgs),
}

#[derive(Debug, clap::Args)]
struct ExtractArgs {
    /// The path to the API documentation (`.md`, `.json`, or `.yaml`).
    input: PathBuf,

    /// The config file. Defaults to `.docprobe.toml` beside the input.
    #[arg(long)]
    config: Option<PathBuf>,

    /// The base URL for documents that don't declare one.
    #[arg(long)]
    base_url: Option<String>,
}

#[derive(Debug, clap::Args)]
struct GenerateArgs {
    /// The path to the API documentation (`.md`, `.json`, or `.yaml`).
    input: PathBuf,

    /// The output directory for the exported files.
    output: PathBuf,

    /// The config file. Defaults to `.docprobe.toml` beside the input.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(flatten)]
    generator: GeneratorArgs,

    #[command(flatten)]
    export: ExportArgs,
}

#[derive(Debug, clap::Args)]
#[command(next_help_heading = "Generator options")]
struct GeneratorArgs {
    /// The base URL for documents that don't declare one.
    #[arg(long)]
    base_url: Option<String>,

    /// The most boundary cases per parameter.
    #[arg(long, allow_negative_numbers = true)]
    max_boundary_samples: Option<i64>,

    /// How many performance cases to generate per endpoint.
    #[arg(long, allow_negative_numbers = true)]
    performance_cases: Option<i64>,

    /// The latency threshold for performance cases, in milliseconds.
    #[arg(long, allow_negative_numbers = true)]
    performance_threshold_ms: Option<i64>,

    /// How many times idempotency cases send their request. Zero skips them.
    #[arg(long, allow_negative_numbers = true)]
    idempotency_repeats: Option<i64>,

    /// Expect any client error for wrongly typed values, instead of
    /// a validation error.
    #[arg(long)]
    permissive: bool,
}

impl GeneratorArgs {
    /// Overrides options from the config file with the ones
    /// that were passed on the command line.
    fn merge(self, file: GeneratorConfig) -> GeneratorConfig {
        GeneratorConfig {
            max_boundary_samples: self
                .max_boundary_samples
                .unwrap_or(file.max_boundary_samples),
            performance_case_count: self
                .performance_cases
                .unwrap_or(file.performance_case_count),
            invalid_type_strict: file.invalid_type_strict && !self.permissive,
            default_base_url: self.base_url.unwrap_or(file.default_base_url),
            performance_threshold_ms: self
                .performance_threshold_ms
                .unwrap_or(file.performance_threshold_ms),
            idempotency_repeat_count: self
                .idempotency_repeats
                .unwrap_or(file.idempotency_repeat_count),
        }
    }
}

#[derive(Debug, clap::Args)]
#[command(next_help_heading = "Export options")]
struct ExportArgs {
    /// The files to write. Defaults to both.
    #[arg(long)]
    format: Option<ExportFormat>,

    /// Where exported requests send query and body parameters.
    /// Defaults to where each parameter is documented.
    #[arg(long)]
    placement: Option<ExportPlacement>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    generator: Option<GeneratorConfig>,
    #[serde(default)]
    export: Option<ExportConfigFile>,
}

impl ConfigFile {
    /// Reads the config file at `path`, or the optional
    /// `.docprobe.toml` beside `input`.
    fn find(cmd: &mut clap::Command, input: &Path, path: Option<&Path>) -> ClapResult<Self> {
        let (path, required) = match path {
            Some(path) => (path.to_owned(), true),
            None => (
                input
                    .parent()
                    .unwrap_or_else(|| Path::new(""))
                    .join(CONFIG_FILE_NAME),
                false,
            ),
        };
        match std::fs::read_to_string(&path) {
            Ok(contents) => toml::from_str(&contents).map_err(|err| {
                cmd.error(
                    ClapErrorKind::ValueValidation,
                    format!("Failed to parse `{}`: {err}", path.display()),
                )
            }),
            Err(err) if err.kind() == IoErrorKind::NotFound && !required => Ok(Self::default()),
            Err(err) => Err(cmd.error(
                ClapErrorKind::Io,
                format!("Failed to read `{}`: {err}", path.display()),
            )),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ExportConfigFile {
    #[serde(default)]
    format: Option<ExportFormat>,
    #[serde(default)]
    placement: Option<ExportPlacement>,
}

/// Which files `generate` writes.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// A `cases.json` listing.
    Json,
    /// A Postman collection.
    Postman,
    #[default]
    Both,
}

impl ExportFormat {
    #[inline]
    pub fn json(self) -> bool {
        matches!(self, Self::Json | Self::Both)
    }

    #[inline]
    pub fn postman(self) -> bool {
        matches!(self, Self::Postman | Self::Both)
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
enum ExportPlacement {
    /// Where each parameter is documented.
    #[default]
    Declared,
    /// In the JSON request body.
    Body,
    /// In the query string.
    Query,
}

impl From<ExportPlacement> for Placement {
    fn from(value: ExportPlacement) -> Self {
        match value {
            ExportPlacement::Declared => Self::Declared,
            ExportPlacement::Body => Self::Body,
            ExportPlacement::Query => Self::Query,
        }
    }
}
