use std::path::Path;

use docprobe_core::{
    export::{CasesFile, PostmanCollection, write_to_disk},
    parse::{ParseWarning, SourceFormat},
    pipeline::{self, Generated},
};
use itertools::Itertools;
use log::{info, warn};
use miette::{Context, IntoDiagnostic, NamedSource, Report, Result};

mod config;

use self::config::{Command, Extract, Generate, Main};

fn main() -> Result<()> {
    let Ok(main) = Main::parse().map_err(|err| err.exit());

    let level = if main.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();

    match main.command {
        Command::Extract(Extract { input, generator }) => {
            let source = read(&input)?;
            let format = SourceFormat::detect(&input, &source);
            let built = pipeline::extract(&source, format, &generator.default_base_url)
                .map_err(|err| report(&input, &source, err))?;
            show_warnings(&input, &source, &built.warnings);

            let json = serde_json::to_string_pretty(&built.spec)
                .into_diagnostic()
                .context("Failed to serialize API")?;
            println!("{json}");
        }
        Command::Generate(Generate {
            input,
            output,
            generator,
            format,
            placement,
        }) => {
            let source = read(&input)?;
            let Generated {
                spec,
                cases,
                warnings,
            } = pipeline::run(&source, SourceFormat::detect(&input, &source), &generator)
                .map_err(|err| report(&input, &source, err))?;
            show_warnings(&input, &source, &warnings);

            info!(
                "API: {} (version {}), {} endpoints",
                spec.title,
                spec.version,
                spec.endpoints.len()
            );
            let counts = cases
                .iter()
                .counts_by(|case| case.category)
                .into_iter()
                .sorted()
                .map(|(category, count)| format!("{count} {category}"))
                .join(", ");
            info!("Generated {} test cases: {counts}", cases.len());

            info!("Writing exports to `{}`...", output.display());
            if format.json() {
                info!("Writing `{}`...", CasesFile::PATH);
                write_to_disk(&output, CasesFile::new(&spec, &cases))?;
            }
            if format.postman() {
                info!("Writing `{}`...", PostmanCollection::PATH);
                write_to_disk(&output, PostmanCollection::new(&spec, &cases, placement))?;
            }

            info!("Export complete");
        }
    }

    Ok(())
}

fn read(input: &Path) -> Result<String> {
    std::fs::read_to_string(input)
        .into_diagnostic()
        .with_context(|| format!("Failed to read `{}`", input.display()))
}

fn named(input: &Path, source: &str) -> NamedSource<String> {
    NamedSource::new(input.display().to_string(), source.to_owned())
}

/// Prints each warning as a diagnostic, pointing at the
/// offending source line.
fn show_warnings(input: &Path, source: &str, warnings: &[ParseWarning]) {
    if warnings.is_empty() {
        return;
    }
    warn!("{} problems with `{}`", warnings.len(), input.display());
    for warning in warnings {
        let report = Report::new(warning.clone()).with_source_code(named(input, source));
        eprintln!("{report:?}");
    }
}

fn report(
    input: &Path,
    source: &str,
    err: impl miette::Diagnostic + Send + Sync + 'static,
) -> Report {
    Report::new(err).with_source_code(named(input, source))
}
