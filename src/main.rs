mod common;
mod compiler;
mod config;
mod languages;
mod locator;
mod pipeline;
mod report;
mod runner;
mod samples;
mod verifier;

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::languages::{init_languages, LanguageTable};
use crate::pipeline::Pipeline;
use crate::report::{ConsoleSink, HtmlSink, JsonSink, MultiSink, ReportSink, VerificationReport};
use crate::runner::{CommandSpec, IoSpec, LocalRunner, RunLimits, Runner};
use crate::samples::{HeadlessChromeScraper, SampleCache, SampleFetcher};

#[derive(Parser)]
#[command(author, version, about = "Verify competitive programming solutions against sample tests", long_about = None)]
struct Cli {
    /// Language table merged over the built-in one
    #[arg(long, global = true, env = "CP_BUDDY_LANGUAGES")]
    languages: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a solution against the sample tests of the problem linked in it
    Run {
        /// Solution source file containing the problem URL
        file: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Run a solution on custom input
    Custom {
        file: PathBuf,
        /// Input text
        #[arg(long, conflicts_with = "input_file")]
        input: Option<String>,
        /// Read input from a file (stdin is used when neither is given)
        #[arg(long)]
        input_file: Option<PathBuf>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Install the toolchain for a language
    Install {
        language: String,
    },
    /// List configured languages
    Languages,
}

#[derive(clap::Args)]
struct OutputArgs {
    /// Wall-clock limit for the solution in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,
    /// Also write the report as HTML to this path
    #[arg(long)]
    html: Option<PathBuf>,
    /// Print the report as JSON instead of text
    #[arg(long)]
    json: bool,
}

impl OutputArgs {
    fn sink(&self) -> MultiSink {
        let mut sink = MultiSink::new();
        sink = if self.json {
            sink.with(JsonSink::new())
        } else {
            sink.with(ConsoleSink::new())
        };
        if let Some(path) = &self.html {
            sink = sink.with(HtmlSink::new(path));
        }
        sink
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("cp_buddy=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match dispatch(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Returns whether the command succeeded
async fn dispatch(cli: Cli) -> Result<bool> {
    let mut config = AppConfig::from_env();
    if cli.languages.is_some() {
        config.languages_path = cli.languages;
    }
    let table = init_languages(config.languages_path.as_deref())?;

    match cli.command {
        Commands::Run { file, output } => {
            apply_overrides(&mut config, &output);
            let pipeline = build_pipeline(config, table);
            let report = pipeline.run_samples(&file).await?;
            present(&output, &report)
        }
        Commands::Custom {
            file,
            input,
            input_file,
            output,
        } => {
            apply_overrides(&mut config, &output);
            let input = read_custom_input(input, input_file)?;
            let pipeline = build_pipeline(config, table);
            let report = pipeline.run_custom(&file, &input).await?;
            present(&output, &report)
        }
        Commands::Install { language } => install(table, &language).await,
        Commands::Languages => {
            for (name, language) in table.entries() {
                let kind = if language.is_compiled() {
                    "compiled"
                } else {
                    "interpreted"
                };
                println!("{:<12} {:<12} .{}", name, kind, language.extensions.join(" ."));
            }
            Ok(true)
        }
    }
}

fn apply_overrides(config: &mut AppConfig, output: &OutputArgs) {
    if let Some(ms) = output.timeout_ms {
        config.run_timeout = Duration::from_millis(ms);
    }
}

fn build_pipeline(config: AppConfig, table: &LanguageTable) -> Pipeline<'_> {
    let cache = Arc::new(SampleCache::new(config.cache_ttl));
    if !config.cache_ttl.is_zero() {
        cache.clone().spawn_sweeper();
    }

    let scraper = Arc::new(HeadlessChromeScraper::new(
        config.browser.clone(),
        config.user_agent.clone(),
        config.navigation_timeout,
    ));
    let fetcher = SampleFetcher::new(cache, scraper, config.navigation_timeout);

    info!(
        "Using site {} (run timeout {:?}, compile timeout {:?})",
        config.site, config.run_timeout, config.compile_timeout
    );
    Pipeline::new(config, fetcher, table, Arc::new(LocalRunner::new()))
}

fn read_custom_input(input: Option<String>, input_file: Option<PathBuf>) -> Result<String> {
    if let Some(text) = input {
        return Ok(text);
    }
    if let Some(path) = input_file {
        return std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read input file {:?}", path));
    }

    let mut text = String::new();
    std::io::stdin()
        .read_to_string(&mut text)
        .context("Failed to read input from stdin")?;
    Ok(text)
}

fn present(output: &OutputArgs, report: &VerificationReport) -> Result<bool> {
    output.sink().present(report)?;
    Ok(report.outcome.is_success())
}

async fn install(table: &LanguageTable, language: &str) -> Result<bool> {
    let Some(config) = table.get(language) else {
        bail!("Unknown language: {}", language);
    };
    let Some(command) = &config.install_command else {
        warn!("No install command configured for {}", language);
        return Ok(false);
    };

    info!("Installing {}: {}", language, command.join(" "));
    // Package managers may prompt, so no practical time limit applies
    let limits = RunLimits::new(Duration::from_secs(24 * 60 * 60));
    let result = LocalRunner::new()
        .run(&CommandSpec::from_vec(command), &limits, &IoSpec::inherited())
        .await?;

    if let Some(failure) = &result.exit_error {
        warn!("Install command for {} failed: {}", language, failure);
    }
    Ok(result.is_success())
}
