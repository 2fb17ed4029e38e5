//! Language configuration for compilation and execution
//!
//! Maps a source file's extension to a language and builds the compile and
//! run commands for it. Commands are argument vectors, never shell strings;
//! stdin/stdout redirection happens at spawn time in the runner.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::Context;
use serde::Deserialize;
use tracing::{debug, info};

use crate::common::LanguageError;
use crate::runner::CommandSpec;

/// Configuration for a supported programming language
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageConfig {
    /// File extensions (without dot) handled by this language
    pub extensions: Vec<String>,
    /// Compile command template (None if interpreted)
    pub compile_command: Option<Vec<String>>,
    /// Run command template
    pub run_command: Vec<String>,
    /// Toolchain install command, delegated as-is
    pub install_command: Option<Vec<String>>,
    /// Extension of the `{binary}` artifact (`out` unless the toolchain needs another)
    pub binary_extension: String,
}

impl LanguageConfig {
    pub fn is_compiled(&self) -> bool {
        self.compile_command.is_some()
    }
}

/// Raw TOML configuration for a language
#[derive(Debug, Deserialize)]
struct RawLanguageConfig {
    #[serde(default)]
    extensions: Vec<String>,
    compile_command: Option<String>,
    run_command: String,
    install_command: Option<String>,
    binary_extension: Option<String>,
}

/// Extension and toolchain tables
#[derive(Debug, Clone, Default)]
pub struct LanguageTable {
    languages: HashMap<String, LanguageConfig>,
    extensions: HashMap<String, String>,
}

impl LanguageTable {
    /// Parse a language table from TOML
    pub fn from_toml(content: &str) -> Result<Self, LanguageError> {
        let raw_configs: HashMap<String, RawLanguageConfig> =
            toml::from_str(content).map_err(|e| LanguageError::Config(e.to_string()))?;

        let mut table = Self::default();
        for (name, raw) in raw_configs {
            let run_command = into_command(&raw.run_command);
            if run_command.is_empty() {
                return Err(LanguageError::Config(format!(
                    "empty run_command for {}",
                    name
                )));
            }

            let config = LanguageConfig {
                extensions: raw
                    .extensions
                    .iter()
                    .map(|ext| ext.trim_start_matches('.').to_lowercase())
                    .collect(),
                compile_command: raw.compile_command.as_deref().map(into_command),
                run_command,
                install_command: raw.install_command.as_deref().map(into_command),
                binary_extension: raw
                    .binary_extension
                    .map(|ext| ext.trim_start_matches('.').to_string())
                    .unwrap_or_else(|| DEFAULT_BINARY_EXTENSION.to_string()),
            };
            table.insert(&name, config);
        }

        Ok(table)
    }

    /// Built-in table shipped with the binary
    pub fn builtin() -> Result<Self, LanguageError> {
        let content = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/files/languages.toml"));
        Self::from_toml(content)
    }

    /// Replace or add every language defined in `other`
    pub fn merge(&mut self, other: LanguageTable) {
        for (name, config) in other.languages {
            self.insert(&name, config);
        }
    }

    fn insert(&mut self, name: &str, config: LanguageConfig) {
        let name = name.to_lowercase();
        if let Some(previous) = self.languages.get(&name) {
            for ext in &previous.extensions {
                if self.extensions.get(ext) == Some(&name) {
                    self.extensions.remove(ext);
                }
            }
        }
        for ext in &config.extensions {
            self.extensions.insert(ext.clone(), name.clone());
        }
        self.languages.insert(name, config);
    }

    /// Get language configuration by language name
    pub fn get(&self, language: &str) -> Option<&LanguageConfig> {
        self.languages.get(&language.to_lowercase())
    }

    /// Language name for a file extension
    pub fn language_for_extension(&self, ext: &str) -> Option<&str> {
        self.extensions
            .get(&ext.trim_start_matches('.').to_lowercase())
            .map(String::as_str)
    }

    /// Supported language names with their extensions, sorted by name
    pub fn entries(&self) -> Vec<(&str, &LanguageConfig)> {
        let mut entries: Vec<_> = self
            .languages
            .iter()
            .map(|(name, config)| (name.as_str(), config))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

const DEFAULT_BINARY_EXTENSION: &str = "out";

/// Global language table
static LANGUAGES: OnceLock<LanguageTable> = OnceLock::new();

/// Initialize the language table, merging an optional user override file
pub fn init_languages(override_path: Option<&Path>) -> anyhow::Result<&'static LanguageTable> {
    let mut table = LanguageTable::builtin()?;

    if let Some(path) = override_path {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read language overrides {:?}", path))?;
        let overrides = LanguageTable::from_toml(&content)
            .with_context(|| format!("Invalid language overrides in {:?}", path))?;
        info!(
            "Loaded {} language override(s) from {:?}",
            overrides.languages.len(),
            path
        );
        table.merge(overrides);
    }

    LANGUAGES
        .set(table)
        .map_err(|_| anyhow::anyhow!("Languages already initialized"))?;

    LANGUAGES
        .get()
        .ok_or_else(|| anyhow::anyhow!("Languages not initialized"))
}

/// Deterministic artifact paths for one run of a source file
#[derive(Debug, Clone, PartialEq)]
pub struct RunPaths {
    pub source: PathBuf,
    /// Compiled binary (or class directory) beside the source
    pub binary: PathBuf,
    /// Sample input fed to stdin
    pub input: PathBuf,
    /// Captured stdout
    pub result: PathBuf,
}

impl RunPaths {
    /// `<stem>.out`, `<stem>_input.txt` and `<stem>_result.txt` beside the source.
    /// A `token` scopes the names to one run.
    pub fn for_source(source: &Path, token: Option<&str>) -> Self {
        let dir = source.parent().unwrap_or(Path::new("."));
        let stem = file_stem(source);
        let base = match token {
            Some(token) => format!("{}_{}", stem, token),
            None => stem,
        };

        Self {
            source: source.to_path_buf(),
            binary: dir.join(format!("{}.out", base)),
            input: dir.join(format!("{}_input.txt", base)),
            result: dir.join(format!("{}_result.txt", base)),
        }
    }

    /// Toolchains such as `kotlinc -d` pick the output format from the file name
    pub fn with_binary_extension(mut self, ext: &str) -> Self {
        self.binary.set_extension(ext);
        self
    }
}

/// Commands needed to build and run one source file
#[derive(Debug, Clone)]
pub struct ResolvedCommand {
    pub language: String,
    pub compile: Option<CommandSpec>,
    pub run: CommandSpec,
    pub paths: RunPaths,
}

/// Resolve the language and commands for `source`
pub fn resolve(
    source: &Path,
    table: &LanguageTable,
    isolate_runs: bool,
) -> Result<ResolvedCommand, LanguageError> {
    let ext = source
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    let language = table
        .language_for_extension(ext)
        .ok_or_else(|| LanguageError::Unsupported(display_ext(ext)))?;
    let config = table
        .get(language)
        .ok_or_else(|| LanguageError::Unsupported(display_ext(ext)))?;

    let source = absolute(source);
    let token = isolate_runs.then(run_token);
    let paths = RunPaths::for_source(&source, token.as_deref())
        .with_binary_extension(&config.binary_extension);

    let compile = config
        .compile_command
        .as_ref()
        .map(|template| CommandSpec::from_vec(&substitute(template, &paths)));
    let run = CommandSpec::from_vec(&substitute(&config.run_command, &paths));
    let work_dir = source.parent().unwrap_or(Path::new(".")).to_path_buf();

    debug!(
        "Resolved {:?} as {} (compile: {:?}, run: {:?})",
        source, language, compile, run
    );

    Ok(ResolvedCommand {
        language: language.to_string(),
        compile: compile.map(|c| c.with_work_dir(&work_dir)),
        run: run.with_work_dir(&work_dir),
        paths,
    })
}

fn substitute(template: &[String], paths: &RunPaths) -> Vec<String> {
    let dir = paths.source.parent().unwrap_or(Path::new("."));
    let stem = file_stem(&paths.source);
    template
        .iter()
        .map(|arg| {
            arg.replace("{source}", &paths.source.to_string_lossy())
                .replace("{binary}", &paths.binary.to_string_lossy())
                .replace("{dir}", &dir.to_string_lossy())
                .replace("{stem}", &stem)
        })
        .collect()
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "solution".to_string())
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

fn display_ext(ext: &str) -> String {
    if ext.is_empty() {
        "(no extension)".to_string()
    } else {
        format!(".{}", ext)
    }
}

fn run_token() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}

fn into_command(command: &str) -> Vec<String> {
    command.split_whitespace().map(|s| s.to_string()).collect()
}
