use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::locator::extractor::{DEFAULT_MAX_MARKUP_CHARS, ExtractionSettings};
use crate::oracle::ollama::{DEFAULT_ENDPOINT, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};
use crate::oracle::response::DEFAULT_JSON_ATTEMPTS;
use crate::runner::executor::{DEFAULT_PROGRAM, DEFAULT_RETRIES, ExecutionSettings};

pub const DEFAULT_CONFIG_FILE: &str = "page-scribe.yaml";
pub const DEFAULT_OUTPUT_DIR: &str = "generated";
pub const DEFAULT_RUN_LOG_DIR: &str = "run_log";

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "page-scribe",
    version,
    about = "Generate page objects, Gherkin scenarios and Playwright tests from live pages"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Ollama API endpoint
    #[arg(long, global = true)]
    pub ollama_endpoint: Option<String>,

    /// Ollama model name
    #[arg(long, global = true)]
    pub ollama_model: Option<String>,

    /// Root directory for generated artifacts
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Path to config file (default: page-scribe.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full pipeline for one or more pages
    Generate {
        /// Page URL(s), comma separated or repeated
        #[arg(long, env = "TEST_URL", value_delimiter = ',')]
        url: Vec<String>,

        /// Existing Gherkin feature file; skips scenario generation
        #[arg(long)]
        feature: Option<PathBuf>,

        /// Run the generated tests afterwards
        #[arg(long)]
        execute: bool,

        /// Clear generated artifacts before starting
        #[arg(long)]
        clean: bool,

        /// Build the page object from the extracted locators instead of a second request
        #[arg(long)]
        reuse_locators: bool,

        /// Markup characters sent with each locator request
        #[arg(long)]
        max_markup_chars: Option<usize>,
    },

    /// Run an already generated Playwright spec
    Execute {
        /// Path to the .spec.ts file
        #[arg(long)]
        spec: PathBuf,

        /// Where to write the HTML report (default: <output-dir>/reports/<spec name>)
        #[arg(long)]
        report_dir: Option<PathBuf>,

        /// URL the spec targets, used in failure hints
        #[arg(long, env = "TEST_URL", default_value = "")]
        url: String,
    },

    /// Delete generated artifacts
    Clean {
        /// File to keep, e.g. a hand-written feature file
        #[arg(long)]
        keep: Option<PathBuf>,
    },
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `page-scribe.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub ollama: OllamaConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub execute: ExecuteConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OllamaConfig {
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: Option<u64>,
    pub json_attempts: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    #[serde(default = "default_max_markup_chars")]
    pub max_markup_chars: usize,

    #[serde(default)]
    pub reuse_locators_for_accessors: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_markup_chars: DEFAULT_MAX_MARKUP_CHARS,
            reuse_locators_for_accessors: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    pub root: Option<PathBuf>,
    pub run_log_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BrowserConfig {
    pub server_script: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteConfig {
    #[serde(default = "default_retries")]
    pub retries: u32,

    #[serde(default = "default_program")]
    pub program: String,
}

impl Default for ExecuteConfig {
    fn default() -> Self {
        Self {
            retries: DEFAULT_RETRIES,
            program: DEFAULT_PROGRAM.to_string(),
        }
    }
}

// Serde default helpers
fn default_max_markup_chars() -> usize { DEFAULT_MAX_MARKUP_CHARS }
fn default_retries() -> u32 { DEFAULT_RETRIES }
fn default_program() -> String { DEFAULT_PROGRAM.to_string() }

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or(DEFAULT_CONFIG_FILE);
    match std::fs::read_to_string(config_path) {
        Ok(content) => match serde_yaml::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("ignoring malformed config '{}': {}", config_path, e);
                AppConfig::default()
            }
        },
        Err(_) => AppConfig::default(),
    }
}

// ============================================================================
// Resolution (CLI > config > env > defaults)
// ============================================================================

/// Oracle connection settings after merging every source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OllamaSettings {
    pub endpoint: String,
    pub model: String,
    pub timeout_secs: u64,
    pub json_attempts: u32,
}

pub fn resolve_ollama(cli: &Cli, config: &AppConfig) -> OllamaSettings {
    let endpoint = cli
        .ollama_endpoint
        .clone()
        .or_else(|| config.ollama.endpoint.clone())
        .or_else(|| std::env::var("OLLAMA_ENDPOINT").ok())
        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
    let model = cli
        .ollama_model
        .clone()
        .or_else(|| config.ollama.model.clone())
        .or_else(|| std::env::var("OLLAMA_MODEL").ok())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());

    OllamaSettings {
        endpoint,
        model,
        timeout_secs: config.ollama.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        json_attempts: config.ollama.json_attempts.unwrap_or(DEFAULT_JSON_ATTEMPTS),
    }
}

pub fn resolve_output_dir(cli: &Cli, config: &AppConfig) -> PathBuf {
    cli.output_dir
        .clone()
        .or_else(|| config.output.root.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
}

pub fn resolve_run_log_dir(config: &AppConfig) -> PathBuf {
    config
        .output
        .run_log_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_RUN_LOG_DIR))
}

pub fn build_extraction_settings(
    config: &AppConfig,
    ollama: &OllamaSettings,
    max_markup_chars: Option<usize>,
) -> ExtractionSettings {
    ExtractionSettings {
        max_markup_chars: max_markup_chars.unwrap_or(config.extraction.max_markup_chars),
        json_attempts: ollama.json_attempts,
    }
}

pub fn build_execution_settings(config: &AppConfig) -> ExecutionSettings {
    ExecutionSettings {
        program: config.execute.program.clone(),
        retries: config.execute.retries,
    }
}
