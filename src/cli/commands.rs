use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::browser::session::{BrowserSession, default_server_script};
use crate::cli::config::{
    AppConfig, Cli, OllamaSettings, build_execution_settings, build_extraction_settings,
    resolve_ollama, resolve_output_dir, resolve_run_log_dir,
};
use crate::codegen::accessor::BuilderRegistry;
use crate::oracle::ollama::OllamaBackend;
use crate::pipeline::artifacts::ArtifactStore;
use crate::pipeline::orchestrator::{Pipeline, PipelineSettings};
use crate::report::console::format_console_report;
use crate::runner::executor::execute_tests;
use crate::trace::logger::RunLog;

/// Options of the `generate` subcommand.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub urls: Vec<String>,
    pub feature: Option<PathBuf>,
    pub execute: bool,
    pub clean: bool,
    pub reuse_locators: bool,
    pub max_markup_chars: Option<usize>,
}

pub fn build_oracle(settings: &OllamaSettings) -> OllamaBackend {
    OllamaBackend::new(&settings.endpoint, &settings.model)
        .with_timeout(Duration::from_secs(settings.timeout_secs))
}

// ============================================================================
// generate subcommand
// ============================================================================

/// Run the pipeline for every URL. Returns whether every subject succeeded.
pub fn cmd_generate(
    cli: &Cli,
    config: &AppConfig,
    options: &GenerateOptions,
) -> anyhow::Result<bool> {
    let urls: Vec<String> = options
        .urls
        .iter()
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .collect();

    if urls.is_empty() {
        tracing::error!("No target URL given (use --url or set TEST_URL)");
        return Ok(false);
    }

    let ollama = resolve_ollama(cli, config);
    let store = ArtifactStore::new(resolve_output_dir(cli, config));

    if options.clean {
        let removed = store.clear(options.feature.as_deref())?;
        tracing::info!(removed, root = %store.root().display(), "Cleared generated artifacts");
    }

    let settings = PipelineSettings {
        extraction: build_extraction_settings(config, &ollama, options.max_markup_chars),
        reuse_locators_for_accessors: options.reuse_locators
            || config.extraction.reuse_locators_for_accessors,
        execute: options.execute.then(|| build_execution_settings(config)),
    };

    let oracle = build_oracle(&ollama);
    let registry = BuilderRegistry::standard();
    let log = RunLog::open(&resolve_run_log_dir(config));
    tracing::debug!(model = %ollama.model, endpoint = %ollama.endpoint, "Using Ollama");

    let script = config
        .browser
        .server_script
        .clone()
        .unwrap_or_else(default_server_script);
    let mut session = BrowserSession::launch(&script)?;

    let pipeline = Pipeline::new(&oracle, &store, &registry, &settings, &log);
    let report = pipeline.run(&urls, options.feature.as_deref(), &mut session);
    session.quit()?;

    print!("{}", format_console_report(&report));
    if let Some(path) = log.path() {
        tracing::info!("Run log written to {}", path.display());
    }

    Ok(report.all_succeeded())
}

// ============================================================================
// execute subcommand
// ============================================================================

/// Run an existing spec file. Returns whether the tests passed.
pub fn cmd_execute(
    cli: &Cli,
    config: &AppConfig,
    spec: &Path,
    report_dir: Option<&Path>,
    url: &str,
) -> anyhow::Result<bool> {
    let store = ArtifactStore::new(resolve_output_dir(cli, config));
    let subject = spec_subject(spec);
    let report_dir = report_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| store.report_dir(&subject));

    let log = RunLog::open(&resolve_run_log_dir(config));
    let run = execute_tests(
        spec,
        &report_dir,
        url,
        &subject,
        &build_execution_settings(config),
        &log,
    )?;

    println!("{}", run.stdout.trim_end());
    if !run.stderr.trim().is_empty() {
        eprintln!("{}", run.stderr.trim_end());
    }

    if run.passed {
        println!("Tests passed (report: {})", run.report_dir.display());
    } else {
        println!("Tests failed (report: {})", run.report_dir.display());
        if !run.suggestions.is_empty() {
            println!("Suggestions for resolution:");
            for suggestion in &run.suggestions {
                println!("  - {}", suggestion);
            }
        }
    }

    Ok(run.passed)
}

/// Subject name of a spec file: `login.spec.ts` -> `login`.
pub fn spec_subject(spec: &Path) -> String {
    let name = spec
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = name.split('.').next().unwrap_or("");
    if stem.is_empty() {
        "spec".to_string()
    } else {
        stem.to_string()
    }
}

// ============================================================================
// clean subcommand
// ============================================================================

pub fn cmd_clean(cli: &Cli, config: &AppConfig, keep: Option<&Path>) -> anyhow::Result<()> {
    let store = ArtifactStore::new(resolve_output_dir(cli, config));
    let removed = store.clear(keep)?;
    println!(
        "Removed {} generated files from {}",
        removed,
        store.root().display()
    );
    Ok(())
}
