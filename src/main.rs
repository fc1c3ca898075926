use anyhow::Result;
use clap::Parser;
use page_scribe::cli::commands::{GenerateOptions, cmd_clean, cmd_execute, cmd_generate};
use page_scribe::cli::config::{Cli, Commands, load_config};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_deref());

    match &cli.command {
        Commands::Generate {
            url,
            feature,
            execute,
            clean,
            reuse_locators,
            max_markup_chars,
        } => {
            let options = GenerateOptions {
                urls: url.clone(),
                feature: feature.clone(),
                execute: *execute,
                clean: *clean,
                reuse_locators: *reuse_locators,
                max_markup_chars: *max_markup_chars,
            };
            if !cmd_generate(&cli, &config, &options)? {
                std::process::exit(1);
            }
        }
        Commands::Execute {
            spec,
            report_dir,
            url,
        } => {
            if !cmd_execute(&cli, &config, spec, report_dir.as_deref(), url)? {
                std::process::exit(1);
            }
        }
        Commands::Clean { keep } => {
            cmd_clean(&cli, &config, keep.as_deref())?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    use tracing_subscriber::EnvFilter;

    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("page_scribe=info")),
        1 => EnvFilter::new("page_scribe=debug"),
        _ => EnvFilter::new("page_scribe=trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}
