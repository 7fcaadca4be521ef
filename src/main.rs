//! Mission Architect binary entry point

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use mission_architect::cli::Args;
use mission_architect::config::{Config, API_KEY_ENV};
use mission_architect::prompt::ModelKind;
use mission_architect::repl::ChatRepl;
use mission_architect::session::validate_api_key;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load().context("Failed to load configuration")?;

    let api_key = args
        .api_key
        .clone()
        .or_else(|| config.api_key())
        .with_context(|| {
            format!(
                "No API key configured. Set {} or add it to {}",
                API_KEY_ENV,
                Config::config_path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|_| "the config file".to_string())
            )
        })?;

    let model = args
        .model
        .or_else(|| config.model().and_then(ModelKind::parse))
        .unwrap_or_default();
    let desanitized = args.desanitized || config.chat.desanitized;

    if args.check_key {
        print!("Validating API key... ");
        if validate_api_key(&api_key, model.id()).await {
            println!("{}", "OK".green());
            return Ok(());
        }
        println!("{}", "INVALID".red());
        bail!("API key validation failed");
    }

    let mut repl = ChatRepl::new(api_key, model, desanitized, args.verbose)
        .context("Failed to initialize session")?;

    match args.question {
        Some(question) => repl.send(&question).await?,
        None => repl.run().await?,
    }

    Ok(())
}
