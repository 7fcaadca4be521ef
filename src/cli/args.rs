//! Command-line argument parsing for Mission Architect
//!
//! Provides the clap-based CLI: an optional one-shot question plus flags
//! controlling model tier, environment mode, and diagnostics.

use crate::prompt::ModelKind;
use clap::Parser;

/// Mission Architect - mission-building assistant for DCS World
#[derive(Parser, Debug)]
#[command(name = "mission-architect")]
#[command(version)]
#[command(
    about = "Answers MOOSE and DML scripting questions by reading their live Lua source from GitHub",
    long_about = None
)]
pub struct Args {
    /// One-shot question; starts the interactive session when omitted
    #[arg(value_name = "QUESTION")]
    pub question: Option<String>,

    /// Model tier to use
    #[arg(short, long, value_enum)]
    pub model: Option<ModelKind>,

    /// Generate for a desanitized (unlocked) DCS environment
    #[arg(long)]
    pub desanitized: bool,

    /// API key (overrides config file and environment)
    #[arg(long, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Validate the API key and exit
    #[arg(long)]
    pub check_key: bool,

    /// Enable verbose diagnostics
    #[arg(short, long)]
    pub verbose: bool,
}
