//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use picoplaca_core::Tz;

#[derive(Debug, Parser)]
#[command(name = "picoplaca")]
#[command(author, version, about = "Predict pico y placa driving restrictions", long_about = None)]
pub struct Cli {
    /// License plate, AAA9999
    #[arg(short, long)]
    pub plate: Option<String>,

    /// Date as YYYY/MM/DD (default: today in the rules' timezone)
    #[arg(short, long)]
    pub date: Option<String>,

    /// Time as 24 hour HH:MM (default: now in the rules' timezone)
    #[arg(short, long)]
    pub time: Option<String>,

    /// YAML or JSON rule file (default: built-in Quito rules)
    #[arg(short, long, env = "PICOPLACA_RULES")]
    pub rules: Option<PathBuf>,

    /// IANA timezone, overrides the rule file
    #[arg(long, value_parser = parse_timezone)]
    pub timezone: Option<Tz>,

    /// Raw parameter as NAME=VALUE (DATE, TIME or PLATE), applied last
    #[arg(long = "param", value_name = "NAME=VALUE", value_parser = parse_param)]
    pub params: Vec<(String, String)>,

    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    #[arg(short, long)]
    pub verbose: bool,
}

/// Output format for predictions.
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn parse_timezone(s: &str) -> Result<Tz, String> {
    s.parse::<Tz>().map_err(|e| e.to_string())
}

fn parse_param(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected NAME=VALUE, got {s:?}"))
}
