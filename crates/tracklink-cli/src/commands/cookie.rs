//! Cookie header command.

use clap::Args;
use serde::Serialize;

use crate::output::{self, OutputFormat};
use tracklink_core::error::AppError;
use tracklink_core::types::build_cookie_header;

/// Arguments for the cookie command
#[derive(Debug, Args)]
pub struct CookieArgs {
    /// Cookie pairs as `name=value`; values are percent-encoded
    #[arg(required = true, value_parser = parse_pair)]
    pub pairs: Vec<(String, String)>,
}

#[derive(Debug, Serialize)]
struct CookieHeader {
    header: String,
}

/// Print the Cookie header built from the given pairs
pub fn execute(args: &CookieArgs, format: OutputFormat) -> Result<(), AppError> {
    let header = build_cookie_header(args.pairs.iter().map(|(k, v)| (k, v)));

    match format {
        OutputFormat::Table => {
            println!("{header}");
            Ok(())
        }
        OutputFormat::Json => output::print_json(&CookieHeader { header }),
    }
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{raw}'"))?;
    if name.is_empty() {
        return Err(format!("cookie name is empty in '{raw}'"));
    }
    Ok((name.to_string(), value.to_string()))
}
