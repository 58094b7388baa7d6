//! Units command implementation.

use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use tierproof_sources::load_catalogue;

/// Execute the units command.
pub async fn execute_units(config: &Config, formatter: &Formatter) -> Result<()> {
    let units = load_catalogue(&config.data.fixtures_dir).await?;
    println!("{}", formatter.format_units(&units)?);
    Ok(())
}
