//! Config command implementation.

use crate::cli::ConfigArgs;
use crate::config::Config;
use crate::error::Result;
use std::path::Path;

/// Execute the config command.
pub fn execute_config(args: ConfigArgs, config: &Config, path: Option<&Path>) -> Result<()> {
    if args.path {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Config::default_path()?,
        };
        println!("{}", path.display());
    } else {
        print!("{}", config.to_toml()?);
    }
    Ok(())
}
