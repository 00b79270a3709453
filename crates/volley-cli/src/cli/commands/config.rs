//! `volley config` – show where the config lives and what it resolves to.

use anyhow::Result;
use volley_core::config::{self, DispatchConfig};

pub fn run_config(cfg: &DispatchConfig) -> Result<()> {
    let path = config::config_path()?;
    println!("# {}", path.display());
    print!("{}", toml::to_string_pretty(cfg)?);
    if let Err(err) = cfg.resolve() {
        println!("# warning: {}", err);
    }
    Ok(())
}
