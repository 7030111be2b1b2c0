//! Show or initialize the configuration.

use clipforge_common::config::{config_file_path, AppConfig};

pub fn run(config: &AppConfig, init: bool, path: bool) -> anyhow::Result<()> {
    let file = config_file_path();

    if path {
        println!("{}", file.display());
        return Ok(());
    }

    config.validate()?;

    if init {
        if file.exists() {
            anyhow::bail!("Config already exists: {}", file.display());
        }
        config.save()?;
        println!("Wrote {}", file.display());
        return Ok(());
    }

    println!("# {}", file.display());
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}
