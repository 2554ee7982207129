//! Print or write the default configuration.

use anyhow::{bail, Context, Result};
use signalbot_config::AppConfig;

use crate::cli::InitConfigArgs;

pub fn run(args: &InitConfigArgs) -> Result<()> {
    let toml = AppConfig::default().to_toml()?;

    match &args.output {
        Some(path) => {
            if path.exists() && !args.force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                std::fs::create_dir_all(dir)?;
            }
            std::fs::write(path, toml)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote default configuration to {}", path.display());
        }
        None => print!("{toml}"),
    }
    Ok(())
}
