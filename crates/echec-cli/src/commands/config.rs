use anyhow::{Context, Result};
use echec_core::config::RootConfig;
use echec_infrastructure::ConfigService;

pub fn show(config: &RootConfig) -> Result<()> {
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

pub fn init(service: &ConfigService) -> Result<()> {
    let path = service.config_path()?;
    if path.exists() {
        println!("{} already exists", path.display());
        return Ok(());
    }
    service
        .save(&RootConfig::default())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}

pub fn path(service: &ConfigService) -> Result<()> {
    println!("{}", service.config_path()?.display());
    Ok(())
}
