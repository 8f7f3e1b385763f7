use std::fs;
use std::path::Path;

use annuals_core::PipelineConfig;
use anyhow::Context;

/// Read a TOML config file, or take the defaults when no file is given.
pub fn load(path: Option<&Path>) -> anyhow::Result<PipelineConfig> {
    let config = match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            parse(&text).with_context(|| format!("parsing config {}", path.display()))?
        }
        None => PipelineConfig::default(),
    };
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn parse(text: &str) -> anyhow::Result<PipelineConfig> {
    Ok(toml::from_str(text)?)
}
