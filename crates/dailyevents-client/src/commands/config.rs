//! Configuration commands.

use std::path::Path;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Dump the current configuration to stdout.
pub fn dump(config: &ClientConfig, path: &Path) -> ClientResult<()> {
    println!("{}", render(config, path)?);
    Ok(())
}

/// Renders the configuration as TOML. Plain-text tokens are redacted.
pub fn render(config: &ClientConfig, path: &Path) -> ClientResult<String> {
    let toml_str = toml::to_string_pretty(config)
        .map_err(|e| ClientError::Config(format!("failed to serialize config: {}", e)))?;
    Ok(format!("# config.toml ({})\n{}", path.display(), toml_str))
}

/// Validate the configuration.
pub fn validate(config: &ClientConfig) -> ClientResult<()> {
    let resolved = config.resolve().map_err(ClientError::Config)?;

    println!(
        "Home Assistant: {} (TLS verification {})",
        resolved.hass.url,
        if resolved.hass.verify_tls { "on" } else { "off" }
    );
    println!(
        "Digest: {} day(s) in {}, channels: {}",
        resolved.num_of_days,
        resolved.timezone,
        resolved.channels.join(", ")
    );
    println!("Configuration is valid.");
    Ok(())
}

/// Show the configuration file path.
pub fn path(path: &Path) -> ClientResult<()> {
    let exists = if path.exists() { "" } else { " (not found)" };
    println!("config: {}{}", path.display(), exists);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::REDACTED_TOKEN;

    #[test]
    fn render_never_prints_plain_token() {
        let config = ClientConfig::parse(
            "[homeassistant]\nhost = \"http://hass:8123\"\ntoken = \"eyJhbGciOiJIUzI1NiJ9\"\n",
        )
        .unwrap();

        let out = render(&config, Path::new("/tmp/config.toml")).unwrap();
        assert!(out.starts_with("# config.toml (/tmp/config.toml)\n"));
        assert!(out.contains("host = \"http://hass:8123\""));
        assert!(out.contains(REDACTED_TOKEN));
        assert!(!out.contains("eyJhbGciOiJIUzI1NiJ9"));
    }
}
