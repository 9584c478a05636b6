//! Tracing subscriber setup shared by the binaries

use crate::config::LoggingConfig;
use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise `default_target` logs at the configured
/// level.
pub fn init(config: &LoggingConfig, default_target: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("warn")
            .add_directive(format!("{}={}", default_target, config.level).parse()?)
            .add_directive(format!("fraudshield={}", config.level).parse()?)
            .add_directive("tower_http=info".parse()?),
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = if config.format == "json" {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_installs_once() {
        let config = LoggingConfig::default();

        assert!(init(&config, "generate_sample_data").is_ok());
        // the global subscriber is already set
        assert!(init(&config, "train_model").is_err());
    }
}
