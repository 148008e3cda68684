//! Top-level arguments, the node configuration file and logging setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use corelib::RingConfig;
use serde::{Deserialize, Serialize};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};
use transport::TransportConfig;

use crate::commands::Command;

#[derive(Debug, Parser)]
#[command(name = "chord", version, about = "Distributed dictionary on a Chord ring")]
pub struct CliConfig {
    /// Append logs to this file instead of stderr.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl CliConfig {
    pub fn run(self) -> anyhow::Result<()> {
        init_logging(self.log_file.as_deref())?;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("failed to start async runtime")?;
        runtime.block_on(self.command.execute())
    }
}

/// Contents of `chord node --config FILE`. Missing sections take defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeFileConfig {
    pub ring: RingConfig,
    pub transport: TransportConfig,
}

impl NodeFileConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        let config: NodeFileConfig = serde_json::from_str(text)?;
        config.ring.validate()?;
        Ok(config)
    }
}

/// `RUST_LOG` selects levels; `info` when unset.
fn init_logging(log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            registry
                .with(fmt::layer().with_ansi(false).with_writer(Arc::new(file)))
                .init();
        }
        None => registry.with(fmt::layer().with_writer(std::io::stderr)).init(),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use corelib::{FingerPropagation, HashAlgorithm};

    #[test]
    fn test_partial_config_file() {
        let config = NodeFileConfig::from_json(
            r#"{ "ring": { "hasher": "xxh3", "propagation": "single_hop" },
                 "transport": { "request_timeout_ms": 500 } }"#,
        )
        .unwrap();
        assert_eq!(config.ring.bits, 31);
        assert_eq!(config.ring.hasher, HashAlgorithm::Xxh3);
        assert_eq!(config.ring.propagation, FingerPropagation::SingleHop);
        assert_eq!(config.transport.request_timeout_ms, 500);
        assert!(config.transport.nodelay);
    }

    #[test]
    fn test_invalid_ring_rejected() {
        assert!(NodeFileConfig::from_json(r#"{ "ring": { "bits": 0 } }"#).is_err());
    }

    #[test]
    fn test_parse_node_command() {
        let cli = CliConfig::try_parse_from([
            "chord",
            "node",
            "--listen",
            "127.0.0.1:5000",
            "--bootstrap",
            "127.0.0.1:5001",
            "--log-file",
            "node.log",
        ])
        .unwrap();
        assert_eq!(cli.log_file, Some(PathBuf::from("node.log")));
        match cli.command {
            Command::Node(args) => {
                assert_eq!(args.listen, "127.0.0.1:5000");
                assert_eq!(args.bootstrap.as_deref(), Some("127.0.0.1:5001"));
                assert_eq!(args.id, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
