//! Runtime configuration: `config.toml` layered with `SIREN_*` environment
//! variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;

/// Runtime server configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
}

impl ServerConfig {
  /// Load from `path` (optional) and the environment, in that order of
  /// precedence from lowest to highest.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .set_default("host", "127.0.0.1")?
      .set_default("port", 8080)?
      .set_default("store_path", "~/.local/share/siren/siren.db")?
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("SIREN"))
      .build()
      .context("failed to read config file")?;

    let mut cfg: ServerConfig = settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")?;
    cfg.store_path = expand_tilde(&cfg.store_path);
    Ok(cfg)
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_apply_without_a_file() {
    let cfg = ServerConfig::load(Path::new("does-not-exist.toml")).unwrap();
    assert_eq!(cfg.port, 8080);
    assert!(cfg.store_path.ends_with("siren/siren.db"));
  }

  #[test]
  fn plain_paths_are_untouched() {
    assert_eq!(expand_tilde(Path::new("/var/lib/siren.db")), PathBuf::from("/var/lib/siren.db"));
    assert_eq!(expand_tilde(Path::new("data/siren.db")), PathBuf::from("data/siren.db"));
  }
}
