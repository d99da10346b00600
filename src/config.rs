//! Configuration for ferrumkv
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

/// Default base directory of the file backend
pub const DEFAULT_BASE_DIR: &str = "./data/";

/// Default HTTP listen address
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";

/// Storage backend selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    /// One file per key inside an existing directory
    File(PathBuf),
    /// Volatile map, lost on restart
    Memory,
}

/// Main configuration for a ferrumkv instance
#[derive(Debug, Clone)]
pub struct Config {
    /// Which store to open at startup
    pub backend: Backend,

    /// HTTP listen address (host:port)
    pub listen_addr: String,

    /// Answer CORS preflights permissively
    pub cors: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: Backend::File(PathBuf::from(DEFAULT_BASE_DIR)),
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            cors: false,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Use the file backend rooted at `path`
    pub fn base_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.backend = Backend::File(path.into());
        self
    }

    /// Use the in-memory backend
    pub fn memory(mut self) -> Self {
        self.config.backend = Backend::Memory;
        self
    }

    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    pub fn cors(mut self, enabled: bool) -> Self {
        self.config.cors = enabled;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
