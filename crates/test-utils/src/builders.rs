#![allow(dead_code)]

use std::collections::BTreeMap;
use passpool::config::{ConfigFile, PassConfig, PoolSection, RawConfigFile};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                pool: PoolSection::default(),
                pass: BTreeMap::new(),
            },
        }
    }

    pub fn with_pass(mut self, name: &str, pass: PassConfig) -> Self {
        self.config.pass.insert(name.to_string(), pass);
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.config.pool.workers = Some(workers);
        self
    }

    pub fn with_root(mut self, name: &str) -> Self {
        self.config
            .pool
            .roots
            .get_or_insert_with(Vec::new)
            .push(name.to_string());
        self
    }

    /// The unvalidated config, for tests that exercise validation errors.
    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `PassConfig`.
pub struct PassConfigBuilder {
    pass: PassConfig,
}

impl PassConfigBuilder {
    pub fn new(cmd: &str) -> Self {
        Self {
            pass: PassConfig {
                cmd: cmd.to_string(),
                after: vec![],
            },
        }
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.pass.after.push(dep.to_string());
        self
    }

    pub fn build(self) -> PassConfig {
        self.pass
    }
}
