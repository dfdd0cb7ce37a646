#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use scriptexec::config::{ConfigFile, ConfigSection, RawConfigFile, ScriptConfig};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                script: BTreeMap::new(),
            },
        }
    }

    pub fn logs_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.config.logs_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn max_tasks(mut self, max: usize) -> Self {
        self.config.config.max_tasks = max;
        self
    }

    pub fn progress(mut self, step: u8, cap: u8) -> Self {
        self.config.config.progress_step = step;
        self.config.config.progress_cap = cap;
        self
    }

    pub fn with_script(mut self, name: &str, script: ScriptConfig) -> Self {
        self.config.script.insert(name.to_string(), script);
        self
    }

    pub fn raw(self) -> RawConfigFile {
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

/// Builder for `ScriptConfig`.
pub struct ScriptConfigBuilder {
    script: ScriptConfig,
}

impl ScriptConfigBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            script: ScriptConfig {
                path: path.into(),
                args: vec![],
                description: None,
            },
        }
    }

    /// `/bin/sh -c <script>`.
    pub fn shell(script: &str) -> Self {
        Self::new("/bin/sh").arg("-c").arg(script)
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.script.args.push(arg.to_string());
        self
    }

    pub fn description(mut self, text: &str) -> Self {
        self.script.description = Some(text.to_string());
        self
    }

    pub fn build(self) -> ScriptConfig {
        self.script
    }
}
