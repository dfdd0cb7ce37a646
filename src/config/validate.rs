// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, ScriptexecError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::ScriptexecError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.script))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_global_config(cfg)?;
    validate_scripts(cfg)?;
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    let c = &cfg.config;

    if c.logs_dir.as_os_str().is_empty() {
        return Err(config_error("[config].logs_dir must not be empty"));
    }

    if c.max_tasks == 0 {
        return Err(config_error("[config].max_tasks must be >= 1 (got 0)"));
    }

    if c.progress_step == 0 {
        return Err(config_error("[config].progress_step must be >= 1 (got 0)"));
    }

    if !(1..=99).contains(&c.progress_cap) {
        return Err(ScriptexecError::ConfigError(format!(
            "[config].progress_cap must be between 1 and 99 (got {})",
            c.progress_cap
        )));
    }

    match c.poll_interval() {
        Ok(d) if d.is_zero() => Err(config_error("[config].poll_interval must be > 0")),
        Ok(_) => Ok(()),
        Err(e) => Err(ScriptexecError::ConfigError(format!(
            "[config].poll_interval: {e}"
        ))),
    }
}

fn validate_scripts(cfg: &RawConfigFile) -> Result<()> {
    for (name, script) in cfg.script.iter() {
        if name.trim().is_empty() {
            return Err(config_error("script names must not be empty"));
        }
        if script.path.as_os_str().is_empty() {
            return Err(ScriptexecError::ConfigError(format!(
                "script '{}' has an empty `path`",
                name
            )));
        }
    }
    Ok(())
}

fn config_error(msg: &str) -> ScriptexecError {
    ScriptexecError::ConfigError(msg.to_string())
}
