use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "portfolio_builder.toml";
pub const DEFAULT_SERVICE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub service_url: Url,
    pub state_dir: PathBuf,
    pub request_timeout: Duration,
}

/// Explicit values from the command line; they win over every other layer.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config_file: Option<PathBuf>,
    pub service_url: Option<String>,
    pub state_dir: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    service_url: Option<String>,
    state_dir: Option<PathBuf>,
    request_timeout_secs: Option<u64>,
}

pub fn default_state_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("portfolio_builder"))
        .unwrap_or_else(|| PathBuf::from(".portfolio_builder"))
}

fn parse_service_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).with_context(|| format!("invalid service url '{raw}'"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("service url must start with http:// or https:// (got '{raw}')");
    }
    Ok(url)
}

fn parse_timeout(raw: &str, source: &str) -> Result<u64> {
    raw.trim()
        .parse::<u64>()
        .with_context(|| format!("{source} must be a whole number of seconds"))
}

/// Layers defaults, the TOML file, environment variables and CLI overrides,
/// in that order. `env` is injected so the layering can be tested.
pub fn resolve_settings(
    file_contents: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
    overrides: &Overrides,
) -> Result<Settings> {
    let mut service_url = DEFAULT_SERVICE_URL.to_string();
    let mut state_dir = default_state_dir();
    let mut timeout_secs = DEFAULT_REQUEST_TIMEOUT_SECS;

    if let Some(raw) = file_contents {
        let file: FileSettings = toml::from_str(raw).context("invalid configuration file")?;
        if let Some(v) = file.service_url {
            service_url = v;
        }
        if let Some(v) = file.state_dir {
            state_dir = v;
        }
        if let Some(v) = file.request_timeout_secs {
            timeout_secs = v;
        }
    }

    let env = |name: &str| env(name).filter(|value| !value.trim().is_empty());
    if let Some(v) = env("PORTFOLIO_SERVICE_URL") {
        service_url = v;
    }
    if let Some(v) = env("PORTFOLIO_STATE_DIR") {
        state_dir = PathBuf::from(v);
    }
    if let Some(v) = env("PORTFOLIO_REQUEST_TIMEOUT_SECS") {
        timeout_secs = parse_timeout(&v, "PORTFOLIO_REQUEST_TIMEOUT_SECS")?;
    }

    if let Some(v) = &overrides.service_url {
        service_url = v.clone();
    }
    if let Some(v) = &overrides.state_dir {
        state_dir = v.clone();
    }
    if let Some(v) = overrides.timeout_secs {
        timeout_secs = v;
    }

    if timeout_secs == 0 {
        return Err(anyhow!("request timeout must be at least one second"));
    }

    Ok(Settings {
        service_url: parse_service_url(&service_url)?,
        state_dir,
        request_timeout: Duration::from_secs(timeout_secs),
    })
}

fn read_config_file(path: &Path, required: bool) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(raw) => Ok(Some(raw)),
        Err(err) if !required && err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => {
            Err(err).with_context(|| format!("failed to read config file '{}'", path.display()))
        }
    }
}

/// Reads the process environment and the config file. An explicitly named
/// file must exist; the default one is optional.
pub fn load_settings(overrides: &Overrides) -> Result<Settings> {
    let file_contents = match &overrides.config_file {
        Some(path) => read_config_file(path, true)?,
        None => read_config_file(Path::new(DEFAULT_CONFIG_FILE), false)?,
    };
    resolve_settings(
        file_contents.as_deref(),
        |name| std::env::var(name).ok(),
        overrides,
    )
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
