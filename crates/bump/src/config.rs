use crate::ConnectParams;
use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            other => anyhow::bail!("unknown log format '{}', expected json or pretty", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BumpConfig {
    /// Key issued by the pairing service; empty means "not configured"
    pub api_key: String,
    pub username: Option<String>,
    /// Prompt shown by the pairing UI while waiting for a bump
    pub message: Option<String>,
    pub log_format: LogFormat,
}

impl BumpConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from any key lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(BumpConfig {
            api_key: lookup("BUMP_API_KEY").unwrap_or_default(),
            username: non_empty("BUMP_USERNAME"),
            message: non_empty("BUMP_MESSAGE"),
            log_format: non_empty("BUMP_LOG_FORMAT")
                .map(|v| v.parse::<LogFormat>())
                .transpose()?
                .unwrap_or(LogFormat::Pretty),
        })
    }

    pub fn connect_params(&self) -> ConnectParams {
        ConnectParams {
            api_key: self.api_key.clone(),
            username: self.username.clone(),
            message: self.message.clone(),
        }
    }
}
