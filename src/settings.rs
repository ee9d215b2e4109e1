use std::env;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;

use serde_derive::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub static DEFAULT_BASE_URL: &str = "https://chat-us-east-1.stream-io-api.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(6);

static ENV_API_KEY: &str = "STREAM_KEY";
static ENV_API_SECRET: &str = "STREAM_SECRET";
static ENV_BASE_URL: &str = "STREAM_CHAT_URL";
static ENV_TIMEOUT: &str = "STREAM_CHAT_TIMEOUT";

#[derive(Serialize, Deserialize)]
struct SettingsFile {
    pub api_key: String,
    pub api_secret: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// Credentials and transport settings used to build a [`Client`](crate::Client).
#[derive(Debug, Clone, PartialEq)]
pub struct ClientSettings {
    pub api_key: String,
    pub api_secret: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_secret: String::new(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientSettings {
    pub fn new(api_key: &str, api_secret: &str) -> ClientSettings {
        ClientSettings {
            api_key: api_key.to_owned(),
            api_secret: api_secret.to_owned(),
            ..Default::default()
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_owned();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reads `STREAM_KEY`, `STREAM_SECRET` and the optional `STREAM_CHAT_URL`
    /// and `STREAM_CHAT_TIMEOUT` (seconds) from the process environment.
    pub fn from_env() -> Result<ClientSettings> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<ClientSettings>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = ClientSettings::new(
            &lookup(ENV_API_KEY).unwrap_or_default(),
            &lookup(ENV_API_SECRET).unwrap_or_default(),
        );
        if let Some(url) = lookup(ENV_BASE_URL).filter(|u| !u.is_empty()) {
            settings = settings.with_base_url(&url);
        }
        if let Some(raw) = lookup(ENV_TIMEOUT).filter(|t| !t.is_empty()) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                Error::Settings(format!("{} is not a number of seconds: {:?}", ENV_TIMEOUT, raw))
            })?;
            settings.timeout = Duration::from_secs(secs);
        }
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<ClientSettings> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        let settings_file: SettingsFile = serde_json::from_str(&contents).map_err(|e| {
            Error::Settings(format!("error parsing settings file, are you missing some settings? {}", e))
        })?;

        let mut settings = ClientSettings::new(&settings_file.api_key, &settings_file.api_secret);
        if let Some(url) = settings_file.base_url {
            settings = settings.with_base_url(&url);
        }
        if let Some(secs) = settings_file.timeout_secs {
            settings.timeout = Duration::from_secs(secs);
        }
        settings.validate()?;
        Ok(settings)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let settings_file = SettingsFile {
            api_key: self.api_key.clone(),
            api_secret: self.api_secret.clone(),
            base_url: Some(self.base_url.clone()),
            timeout_secs: Some(self.timeout.as_secs()),
        };
        let encoded = serde_json::to_string_pretty(&settings_file)?;
        let mut file = File::create(path)?;
        file.write_all(encoded.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.api_key.is_empty() {
            return Err(Error::Settings("API key is empty".to_owned()));
        }
        if self.api_secret.is_empty() {
            return Err(Error::Settings("API secret is empty".to_owned()));
        }
        if self.base_url.is_empty() {
            return Err(Error::Settings("base URL is empty".to_owned()));
        }
        if self.timeout.is_zero() {
            return Err(Error::Settings("timeout must be greater than zero".to_owned()));
        }
        Ok(())
    }
}
