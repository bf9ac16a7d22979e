use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BrowserProduct {
    #[default]
    Chrome,
    Chromium,
    Firefox,
}

impl fmt::Display for BrowserProduct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BrowserProduct::Chrome => "chrome",
            BrowserProduct::Chromium => "chromium",
            BrowserProduct::Firefox => "firefox",
        };
        f.write_str(name)
    }
}

impl FromStr for BrowserProduct {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chrome" => Ok(BrowserProduct::Chrome),
            "chromium" => Ok(BrowserProduct::Chromium),
            "firefox" => Ok(BrowserProduct::Firefox),
            other => Err(format!("unknown browser product: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub users: Vec<String>,
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub dev: bool,
    #[serde(default = "default_retry")]
    pub retry: u32,
    #[serde(default)]
    pub product: BrowserProduct,
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
    #[serde(default = "default_max_concurrent_downloads")]
    pub max_concurrent_downloads: usize,
    #[serde(default)]
    pub chrome_executable: Option<PathBuf>,
}

fn default_out_dir() -> PathBuf {
    PathBuf::from("twid-dist")
}

fn default_retry() -> u32 {
    3
}

fn default_settle_ms() -> u64 {
    500
}

fn default_max_concurrent_downloads() -> usize {
    16
}

impl Default for Config {
    fn default() -> Self {
        Self {
            users: Vec::new(),
            out_dir: default_out_dir(),
            token: None,
            dev: false,
            retry: default_retry(),
            product: BrowserProduct::default(),
            settle_ms: default_settle_ms(),
            max_concurrent_downloads: default_max_concurrent_downloads(),
            chrome_executable: None,
        }
    }
}

/// Contents of `twid.config.json`. Every key is optional; present keys win
/// over command-line values.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileConfig {
    pub users: Option<Vec<String>>,
    pub out_dir: Option<PathBuf>,
    pub token: Option<String>,
    pub dev: Option<bool>,
    pub retry: Option<u32>,
    pub product: Option<BrowserProduct>,
    pub settle_ms: Option<u64>,
    pub max_concurrent_downloads: Option<usize>,
    pub chrome_executable: Option<PathBuf>,
}

impl Config {
    pub fn merge_file(mut self, file: FileConfig) -> Self {
        if let Some(users) = file.users {
            self.users = users;
        }
        if let Some(out_dir) = file.out_dir {
            self.out_dir = out_dir;
        }
        if file.token.is_some() {
            self.token = file.token;
        }
        if let Some(dev) = file.dev {
            self.dev = dev;
        }
        if let Some(retry) = file.retry {
            self.retry = retry;
        }
        if let Some(product) = file.product {
            self.product = product;
        }
        if let Some(settle_ms) = file.settle_ms {
            self.settle_ms = settle_ms;
        }
        if let Some(max) = file.max_concurrent_downloads {
            self.max_concurrent_downloads = max;
        }
        if file.chrome_executable.is_some() {
            self.chrome_executable = file.chrome_executable;
        }
        self
    }

    /// Checks everything that must hold before a browser is launched and
    /// returns the auth token.
    pub fn validate(&self) -> Result<&str, ConfigError> {
        let token = self
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingToken)?;

        if self.users.iter().all(|u| u.trim().is_empty()) {
            return Err(ConfigError::NoUsers);
        }

        if self.product == BrowserProduct::Firefox {
            return Err(ConfigError::UnsupportedProduct(self.product.to_string()));
        }

        Ok(token)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}
