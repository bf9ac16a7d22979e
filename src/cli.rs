use std::path::PathBuf;

use clap::Parser;
use twid_core::models::settings::{BrowserProduct, Config};

/// Download every image and video from one or more profiles' media timelines
#[derive(Parser, Debug)]
#[command(name = "twid", author, version, about)]
pub struct Cli {
    /// Profiles to download: a handle, @handle or profile URL
    pub users: Vec<String>,

    /// The output dir
    #[arg(short = 'O', long, default_value = "twid-dist")]
    pub out_dir: PathBuf,

    /// Value of the auth_token cookie of a logged-in session
    #[arg(short = 'T', long, env = "TWID_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Show the browser with devtools open and log at debug level
    #[arg(short = 'D', long)]
    pub dev: bool,

    /// Download passes per profile
    #[arg(short = 'R', long, default_value_t = 3)]
    pub retry: u32,

    /// Browser to drive
    #[arg(short = 'P', long, default_value = "chrome")]
    pub product: BrowserProduct,

    /// JSON config file whose values override these flags
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    pub fn to_config(&self) -> Config {
        Config {
            users: self.users.clone(),
            out_dir: self.out_dir.clone(),
            token: self.token.clone(),
            dev: self.dev,
            retry: self.retry,
            product: self.product,
            ..Config::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_flags() {
        let cli = Cli::try_parse_from([
            "twid", "-O", "out", "-T", "tok", "-D", "-R", "5", "-P", "chromium", "nasa", "esa",
        ])
        .unwrap();
        let config = cli.to_config();
        assert_eq!(config.users, vec!["nasa", "esa"]);
        assert_eq!(config.out_dir, PathBuf::from("out"));
        assert_eq!(config.token.as_deref(), Some("tok"));
        assert!(config.dev);
        assert_eq!(config.retry, 5);
        assert_eq!(config.product, BrowserProduct::Chromium);
    }

    #[test]
    fn defaults_match_config_defaults() {
        let cli = Cli::try_parse_from(["twid", "nasa"]).unwrap();
        let config = cli.to_config();
        let defaults = Config::default();
        assert_eq!(config.out_dir, defaults.out_dir);
        assert_eq!(config.retry, defaults.retry);
        assert_eq!(config.product, defaults.product);
        assert!(cli.config.is_none());
    }

    #[test]
    fn unknown_product_is_rejected() {
        assert!(Cli::try_parse_from(["twid", "-P", "safari", "nasa"]).is_err());
    }
}
