//! Configuration: YAML file plus `VPCTL_`-prefixed environment overrides.

use std::{net::IpAddr, path::PathBuf, time::Duration};

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};

/// Shown on the user dashboard until a real analytics embed is configured.
pub const PLACEHOLDER_ANALYTICS_URL: &str = "https://app.powerbi.com/view?r=YOUR_EMBED_LINK";

#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to config file
    #[arg(short = 'f', long, env = "VPCTL_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate the config and exit
    #[arg(long, default_value = "false")]
    pub validate: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Address to bind the HTTP server to
    pub host: IpAddr,
    pub port: u16,

    pub database: DatabaseConfig,

    /// Key used to sign session tokens. Required at startup.
    pub secret_key: Option<String>,

    /// Path to the trained model artifact. The app starts without it, in
    /// degraded mode.
    pub model_path: PathBuf,

    /// Analytics dashboard embed URL shown to users; falls back to a
    /// placeholder when unset.
    pub analytics_embed_url: Option<String>,

    pub session: SessionConfig,
    pub bootstrap: BootstrapConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://data/vpctl.db?mode=rwc".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    pub cookie_name: String,

    /// Absolute session lifetime; sessions are not renewed on activity.
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// Set the `Secure` attribute on the session cookie. Disable only for
    /// plain-HTTP local development.
    pub cookie_secure: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "vpctl_session".to_string(),
            timeout: Duration::from_secs(30 * 60),
            cookie_secure: true,
        }
    }
}

/// First-run account seeding. Accounts are created only when the matching
/// password is set, and never overwritten if the username already exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BootstrapConfig {
    pub admin_username: String,
    pub admin_password: Option<String>,
    pub demo_username: String,
    pub demo_password: Option<String>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            admin_username: "admin".to_string(),
            admin_password: None,
            demo_username: "user".to_string(),
            demo_password: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".parse().expect("valid default host"),
            port: 3000,
            database: DatabaseConfig::default(),
            secret_key: None,
            model_path: PathBuf::from("model/startup_forest.json"),
            analytics_embed_url: None,
            session: SessionConfig::default(),
            bootstrap: BootstrapConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the YAML file at `path`, letting environment
    /// variables like `VPCTL_SESSION__TIMEOUT` override file values.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let config: Config = Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed("VPCTL_").split("__"))
            .extract()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.secret_key.as_deref().is_none_or(str::is_empty) {
            anyhow::bail!("secret_key must be set (config file or VPCTL_SECRET_KEY)");
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn analytics_url(&self) -> &str {
        self.analytics_embed_url.as_deref().unwrap_or(PLACEHOLDER_ANALYTICS_URL)
    }
}
