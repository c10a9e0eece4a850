use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use axum::http::HeaderValue;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("environment variable {0} is required")]
    Missing(&'static str),

    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Mongo,
    Memory,
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err>{
        match s.to_ascii_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(Self::Mongo),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown store `{other}`, expected `mongo` or `memory`")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub mongodb_uri: String,
    pub mongodb_db: String,
    pub store: StoreKind,
    pub jwt_secret: String,
    pub admin_emails: Vec<String>,
    pub upload_dir: PathBuf,
    pub public_base_url: String,
    pub max_upload_bytes: usize,
    pub cors_origin: Option<HeaderValue>,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError>{
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests need not touch the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = try_load(&lookup, "PORT", "3000")?;
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;
        let public_base_url = lookup("PUBLIC_BASE_URL")
            .unwrap_or_else(|| format!("http://localhost:{port}"))
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            port,
            mongodb_uri: try_load(&lookup, "MONGODB_URI", "mongodb://localhost:27017")?,
            mongodb_db: try_load(&lookup, "MONGODB_DB", "ecommerce")?,
            store: try_load(&lookup, "CATALOG_STORE", "mongo")?,
            jwt_secret,
            admin_emails: parse_list(lookup("ADMIN_EMAILS").as_deref().unwrap_or_default()),
            upload_dir: try_load(&lookup, "UPLOAD_DIR", "uploads")?,
            public_base_url,
            max_upload_bytes: try_load(&lookup, "MAX_UPLOAD_BYTES", "10485760")?,
            cors_origin: lookup("CORS_ORIGIN")
                .filter(|s| !s.is_empty())
                .map(|origin| {
                    origin.parse::<HeaderValue>().map_err(|e| ConfigError::Invalid {
                        key: "CORS_ORIGIN",
                        message: e.to_string(),
                    })
                })
                .transpose()?,
        })
    }

    pub fn is_admin_email(&self, email: &str) -> bool{
        self.admin_emails.iter().any(|e| e.eq_ignore_ascii_case(email))
    }
}

fn try_load<F, T>(lookup: &F, key: &'static str, default: &str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    let raw = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.parse().map_err(|e: T::Err| {
        warn!("Invalid {key} value: {e}");
        ConfigError::Invalid { key, message: e.to_string() }
    })
}

fn parse_list(raw: &str) -> Vec<String>{
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String>{
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply() {
        let config = Config::from_lookup(lookup(&[("JWT_SECRET", "s")])).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.store, StoreKind::Mongo);
        assert_eq!(config.public_base_url, "http://localhost:3000");
        assert!(config.admin_emails.is_empty());
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn secret_is_required() {
        assert!(matches!(Config::from_lookup(lookup(&[])), Err(ConfigError::Missing("JWT_SECRET"))));
    }

    #[test]
    fn bad_values_are_reported() {
        let err = Config::from_lookup(lookup(&[("JWT_SECRET", "s"), ("PORT", "http")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "PORT", .. }));

        let err = Config::from_lookup(lookup(&[("JWT_SECRET", "s"), ("CATALOG_STORE", "redis")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "CATALOG_STORE", .. }));
    }

    #[test]
    fn admin_list_and_base_url_are_normalised() {
        let config = Config::from_lookup(lookup(&[
            ("JWT_SECRET", "s"),
            ("ADMIN_EMAILS", " boss@shop.test, ,ops@shop.test "),
            ("PUBLIC_BASE_URL", "https://cdn.shop.test/"),
            ("CATALOG_STORE", "memory"),
        ]))
        .unwrap();
        assert_eq!(config.admin_emails, ["boss@shop.test", "ops@shop.test"]);
        assert!(config.is_admin_email("BOSS@shop.test"));
        assert_eq!(config.public_base_url, "https://cdn.shop.test");
        assert_eq!(config.store, StoreKind::Memory);
        assert!(config.cors_origin.is_none());
    }

    #[test]
    fn cors_origin_must_be_a_header_value() {
        let err = Config::from_lookup(lookup(&[("JWT_SECRET", "s"), ("CORS_ORIGIN", "bad\norigin")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "CORS_ORIGIN", .. }));
    }
}
