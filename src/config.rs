use crate::{file_store, router::MatchMode};
use log::{info, warn};
use std::{env, fmt, path::PathBuf, str::FromStr};
use thiserror::Error;

/// `DB_FILE` value selecting the in-memory store.
pub const MEMORY_DB: &str = ":memory:";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {key} value '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// What to answer for a request no route matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnmatchedRoute {
    /// `404 {"message":"Not Found"}`
    #[default]
    NotFound,
    /// `200 null`
    Null,
}

impl FromStr for UnmatchedRoute {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "not-found" | "404" => Ok(UnmatchedRoute::NotFound),
            "null" => Ok(UnmatchedRoute::Null),
            other => Err(format!("expected 'not-found' or 'null', got '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Database {
    File(PathBuf),
    Memory,
}

impl fmt::Display for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Database::File(p) => write!(f, "{}", p.display()),
            Database::Memory => f.write_str(MEMORY_DB),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database: Database,
    pub store: file_store::Config,
    pub host: String,
    pub port: u16,
    pub prod: bool,
    pub uri_prefix: String,
    pub route_match: MatchMode,
    pub unmatched: UnmatchedRoute,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database: Database::File(default_db_file()),
            store: file_store::Config::default(),
            host: "127.0.0.1".to_owned(),
            port: 1721,
            prod: false,
            uri_prefix: "/sneakers".to_owned(),
            route_match: MatchMode::default(),
            unmatched: UnmatchedRoute::default(),
        }
    }
}

fn default_db_file() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("db.json")
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from `lookup`, falling back to defaults for
    /// unset keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let database = match lookup("DB_FILE") {
            Some(v) if v.trim() == MEMORY_DB => Database::Memory,
            Some(v) if !v.trim().is_empty() => Database::File(PathBuf::from(v)),
            _ => defaults.database,
        };
        let store = file_store::Config {
            pretty: try_load(&lookup, "DB_PRETTY", defaults.store.pretty)?,
            ..defaults.store
        };
        Ok(Config {
            database,
            store,
            host: lookup("HOST").unwrap_or(defaults.host),
            port: try_load(&lookup, "PORT", defaults.port)?,
            prod: lookup("PROD").is_some_and(|v| v == "true"),
            uri_prefix: lookup("URI_PREFIX").unwrap_or(defaults.uri_prefix),
            route_match: try_load(&lookup, "ROUTE_MATCH", defaults.route_match)?,
            unmatched: try_load(&lookup, "UNMATCHED_ROUTE", defaults.unmatched)?,
        })
    }
}

fn try_load<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + fmt::Debug,
    T::Err: fmt::Display,
{
    match lookup(key) {
        None => {
            info!("{key} not set, using default: {default:?}");
            Ok(default)
        }
        Some(value) => value.trim().parse().map_err(|e: T::Err| {
            warn!("Invalid {key} value: {e}");
            ConfigError::Invalid {
                key,
                value,
                reason: e.to_string(),
            }
        }),
    }
}
