//! Maps a request method and path onto a collection operation.

use crate::document::CATALOG;
use axum::http::Method;
use std::{fmt, str::FromStr};

/// Collections reachable through `/{collection}` paths, in match priority.
pub const ROUTED_COLLECTIONS: [&str; 3] = ["favorites", "orders", "cart"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// The first path segment must equal a collection name.
    #[default]
    Segment,
    /// Any path containing a collection name routes to it.
    Substring,
}

impl FromStr for MatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "segment" => Ok(MatchMode::Segment),
            "substring" => Ok(MatchMode::Substring),
            other => Err(format!("unknown route match mode '{other}'")),
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MatchMode::Segment => "segment",
            MatchMode::Substring => "substring",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    List(String),
    Append(String),
    Remove(String, Option<String>),
    Preflight,
    Unmatched,
}

#[derive(Debug, Clone)]
pub struct Router {
    prefix: String,
    mode: MatchMode,
}

impl Router {
    pub fn new(prefix: impl Into<String>, mode: MatchMode) -> Self {
        let prefix = prefix.into().trim_end_matches('/').to_owned();
        Router { prefix, mode }
    }

    /// Resolves `method` and the full request `path` (no query string).
    pub fn route(&self, method: &Method, path: &str) -> Route {
        if *method == Method::OPTIONS {
            return Route::Preflight;
        }
        let Some(rest) = path.strip_prefix(self.prefix.as_str()) else {
            return Route::Unmatched;
        };
        if !rest.is_empty() && !rest.starts_with('/') {
            return Route::Unmatched;
        }
        match self.mode {
            MatchMode::Segment => route_segments(method, rest),
            MatchMode::Substring => route_substring(method, rest),
        }
    }
}

fn operation(method: &Method, collection: &str, id: Option<&str>) -> Route {
    let collection = collection.to_owned();
    if *method == Method::GET {
        Route::List(collection)
    } else if *method == Method::POST {
        Route::Append(collection)
    } else if *method == Method::DELETE {
        Route::Remove(collection, id.map(str::to_owned))
    } else {
        Route::Unmatched
    }
}

fn route_segments(method: &Method, rest: &str) -> Route {
    let segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        [] | [CATALOG] if *method == Method::GET => Route::List(CATALOG.to_owned()),
        [name] | [name, _] if ROUTED_COLLECTIONS.contains(name) => {
            operation(method, name, segments.get(1).copied())
        }
        _ => Route::Unmatched,
    }
}

fn route_substring(method: &Method, rest: &str) -> Route {
    if (rest.is_empty() || rest == "/items") && *method == Method::GET {
        return Route::List(CATALOG.to_owned());
    }
    if ROUTED_COLLECTIONS.iter().any(|name| rest.contains(name)) {
        let mut parts = rest.get(1..).unwrap_or_default().split('/');
        let collection = parts.next().unwrap_or_default();
        return operation(method, collection, parts.next());
    }
    Route::Unmatched
}
