// Copyright (c) 2016 - 2017 Markus Kohlhase <mail@markus-kohlhase.de>

//! The backend of the sneakers storefront demo.
//!
//! Catalog items, favorites, orders and cart lines live in one JSON file
//! that maps each collection name to an array of items. Every request loads
//! the whole file and every change rewrites it.
//!
//! **WARNING**:
//! Don't use it if you want to persist a large amount of objects.
//! Use a real DB instead.
//!
//! # Example
//!
//! ```rust,no_run
//! use sneaker_store::{Collections, FileStore};
//! use serde_json::json;
//!
//! let db = FileStore::open("db.json").unwrap();
//! let shop = Collections::new(db);
//! let item = json!({ "id": 7, "name": "Air Max" });
//! let cart = shop.append("cart", item.as_object().unwrap().clone()).unwrap();
//! assert_eq!(cart.last(), Some(&item));
//! shop.remove_by_id("cart", Some("7")).unwrap();
//! ```
//!
//! If you like to pretty print the file content, set `pretty` to `true`
//! and choose a number of whitespaces for the indention:
//!
//! ```rust,no_run
//! let mut cfg = sneaker_store::FileStoreConfig::default();
//! cfg.pretty = true;  // false is default
//! cfg.indent = 4;     // 2 is default
//! let db = sneaker_store::FileStore::open_with_cfg("db.json", cfg);
//! ```

pub mod collections;
pub mod config;
pub mod document;
pub mod error;
mod file_store;
mod json_store;
mod memory_store;
pub mod router;
pub mod server;

pub use crate::{
    collections::Collections,
    config::Config,
    document::{Document, Item},
    error::{Error, InternalError},
    file_store::{Config as FileStoreConfig, FileStore},
    json_store::JsonStore,
    memory_store::MemoryStore,
    server::{app, AppState},
};
