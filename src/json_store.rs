use crate::{
    document::{empty_document, normalize, Document},
    error::InternalError,
};
use log::debug;
use serde_json::Value;
use std::result;

pub type Result<T> = result::Result<T, InternalError>;

/// Whole-document persistence: every load reads everything, every save
/// replaces everything.
pub trait JsonStore: Send + Sync {
    fn load(&self) -> Result<Document>;
    fn save(&self, doc: &Document) -> Result<()>;
}

impl<S: JsonStore + ?Sized> JsonStore for Box<S> {
    fn load(&self) -> Result<Document> {
        (**self).load()
    }

    fn save(&self, doc: &Document) -> Result<()> {
        (**self).save(doc)
    }
}

/// Parses raw store content into a canonical document.
///
/// Blank content and the legacy `[]` both yield the empty document.
pub(crate) fn parse_document(content: &str) -> Result<Document> {
    let (doc, repaired) = read_document(content)?;
    if repaired {
        debug!("Filled missing collections of the store document");
    }
    Ok(doc)
}

/// Like [`parse_document`], also telling whether the content had to be
/// completed to reach the canonical shape.
pub(crate) fn read_document(content: &str) -> Result<(Document, bool)> {
    if content.trim().is_empty() {
        return Ok((empty_document(), true));
    }
    match serde_json::from_str::<Value>(content)? {
        Value::Object(mut doc) => {
            let repaired = normalize(&mut doc);
            Ok((doc, repaired))
        }
        Value::Array(a) if a.is_empty() => Ok((empty_document(), true)),
        other => Err(InternalError::InvalidDocument(format!(
            "expected an object of collections, found {}",
            kind(&other)
        ))),
    }
}

fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
