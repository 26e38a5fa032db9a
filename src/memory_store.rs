use crate::{
    document::{empty_document, Document},
    json_store::{parse_document, JsonStore, Result},
};
use parking_lot::RwLock;
use std::sync::Arc;

/// A document that lives only as long as the process.
///
/// Clones share the same document.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    mem: Arc<RwLock<Document>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        MemoryStore {
            mem: Arc::new(RwLock::new(empty_document())),
        }
    }
}

impl MemoryStore {
    /// Seeds the store from raw JSON, with the same rules as a store file.
    pub fn from_json(content: &str) -> Result<MemoryStore> {
        Ok(MemoryStore {
            mem: Arc::new(RwLock::new(parse_document(content)?)),
        })
    }
}

impl JsonStore for MemoryStore {
    fn load(&self) -> Result<Document> {
        Ok(self.mem.read().clone())
    }

    fn save(&self, doc: &Document) -> Result<()> {
        *self.mem.write() = doc.clone();
        Ok(())
    }
}
