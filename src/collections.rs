//! List, append and remove operations over the named collections of a store.

use crate::{
    document::{coerce_id, has_id, Document, Item},
    error::{Error, Result},
    json_store::JsonStore,
};
use log::{debug, warn};
use parking_lot::Mutex;
use serde_json::Value;

/// Serializes every load-modify-save cycle against one store.
pub struct Collections<S> {
    store: S,
    lock: Mutex<()>,
}

impl<S: JsonStore> Collections<S> {
    pub fn new(store: S) -> Self {
        Collections {
            store,
            lock: Mutex::new(()),
        }
    }

    /// Returns the items of `collection` in insertion order.
    pub fn list(&self, collection: &str) -> Result<Vec<Value>> {
        let _guard = self.lock.lock();
        let mut doc = self.store.load()?;
        take_items(&mut doc, collection)
    }

    /// Pushes `item` to the end of `collection` and returns the new sequence.
    pub fn append(&self, collection: &str, item: Item) -> Result<Vec<Value>> {
        let _guard = self.lock.lock();
        let mut doc = self.store.load()?;
        let items = items_mut(&mut doc, collection)?;
        if let Some(id) = item.get("id").and_then(Value::as_f64) {
            if items.iter().any(|v| has_id(v, id)) {
                warn!("Appending duplicate id {id} to {collection}");
            }
        }
        items.push(Value::Object(item));
        let updated = items.clone();
        self.store.save(&doc)?;
        debug!("Appended to {collection}, now {} items", updated.len());
        Ok(updated)
    }

    /// Removes the first item of `collection` whose numeric `id` equals `id`.
    ///
    /// Nothing is written when no item matches.
    pub fn remove_by_id(&self, collection: &str, id: Option<&str>) -> Result<Vec<Value>> {
        let wanted = id.and_then(coerce_id).ok_or_else(Error::not_found)?;
        let _guard = self.lock.lock();
        let mut doc = self.store.load()?;
        let items = items_mut(&mut doc, collection)?;
        let idx = items
            .iter()
            .position(|v| has_id(v, wanted))
            .ok_or_else(Error::not_found)?;
        items.remove(idx);
        let updated = items.clone();
        self.store.save(&doc)?;
        debug!("Removed id {wanted} from {collection}");
        Ok(updated)
    }
}

fn items_mut<'a>(doc: &'a mut Document, collection: &str) -> Result<&'a mut Vec<Value>> {
    match doc.get_mut(collection) {
        Some(Value::Array(items)) => Ok(items),
        _ => Err(Error::not_found()),
    }
}

fn take_items(doc: &mut Document, collection: &str) -> Result<Vec<Value>> {
    Ok(std::mem::take(items_mut(doc, collection)?))
}
