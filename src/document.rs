use serde_json::{value::Map, Value};

/// A single record of a collection: a JSON object with a numeric `id` by convention.
pub type Item = Map<String, Value>;

/// The whole persisted store: collection name to ordered items.
pub type Document = Map<String, Value>;

/// The collections every document is guaranteed to carry.
pub const KNOWN_COLLECTIONS: [&str; 4] = ["items", "favorites", "orders", "cart"];

/// Collection served for `GET /` and `GET /items`.
pub const CATALOG: &str = "items";

/// Returns the canonical empty document with all known collections present.
pub fn empty_document() -> Document {
    let mut doc = Document::new();
    normalize(&mut doc);
    doc
}

/// Fills in any known collection missing from `doc` with an empty sequence.
///
/// Returns `true` if the document was changed.
pub fn normalize(doc: &mut Document) -> bool {
    let mut changed = false;
    for name in KNOWN_COLLECTIONS {
        if !doc.contains_key(name) {
            doc.insert(name.to_owned(), Value::Array(vec![]));
            changed = true;
        }
    }
    changed
}

/// Coerces a path segment to the number an item `id` is compared against.
///
/// Blank input coerces to zero and unsigned `0x`/`0o`/`0b` literals are read in
/// their radix. Text that is not a finite number yields `None` and can never
/// match an item.
pub fn coerce_id(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    if let Some(n) = radix_literal(trimmed) {
        return Some(n);
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Unsigned `0x`, `0o` and `0b` literals, case-insensitive.
fn radix_literal(text: &str) -> Option<f64> {
    let (radix, digits) = match text.get(..2)?.to_ascii_lowercase().as_str() {
        "0x" => (16, &text[2..]),
        "0o" => (8, &text[2..]),
        "0b" => (2, &text[2..]),
        _ => return None,
    };
    if digits.is_empty() {
        return None;
    }
    digits
        .chars()
        .try_fold(0.0_f64, |acc, c| {
            c.to_digit(radix)
                .map(|d| acc * f64::from(radix) + f64::from(d))
        })
        .filter(|n| n.is_finite())
}

/// Returns `true` if `value` is an object whose numeric `id` equals `id`.
#[allow(clippy::float_cmp)]
pub fn has_id(value: &Value, id: f64) -> bool {
    value
        .get("id")
        .and_then(Value::as_f64)
        .is_some_and(|x| x == id)
}
