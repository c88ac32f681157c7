//! `AttributeValue` and the capacity-bounded, access-order-evicting
//! attribute map.

use std::borrow::Cow;

use hashbrown::HashMap;

/// A tagged-union attribute value. Immutable once constructed.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeValue {
    String(Cow<'static, str>),
    Int(i64),
    Double(f64),
    Bool(bool),
}

impl From<&'static str> for AttributeValue {
    fn from(value: &'static str) -> Self {
        AttributeValue::String(Cow::Borrowed(value))
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::String(Cow::Owned(value))
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Int(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Double(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

/// A capacity-bounded `String -> AttributeValue` map with access-order
/// (LRU) eviction: re-assigning an existing key refreshes its recency, so
/// under steady-state traffic that repeatedly updates the same keys, the
/// hot set survives and stale keys are the ones dropped.
pub struct BoundedAttributes {
    capacity: usize,
    // Most-recently-touched key is at the back.
    order: Vec<String>,
    values: HashMap<String, AttributeValue, ahash::RandomState>,
    total_recorded: u32,
}

impl BoundedAttributes {
    pub fn new(capacity: usize) -> Self {
        BoundedAttributes {
            capacity: capacity.max(1),
            order: Vec::new(),
            values: HashMap::with_hasher(ahash::RandomState::new()),
            total_recorded: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Inserts or updates `key`, moving it to the most-recently-used
    /// position. Always increments `total_recorded`, regardless of whether
    /// the key already existed.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<AttributeValue>) {
        let key = key.into();
        self.total_recorded += 1;

        if self.values.contains_key(&key) {
            self.touch(&key);
        } else {
            self.order.push(key.clone());
        }
        self.values.insert(key, value.into());

        if self.values.len() > self.capacity {
            self.evict_oldest();
        }
    }

    pub fn put_all(&mut self, entries: impl IntoIterator<Item = (String, AttributeValue)>) {
        for (key, value) in entries {
            self.put(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.values.get(key)
    }

    pub fn dropped(&self) -> u32 {
        self.total_recorded
            .saturating_sub(self.values.len() as u32)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.order
            .iter()
            .filter_map(move |k| self.values.get(k).map(|v| (k.as_str(), v)))
    }

    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            let key = self.order.remove(pos);
            self.order.push(key);
        }
    }

    fn evict_oldest(&mut self) {
        if !self.order.is_empty() {
            let oldest = self.order.remove(0);
            self.values.remove(&oldest);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // S4 — attribute eviction with cap 8: keys K0..K15 inserted, size=8,
    // dropped=8, retained are K8..K15 mapped to 8..15.
    #[test]
    fn eviction_keeps_most_recently_inserted() {
        let mut attrs = BoundedAttributes::new(8);
        for i in 0..16 {
            attrs.put(format!("K{i}"), i as i64);
        }
        assert_eq!(attrs.len(), 8);
        assert_eq!(attrs.dropped(), 8);
        for i in 8..16 {
            assert_eq!(attrs.get(&format!("K{i}")), Some(&AttributeValue::Int(i)));
        }
        for i in 0..8 {
            assert!(attrs.get(&format!("K{i}")).is_none());
        }
    }

    // S5 — re-insertion refreshes recency.
    #[test]
    fn rewrite_refreshes_recency_without_growing_size() {
        let mut attrs = BoundedAttributes::new(8);
        for i in 0..16 {
            attrs.put(format!("K{i}"), i as i64);
        }
        for i in 0..4 {
            attrs.put(format!("K{i}"), i as i64);
        }
        assert_eq!(attrs.len(), 8);
        assert_eq!(attrs.dropped(), 12);
        for i in 12..16 {
            assert_eq!(attrs.get(&format!("K{i}")), Some(&AttributeValue::Int(i)));
        }
        for i in 0..4 {
            assert_eq!(attrs.get(&format!("K{i}")), Some(&AttributeValue::Int(i)));
        }
    }

    #[test]
    fn rewrite_never_increases_size_but_always_increments_dropped() {
        let mut attrs = BoundedAttributes::new(4);
        attrs.put("a", 1i64);
        attrs.put("b", 2i64);
        attrs.put("a", 3i64);
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs.dropped(), 1);
        attrs.put("a", 4i64);
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs.dropped(), 2);
    }
}
