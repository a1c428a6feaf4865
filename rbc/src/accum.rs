use crate::error::{RbcError, Result};
use crate::table::ProbeTable;
use crate::TopicId;

/// Per-topic map from document id to its running weighted score.
pub struct DocAccumulator {
    table: ProbeTable<String, f64>,
}

impl DocAccumulator {
    pub fn new() -> Self { Self::with_capacity(0) }

    /// Sized for `expected` documents; the table doubles past that as needed.
    pub fn with_capacity(expected: usize) -> Self {
        Self { table: ProbeTable::with_capacity(expected) }
    }

    /// Add `delta` to `doc_id`'s score, inserting it at `delta` if unseen.
    pub fn upsert(&mut self, doc_id: &str, delta: f64) -> Result<()> {
        if let Some(score) = self.table.get_mut(doc_id) {
            *score += delta;
            return Ok(());
        }
        self.table.insert(doc_id.to_owned(), delta)?;
        Ok(())
    }

    pub fn score(&self, doc_id: &str) -> Option<f64> { self.table.get(doc_id).copied() }

    /// Every `(doc_id, score)` pair, in probe-table order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.table.iter().map(|(d, s)| (d.as_str(), *s))
    }

    pub fn len(&self) -> usize { self.table.len() }

    pub fn is_empty(&self) -> bool { self.table.is_empty() }

    pub fn capacity(&self) -> usize { self.table.capacity() }
}

impl Default for DocAccumulator {
    fn default() -> Self { Self::new() }
}

/// Owns one [`DocAccumulator`] per topic.
pub struct TopicTable {
    table: ProbeTable<TopicId, DocAccumulator>,
}

impl TopicTable {
    pub fn new() -> Self { Self { table: ProbeTable::new() } }

    /// One empty accumulator per topic, each sized for `expected_docs`.
    pub fn with_topics(topics: &[TopicId], expected_docs: usize) -> Result<Self> {
        let mut t = Self { table: ProbeTable::with_capacity(topics.len()) };
        for &topic in topics {
            t.insert(topic, expected_docs)?;
        }
        Ok(t)
    }

    /// Add an empty accumulator for `topic`. Returns false if it was already present.
    pub fn insert(&mut self, topic: TopicId, expected_docs: usize) -> Result<bool> {
        if self.table.contains_key(&topic) {
            return Ok(false);
        }
        self.table.insert(topic, DocAccumulator::with_capacity(expected_docs))?;
        Ok(true)
    }

    pub fn contains(&self, topic: TopicId) -> bool { self.table.contains_key(&topic) }

    pub fn get(&self, topic: TopicId) -> Option<&DocAccumulator> { self.table.get(&topic) }

    pub fn lookup_mut(&mut self, topic: TopicId) -> Result<&mut DocAccumulator> {
        self.table.get_mut(&topic).ok_or(RbcError::UnknownTopic(topic))
    }

    pub fn len(&self) -> usize { self.table.len() }

    pub fn is_empty(&self) -> bool { self.table.is_empty() }
}

impl Default for TopicTable {
    fn default() -> Self { Self::new() }
}
