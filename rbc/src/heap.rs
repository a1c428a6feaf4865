//! Binary min-heap used to pull ranked documents out of an accumulator.

use std::cmp::Ordering;

use crate::accum::DocAccumulator;

/// A document and its fused score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredDoc<'a> {
    pub doc_id: &'a str,
    pub score: f64,
}

impl ScoredDoc<'_> {
    /// Heap order: score ascending, then doc id descending.
    ///
    /// Reversed into a descending ranking, tied documents therefore come out
    /// in ascending doc-id order.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.doc_id.cmp(self.doc_id))
    }
}

/// Min-heap of [`ScoredDoc`], optionally bounded to the `k` best entries.
pub struct TopKHeap<'a> {
    heap: Vec<ScoredDoc<'a>>,
    bound: Option<usize>,
}

impl<'a> TopKHeap<'a> {
    pub fn new() -> Self { Self { heap: Vec::new(), bound: None } }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { heap: Vec::with_capacity(capacity), bound: None }
    }

    /// Keeps only the `k` highest-ordered entries. `k == 0` keeps nothing.
    pub fn bounded(k: usize) -> Self {
        Self { heap: Vec::with_capacity(k.saturating_add(1).min(1 << 20)), bound: Some(k) }
    }

    pub fn from_accumulator(accum: &'a DocAccumulator) -> Self {
        let mut heap = Self::with_capacity(accum.len());
        heap.extend_from(accum);
        heap
    }

    pub fn bounded_from_accumulator(accum: &'a DocAccumulator, k: usize) -> Self {
        let mut heap = Self::bounded(k);
        heap.extend_from(accum);
        heap
    }

    fn extend_from(&mut self, accum: &'a DocAccumulator) {
        for (doc_id, score) in accum.entries() {
            self.insert(doc_id, score);
        }
    }

    /// Returns false if a full bounded heap rejected the entry.
    pub fn insert(&mut self, doc_id: &'a str, score: f64) -> bool {
        let doc = ScoredDoc { doc_id, score };
        match self.bound {
            Some(k) if self.heap.len() >= k => {
                let beats_min = self.heap.first().is_some_and(|min| doc.rank_cmp(min) == Ordering::Greater);
                if !beats_min {
                    return false;
                }
                self.heap[0] = doc;
                self.sift_down(0);
                true
            }
            _ => {
                self.heap.push(doc);
                self.sift_up(self.heap.len() - 1);
                true
            }
        }
    }

    pub fn peek_min(&self) -> Option<&ScoredDoc<'a>> { self.heap.first() }

    pub fn extract_min(&mut self) -> Option<ScoredDoc<'a>> {
        if self.heap.is_empty() {
            return None;
        }
        let min = self.heap.swap_remove(0);
        if !self.heap.is_empty() {
            self.sift_down(0);
        }
        Some(min)
    }

    /// Consume the heap, lowest entry first.
    pub fn drain_ascending(self) -> DrainAscending<'a> { DrainAscending { heap: self } }

    pub fn len(&self) -> usize { self.heap.len() }

    pub fn is_empty(&self) -> bool { self.heap.is_empty() }

    fn less(&self, a: usize, b: usize) -> bool {
        self.heap[a].rank_cmp(&self.heap[b]) == Ordering::Less
    }

    fn sift_up(&mut self, mut i: usize) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if !self.less(i, parent) {
                break;
            }
            self.heap.swap(i, parent);
            i = parent;
        }
    }

    fn sift_down(&mut self, mut i: usize) {
        let n = self.heap.len();
        loop {
            let left = 2 * i + 1;
            let right = left + 1;
            let mut smallest = i;
            if left < n && self.less(left, smallest) {
                smallest = left;
            }
            if right < n && self.less(right, smallest) {
                smallest = right;
            }
            if smallest == i {
                break;
            }
            self.heap.swap(i, smallest);
            i = smallest;
        }
    }
}

impl Default for TopKHeap<'_> {
    fn default() -> Self { Self::new() }
}

pub struct DrainAscending<'a> {
    heap: TopKHeap<'a>,
}

impl<'a> Iterator for DrainAscending<'a> {
    type Item = ScoredDoc<'a>;

    fn next(&mut self) -> Option<Self::Item> { self.heap.extract_min() }

    fn size_hint(&self) -> (usize, Option<usize>) { (self.heap.len(), Some(self.heap.len())) }
}

impl ExactSizeIterator for DrainAscending<'_> {}
