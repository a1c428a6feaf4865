//! Rank-biased fusion of several runs into one ranking per topic.
//!
//! The engine moves through three states. The first [`FusionEngine::register_topics`]
//! call leaves `Uninitialized`; [`FusionEngine::present`] ends in `Presented`,
//! after which nothing else may be called.

use std::fmt;
use std::io::Write;

use crate::accum::{DocAccumulator, TopicTable};
use crate::error::{RbcError, Result};
use crate::heap::TopKHeap;
use crate::trec::Run;
use crate::weights::WeightSchedule;
use crate::TopicId;

/// Placeholder column written between the topic and the document id.
pub const ITER_PLACEHOLDER: &str = "Q0";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    Accumulating,
    Presented,
}

impl EngineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Accumulating => "accumulating",
            Self::Presented => "presented",
        }
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AccumulateSummary {
    pub weighted: usize,
    pub skipped: usize,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PresentSummary {
    pub topics: usize,
    pub lines: usize,
}

/// One output row of a topic's fused ranking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedDoc<'a> {
    pub doc_id: &'a str,
    /// 1-based output rank.
    pub rank: usize,
    /// Accumulated weight.
    pub score: f64,
    /// Index in the topic's full ascending-score order.
    pub position: usize,
}

impl RankedDoc<'_> {
    /// Value written in the score column: ascending position plus accumulated weight.
    pub fn printed_score(&self) -> f64 { self.position as f64 + self.score }
}

pub struct FusionEngine {
    state: EngineState,
    weights: WeightSchedule,
    topics: TopicTable,
    order: Vec<TopicId>,
    late: Vec<TopicId>,
}

impl FusionEngine {
    pub fn new() -> Self {
        Self {
            state: EngineState::Uninitialized,
            weights: WeightSchedule::new(),
            topics: TopicTable::new(),
            order: Vec::new(),
            late: Vec::new(),
        }
    }

    pub fn state(&self) -> EngineState { self.state }

    pub fn weights(&self) -> &WeightSchedule { &self.weights }

    /// Topics in output order.
    pub fn topics(&self) -> &[TopicId] { &self.order }

    /// Topics added after the first registration.
    pub fn late_topics(&self) -> &[TopicId] { &self.late }

    pub fn accumulator(&self, topic: TopicId) -> Option<&DocAccumulator> { self.topics.get(topic) }

    fn ensure_open(&self, op: &'static str) -> Result<()> {
        if self.state == EngineState::Presented {
            return Err(RbcError::InvalidState { op, state: self.state.as_str() });
        }
        Ok(())
    }

    /// Register a run's topics. Returns how many were new.
    ///
    /// The first call fixes the initial topic set. On later calls unseen
    /// topics are appended with a warning; that is recoverable. New
    /// accumulators are sized for `expected_docs` and grow from there.
    pub fn register_topics(&mut self, ids: &[TopicId], expected_docs: usize) -> Result<usize> {
        self.ensure_open("register topics")?;
        let first = self.state == EngineState::Uninitialized;
        if first {
            self.topics = TopicTable::with_topics(ids, expected_docs)?;
            self.order.reserve(ids.len() * 2);
        }

        let mut added = 0;
        for &id in ids {
            if first {
                if !self.order.contains(&id) {
                    self.order.push(id);
                    added += 1;
                }
                continue;
            }
            if self.topics.insert(id, expected_docs)? {
                tracing::warn!(topic = id, "lazy add topic");
                self.order.push(id);
                self.late.push(id);
                added += 1;
            }
        }
        self.state = EngineState::Accumulating;
        Ok(added)
    }

    /// Make sure weights exist down to `run_len` ranks. Call once per run before accumulating it.
    pub fn extend_weights(&mut self, phi: f64, run_len: usize) -> Result<()> {
        self.ensure_open("extend weights")?;
        self.weights.extend(phi, run_len)
    }

    /// Add every record's rank weight to its (topic, document) score.
    ///
    /// Records ranked deeper than the weight table, or with rank 0, carry no
    /// weight and are skipped.
    pub fn accumulate(&mut self, run: &Run) -> Result<AccumulateSummary> {
        if self.state != EngineState::Accumulating {
            return Err(RbcError::InvalidState { op: "accumulate", state: self.state.as_str() });
        }

        let mut summary = AccumulateSummary::default();
        for rec in run.records() {
            let weight = (rec.rank as usize).checked_sub(1).and_then(|r| self.weights.get(r));
            let Some(w) = weight else {
                tracing::debug!(topic = rec.topic, doc = %rec.doc_id, rank = rec.rank, "skipping unweighted rank");
                summary.skipped += 1;
                continue;
            };
            self.topics.lookup_mut(rec.topic)?.upsert(&rec.doc_id, w)?;
            summary.weighted += 1;
        }
        Ok(summary)
    }

    /// Top `depth` documents of `topic`, best first.
    ///
    /// `depth` is clamped to the weight table length. Ties are listed in
    /// ascending doc-id order.
    pub fn ranked(&self, topic: TopicId, depth: usize) -> Result<Vec<RankedDoc<'_>>> {
        let accum = self.topics.get(topic).ok_or(RbcError::UnknownTopic(topic))?;
        let n = accum.len();
        let take = depth.min(self.weights.len()).min(n);
        let offset = n - take;

        let ascending: Vec<_> = TopKHeap::bounded_from_accumulator(accum, take).drain_ascending().collect();
        Ok(ascending
            .into_iter()
            .enumerate()
            .rev()
            .enumerate()
            .map(|(k, (j, doc))| RankedDoc {
                doc_id: doc.doc_id,
                rank: k + 1,
                score: doc.score,
                position: offset + j,
            })
            .collect())
    }

    /// Write the fused ranking of every topic in first-seen order.
    ///
    /// Each line is `<topic> Q0 <doc> <rank> <score> <run_id>`.
    pub fn present<W: Write>(&mut self, out: &mut W, run_id: &str, depth: usize) -> Result<PresentSummary> {
        if depth < 1 {
            return Err(RbcError::InvalidDepth);
        }
        if self.state != EngineState::Accumulating {
            return Err(RbcError::InvalidState { op: "present", state: self.state.as_str() });
        }
        self.state = EngineState::Presented;

        let mut summary = PresentSummary::default();
        for &topic in &self.order {
            let rows = self.ranked(topic, depth)?;
            if rows.is_empty() {
                tracing::warn!(topic, "no weighted documents for topic");
                continue;
            }
            for row in &rows {
                writeln!(
                    out,
                    "{} {} {} {} {:.4} {}",
                    topic,
                    ITER_PLACEHOLDER,
                    row.doc_id,
                    row.rank,
                    row.printed_score(),
                    run_id
                )?;
            }
            summary.topics += 1;
            summary.lines += rows.len();
        }
        Ok(summary)
    }
}

impl Default for FusionEngine {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trec::RunRecord;

    fn run(rows: &[(TopicId, &str, u32)]) -> Run {
        let mut r = Run::new();
        for &(topic, doc, rank) in rows {
            r.push(RunRecord { topic, doc_id: doc.into(), rank, score: None, tag: None });
        }
        r
    }

    fn ingest(engine: &mut FusionEngine, r: &Run) {
        engine.register_topics(r.topics(), r.docs_per_topic()).unwrap();
        engine.extend_weights(0.8, r.max_rank() as usize).unwrap();
        engine.accumulate(r).unwrap();
    }

    #[test]
    fn state_transitions() {
        let mut e = FusionEngine::new();
        assert_eq!(e.state(), EngineState::Uninitialized);
        let r = run(&[(1, "A", 1)]);
        assert!(matches!(e.accumulate(&r), Err(RbcError::InvalidState { .. })));
        ingest(&mut e, &r);
        assert_eq!(e.state(), EngineState::Accumulating);
        let mut out = Vec::new();
        e.present(&mut out, "t", 10).unwrap();
        assert_eq!(e.state(), EngineState::Presented);
        assert!(matches!(e.present(&mut out, "t", 10), Err(RbcError::InvalidState { .. })));
        assert!(matches!(e.accumulate(&r), Err(RbcError::InvalidState { .. })));
        assert!(matches!(e.register_topics(&[2], 1), Err(RbcError::InvalidState { .. })));
    }

    #[test]
    fn present_before_registration_fails() {
        let mut e = FusionEngine::new();
        let mut out = Vec::new();
        assert!(matches!(e.present(&mut out, "t", 1), Err(RbcError::InvalidState { .. })));
    }

    #[test]
    fn zero_depth_is_rejected() {
        let mut e = FusionEngine::new();
        ingest(&mut e, &run(&[(1, "A", 1)]));
        let mut out = Vec::new();
        assert!(matches!(e.present(&mut out, "t", 0), Err(RbcError::InvalidDepth)));
        assert_eq!(e.state(), EngineState::Accumulating);
    }

    #[test]
    fn unregistered_topic_is_fatal() {
        let mut e = FusionEngine::new();
        ingest(&mut e, &run(&[(1, "A", 1)]));
        let stray = run(&[(9, "B", 1)]);
        assert!(matches!(e.accumulate(&stray), Err(RbcError::UnknownTopic(9))));
    }

    #[test]
    fn deep_and_zero_ranks_are_skipped() {
        let mut e = FusionEngine::new();
        let r = run(&[(1, "A", 1), (1, "B", 2)]);
        e.register_topics(r.topics(), r.docs_per_topic()).unwrap();
        e.extend_weights(0.8, 1).unwrap();
        let s = e.accumulate(&r).unwrap();
        assert_eq!(s, AccumulateSummary { weighted: 1, skipped: 1 });
        let s = e.accumulate(&run(&[(1, "C", 0)])).unwrap();
        assert_eq!(s.skipped, 1);
        assert_eq!(e.accumulator(1).unwrap().len(), 1);
    }

    #[test]
    fn ranked_positions_count_from_the_bottom() {
        let mut e = FusionEngine::new();
        ingest(&mut e, &run(&[(1, "A", 1), (1, "B", 2), (1, "C", 3), (1, "D", 4)]));
        let rows = e.ranked(1, 2).unwrap();
        let ids: Vec<&str> = rows.iter().map(|r| r.doc_id).collect();
        assert_eq!(ids, vec!["A", "B"]);
        assert_eq!(rows[0].position, 3);
        assert_eq!(rows[1].position, 2);
        assert_eq!(rows[1].rank, 2);
    }

    #[test]
    fn duplicate_ids_in_first_registration_are_listed_once() {
        let mut e = FusionEngine::new();
        assert_eq!(e.register_topics(&[3, 1, 3], 4).unwrap(), 2);
        assert_eq!(e.topics(), &[3, 1]);
        assert!(e.late_topics().is_empty());
    }
}
