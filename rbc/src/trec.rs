use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use crate::error::ParseError;
use crate::TopicId;

/// One line of a TREC run: `<topic> Q0 <docno> <rank> <score> <tag>`.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    pub topic: TopicId,
    pub doc_id: String,
    /// 1-based rank as written in the file.
    pub rank: u32,
    pub score: Option<f64>,
    pub tag: Option<String>,
}

/// A parsed run file.
#[derive(Debug, Default, Clone)]
pub struct Run {
    topics: Vec<TopicId>,
    records: Vec<RunRecord>,
    max_rank: u32,
}

impl Run {
    pub fn new() -> Self { Self::default() }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ParseError> {
        let f = File::open(path)?;
        Self::from_reader(BufReader::new(f))
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, ParseError> {
        let mut run = Run::new();
        let mut seen: HashSet<TopicId> = HashSet::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() { continue; }
            let rec = parse_line(&line, i + 1)?;
            if seen.insert(rec.topic) {
                run.topics.push(rec.topic);
            }
            run.max_rank = run.max_rank.max(rec.rank);
            run.records.push(rec);
        }
        Ok(run)
    }

    /// Append a record, tracking its topic and rank.
    pub fn push(&mut self, rec: RunRecord) {
        if !self.topics.contains(&rec.topic) {
            self.topics.push(rec.topic);
        }
        self.max_rank = self.max_rank.max(rec.rank);
        self.records.push(rec);
    }

    /// Distinct topics in first-seen order.
    pub fn topics(&self) -> &[TopicId] { &self.topics }

    pub fn records(&self) -> &[RunRecord] { &self.records }

    /// Deepest rank in the run, 0 when empty.
    pub fn max_rank(&self) -> u32 { self.max_rank }

    /// Average records per topic, rounded up. Used to size accumulators.
    pub fn docs_per_topic(&self) -> usize {
        if self.topics.is_empty() {
            return 0;
        }
        self.records.len().div_ceil(self.topics.len())
    }

    pub fn len(&self) -> usize { self.records.len() }

    pub fn is_empty(&self) -> bool { self.records.is_empty() }
}

impl FromStr for Run {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> { Self::from_reader(s.as_bytes()) }
}

fn parse_line(line: &str, lineno: usize) -> Result<RunRecord, ParseError> {
    let mut fields = line.split_whitespace();
    let mut next = |field: &'static str| fields.next().ok_or(ParseError::MissingField { line: lineno, field });

    let topic_raw = next("topic")?;
    let _q0 = next("Q0")?;
    let doc_id = next("docno")?.to_string();
    let rank_raw = next("rank")?;
    let score_raw = next("score").ok();
    let tag = next("tag").ok().map(str::to_string);

    let topic = topic_raw
        .parse::<TopicId>()
        .map_err(|_| ParseError::InvalidTopic { line: lineno, value: topic_raw.to_string() })?;
    let rank = rank_raw
        .parse::<u32>()
        .map_err(|_| ParseError::InvalidRank { line: lineno, value: rank_raw.to_string() })?;
    let score = score_raw
        .map(|s| s.parse::<f64>().map_err(|_| ParseError::InvalidScore { line: lineno, value: s.to_string() }))
        .transpose()?;

    Ok(RunRecord { topic, doc_id, rank, score, tag })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_standard_line() {
        let run: Run = "401 Q0 FT911-3 1 12.5 bm25\n".parse().unwrap();
        assert_eq!(run.len(), 1);
        let rec = &run.records()[0];
        assert_eq!(rec.topic, 401);
        assert_eq!(rec.doc_id, "FT911-3");
        assert_eq!(rec.rank, 1);
        assert_eq!(rec.score, Some(12.5));
        assert_eq!(rec.tag.as_deref(), Some("bm25"));
    }

    #[test]
    fn reports_line_numbers() {
        let err = "401 Q0 a 1 1.0 x\n\n401 Q0 b two 0.5 x\n".parse::<Run>().unwrap_err();
        match err {
            ParseError::InvalidRank { line, value } => {
                assert_eq!(line, 3);
                assert_eq!(value, "two");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn push_tracks_topics_and_depth() {
        let mut run = Run::new();
        for (topic, doc, rank) in [(7, "a", 1), (3, "b", 4), (7, "c", 2)] {
            run.push(RunRecord { topic, doc_id: doc.into(), rank, score: None, tag: None });
        }
        assert_eq!(run.topics(), &[7, 3]);
        assert_eq!(run.max_rank(), 4);
        assert_eq!(run.docs_per_topic(), 2);
        assert_eq!(Run::new().docs_per_topic(), 0);
    }

    #[test]
    fn negative_topics_parse() {
        let run: Run = "-3 Q0 a 1 0.5 x\n".parse().unwrap();
        assert_eq!(run.topics(), &[-3]);
    }

    #[test]
    fn malformed_score_is_rejected() {
        let err = "401 Q0 a 1 abc x\n".parse::<Run>().unwrap_err();
        assert!(matches!(err, ParseError::InvalidScore { line: 1, .. }));
    }
}
