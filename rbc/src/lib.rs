//! Rank-biased centroid (RBC) fusion of TREC runs.
//!
//! Each input run contributes `(1 - phi) * phi^(rank - 1)` to every
//! (topic, document) pair it ranks. Summed over all runs, these weights give
//! one consensus ranking per topic.
//!
//! ```no_run
//! use rbc::{FusionEngine, Run};
//!
//! let mut engine = FusionEngine::new();
//! for path in ["bm25.run", "dense.run"] {
//!     let run = Run::from_path(path)?;
//!     engine.register_topics(run.topics(), run.docs_per_topic())?;
//!     engine.extend_weights(0.8, run.max_rank() as usize)?;
//!     engine.accumulate(&run)?;
//! }
//! engine.present(&mut std::io::stdout().lock(), "rbc-combine", 1000)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod accum;
pub mod engine;
pub mod error;
pub mod heap;
pub mod table;
pub mod trec;
pub mod weights;

pub type TopicId = i32;

pub use accum::{DocAccumulator, TopicTable};
pub use engine::{AccumulateSummary, EngineState, FusionEngine, PresentSummary, RankedDoc};
pub use error::{ParseError, RbcError};
pub use heap::{ScoredDoc, TopKHeap};
pub use trec::{Run, RunRecord};
pub use weights::WeightSchedule;

/// Default persistence.
pub const DEFAULT_PHI: f64 = 0.8;
/// Default output depth per topic.
pub const DEFAULT_DEPTH: usize = 1000;
/// Default run tag written in the last output column.
pub const DEFAULT_RUN_ID: &str = "rbc-combine";
