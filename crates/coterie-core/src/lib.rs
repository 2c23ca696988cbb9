// Allow minor clippy style warnings at crate level
// These are mostly style preferences, not bugs
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::derive_partial_eq_without_eq)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::uninlined_format_args)]

//! Co-occurrence graphs of people and their maximal cliques.
//!
//! People mentioned together in a sentence become adjacent in an undirected
//! graph. Maximal cliques of that graph are groups that were all seen with
//! each other; optionally each clique absorbs outsiders that miss only one
//! member.
//!
//! - [`collect`] - mentions -> identity sets, with reference selection
//! - [`CoOccurrenceGraph`] - mutable graph built during ingestion
//! - [`FrozenGraph`] - read-only adjacency searched by the algorithms
//! - [`links::LinkTable`] - best external reference per identity
//! - [`algo::cliques`] - maximal clique enumeration, per component
//! - [`algo::almost`] - almost-clique expansion
//! - [`pipeline`] - the whole job
//!
//! # Example
//!
//! ```rust
//! use coterie_core::algo::cliques::maximal_cliques;
//! use coterie_core::CoOccurrenceGraph;
//!
//! let mut g = CoOccurrenceGraph::new();
//! g.add_co_occurrence(["A", "B", "C"]);
//! g.add_co_occurrence(["A", "D"]);
//!
//! let frozen = g.freeze(1);
//! let mut cliques = maximal_cliques(&frozen);
//! cliques.sort();
//! assert_eq!(cliques, vec![vec![0, 1, 2], vec![0, 3]]);
//! ```

pub mod algo;
pub mod collect;
pub mod config;
mod error;
pub mod formats;
mod graph;
mod identity;
pub mod links;
pub mod pipeline;
pub mod resolve;

pub use config::PipelineConfig;
pub use error::{Error, Result};
pub use graph::{CoOccurrenceGraph, FrozenGraph, GraphStats};
pub use identity::{IdentityId, PersonIdentity, ScoredReference};
pub use links::LinkTable;

// Re-export petgraph for callers that want the ingestion graph's internals
pub use petgraph;
