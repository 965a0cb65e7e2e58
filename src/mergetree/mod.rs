//! Merge-tree read path.
//!
//! A split's files are partitioned into key-disjoint [`Section`]s of
//! [`SortedRun`]s. Single-run sections are concatenated; overlapping sections
//! are sort-merged and reduced by a [`MergeFunction`]. The section readers are
//! chained lazily by [`ConcatRecordReader`].

pub mod compact;
pub mod concat;
pub mod drop_delete;
pub mod interval;
pub mod readers;
pub mod reverse;
pub mod sort;
pub mod sorted_run;

pub use compact::{AdjustedProjection, MergeFunction, MergeFunctionFactory, ReducerMergeFunctionWrapper};
pub use concat::ConcatRecordReader;
pub use drop_delete::DropDeleteReader;
pub use interval::{IntervalPartition, Section};
pub use readers::{read_for_section, read_for_sorted_run};
pub use reverse::ReverseReader;
pub use sort::{KeyGroupStream, SortMergeReader};
pub use sorted_run::SortedRun;
