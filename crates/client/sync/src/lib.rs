//! Replay sync: discovers sequentially-numbered snapshot files across the
//! configured storage roots and feeds them, strictly in height order,
//! through a single decode → reconstruct → submit pipeline.
//!
//! Two tasks share nothing but an unbounded FIFO of file paths: the
//! discovery producer owns the height cursor and only ever advances it
//! after enqueueing a file for the current height; the consumer decodes
//! each file and submits one batch of replay instructions per file before
//! dequeuing the next, which keeps the execution node's height and the
//! cursor approximately in lockstep.

mod discovery;
mod replay;
mod sync;

pub use replay::build_instruction;
pub use sync::{sync_worker, SyncConfig};

use std::path::PathBuf;

/// Queue item: a snapshot file to replay, or [`None`] to tell the consumer
/// to flush and stop.
pub(crate) type QueueItem = Option<PathBuf>;
