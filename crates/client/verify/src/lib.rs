//! Divergence verification.
//!
//! Both procedures compare the replayed chain against its canonical source
//! through one primitive: do the two endpoints report the same block hash
//! at a given height? [`bisect`] locates the lowest diverging height with a
//! logarithmic search; [`watch`] polls ahead with a fixed stride as the
//! replay progresses and shuts the node down on the first mismatch, since
//! a diverged replay is not worth continuing.

mod bisect;
mod watch;

pub use bisect::{find_divergence, lowest_mismatch};
pub use watch::{watch_divergence, WatchConfig};
