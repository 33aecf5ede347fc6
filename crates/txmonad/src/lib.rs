//! Deferred transaction composition
//!
//! Build a graph of [`TxMonad`] nodes without a transaction, then run it
//! with [`TxMonad::run_within`]. Queries execute strictly one after another
//! on the supplied transaction.

#![warn(missing_docs)]

mod node;
mod scheduler;


pub use node::{Next, NodeId, TxMonad};
pub use scheduler::{NodeState, RunTrace};
