//! Sequential execution of a node graph
//!
//! The scheduler walks the graph iteratively with an explicit stack of
//! pending continuations, so chains of any length run without native
//! recursion.
//!
//! ## Walk
//!
//! ```text
//! descend(node):
//!     mark Bound
//!     Chain/Catch -> push frame, descend(parent)
//!     Join        -> push frame(second), descend(first)
//!     Query       -> execute now, settle
//!     Ready       -> settle
//!
//! loop: pop frame, feed it the last outcome
//!     a continuation that returns a node pushes Follow and descends into it
//! ```
//!
//! Every query executes exactly once, at the moment its node is bound, and
//! only one statement is ever in flight on the transaction.
//!
//! ## Node states
//!
//! ```text
//! Pending ──bind──> Bound ──settle──> Resolved | Rejected
//! ```

use crate::node::{Combiner, Continuation, Next, NodeId, NodeKind, Recovery, TxMonad};
use indexmap::IndexMap;
use rowgraph_core::{Executor, Query, Result, Value};

/// Lifecycle state of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// Built, no transaction yet
    Pending,
    /// Transaction supplied, outcome not known yet
    Bound,
    /// Settled with a value
    Resolved,
    /// Settled with an error
    Rejected,
}

impl NodeState {
    /// Check whether the state is terminal
    pub fn is_settled(&self) -> bool {
        matches!(self, NodeState::Resolved | NodeState::Rejected)
    }
}

/// Record of one run: executed statements and final node states
#[derive(Debug, Clone, Default)]
pub struct RunTrace {
    executed: Vec<Query>,
    states: IndexMap<NodeId, NodeState>,
}

impl RunTrace {
    /// Statements sent to the transaction, in order
    pub fn executed(&self) -> &[Query] {
        &self.executed
    }

    /// Statement texts sent to the transaction, in order
    pub fn executed_texts(&self) -> Vec<&str> {
        self.executed.iter().map(|q| q.text.as_str()).collect()
    }

    /// State of a node; nodes the run never reached are `Pending`
    pub fn state(&self, id: NodeId) -> NodeState {
        self.states.get(&id).copied().unwrap_or(NodeState::Pending)
    }

    /// Nodes the run bound, in binding order
    pub fn bound_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.states.keys().copied()
    }
}

enum Frame {
    Chain { id: NodeId, f: Continuation },
    Catch { id: NodeId, f: Recovery },
    JoinSecond { id: NodeId, second: Box<TxMonad>, f: Combiner },
    JoinCombine { id: NodeId, first: Value, f: Combiner },
    Follow { id: NodeId },
}

pub(crate) struct Scheduler<'t> {
    tx: &'t mut dyn Executor,
    stack: Vec<Frame>,
    trace: RunTrace,
}

impl<'t> Scheduler<'t> {
    pub(crate) fn new(tx: &'t mut dyn Executor) -> Self {
        Scheduler {
            tx,
            stack: Vec::new(),
            trace: RunTrace::default(),
        }
    }

    pub(crate) fn run(mut self, root: TxMonad) -> (Result<Value>, RunTrace) {
        let root_id = root.id;
        let mut outcome = self.descend(root);
        while let Some(frame) = self.stack.pop() {
            outcome = self.resume(frame, outcome);
        }
        tracing::debug!(
            node = %root_id,
            queries = self.trace.executed.len(),
            ok = outcome.is_ok(),
            "deferred chain settled"
        );
        (outcome, self.trace)
    }

    fn descend(&mut self, root: TxMonad) -> Result<Value> {
        let mut node = root;
        loop {
            let id = node.id;
            self.transition(id, NodeState::Bound);
            match node.take_kind() {
                NodeKind::Ready(result) => return self.settle(id, result),
                NodeKind::Query(query) => {
                    let result = self.execute(&query);
                    self.trace.executed.push(query);
                    return self.settle(id, result);
                }
                NodeKind::Chain { parent, f } => {
                    self.stack.push(Frame::Chain { id, f });
                    node = *parent;
                }
                NodeKind::Catch { parent, f } => {
                    self.stack.push(Frame::Catch { id, f });
                    node = *parent;
                }
                NodeKind::Join { first, second, f } => {
                    self.stack.push(Frame::JoinSecond { id, second, f });
                    node = *first;
                }
            }
        }
    }

    fn resume(&mut self, frame: Frame, outcome: Result<Value>) -> Result<Value> {
        match frame {
            Frame::Chain { id, f } => match outcome {
                Ok(value) => self.follow(id, f(value)),
                Err(e) => self.settle(id, Err(e)),
            },
            Frame::Catch { id, f } => match outcome {
                Ok(value) => self.settle(id, Ok(value)),
                Err(e) => {
                    tracing::trace!(node = %id, error = %e, "recovering rejection");
                    self.follow(id, f(e))
                }
            },
            Frame::JoinSecond { id, second, f } => match outcome {
                Ok(first) => {
                    self.stack.push(Frame::JoinCombine { id, first, f });
                    self.descend(*second)
                }
                Err(e) => self.settle(id, Err(e)),
            },
            Frame::JoinCombine { id, first, f } => match outcome {
                Ok(second) => self.follow(id, f(first, second)),
                Err(e) => self.settle(id, Err(e)),
            },
            Frame::Follow { id } => self.settle(id, outcome),
        }
    }

    fn follow(&mut self, id: NodeId, next: Result<Next>) -> Result<Value> {
        match next {
            Ok(Next::Value(value)) => self.settle(id, Ok(value)),
            Ok(Next::Node(node)) => {
                self.stack.push(Frame::Follow { id });
                self.descend(node)
            }
            Err(e) => self.settle(id, Err(e)),
        }
    }

    fn execute(&mut self, query: &Query) -> Result<Value> {
        tracing::debug!(sql = %query.text, params = query.values.len(), "executing deferred query");
        self.tx
            .execute_query(query)
            .map(|rows| Value::Array(rows.into_iter().map(Value::Object).collect()))
            .map_err(|e| e.with_query(&query.text, &query.values))
    }

    fn settle(&mut self, id: NodeId, result: Result<Value>) -> Result<Value> {
        let state = if result.is_ok() {
            NodeState::Resolved
        } else {
            NodeState::Rejected
        };
        self.transition(id, state);
        result
    }

    fn transition(&mut self, id: NodeId, state: NodeState) {
        tracing::trace!(node = %id, ?state, "node transition");
        self.trace.states.insert(id, state);
    }
}
