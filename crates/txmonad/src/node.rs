//! Transaction monad nodes
//!
//! A [`TxMonad`] describes work that needs a transaction which does not
//! exist yet. Nodes are built bottom-up and form a graph in which every
//! node owns its predecessors:
//!
//! ```text
//! Ready(value | error)          no query, settled as soon as it is bound
//! Query(text, params)           executed once, when bound
//! Chain  { parent, f }          f(parent value), skipped on rejection
//! Catch  { parent, f }          f(parent error), pass-through on success
//! Join   { first, second, f }   first, then second, then f(a, b)
//! ```
//!
//! Nothing runs until [`TxMonad::run_within`] hands the graph a transaction.
//! Continuations return `Result<impl Into<Next>>`: a plain [`Value`]
//! resolves the node, another [`TxMonad`] is followed on the same
//! transaction, and `Err` rejects it.

use crate::scheduler::{RunTrace, Scheduler};
use rowgraph_core::{Error, Executor, Query, Result, Value};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Identifier of a node, unique within the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    fn next() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric id
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a continuation produces
pub enum Next {
    /// Resolve with a plain value
    Value(Value),
    /// Follow another node on the same transaction
    Node(TxMonad),
}

impl From<Value> for Next {
    fn from(value: Value) -> Self {
        Next::Value(value)
    }
}

impl From<TxMonad> for Next {
    fn from(node: TxMonad) -> Self {
        Next::Node(node)
    }
}

pub(crate) type Continuation = Box<dyn FnOnce(Value) -> Result<Next> + Send>;
pub(crate) type Recovery = Box<dyn FnOnce(Error) -> Result<Next> + Send>;
pub(crate) type Combiner = Box<dyn FnOnce(Value, Value) -> Result<Next> + Send>;

pub(crate) enum NodeKind {
    Ready(Result<Value>),
    Query(Query),
    Chain {
        parent: Box<TxMonad>,
        f: Continuation,
    },
    Catch {
        parent: Box<TxMonad>,
        f: Recovery,
    },
    Join {
        first: Box<TxMonad>,
        second: Box<TxMonad>,
        f: Combiner,
    },
}

/// A deferred computation bound to a future transaction
pub struct TxMonad {
    pub(crate) id: NodeId,
    pub(crate) kind: NodeKind,
}

impl TxMonad {
    fn from_kind(kind: NodeKind) -> Self {
        TxMonad {
            id: NodeId::next(),
            kind,
        }
    }

    /// Inert stand-in left behind when a node's contents are moved out
    fn vacant() -> Self {
        TxMonad {
            id: NodeId(0),
            kind: NodeKind::Ready(Ok(Value::Null)),
        }
    }

    /// Move the node's contents out, leaving it inert
    pub(crate) fn take_kind(&mut self) -> NodeKind {
        std::mem::replace(&mut self.kind, NodeKind::Ready(Ok(Value::Null)))
    }

    /// Node that executes `text` with `params` once bound.
    ///
    /// Resolves to the raw rows as an array of objects.
    pub fn new(text: impl Into<String>, params: Vec<Value>) -> Self {
        Self::query(Query::new(text, params))
    }

    /// Node that executes a query descriptor once bound
    pub fn query(query: impl Into<Query>) -> Self {
        Self::from_kind(NodeKind::Query(query.into()))
    }

    /// Node resolved with `value`, executing nothing
    pub fn unit(value: impl Into<Value>) -> Self {
        Self::from_kind(NodeKind::Ready(Ok(value.into())))
    }

    /// Node rejected with `error`, executing nothing
    pub fn reject(error: Error) -> Self {
        Self::from_kind(NodeKind::Ready(Err(error)))
    }

    /// This node's id
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The query this node executes itself, if any
    pub fn own_query(&self) -> Option<&Query> {
        match &self.kind {
            NodeKind::Query(q) => Some(q),
            _ => None,
        }
    }

    /// Sequence `f` after this node.
    ///
    /// `f` receives the resolved value; it is not called if this node
    /// rejects, and the rejection propagates.
    pub fn chain<F, N>(self, f: F) -> TxMonad
    where
        F: FnOnce(Value) -> Result<N> + Send + 'static,
        N: Into<Next>,
    {
        Self::from_kind(NodeKind::Chain {
            parent: Box::new(self),
            f: Box::new(move |value| f(value).map(Into::into)),
        })
    }

    /// Recover from a rejection of this node.
    ///
    /// Resolved values pass through untouched; on rejection `f` receives the
    /// error and its result becomes the new outcome.
    pub fn catch<F, N>(self, f: F) -> TxMonad
    where
        F: FnOnce(Error) -> Result<N> + Send + 'static,
        N: Into<Next>,
    {
        Self::from_kind(NodeKind::Catch {
            parent: Box::new(self),
            f: Box::new(move |error| f(error).map(Into::into)),
        })
    }

    /// Transform the resolved value
    pub fn map<F>(self, f: F) -> TxMonad
    where
        F: FnOnce(Value) -> Value + Send + 'static,
    {
        self.chain(move |value| Ok(f(value)))
    }

    /// Chain over an array result, passing its elements as a slice.
    ///
    /// Rejects with [`Error::InvalidOperation`] if the value is not an array.
    pub fn spread<F, N>(self, f: F) -> TxMonad
    where
        F: FnOnce(&[Value]) -> Result<N> + Send + 'static,
        N: Into<Next>,
    {
        self.chain(move |value| match value {
            Value::Array(items) => f(&items).map(Into::into),
            other => Err(Error::InvalidOperation(format!(
                "spread expects an array, got {}",
                other.type_name()
            ))),
        })
    }

    /// Combine two nodes.
    ///
    /// `first` runs to completion before `second` starts; both share the
    /// transaction, which cannot serve concurrent statements. `f` receives
    /// both values.
    pub fn join<F, N>(first: TxMonad, second: TxMonad, f: F) -> TxMonad
    where
        F: FnOnce(Value, Value) -> Result<N> + Send + 'static,
        N: Into<Next>,
    {
        Self::from_kind(NodeKind::Join {
            first: Box::new(first),
            second: Box::new(second),
            f: Box::new(move |a, b| f(a, b).map(Into::into)),
        })
    }

    /// Supply the transaction and run the whole graph.
    ///
    /// Queries execute one at a time, in dependency order. Returns the
    /// settled outcome of this node.
    pub fn run_within(self, tx: &mut dyn Executor) -> Result<Value> {
        Scheduler::new(tx).run(self).0
    }

    /// Like [`run_within`](Self::run_within), also returning what happened
    pub fn run_traced(self, tx: &mut dyn Executor) -> (Result<Value>, RunTrace) {
        Scheduler::new(tx).run(self)
    }
}

/// Graphs are dismantled with an explicit worklist; the derived drop would
/// recurse once per predecessor and overflow on deep graphs that never ran.
impl Drop for TxMonad {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        detach_predecessors(&mut self.kind, &mut pending);
        while let Some(mut node) = pending.pop() {
            detach_predecessors(&mut node.kind, &mut pending);
        }
    }
}

fn detach_predecessors(kind: &mut NodeKind, pending: &mut Vec<TxMonad>) {
    match kind {
        NodeKind::Chain { parent, .. } | NodeKind::Catch { parent, .. } => {
            pending.push(std::mem::replace(&mut **parent, TxMonad::vacant()));
        }
        NodeKind::Join { first, second, .. } => {
            pending.push(std::mem::replace(&mut **first, TxMonad::vacant()));
            pending.push(std::mem::replace(&mut **second, TxMonad::vacant()));
        }
        NodeKind::Ready(_) | NodeKind::Query(_) => {}
    }
}

impl fmt::Debug for TxMonad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("TxMonad");
        s.field("id", &self.id);
        match &self.kind {
            NodeKind::Ready(result) => s.field("ready", result),
            NodeKind::Query(q) => s.field("query", q),
            NodeKind::Chain { parent, .. } => s.field("chain", parent),
            NodeKind::Catch { parent, .. } => s.field("catch", parent),
            NodeKind::Join { first, second, .. } => s.field("join", &(first, second)),
        };
        s.finish()
    }
}
