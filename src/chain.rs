//! Generic fallback chain over an ordered list of workers.
//!
//! The chain topology is fixed at construction. Each operation runs the
//! nodes in order under one of two combination policies: reads want the
//! first success, writes and deletes require every node to succeed.

use std::future::Future;
use std::sync::Arc;

use crate::error::{WorkerError, WorkerResult};

/// How results from successive chain nodes are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainPolicy {
    /// First success wins; successors are not invoked. If every node fails,
    /// the last node's failure is returned.
    FirstSuccess,
    /// Every node must succeed. The first failure short-circuits and is
    /// returned, even if earlier nodes succeeded.
    AllSucceed,
}

/// An ordered, immutable chain of workers sharing one capability interface.
pub struct FallbackChain<W: ?Sized> {
    nodes: Vec<Arc<W>>,
}

impl<W: ?Sized> FallbackChain<W> {
    pub fn new(nodes: Vec<Arc<W>>) -> Self {
        Self { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Arc<W>] {
        &self.nodes
    }

    /// Run `op` against the chain under the given policy.
    ///
    /// Under [`ChainPolicy::AllSucceed`] the first node's success value is
    /// returned; there is no partial-success reporting.
    pub async fn run<T, F, Fut>(&self, policy: ChainPolicy, op: F) -> WorkerResult<T>
    where
        F: Fn(Arc<W>) -> Fut,
        Fut: Future<Output = WorkerResult<T>>,
    {
        if self.nodes.is_empty() {
            return Err(WorkerError::invalid_parameters(&["chain"], "fallback-chain"));
        }
        match policy {
            ChainPolicy::FirstSuccess => {
                let mut last_failure = None;
                for node in &self.nodes {
                    match op(node.clone()).await {
                        Ok(value) => return Ok(value),
                        Err(error) => last_failure = Some(error),
                    }
                }
                match last_failure {
                    Some(error) => Err(error),
                    None => Err(WorkerError::Internal("fallback chain produced no result".to_string())),
                }
            }
            ChainPolicy::AllSucceed => {
                let mut first_value = None;
                for node in &self.nodes {
                    let value = op(node.clone()).await?;
                    if first_value.is_none() {
                        first_value = Some(value);
                    }
                }
                match first_value {
                    Some(value) => Ok(value),
                    None => Err(WorkerError::Internal("fallback chain produced no result".to_string())),
                }
            }
        }
    }
}
