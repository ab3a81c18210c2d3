//! Bounded worker pool
//!
//! Runs fetch jobs with a fixed number of concurrent in-flight tasks. Jobs
//! are admitted in submission order; completions arrive in whatever order the
//! network produces, and callers restore ordering downstream (the aggregator
//! keys results by page index).
//!
//! The admission gate is consulted once per job, at submission time. Once the
//! gate closes, no further jobs start — but anything already running is left
//! to finish, so partially collected results stay consistent.

use futures::future;
use futures::stream::{self, StreamExt};
use std::future::Future;

/// Fixed-size concurrent job runner.
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    workers: usize,
}

impl WorkerPool {
    /// Create a pool with the given concurrency (minimum 1).
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    /// The configured concurrency.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `jobs` through `run`, at most `workers` concurrently.
    ///
    /// `admit` is checked before each submission; returning `false` stops all
    /// further submissions. Results are collected in completion order.
    pub async fn run<J, T, G, F, Fut>(&self, jobs: Vec<J>, admit: G, run: F) -> Vec<T>
    where
        G: Fn() -> bool,
        F: Fn(J) -> Fut,
        Fut: Future<Output = T>,
    {
        stream::iter(jobs)
            .take_while(|_| future::ready(admit()))
            .map(run)
            .buffer_unordered(self.workers)
            .collect()
            .await
    }
}
