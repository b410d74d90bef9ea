//! Scripted geocoding provider for the cache and watcher tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use locator_core::error::{LocatorError, Result};
use locator_core::traits::GeocodingProvider;
use locator_core::types::{Address, Coordinate, QueryKey};

enum Answer {
    Found(Coordinate),
    Fail,
}

/// Answers from a fixed table; unknown queries get no match.
///
/// A gated provider parks every call until [`ScriptedProvider::release`]
/// hands out a permit, in call order.
pub(crate) struct ScriptedProvider {
    answers: HashMap<String, Answer>,
    gate: Option<Semaphore>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    pub(crate) fn new() -> Self {
        Self {
            answers: HashMap::new(),
            gate: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn found(mut self, query: &str, coordinate: Coordinate) -> Self {
        self.answers.insert(query.to_string(), Answer::Found(coordinate));
        self
    }

    pub(crate) fn failing(mut self, query: &str) -> Self {
        self.answers.insert(query.to_string(), Answer::Fail);
        self
    }

    pub(crate) fn gated(mut self) -> Self {
        self.gate = Some(Semaphore::new(0));
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    pub(crate) async fn wait_for_calls(&self, n: usize) {
        for _ in 0..5000 {
            if self.calls() >= n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        panic!("provider saw {} calls, expected {}", self.calls(), n);
    }
}

#[async_trait]
impl GeocodingProvider for ScriptedProvider {
    async fn search(&self, query: &QueryKey) -> Result<Option<Coordinate>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate closed").forget();
        }

        match self.answers.get(query.as_str()) {
            Some(Answer::Found(c)) => Ok(Some(*c)),
            Some(Answer::Fail) => Err(LocatorError::Http("connection reset by peer".into())),
            None => Ok(None),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

pub(crate) fn springfield() -> Address {
    Address::new("1 Main St", "Springfield", "IL", "62701")
}
