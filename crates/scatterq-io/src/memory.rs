//! In-memory catalog and query backend for tests and benches.
//!
//! A `MemoryStore` is a clonable handle over shared fixture state: each object
//! carries the frames its query "streams back", and can be scripted to fail or
//! to stall. The bucket part of a scope is ignored; keys are matched against the
//! raw prefix and listed in lexicographic order, paginated like a real catalog.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use scatterq_core::config::Scope;
use scatterq_core::error::{Error, Result};
use scatterq_core::types::{ChunkResult, Listing, ObjectDescriptor, QueryRequest, ScanStats};
use tracing::trace;

use crate::connector::{Catalog, Connector, QueryClient};
use crate::events::{assemble, SelectEvent};
use crate::listing::ListingBuilder;

const DEFAULT_PAGE_SIZE: usize = 1000;

#[derive(Debug, Clone)]
struct Fixture {
    size: u64,
    frames: Vec<SelectEvent>,
    failure: Option<String>,
    delay: Option<Duration>,
}

#[derive(Debug)]
struct State {
    objects: BTreeMap<String, Fixture>,
    page_size: usize,
    list_failure: Option<String>,
    queried: Vec<String>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            objects: BTreeMap::new(),
            page_size: DEFAULT_PAGE_SIZE,
            list_failure: None,
            queried: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    list: AtomicUsize,
    connect: AtomicUsize,
    query: AtomicUsize,
}

/// Thread-safe fixture store implementing every collaborator seam.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
    counters: Arc<Counters>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Keys per simulated listing page (minimum 1).
    pub fn with_page_size(self, page_size: usize) -> Self {
        self.state().page_size = page_size.max(1);
        self
    }

    /// Add an object whose query returns `payload` in one frame plus `stats`.
    pub fn insert(&self, key: impl Into<String>, size: u64, payload: &str, stats: ScanStats) {
        let frames = vec![
            SelectEvent::Records(payload.as_bytes().to_vec()),
            SelectEvent::Stats(stats),
            SelectEvent::End,
        ];
        self.insert_frames(key, size, frames);
    }

    /// Add an object whose query replays the given frames verbatim.
    pub fn insert_frames(&self, key: impl Into<String>, size: u64, frames: Vec<SelectEvent>) {
        self.state().objects.insert(
            key.into(),
            Fixture {
                size,
                frames,
                failure: None,
                delay: None,
            },
        );
    }

    /// Make queries against `key` fail. The key is listed regardless.
    pub fn fail_on(&self, key: &str, reason: impl Into<String>) {
        let mut state = self.state();
        let fixture = state
            .objects
            .entry(key.to_string())
            .or_insert_with(|| Fixture {
                size: 0,
                frames: Vec::new(),
                failure: None,
                delay: None,
            });
        fixture.failure = Some(reason.into());
    }

    /// Make queries against `key` sleep before answering.
    pub fn delay_on(&self, key: &str, delay: Duration) {
        if let Some(fixture) = self.state().objects.get_mut(key) {
            fixture.delay = Some(delay);
        }
    }

    pub fn fail_listing(&self, reason: impl Into<String>) {
        self.state().list_failure = Some(reason.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.state().objects.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.state().objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().objects.is_empty()
    }

    pub fn list_calls(&self) -> usize {
        self.counters.list.load(Ordering::SeqCst)
    }

    pub fn connect_calls(&self) -> usize {
        self.counters.connect.load(Ordering::SeqCst)
    }

    pub fn query_calls(&self) -> usize {
        self.counters.query.load(Ordering::SeqCst)
    }

    /// Keys in the order queries arrived.
    pub fn queried_keys(&self) -> Vec<String> {
        self.state().queried.clone()
    }
}

impl Catalog for MemoryStore {
    fn list(&self, scope: &Scope) -> Result<Listing> {
        self.counters.list.fetch_add(1, Ordering::SeqCst);
        let state = self.state();
        if let Some(reason) = &state.list_failure {
            return Err(Error::Catalog(format!("{scope}: {reason}")));
        }

        let matching: Vec<ObjectDescriptor> = state
            .objects
            .iter()
            .filter(|(key, _)| key.starts_with(&scope.prefix))
            .map(|(key, f)| ObjectDescriptor::new(key.clone(), f.size))
            .collect();

        let mut builder = ListingBuilder::new();
        for page in matching.chunks(state.page_size) {
            builder.push_page(page.iter().cloned());
        }
        // A truncated listing ends with an empty page.
        builder.push_page(Vec::new());
        trace!(scope = %scope, pages = builder.pages(), "listed memory store");
        builder.finish(scope)
    }
}

impl QueryClient for MemoryStore {
    fn query(&self, _scope: &Scope, key: &str, _request: &QueryRequest) -> Result<ChunkResult> {
        self.counters.query.fetch_add(1, Ordering::SeqCst);
        let fixture = {
            let mut state = self.state();
            state.queried.push(key.to_string());
            state.objects.get(key).cloned()
        };
        let fixture = fixture.ok_or_else(|| Error::Query {
            key: key.to_string(),
            reason: "no such key".into(),
        })?;

        if let Some(delay) = fixture.delay {
            thread::sleep(delay);
        }
        if let Some(reason) = fixture.failure {
            return Err(Error::Query {
                key: key.to_string(),
                reason,
            });
        }
        assemble(key, fixture.frames)
    }
}

impl Connector for MemoryStore {
    fn catalog(&self) -> Result<Box<dyn Catalog>> {
        Ok(Box::new(self.clone()))
    }

    fn connect(&self) -> Result<Box<dyn QueryClient>> {
        self.counters.connect.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(self.clone()))
    }
}
