//! ShowStore — cached show records loaded from the backend.
//!
//! `load()` hands back a lazy future that owns everything it needs, so it can
//! be spawned while the store stays on the event loop.  The loop feeds the
//! resolved `LoadOutcome` back through `complete()`, which is the only place
//! the cache changes after a fetch.

use std::future::Future;
use std::sync::Arc;

use knive_proto::api::Backend;
use knive_proto::error::BackendError;
use knive_proto::model::ShowRecord;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Sent to every subscriber when a load has been applied.
#[derive(Debug, Clone)]
pub enum StoreNotice {
    Loaded(Arc<Vec<ShowRecord>>),
}

/// Result of one `load()` call, tagged with its ticket.
#[derive(Debug)]
pub struct LoadOutcome {
    pub ticket: u64,
    pub result: Result<Vec<ShowRecord>, BackendError>,
}

pub struct ShowStore<B> {
    backend: Arc<B>,
    records: Vec<ShowRecord>,
    loaded: bool,
    /// Ticket handed to the most recent `load()` call.
    issued: u64,
    /// Ticket of the most recent outcome applied to the cache.
    applied: u64,
    notice_tx: broadcast::Sender<StoreNotice>,
}

impl<B: Backend> ShowStore<B> {
    pub fn new(backend: Arc<B>) -> Self {
        let (notice_tx, _) = broadcast::channel(16);
        Self {
            backend,
            records: Vec::new(),
            loaded: false,
            issued: 0,
            applied: 0,
            notice_tx,
        }
    }

    pub fn backend(&self) -> Arc<B> {
        Arc::clone(&self.backend)
    }

    /// Start a fresh fetch.  Nothing happens until the future is polled.
    pub fn load(&mut self) -> impl Future<Output = LoadOutcome> + Send + 'static {
        self.issued += 1;
        let ticket = self.issued;
        let backend = Arc::clone(&self.backend);
        debug!("store: load #{} issued", ticket);
        async move {
            let result = backend.list_channels().await;
            LoadOutcome { ticket, result }
        }
    }

    /// Apply a resolved load.  Returns `None` when a newer load has already
    /// been applied; otherwise the records as loaded, or the error with the
    /// previous cache left in place.
    pub fn complete(
        &mut self,
        outcome: LoadOutcome,
    ) -> Option<Result<Vec<ShowRecord>, BackendError>> {
        if outcome.ticket < self.applied {
            debug!(
                "store: dropping load #{} (already applied #{})",
                outcome.ticket, self.applied
            );
            return None;
        }
        match outcome.result {
            Ok(records) => {
                info!("store: load #{} returned {} shows", outcome.ticket, records.len());
                self.applied = outcome.ticket;
                self.records = records.clone();
                self.loaded = true;
                // No subscribers is fine.
                let _ = self
                    .notice_tx
                    .send(StoreNotice::Loaded(Arc::new(records.clone())));
                Some(Ok(records))
            }
            Err(e) => Some(Err(e)),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreNotice> {
        self.notice_tx.subscribe()
    }

    pub fn records(&self) -> &[ShowRecord] {
        &self.records
    }

    pub fn get(&self, slug: &str) -> Option<&ShowRecord> {
        self.records.iter().find(|r| r.slug == slug)
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Insert or replace a single record received from the backend.
    pub fn upsert(&mut self, record: ShowRecord) {
        match self.records.iter_mut().find(|r| r.slug == record.slug) {
            Some(existing) => *existing = record,
            None => self.records.push(record),
        }
    }
}
