//! Single-shot completion signals for in-flight requests
//!
//! At most one signal is armed per [`RequestKind`]. Arming again replaces the
//! previous signal; its waiter observes [`WaitOutcome::Abandoned`] and the old
//! signal can never be satisfied. Each kind also keeps a completion counter, so
//! an abandoned waiter can still learn that a newer signal of its kind fired.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use tokio::sync::{oneshot, watch};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    CityList,
    Refresh,
    CityData,
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequestKind::CityList => "city list",
            RequestKind::Refresh => "refresh",
            RequestKind::CityData => "city data",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Satisfied,
    TimedOut,
    Abandoned,
}

/// Waiting half of an armed signal
#[derive(Debug)]
pub struct PendingRequest {
    id: u64,
    kind: RequestKind,
    rx: oneshot::Receiver<()>,
    completions: watch::Receiver<u64>,
    seen: u64,
}

impl PendingRequest {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    /// Waits up to `timeout`. Can be called again after `TimedOut`; must not
    /// be called again after any other outcome.
    pub async fn wait(&mut self, timeout: Duration) -> WaitOutcome {
        match tokio::time::timeout(timeout, &mut self.rx).await {
            Ok(Ok(())) => WaitOutcome::Satisfied,
            Ok(Err(_)) => WaitOutcome::Abandoned,
            Err(_) => WaitOutcome::TimedOut,
        }
    }

    /// Waits up to `timeout` for any signal of this kind armed after this
    /// one to be satisfied. Used once this signal has been abandoned.
    pub async fn wait_for_successor(&mut self, timeout: Duration) -> WaitOutcome {
        let seen = self.seen;
        match tokio::time::timeout(timeout, self.completions.wait_for(|count| *count > seen)).await
        {
            Ok(Ok(_)) => WaitOutcome::Satisfied,
            Ok(Err(_)) => WaitOutcome::Abandoned,
            Err(_) => WaitOutcome::TimedOut,
        }
    }
}

#[derive(Debug, Default)]
pub struct PendingRequests {
    next_id: u64,
    armed: HashMap<RequestKind, (u64, oneshot::Sender<()>)>,
    completions: HashMap<RequestKind, watch::Sender<u64>>,
}

impl PendingRequests {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self, kind: RequestKind) -> PendingRequest {
        self.next_id += 1;
        let (tx, rx) = oneshot::channel();
        self.armed.insert(kind, (self.next_id, tx));

        let completions = self
            .completions
            .entry(kind)
            .or_insert_with(|| watch::channel(0).0)
            .subscribe();
        let seen = *completions.borrow();

        PendingRequest {
            id: self.next_id,
            kind,
            rx,
            completions,
            seen,
        }
    }

    /// Fires the armed signal for `kind`, if any. Returns whether one was
    /// armed; a waiter that already gave up is not an error.
    pub fn satisfy(&mut self, kind: RequestKind) -> bool {
        if let Some(completions) = self.completions.get(&kind) {
            completions.send_modify(|count| *count += 1);
        }

        match self.armed.remove(&kind) {
            Some((_, tx)) => {
                let _ = tx.send(());
                true
            }
            None => false,
        }
    }

    /// Drops the signal for `kind` only if it is still the one with `id`.
    pub fn disarm(&mut self, kind: RequestKind, id: u64) {
        if self.armed.get(&kind).is_some_and(|(armed_id, _)| *armed_id == id) {
            self.armed.remove(&kind);
        }
    }

    pub fn is_armed(&self, kind: RequestKind) -> bool {
        self.armed.contains_key(&kind)
    }
}
