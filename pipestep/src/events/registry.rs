//! Registry of per-pipeline status channels.

use super::StatusSink;
use crate::config::StepConfig;
use crate::context::PipelineKey;
use crate::errors::PipestepError;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, trace};

struct Channel {
    id: u64,
    tx: mpsc::Sender<String>,
}

struct RegistryInner {
    channels: DashMap<String, Channel>,
    capacity: usize,
    next_id: AtomicU64,
    dropped: AtomicU64,
}

/// Routes status lines to one bounded channel per pipeline run.
///
/// A run opens its channel with [`open`](Self::open) before its steps
/// execute and tears it down by dropping the returned [`StatusReceiver`]
/// (or calling [`close`](Self::close)). Lines for keys with no open channel,
/// or for a channel that is full, are dropped and counted; `send` never
/// blocks.
///
/// Cloning a registry yields another handle to the same channels.
#[derive(Clone)]
pub struct StatusRegistry {
    inner: Arc<RegistryInner>,
}

impl StatusRegistry {
    /// Creates a registry with the default channel capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&StepConfig::default())
    }

    /// Creates a registry whose channels buffer up to `capacity` lines.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                channels: DashMap::new(),
                capacity: capacity.max(1),
                next_id: AtomicU64::new(0),
                dropped: AtomicU64::new(0),
            }),
        }
    }

    /// Creates a registry from configuration.
    #[must_use]
    pub fn with_config(config: &StepConfig) -> Self {
        Self::with_capacity(config.status_channel_capacity)
    }

    /// Opens the status channel for a pipeline run.
    ///
    /// Fails if a live channel is already open for `key`. A channel whose
    /// receiver is gone is replaced.
    pub fn open(&self, key: &PipelineKey) -> Result<StatusReceiver, PipestepError> {
        let (tx, rx) = mpsc::channel(self.inner.capacity);
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);

        match self.inner.channels.entry(key.as_str().to_string()) {
            Entry::Occupied(mut occupied) => {
                if !occupied.get().tx.is_closed() {
                    return Err(PipestepError::PipelineAlreadyOpen(key.to_string()));
                }
                occupied.insert(Channel { id, tx });
            }
            Entry::Vacant(vacant) => {
                vacant.insert(Channel { id, tx });
            }
        }

        debug!(pipeline_key = %key, "Status channel opened");
        Ok(StatusReceiver {
            key: key.clone(),
            id,
            rx,
            registry: Arc::downgrade(&self.inner),
        })
    }

    /// Closes the channel for `key`. Returns false if none was open.
    ///
    /// Lines already buffered stay readable from the receiver.
    pub fn close(&self, key: &PipelineKey) -> bool {
        let removed = self.inner.channels.remove(key.as_str()).is_some();
        if removed {
            debug!(pipeline_key = %key, "Status channel closed");
        }
        removed
    }

    /// Returns true if a channel is open for `key`.
    #[must_use]
    pub fn is_open(&self, key: &PipelineKey) -> bool {
        self.inner.channels.contains_key(key.as_str())
    }

    /// Returns the number of open channels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.channels.len()
    }

    /// Returns true if no channel is open.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.channels.is_empty()
    }

    /// Returns how many lines were dropped since creation.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.inner.dropped.load(Ordering::Relaxed)
    }

    fn record_drop(&self, pipeline_key: &str, why: &'static str) {
        self.inner.dropped.fetch_add(1, Ordering::Relaxed);
        trace!(pipeline_key = %pipeline_key, reason = why, "Status line dropped");
    }
}

impl Default for StatusRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StatusRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusRegistry")
            .field("open", &self.len())
            .field("capacity", &self.inner.capacity)
            .field("dropped", &self.dropped())
            .finish()
    }
}

impl StatusSink for StatusRegistry {
    fn send(&self, pipeline_key: &str, line: &str) {
        let Some(channel) = self.inner.channels.get(pipeline_key) else {
            self.record_drop(pipeline_key, "no channel");
            return;
        };

        match channel.tx.try_send(line.to_string()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => self.record_drop(pipeline_key, "channel full"),
            Err(TrySendError::Closed(_)) => self.record_drop(pipeline_key, "receiver gone"),
        }
    }
}

/// Receiving end of one pipeline run's status channel.
///
/// Dropping the receiver closes the channel in the registry.
pub struct StatusReceiver {
    key: PipelineKey,
    id: u64,
    rx: mpsc::Receiver<String>,
    registry: Weak<RegistryInner>,
}

impl StatusReceiver {
    /// Returns the pipeline key this receiver listens on.
    #[must_use]
    pub fn key(&self) -> &PipelineKey {
        &self.key
    }

    /// Waits for the next line. Returns `None` once the channel is closed
    /// and drained.
    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    /// Returns the next buffered line without waiting.
    pub fn try_recv(&mut self) -> Option<String> {
        self.rx.try_recv().ok()
    }

    /// Returns every buffered line without waiting.
    pub fn drain(&mut self) -> Vec<String> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}

impl Drop for StatusReceiver {
    fn drop(&mut self) {
        if let Some(inner) = self.registry.upgrade() {
            // a newer channel for the same key is left alone
            inner
                .channels
                .remove_if(self.key.as_str(), |_, channel| channel.id == self.id);
        }
    }
}

impl std::fmt::Debug for StatusReceiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusReceiver")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lines_routed_by_key() {
        let registry = StatusRegistry::new();
        let run_1 = PipelineKey::from("run-1");
        let run_2 = PipelineKey::from("run-2");
        let mut rx_1 = registry.open(&run_1).unwrap();
        let mut rx_2 = registry.open(&run_2).unwrap();

        registry.send("run-1", "a");
        registry.send("run-2", "b");
        registry.send("run-1", "c");

        assert_eq!(rx_1.recv().await.as_deref(), Some("a"));
        assert_eq!(rx_1.recv().await.as_deref(), Some("c"));
        assert_eq!(rx_2.drain(), vec!["b".to_string()]);
    }

    #[test]
    fn test_open_twice_fails() {
        let registry = StatusRegistry::new();
        let key = PipelineKey::from("run-1");
        let _rx = registry.open(&key).unwrap();

        let err = registry.open(&key).unwrap_err();
        assert_eq!(err, PipestepError::PipelineAlreadyOpen("run-1".to_string()));
    }

    #[test]
    fn test_unknown_key_is_dropped() {
        let registry = StatusRegistry::new();
        registry.send("nobody", "line");
        assert_eq!(registry.dropped(), 1);
    }

    #[test]
    fn test_full_channel_never_blocks() {
        let registry = StatusRegistry::with_capacity(2);
        let key = PipelineKey::from("run-1");
        let mut rx = registry.open(&key).unwrap();

        for i in 0..5 {
            registry.send("run-1", &format!("line {i}"));
        }

        assert_eq!(registry.dropped(), 3);
        assert_eq!(rx.drain(), vec!["line 0".to_string(), "line 1".to_string()]);
    }

    #[test]
    fn test_receiver_drop_closes_channel() {
        let registry = StatusRegistry::new();
        let key = PipelineKey::from("run-1");
        {
            let _rx = registry.open(&key).unwrap();
            assert!(registry.is_open(&key));
        }

        assert!(!registry.is_open(&key));
        assert!(registry.is_empty());
        assert!(registry.open(&key).is_ok());
    }

    #[tokio::test]
    async fn test_close_keeps_buffered_lines() {
        let registry = StatusRegistry::new();
        let key = PipelineKey::from("run-1");
        let mut rx = registry.open(&key).unwrap();

        registry.send("run-1", "before");
        assert!(registry.close(&key));
        assert!(!registry.close(&key));
        registry.send("run-1", "after");

        assert_eq!(rx.recv().await.as_deref(), Some("before"));
        assert_eq!(rx.recv().await, None);
        assert_eq!(registry.dropped(), 1);
    }

    #[test]
    fn test_stale_receiver_does_not_close_new_channel() {
        let registry = StatusRegistry::new();
        let key = PipelineKey::from("run-1");
        let old = registry.open(&key).unwrap();
        registry.close(&key);
        let _new = registry.open(&key).unwrap();

        drop(old);
        assert!(registry.is_open(&key));
    }
}
