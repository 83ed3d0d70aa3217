// src/scan/state.rs
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::watch;

use crate::types::ScanResult;

/// Run-wide stop signal; once set it stays set
#[derive(Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Set the token. Returns true only for the call that actually set it.
    pub fn cancel(&self) -> bool {
        !self.tx.send_replace(true)
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolve once the token is set
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as self, so this cannot fail
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// What happened to a result handed to [`ScanState::record`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Appended; the list now holds `count` results
    Recorded { count: usize },
    /// Appended and the quota is now met; the token has been set
    QuotaReached,
    /// Not appended because the run is already stopping
    Rejected,
}

struct Inner {
    results: Vec<ScanResult>,
    last_success: Instant,
    rejected: usize,
}

/// Successes accumulated by all workers of one run
pub struct ScanState {
    inner: Mutex<Inner>,
}

impl ScanState {
    /// Fresh state; the idle clock starts now
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                results: Vec::new(),
                last_success: Instant::now(),
                rejected: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a result and refresh the idle clock
    ///
    /// `quota` of 0 means unlimited. The list never grows past a non-zero
    /// quota, and nothing is appended once `cancel` is set.
    pub fn record(&self, result: ScanResult, quota: usize, cancel: &CancelToken) -> RecordOutcome {
        let mut inner = self.lock();

        if cancel.is_cancelled() || (quota > 0 && inner.results.len() >= quota) {
            inner.rejected += 1;
            return RecordOutcome::Rejected;
        }

        inner.results.push(result);
        inner.last_success = Instant::now();

        let count = inner.results.len();
        if quota > 0 && count >= quota {
            cancel.cancel();
            return RecordOutcome::QuotaReached;
        }

        RecordOutcome::Recorded { count }
    }

    /// Instant of the last recorded success (or of creation)
    pub fn last_success(&self) -> Instant {
        self.lock().last_success
    }

    /// True once the time since the last success is strictly longer than `wait`
    pub fn idle_exceeds(&self, wait: Duration) -> bool {
        idle_exceeded(self.last_success(), Instant::now(), wait)
    }

    /// Results the run refused because it was already stopping
    pub fn rejected(&self) -> usize {
        self.lock().rejected
    }

    pub fn len(&self) -> usize {
        self.lock().results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Move the accumulated results out
    pub fn take_results(&self) -> Vec<ScanResult> {
        std::mem::take(&mut self.lock().results)
    }
}

fn idle_exceeded(last_success: Instant, now: Instant, wait: Duration) -> bool {
    now.saturating_duration_since(last_success) > wait
}

impl Default for ScanState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(ip: &str) -> ScanResult {
        ScanResult {
            ip: ip.to_string(),
            origin: ip.to_string(),
            domain: "example.com".to_string(),
            issuer: "R3".to_string(),
            geo_code: String::new(),
        }
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        assert!(token.cancel());
        assert!(!token.cancel());
        assert!(token.clone().is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelled_resolves_after_cancel() {
        let token = CancelToken::new();
        let waiter = {
            let token = token.clone();
            tokio::spawn(async move { token.cancelled().await })
        };

        tokio::task::yield_now().await;
        token.cancel();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should finish")
            .unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_resolves_when_already_set() {
        let token = CancelToken::new();
        token.cancel();
        tokio::time::timeout(Duration::from_secs(1), token.cancelled())
            .await
            .expect("already-set token should resolve");
    }

    #[test]
    fn test_record_unlimited() {
        let state = ScanState::new();
        let token = CancelToken::new();

        assert_eq!(state.record(result("1.1.1.1"), 0, &token), RecordOutcome::Recorded { count: 1 });
        assert_eq!(state.record(result("2.2.2.2"), 0, &token), RecordOutcome::Recorded { count: 2 });
        assert!(!token.is_cancelled());
        assert_eq!(state.len(), 2);
    }

    #[test]
    fn test_record_quota_sets_token() {
        let state = ScanState::new();
        let token = CancelToken::new();

        assert_eq!(state.record(result("1.1.1.1"), 2, &token), RecordOutcome::Recorded { count: 1 });
        assert_eq!(state.record(result("2.2.2.2"), 2, &token), RecordOutcome::QuotaReached);
        assert!(token.is_cancelled());
        assert_eq!(state.record(result("3.3.3.3"), 2, &token), RecordOutcome::Rejected);
        assert_eq!(state.len(), 2);
        assert_eq!(state.rejected(), 1);
    }

    #[test]
    fn test_record_after_cancel_rejected() {
        let state = ScanState::new();
        let token = CancelToken::new();
        token.cancel();

        assert_eq!(state.record(result("1.1.1.1"), 0, &token), RecordOutcome::Rejected);
        assert!(state.is_empty());
    }

    #[test]
    fn test_record_refreshes_idle_clock() {
        let state = ScanState::new();
        let token = CancelToken::new();
        let created = state.last_success();
        std::thread::sleep(Duration::from_millis(20));

        state.record(result("1.1.1.1"), 0, &token);
        assert!(state.last_success() >= created + Duration::from_millis(20));
    }

    #[test]
    fn test_take_results() {
        let state = ScanState::new();
        let token = CancelToken::new();
        state.record(result("1.1.1.1"), 0, &token);

        let results = state.take_results();
        assert_eq!(results.len(), 1);
        assert!(state.is_empty());
    }

    #[test]
    fn test_idle_requires_strictly_longer_wait() {
        let last = Instant::now();
        let wait = Duration::from_secs(15);

        assert!(!idle_exceeded(last, last, wait));
        assert!(!idle_exceeded(last, last + wait, wait));
        assert!(idle_exceeded(last, last + wait + Duration::from_nanos(1), wait));
    }

    #[test]
    fn test_idle_exceeds_on_live_clock() {
        let state = ScanState::new();
        assert!(!state.idle_exceeds(Duration::from_secs(60)));

        std::thread::sleep(Duration::from_millis(5));
        assert!(state.idle_exceeds(Duration::from_millis(1)));
    }
}
