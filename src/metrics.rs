use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Usage counters for monitoring
#[derive(Clone)]
pub struct Metrics {
    pub users_registered: Arc<AtomicUsize>,
    pub logins_succeeded: Arc<AtomicUsize>,
    pub logins_failed: Arc<AtomicUsize>,
    pub applications_created: Arc<AtomicUsize>,
    pub applications_updated: Arc<AtomicUsize>,
    pub applications_deleted: Arc<AtomicUsize>,
    pub stats_computed: Arc<AtomicUsize>,
    pub start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            users_registered: Arc::new(AtomicUsize::new(0)),
            logins_succeeded: Arc::new(AtomicUsize::new(0)),
            logins_failed: Arc::new(AtomicUsize::new(0)),
            applications_created: Arc::new(AtomicUsize::new(0)),
            applications_updated: Arc::new(AtomicUsize::new(0)),
            applications_deleted: Arc::new(AtomicUsize::new(0)),
            stats_computed: Arc::new(AtomicUsize::new(0)),
            start_time: Instant::now(),
        }
    }

    pub fn inc_users_registered(&self) {
        self.users_registered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_logins_succeeded(&self) {
        self.logins_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_logins_failed(&self) {
        self.logins_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_applications_created(&self) {
        self.applications_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_applications_updated(&self) {
        self.applications_updated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_applications_deleted(&self) {
        self.applications_deleted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_stats_computed(&self) {
        self.stats_computed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            users_registered: self.users_registered.load(Ordering::Relaxed),
            logins_succeeded: self.logins_succeeded.load(Ordering::Relaxed),
            logins_failed: self.logins_failed.load(Ordering::Relaxed),
            applications_created: self.applications_created.load(Ordering::Relaxed),
            applications_updated: self.applications_updated.load(Ordering::Relaxed),
            applications_deleted: self.applications_deleted.load(Ordering::Relaxed),
            stats_computed: self.stats_computed.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
pub struct MetricsSnapshot {
    pub users_registered: usize,
    pub logins_succeeded: usize,
    pub logins_failed: usize,
    pub applications_created: usize,
    pub applications_updated: usize,
    pub applications_deleted: usize,
    pub stats_computed: usize,
    pub uptime_seconds: u64,
}
