use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::models::config::{FilterConfig, SpeakerId};

/// Watchdog poll interval. Bounds how late the time budget can fire.
const WATCHDOG_POLL: Duration = Duration::from_millis(100);

/// Session-wide stop rules: speaker allow-list, time budget, byte budget.
///
/// Speaker admission is pure; the byte counter is only touched from the
/// sequential admission path (single writer); the time budget runs on its
/// own watchdog thread and signals the session through the `on_timeout`
/// callback exactly once.
pub struct FilterPolicy {
    config: FilterConfig,
    bytes_admitted: AtomicU64,
    budget_exhausted: AtomicBool,
    started: AtomicBool,
    finished: Arc<AtomicBool>,
}

impl FilterPolicy {
    pub fn new(config: FilterConfig) -> Self {
        Self {
            config,
            bytes_admitted: AtomicU64::new(0),
            budget_exhausted: AtomicBool::new(false),
            started: AtomicBool::new(false),
            finished: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether packets from `speaker_id` are admitted at all.
    pub fn admit(&self, speaker_id: SpeakerId) -> bool {
        self.config.allowed_speakers.is_empty()
            || self.config.allowed_speakers.contains(&speaker_id)
    }

    /// Check `len` bytes against the session budget without charging it.
    ///
    /// A chunk that would cross the budget is refused whole (no truncation),
    /// and every chunk after the first refusal is refused for the rest of
    /// the session. The budget is charged separately via
    /// [`record_bytes`](Self::record_bytes) once the chunk has actually
    /// landed, so a faulted write does not consume budget. Only called from
    /// the sequential admission path.
    pub fn admit_bytes(&self, len: usize) -> bool {
        if self.config.byte_budget == 0 {
            return true;
        }
        if self.budget_exhausted.load(Ordering::Acquire) {
            return false;
        }

        let total = self.bytes_admitted.load(Ordering::Acquire);
        if total + len as u64 > self.config.byte_budget {
            self.budget_exhausted.store(true, Ordering::Release);
            log::warn!(
                "byte budget exhausted ({} of {} bytes used), dropping remaining audio",
                total,
                self.config.byte_budget
            );
            return false;
        }

        true
    }

    /// Charge `len` bytes after a successful write.
    pub fn record_bytes(&self, len: usize) {
        if self.config.byte_budget == 0 {
            return;
        }
        self.bytes_admitted.fetch_add(len as u64, Ordering::AcqRel);
    }

    pub fn bytes_admitted(&self) -> u64 {
        self.bytes_admitted.load(Ordering::Acquire)
    }

    /// Start the time-budget watchdog, if one is configured.
    ///
    /// Spawns at most one thread per policy. The thread polls the finished
    /// flag so a session that stops early never fires the callback; it is
    /// detached rather than joined because `on_timeout` typically runs the
    /// session's own stop routine on this very thread.
    pub fn start<F>(&self, on_timeout: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.config.time_budget_secs == 0 {
            return;
        }
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }

        let budget = Duration::from_secs(self.config.time_budget_secs);
        let finished = Arc::clone(&self.finished);

        thread::Builder::new()
            .name("filter-timeout".into())
            .spawn(move || {
                let deadline = Instant::now() + budget;
                loop {
                    if finished.load(Ordering::SeqCst) {
                        return;
                    }
                    if Instant::now() >= deadline {
                        break;
                    }
                    thread::sleep(WATCHDOG_POLL);
                }
                if !finished.load(Ordering::SeqCst) {
                    log::info!("time budget of {:?} elapsed, stopping session", budget);
                    on_timeout();
                }
            })
            .expect("failed to spawn filter-timeout thread");
    }

    /// Mark the session finished so a pending watchdog becomes a no-op.
    pub fn mark_finished(&self) {
        self.finished.store(true, Ordering::SeqCst);
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn empty_allow_list_admits_everyone() {
        let policy = FilterPolicy::new(FilterConfig::default());
        assert!(policy.admit(1));
        assert!(policy.admit(u64::MAX));
    }

    #[test]
    fn allow_list_restricts_admission() {
        let policy = FilterPolicy::new(FilterConfig {
            allowed_speakers: HashSet::from([7]),
            ..Default::default()
        });
        assert!(policy.admit(7));
        assert!(!policy.admit(8));
    }

    #[test]
    fn zero_byte_budget_is_unlimited() {
        let policy = FilterPolicy::new(FilterConfig::default());
        assert!(policy.admit_bytes(usize::MAX / 2));
        policy.record_bytes(usize::MAX / 2);
        assert!(policy.admit_bytes(usize::MAX / 2));
    }

    #[test]
    fn crossing_chunk_is_refused_whole_and_budget_latches() {
        let policy = FilterPolicy::new(FilterConfig {
            byte_budget: 10,
            ..Default::default()
        });
        assert!(policy.admit_bytes(6));
        policy.record_bytes(6);
        // 6 + 5 would cross the budget: refused whole, nothing truncated.
        assert!(!policy.admit_bytes(5));
        // Smaller chunks would still fit, but the budget has latched.
        assert!(!policy.admit_bytes(1));
        assert_eq!(policy.bytes_admitted(), 6);
    }

    #[test]
    fn budget_is_only_charged_on_record() {
        let policy = FilterPolicy::new(FilterConfig {
            byte_budget: 10,
            ..Default::default()
        });
        // Admission checks alone never consume budget: a chunk whose write
        // faults leaves the full allowance for later audio.
        assert!(policy.admit_bytes(8));
        assert!(policy.admit_bytes(8));
        assert_eq!(policy.bytes_admitted(), 0);

        policy.record_bytes(8);
        assert!(!policy.admit_bytes(8));
    }

    #[test]
    fn watchdog_fires_after_budget() {
        let policy = FilterPolicy::new(FilterConfig {
            time_budget_secs: 1,
            ..Default::default()
        });
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        policy.start(move || flag.store(true, Ordering::SeqCst));

        thread::sleep(Duration::from_millis(1500));
        assert!(fired.load(Ordering::SeqCst));
    }

    #[test]
    fn watchdog_is_a_noop_once_finished() {
        let policy = FilterPolicy::new(FilterConfig {
            time_budget_secs: 1,
            ..Default::default()
        });
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        policy.start(move || flag.store(true, Ordering::SeqCst));

        policy.mark_finished();
        thread::sleep(Duration::from_millis(1500));
        assert!(!fired.load(Ordering::SeqCst));
    }

    #[test]
    fn no_watchdog_without_time_budget() {
        let policy = FilterPolicy::new(FilterConfig::default());
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        policy.start(move || flag.store(true, Ordering::SeqCst));

        thread::sleep(Duration::from_millis(200));
        assert!(!fired.load(Ordering::SeqCst));
    }
}
