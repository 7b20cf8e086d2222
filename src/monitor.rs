use std::ops::RangeInclusive;

use rand::Rng;
use tokio::time::{self, Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::errors::Result;
use crate::notify::Notifier;
use crate::page::PageClient;
use crate::store::SnapshotStore;

/// How many characters of new content go into a change notification.
const PREVIEW_LIMIT: usize = 1000;

/// Timing knobs for the monitor loop. Production values match the original
/// deployment; tests shrink them.
#[derive(Debug, Clone)]
pub struct MonitorTiming {
    /// Uniform sampling range for the inter-poll wait, in whole seconds.
    pub poll_wait_secs: RangeInclusive<u64>,
    /// Pause after a refresh so the page can re-render before extraction.
    pub settle_delay: Duration,
    /// Minimum window age before a liveness report fires.
    pub status_interval: Duration,
    /// Fixed wait between failed session re-establishment attempts.
    pub cooldown: Duration,
}

impl Default for MonitorTiming {
    fn default() -> Self {
        Self {
            poll_wait_secs: 90..=150,
            settle_delay: Duration::from_secs(2),
            status_interval: Duration::from_secs(1800),
            cooldown: Duration::from_secs(600),
        }
    }
}

impl MonitorTiming {
    /// Draw the next inter-poll wait. Randomized so the polling cadence is
    /// not a fixed, detectable rhythm.
    pub fn sample_poll_wait(&self, rng: &mut impl Rng) -> Duration {
        Duration::from_secs(rng.gen_range(self.poll_wait_secs.clone()))
    }
}

/// Result of the extraction step, separating a readable page from a dead
/// session.
#[derive(Debug)]
pub enum Extraction {
    Text(String),
    SessionLost(String),
}

/// What a single poll iteration did.
#[derive(Debug, PartialEq, Eq)]
pub enum PollOutcome {
    /// Content differed from the last snapshot; a notification went out and
    /// the new snapshot was persisted.
    Changed,
    /// Content matched; `reported` is set when a liveness report fired.
    Unchanged { reported: bool },
    /// The page could not be read; the session must be re-established.
    SessionLost(String),
}

/// How an active extract-wait-refresh cycle ended.
enum CycleEnd {
    Continue,
    Lost(String),
    Shutdown,
}

/// Polls-without-change accounting since the window opened.
struct ReportWindow {
    polls: u64,
    opened_at: Instant,
}

impl ReportWindow {
    fn open() -> Self {
        Self {
            polls: 0,
            opened_at: Instant::now(),
        }
    }

    fn reset(&mut self) {
        self.polls = 0;
        self.opened_at = Instant::now();
    }
}

/// The monitoring state machine. Owns the session lifecycle, the poll loop,
/// the liveness-report timer and the recovery policy.
pub struct ChangeMonitor<P: PageClient, N: Notifier, S: SnapshotStore> {
    page: P,
    notifier: N,
    store: S,
    timing: MonitorTiming,
    last_snapshot: String,
    window: ReportWindow,
}

impl<P: PageClient, N: Notifier, S: SnapshotStore> ChangeMonitor<P, N, S> {
    pub fn new(page: P, notifier: N, store: S, timing: MonitorTiming) -> Self {
        Self {
            page,
            notifier,
            store,
            timing,
            last_snapshot: String::new(),
            window: ReportWindow::open(),
        }
    }

    /// Run until the shutdown token fires. A failed session establishment at
    /// startup is fatal; once past startup, session loss is recovered from
    /// indefinitely.
    pub async fn run(&mut self, shutdown: CancellationToken) -> Result<()> {
        self.notify_best_effort("Page monitor started.").await;

        self.last_snapshot = self.store.load().unwrap_or_default();
        if self.last_snapshot.is_empty() {
            info!("No prior snapshot; the first extraction will notify");
        } else {
            info!(
                "Loaded prior snapshot ({} chars)",
                self.last_snapshot.chars().count()
            );
        }

        let mut session = match self.page.establish().await {
            Ok(session) => Some(session),
            Err(e) => {
                error!("Startup failed: {}", e);
                self.notify_best_effort(&format!("Page monitor failed to start: {}", e))
                    .await;
                return Err(e);
            }
        };
        self.window.reset();
        info!("Session established; entering poll loop");

        loop {
            if shutdown.is_cancelled() {
                break;
            }

            let end = {
                let Some(live) = session.as_ref() else { break };
                self.cycle(live, &shutdown).await
            };

            match end {
                CycleEnd::Continue => {}
                CycleEnd::Shutdown => break,
                CycleEnd::Lost(cause) => {
                    if let Some(dead) = session.take() {
                        session = self.recover(dead, &cause, &shutdown).await;
                    }
                }
            }
        }

        info!("Shutting down");
        if let Some(live) = session.take() {
            self.page.release(live).await;
        }
        self.notify_best_effort("Page monitor stopped.").await;
        Ok(())
    }

    /// One full active cycle: poll, jittered wait, refresh, settle. The
    /// shutdown token is honored inside every sleep.
    async fn cycle(&mut self, session: &P::Session, shutdown: &CancellationToken) -> CycleEnd {
        if let PollOutcome::SessionLost(cause) = self.poll_once(session).await {
            return CycleEnd::Lost(cause);
        }

        let wait = self.timing.sample_poll_wait(&mut rand::thread_rng());
        debug!("Next refresh in {}s", wait.as_secs());
        tokio::select! {
            _ = shutdown.cancelled() => return CycleEnd::Shutdown,
            _ = time::sleep(wait) => {}
        }

        if let Err(e) = self.page.refresh(session).await {
            return CycleEnd::Lost(e.to_string());
        }

        tokio::select! {
            _ = shutdown.cancelled() => return CycleEnd::Shutdown,
            _ = time::sleep(self.timing.settle_delay) => {}
        }

        CycleEnd::Continue
    }

    /// Extract, compare against the last snapshot, and either notify+persist
    /// a change or account the poll in the report window.
    async fn poll_once(&mut self, session: &P::Session) -> PollOutcome {
        let current = match self.extract(session).await {
            Extraction::Text(text) => text,
            Extraction::SessionLost(cause) => return PollOutcome::SessionLost(cause),
        };

        if current != self.last_snapshot {
            info!(
                "Content change detected ({} chars)",
                current.chars().count()
            );
            let message = format!(
                "Watched page changed! New content:\n\n{}",
                preview(&current)
            );
            self.notify_best_effort(&message).await;
            if let Err(e) = self.store.store(&current) {
                warn!("Failed to persist snapshot: {}", e);
            }
            self.last_snapshot = current;
            self.window.reset();
            return PollOutcome::Changed;
        }

        self.window.polls += 1;
        info!("No change ({} polls this window)", self.window.polls);

        if self.window.opened_at.elapsed() > self.timing.status_interval {
            let message = format!(
                "Monitor alive at {}. {} polls since the last report, no change.",
                chrono::Local::now().format("%H:%M:%S"),
                self.window.polls
            );
            self.notify_best_effort(&message).await;
            self.window.reset();
            return PollOutcome::Unchanged { reported: true };
        }

        PollOutcome::Unchanged { reported: false }
    }

    async fn extract(&mut self, session: &P::Session) -> Extraction {
        match self.page.extract_text(session).await {
            Ok(text) => Extraction::Text(text),
            // Any read fault counts as session loss; transient DOM glitches
            // and true expiry are not distinguished.
            Err(e) => Extraction::SessionLost(e.to_string()),
        }
    }

    /// Drop the dead session and establish a fresh one, sleeping the fixed
    /// cooldown between failed attempts. Returns `None` when shutdown fires
    /// first; the dead session has been released either way.
    async fn recover(
        &mut self,
        dead: P::Session,
        cause: &str,
        shutdown: &CancellationToken,
    ) -> Option<P::Session> {
        warn!("Session lost: {}", cause);
        self.page.release(dead).await;
        self.notify_best_effort(&format!(
            "Session lost ({}). Attempting to log back in...",
            cause
        ))
        .await;

        loop {
            if shutdown.is_cancelled() {
                return None;
            }

            match self.page.establish().await {
                Ok(session) => {
                    info!("Session re-established");
                    return Some(session);
                }
                Err(e) => {
                    error!("Recovery failed: {}", e);
                    self.notify_best_effort(&format!(
                        "Recovery failed ({}). Retrying in {} minutes.",
                        e,
                        self.timing.cooldown.as_secs() / 60
                    ))
                    .await;
                    tokio::select! {
                        _ = shutdown.cancelled() => return None,
                        _ = time::sleep(self.timing.cooldown) => {}
                    }
                }
            }
        }
    }

    async fn notify_best_effort(&self, text: &str) {
        if let Err(e) = self.notifier.send(text).await {
            warn!("Notification failed: {}", e);
        }
    }
}

/// Bounded prefix of new content for the change notification.
fn preview(text: &str) -> String {
    let mut cut: String = text.chars().take(PREVIEW_LIMIT).collect();
    if cut.len() < text.len() {
        cut.push_str("...");
    }
    cut
}
