//! Poll cycle orchestration: fetch, detect change, filter, log, decide, notify.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{info, info_span, warn, Instrument};

use crate::change::{Change, ChangeDetector};
use crate::config::AppConfig;
use crate::decision::{decide, AlertPolicy, Decision};
use crate::delay_log::write_delay_log;
use crate::feeds::SearchFetcher;
use crate::filters::{run_pipeline, RECENCY_WINDOW_SECS};
use crate::notify::{load_subscriptions, Notifier};

/// Everything a cycle needs besides its collaborators.
#[derive(Debug, Clone)]
pub struct PollSettings {
    pub interval: Duration,
    pub log_dir: PathBuf,
    pub subscriptions_path: PathBuf,
    pub policy: AlertPolicy,
}

impl From<&AppConfig> for PollSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            interval: config.poll.interval(),
            log_dir: config.output.log_dir.clone(),
            subscriptions_path: config.output.subscriptions_path.clone(),
            policy: config.alert.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleReport {
    /// Search failed; nothing changed and the next cycle retries.
    FetchFailed(String),
    NoUpdates { max_id: i64 },
    Processed(CycleSummary),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleSummary {
    pub max_id: i64,
    pub valid: usize,
    pub delayed: usize,
    pub decision: Decision,
    pub log_path: Option<PathBuf>,
    /// Messages accepted by the notifier.
    pub sent: usize,
    /// Messages the notifier rejected.
    pub failed: usize,
}

pub struct Poller {
    fetcher: Box<dyn SearchFetcher>,
    notifier: Box<dyn Notifier>,
    settings: PollSettings,
    detector: ChangeDetector,
}

impl Poller {
    pub fn new(
        fetcher: Box<dyn SearchFetcher>,
        notifier: Box<dyn Notifier>,
        settings: PollSettings,
    ) -> Self {
        Self {
            fetcher,
            notifier,
            settings,
            detector: ChangeDetector::new(),
        }
    }

    pub fn last_seen_id(&self) -> i64 {
        self.detector.last_seen_id()
    }

    /// Run one cycle as of `now`.
    pub async fn run_cycle(&mut self, now: DateTime<Utc>) -> CycleReport {
        let span = info_span!("poll_cycle", last_seen_id = self.detector.last_seen_id());
        self.cycle(now).instrument(span).await
    }

    async fn cycle(&mut self, now: DateTime<Utc>) -> CycleReport {
        let envelope = match self.fetcher.fetch().await {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(error = %e, "search fetch failed, retrying next cycle");
                return CycleReport::FetchFailed(e.to_string());
            }
        };

        let max_id = envelope.max_id;
        if self.detector.observe(max_id) == Change::Unchanged {
            info!(max_id, "no updates");
            return CycleReport::NoUpdates { max_id };
        }

        let outcome = run_pipeline(envelope.results, now, RECENCY_WINDOW_SECS);
        let valid = outcome.valid.len();
        let delayed = outcome.delayed.len();

        let mut log_path = None;
        if !outcome.delayed.is_empty() {
            info!(valid, delayed, "found delay posts");
            match write_delay_log(&self.settings.log_dir, now, valid, &outcome.delayed).await {
                Ok(path) => log_path = Some(path),
                Err(e) => warn!(error = %e, "could not write delay log"),
            }
        }

        let decision = decide(valid, delayed, &self.settings.policy);
        let (sent, failed) = match &decision {
            Decision::Notify { message, .. } => self.notify_subscribers(message).await,
            Decision::Quiet { percentage, .. } => {
                info!(valid, delayed, percentage, "below alert thresholds");
                (0, 0)
            }
            Decision::NoData => {
                info!("no valid posts this cycle");
                (0, 0)
            }
        };

        CycleReport::Processed(CycleSummary {
            max_id,
            valid,
            delayed,
            decision,
            log_path,
            sent,
            failed,
        })
    }

    async fn notify_subscribers(&self, message: &str) -> (usize, usize) {
        let path = &self.settings.subscriptions_path;
        let numbers = match load_subscriptions(path).await {
            Ok(numbers) => numbers,
            Err(e) => {
                warn!(error = %e, "skipping notifications this cycle");
                return (0, 0);
            }
        };

        let mut sent = 0;
        let mut failed = 0;
        for number in &numbers {
            match self.notifier.send(number, message).await {
                Ok(()) => sent += 1,
                Err(e) => {
                    warn!(
                        notifier = self.notifier.id(),
                        to = %number,
                        error = %e,
                        "notification failed"
                    );
                    failed += 1;
                }
            }
        }
        info!(notifier = self.notifier.id(), sent, failed, "notified subscribers");
        (sent, failed)
    }

    /// Poll forever, sleeping `interval` between cycles, until Ctrl-C.
    pub async fn run(mut self) {
        loop {
            info!("polling search endpoint");
            self.run_cycle(Utc::now()).await;
            info!(next_in_secs = self.settings.interval.as_secs(), "done polling");

            tokio::select! {
                _ = tokio::time::sleep(self.settings.interval) => {}
                _ = tokio::signal::ctrl_c() => {
                    info!("interrupted, shutting down");
                    return;
                }
            }
        }
    }
}
