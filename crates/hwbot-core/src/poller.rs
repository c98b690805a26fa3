use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use hwbot_channels::{send_message, Delivery, Notifier};
use hwbot_provider::{check_response, current_date, parse_status, HomeworkApi};
use hwbot_schema::HomeworkError;
use tokio_util::sync::CancellationToken;

/// How far behind the wall clock the first request starts.
pub const CHECKPOINT_SKEW_SECS: i64 = 60;

pub const FAILURE_PREFIX: &str = "Сбой в работе программы";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPhase {
    Startup,
    /// Last cycle found a status change and relayed it.
    Polling,
    /// Last cycle found nothing new.
    Backoff,
    ErrorReported,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Idle,
    Notified(Delivery),
    ErrorReported(Delivery),
    /// Same failure as the previous cycle; the user was not told again.
    ErrorSuppressed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollState {
    pub checkpoint: i64,
    pub last_error: Option<HomeworkError>,
    pub phase: PollPhase,
}

struct CycleResult {
    message: Option<String>,
    checkpoint: i64,
}

pub struct Poller {
    api: Arc<dyn HomeworkApi>,
    notifier: Arc<dyn Notifier>,
    interval: Duration,
    state: PollState,
}

impl Poller {
    pub fn new(api: Arc<dyn HomeworkApi>, notifier: Arc<dyn Notifier>, interval: Duration) -> Self {
        Self {
            api,
            notifier,
            interval,
            state: PollState {
                checkpoint: Utc::now().timestamp() - CHECKPOINT_SKEW_SECS,
                last_error: None,
                phase: PollPhase::Startup,
            },
        }
    }

    pub fn with_checkpoint(mut self, checkpoint: i64) -> Self {
        self.state.checkpoint = checkpoint;
        self
    }

    pub fn state(&self) -> &PollState {
        &self.state
    }

    /// Poll until `cancel` fires, sleeping `interval` after every cycle.
    pub async fn run(mut self, cancel: CancellationToken) -> PollState {
        tracing::info!(
            "Polling homework statuses every {}s from checkpoint {}",
            self.interval.as_secs(),
            self.state.checkpoint
        );

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                outcome = self.run_cycle() => {
                    tracing::debug!("Cycle finished: {:?}", outcome);
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = cancel.cancelled() => break,
            }
        }

        tracing::info!("Polling stopped at checkpoint {}", self.state.checkpoint);
        self.state
    }

    /// One fetch/validate/notify pass, without the trailing sleep.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        match self.poll_once().await {
            Ok(CycleResult { message, checkpoint }) => {
                self.state.checkpoint = checkpoint;
                self.state.last_error = None;
                match message {
                    Some(text) => {
                        let delivery = send_message(self.notifier.as_ref(), &text).await;
                        self.set_phase(PollPhase::Polling);
                        CycleOutcome::Notified(delivery)
                    }
                    None => {
                        tracing::debug!("No new homework status since {}", self.state.checkpoint);
                        self.set_phase(PollPhase::Backoff);
                        CycleOutcome::Idle
                    }
                }
            }
            Err(err) => {
                let text = format!("{FAILURE_PREFIX}: {err}");
                tracing::error!("{text}");
                self.set_phase(PollPhase::ErrorReported);

                if self.state.last_error.as_ref() == Some(&err) {
                    tracing::debug!("Same failure as last cycle, not notifying again");
                    return CycleOutcome::ErrorSuppressed;
                }

                let delivery = send_message(self.notifier.as_ref(), &text).await;
                self.state.last_error = Some(err);
                CycleOutcome::ErrorReported(delivery)
            }
        }
    }

    async fn poll_once(&self) -> Result<CycleResult, HomeworkError> {
        let body = self.api.fetch(self.state.checkpoint).await?;
        let homeworks = check_response(&body)?;

        let message = match homeworks.first() {
            Some(latest) => Some(parse_status(latest)?),
            None => None,
        };

        let checkpoint = current_date(&body).unwrap_or_else(|| {
            let now = Utc::now().timestamp();
            tracing::error!("response has no usable current_date, falling back to {now}");
            now
        });

        Ok(CycleResult { message, checkpoint })
    }

    fn set_phase(&mut self, phase: PollPhase) {
        if self.state.phase != phase {
            tracing::debug!("Poll phase {:?} -> {:?}", self.state.phase, phase);
            self.state.phase = phase;
        }
    }
}
