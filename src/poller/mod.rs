//! Polling scheduler
//!
//! One task owns the poll loop. A round walks its target topics in registry
//! order, one fetch at a time, with a fixed pause between fetches so the
//! provider never sees a burst. A failing topic is logged and skipped; it
//! never ends the round or the loop.
//!
//! At startup a round over every registered topic runs before the first
//! tick so the cache is warm. After that each tick polls the configured
//! scope, normally only topics somebody is subscribed to.

use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep};
use tracing::{debug, info, warn};

use crate::broker::Coordinator;
use crate::config::{PollScope, PollerSettings};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollerState {
    Idle,
    Fetching(String),
}

/// Counts for one round.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RoundSummary {
    pub visited: usize,
    pub emitted: usize,
    pub failed: usize,
    /// Results dropped because their topic was deleted mid-fetch.
    pub discarded: usize,
}

pub struct Poller {
    coordinator: Coordinator,
    settings: PollerSettings,
    state: watch::Sender<PollerState>,
}

impl Poller {
    pub fn new(coordinator: Coordinator, settings: PollerSettings) -> Self {
        Self {
            coordinator,
            settings,
            state: watch::Sender::new(PollerState::Idle),
        }
    }

    pub fn state(&self) -> watch::Receiver<PollerState> {
        self.state.subscribe()
    }

    pub async fn run_round(&self, scope: PollScope) -> RoundSummary {
        let targets = self.coordinator.broker().poll_targets(scope);
        let mut summary = RoundSummary::default();

        for (i, topic) in targets.iter().enumerate() {
            if i > 0 {
                sleep(self.settings.pacing()).await;
            }
            self.state
                .send_replace(PollerState::Fetching(topic.name.clone()));
            summary.visited += 1;

            match self.coordinator.refresh(topic).await {
                Ok(Some(observation)) if observation.should_emit() => summary.emitted += 1,
                Ok(Some(_)) => {}
                Ok(None) => summary.discarded += 1,
                Err(err) => {
                    warn!("poll of {} failed: {err}", topic.name);
                    summary.failed += 1;
                }
            }
        }

        self.state.send_replace(PollerState::Idle);
        summary
    }

    /// Runs until `shutdown` fires or its sender is dropped.
    pub async fn run(self, mut shutdown: watch::Receiver<()>) {
        let period = self.settings.interval();
        info!(
            "poller started: every {}s over {:?} topics, {}ms between fetches",
            period.as_secs(),
            self.settings.scope,
            self.settings.pacing_ms
        );

        let summary = self.run_round(PollScope::All).await;
        info!("startup round: {summary:?}");

        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let summary = self.run_round(self.settings.scope).await;
                    debug!("poll round: {summary:?}");
                }
                _ = shutdown.changed() => {
                    info!("poller stopping");
                    break;
                }
            }
        }
    }
}
