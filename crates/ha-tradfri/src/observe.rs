//! Observe loop keeping an entity in sync with gateway pushes
//!
//! Gateway observations are one-shot, so the loop issues the observe command
//! again after every update. Failures are retried with exponential backoff;
//! after too many in a row the entity goes unavailable for good.

use crate::api::SharedGatewayApi;
use crate::command::{Command, Response};
use crate::error::TradfriError;
use ha_components::{LightEntity, LightStateWriter};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Backoff settings for a failing observation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// Consecutive failures tolerated before giving up
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
            max_attempts: 10,
        }
    }
}

impl RetryPolicy {
    /// Delay after the `failures`-th consecutive failure (1-based)
    pub fn backoff(&self, failures: u32) -> Duration {
        let exponent = failures.saturating_sub(1).min(31);
        self.initial_backoff
            .saturating_mul(1u32 << exponent)
            .min(self.max_backoff)
    }
}

/// An entity that can follow its gateway resource
pub(crate) trait Observable: LightEntity + 'static {
    fn api(&self) -> &SharedGatewayApi;

    fn retry_policy(&self) -> RetryPolicy;

    fn observe_command(&self) -> Command;

    /// Refresh the cache from an observe result
    fn apply_update(&self, response: Response) -> Result<(), TradfriError>;

    /// Enter the terminal unavailable state
    fn mark_unavailable(&self);
}

/// Start following `entity` in the background
pub(crate) fn spawn_observer<T: Observable>(
    entity: Arc<T>,
    writer: LightStateWriter,
) -> JoinHandle<()> {
    tokio::spawn(observe_loop(entity, writer))
}

async fn observe_loop<T: Observable>(entity: Arc<T>, writer: LightStateWriter) {
    let policy = entity.retry_policy();
    let mut failures = 0u32;

    loop {
        let command = entity.observe_command();
        let result = match entity.api().execute(command).await {
            Ok(response) => entity.apply_update(response),
            Err(err) => Err(err),
        };

        match result {
            Ok(()) => {
                failures = 0;
                debug!("Observed update for {}", entity.name());
                writer.write(&*entity);
            }
            Err(err) => {
                failures += 1;
                warn!(
                    "Observation failed for {} ({}/{}): {}",
                    entity.name(),
                    failures,
                    policy.max_attempts,
                    err
                );

                if failures >= policy.max_attempts {
                    warn!("Giving up on observing {}, marking it unavailable", entity.name());
                    entity.mark_unavailable();
                    writer.write(&*entity);
                    return;
                }

                let delay = policy.backoff(failures);
                debug!("Retrying observation of {} in {:?}", entity.name(), delay);
                tokio::time::sleep(delay).await;
            }
        }
    }
}
