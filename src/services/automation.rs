use crate::{
    db::DbPool,
    entities::automation_attempt::{self, Entity as AutomationAttemptEntity},
    errors::ServiceError,
    events::{Event, EventSender},
    unleashed::AutomationGateway,
};
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, EntityTrait, IntoActiveModel};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Derives the numeric automation target from a human-readable adjustment
/// number: strip the `SA-` prefix and leading zeros, parse, add one. The
/// offset is an external-system convention.
pub fn adjustment_target(adjustment_number: &str) -> Option<i64> {
    let stripped = adjustment_number
        .strip_prefix("SA-")
        .unwrap_or(adjustment_number)
        .trim_start_matches('0');

    stripped.parse::<i64>().ok().map(|n| n + 1)
}

/// Drives the external RPA workflow that approves parked adjustments.
///
/// Triggers are best-effort: a bounded number of attempts, silent
/// exhaustion, no error surfaced to the posting flow.
#[derive(Clone)]
pub struct AutomationService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    gateway: Arc<dyn AutomationGateway>,
    max_attempts: u32,
}

impl AutomationService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        gateway: Arc<dyn AutomationGateway>,
        max_attempts: u32,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            gateway,
            max_attempts,
        }
    }

    /// Fires the workflow for `target`, retrying on any non-200 outcome up
    /// to the attempt budget. Returns the successful status code, or `None`
    /// once the budget is exhausted.
    #[instrument(skip(self))]
    pub async fn trigger(&self, target: i64) -> Option<u16> {
        let mut attempt = 0;

        while attempt < self.max_attempts {
            match self.gateway.trigger(target).await {
                Ok(200) => {
                    info!("Automation triggered for target {}", target);
                    self.event_sender
                        .send_or_log(Event::AutomationTriggered {
                            target,
                            attempts_used: attempt + 1,
                        })
                        .await;
                    return Some(200);
                }
                Ok(status) => {
                    warn!(
                        "Automation trigger for {} returned {} (attempt {}/{})",
                        target,
                        status,
                        attempt + 1,
                        self.max_attempts
                    );
                    attempt += 1;
                }
                Err(e) => {
                    warn!(
                        "Automation trigger for {} failed: {} (attempt {}/{})",
                        target,
                        e,
                        attempt + 1,
                        self.max_attempts
                    );
                    attempt += 1;
                }
            }
        }

        self.event_sender
            .send_or_log(Event::AutomationExhausted { target })
            .await;
        None
    }

    /// Spawns a fire-and-forget trigger. The posting flow never awaits the
    /// workflow outcome.
    pub fn trigger_detached(&self, target: i64) {
        let service = self.clone();
        tokio::spawn(async move {
            service.trigger(target).await;
        });
    }

    /// Records a manual trigger in the attempt ledger and fires the
    /// workflow. The ledger is operational visibility only; it never
    /// blocks a retry.
    #[instrument(skip(self))]
    pub async fn manual_trigger(&self, target: i64) -> Result<(), ServiceError> {
        let db = self.db_pool.as_ref();
        let number = target.to_string();
        let now = Utc::now();

        match AutomationAttemptEntity::find_by_id(number.clone()).one(db).await? {
            Some(existing) => {
                let attempts = existing.attempts + 1;
                let mut active = existing.into_active_model();
                active.attempts = Set(attempts);
                active.updated_at = Set(now);
                active.update(db).await?;
            }
            None => {
                let active = automation_attempt::ActiveModel {
                    number: Set(number),
                    attempts: Set(1),
                    created_at: Set(now),
                    updated_at: Set(now),
                };
                active.insert(db).await?;
            }
        }

        self.trigger_detached(target);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_strips_prefix_and_leading_zeros() {
        assert_eq!(adjustment_target("SA-0000123"), Some(124));
        assert_eq!(adjustment_target("SA-0001000"), Some(1001));
        assert_eq!(adjustment_target("123"), Some(124));
    }

    #[test]
    fn unparseable_numbers_yield_none() {
        assert_eq!(adjustment_target("SA-"), None);
        assert_eq!(adjustment_target("Failed"), None);
        assert_eq!(adjustment_target(""), None);
    }
}
