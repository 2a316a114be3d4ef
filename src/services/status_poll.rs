use crate::{
    db::DbPool,
    entities::{
        bin, bin::Entity as BinEntity, dispatch, dispatch::Entity as DispatchEntity,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    models::{external_status, PostingState},
    unleashed::StockAdjustmentGateway,
};
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, IntoActiveModel,
    QueryFilter,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, instrument};

/// Outcome of one poll sweep.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct PollReport {
    pub checked: usize,
    pub updated: usize,
    pub failed: usize,
}

impl PollReport {
    fn merge(self, other: PollReport) -> PollReport {
        PollReport {
            checked: self.checked + other.checked,
            updated: self.updated + other.updated,
            failed: self.failed + other.failed,
        }
    }
}

/// Advances the stored external status of posted bins and dispatches by
/// polling the adjustment gateway.
///
/// Candidates are records with an adjustment identifier whose stored
/// status is absent or still `PARKED`. Records are polled sequentially;
/// one record's failure is logged and skipped without aborting the sweep.
#[derive(Clone)]
pub struct StatusPollService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    gateway: Arc<dyn StockAdjustmentGateway>,
}

impl StatusPollService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        gateway: Arc<dyn StockAdjustmentGateway>,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            gateway,
        }
    }

    fn connection(&self) -> &DatabaseConnection {
        self.db_pool.as_ref()
    }

    fn pending_condition<S, P>(status_col: S, id_col: P) -> Condition
    where
        S: ColumnTrait,
        P: ColumnTrait,
    {
        Condition::all()
            .add(id_col.is_not_null())
            .add(
                Condition::any()
                    .add(status_col.is_null())
                    .add(status_col.eq(external_status::PARKED)),
            )
    }

    /// Polls every pending bin once. At most one status write per record
    /// per sweep, and only when the returned status differs.
    #[instrument(skip(self))]
    pub async fn poll_bins(&self) -> Result<PollReport, ServiceError> {
        let db = self.connection();
        let candidates = BinEntity::find()
            .filter(Self::pending_condition(
                bin::Column::ExternalStatus,
                bin::Column::AdjustmentId,
            ))
            .all(db)
            .await?;

        let mut report = PollReport::default();
        for record in candidates {
            let Some(adjustment_id) = record.adjustment_id.clone() else {
                continue;
            };
            report.checked += 1;

            match self.gateway.adjustment_status(&adjustment_id).await {
                Ok(info) => {
                    let status = info.status.to_uppercase();
                    if record.external_status.as_deref() != Some(status.as_str()) {
                        let old_status = record.external_status.clone();
                        let mut active = record.into_active_model();
                        if status == external_status::COMPLETED {
                            active.posting_state = Set(PostingState::Approved);
                        }
                        active.external_status = Set(Some(status.clone()));
                        active.external_modified_by = Set(info.last_modified_by.clone());
                        active.external_modified_on = Set(info.last_modified_on.clone());
                        active.updated_at = Set(Utc::now());
                        active.update(db).await?;

                        self.event_sender
                            .send_or_log(Event::AdjustmentStatusChanged {
                                adjustment_id,
                                old_status,
                                new_status: status,
                            })
                            .await;
                        report.updated += 1;
                    }
                }
                Err(e) => {
                    error!(
                        "Failed to fetch status for bin adjustment {}: {}",
                        adjustment_id, e
                    );
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    /// Polls every pending dispatch once.
    #[instrument(skip(self))]
    pub async fn poll_dispatches(&self) -> Result<PollReport, ServiceError> {
        let db = self.connection();
        let candidates = DispatchEntity::find()
            .filter(Self::pending_condition(
                dispatch::Column::ExternalStatus,
                dispatch::Column::AdjustmentId,
            ))
            .all(db)
            .await?;

        let mut report = PollReport::default();
        for record in candidates {
            let Some(adjustment_id) = record.adjustment_id.clone() else {
                continue;
            };
            report.checked += 1;

            match self.gateway.adjustment_status(&adjustment_id).await {
                Ok(info) => {
                    let status = info.status.to_uppercase();
                    if record.external_status.as_deref() != Some(status.as_str()) {
                        let old_status = record.external_status.clone();
                        let mut active = record.into_active_model();
                        if status == external_status::COMPLETED {
                            active.posting_state = Set(PostingState::Approved);
                        }
                        active.external_status = Set(Some(status.clone()));
                        active.external_modified_by = Set(info.last_modified_by.clone());
                        active.external_modified_on = Set(info.last_modified_on.clone());
                        active.updated_at = Set(Utc::now());
                        active.update(db).await?;

                        self.event_sender
                            .send_or_log(Event::AdjustmentStatusChanged {
                                adjustment_id,
                                old_status,
                                new_status: status,
                            })
                            .await;
                        report.updated += 1;
                    }
                }
                Err(e) => {
                    error!(
                        "Failed to fetch status for dispatch adjustment {}: {}",
                        adjustment_id, e
                    );
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    /// Polls bins then dispatches, sequentially.
    #[instrument(skip(self))]
    pub async fn sweep(&self) -> Result<PollReport, ServiceError> {
        let bins = self.poll_bins().await?;
        let dispatches = self.poll_dispatches().await?;
        Ok(bins.merge(dispatches))
    }
}
