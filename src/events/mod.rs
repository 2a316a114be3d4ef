use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Events emitted by the services layer. Consumed by a single background
/// processing loop; delivery is best-effort.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // BOM events
    BomCreated(Uuid),
    BomUpdated(Uuid),
    BomDeleted(Uuid),

    // Packout events
    BinSaved(Uuid),
    BinDeleted(Uuid),
    BinPosted {
        bin_id: Uuid,
        adjustment_number: String,
        line_count: usize,
    },
    BinPostingFailed {
        bin_id: Uuid,
        reason: String,
    },

    // Dispatch events
    DispatchSaved(i32),
    DispatchDeleted(i32),
    DispatchPosted {
        dispatch_id: i32,
        adjustment_number: String,
        line_count: usize,
    },
    DispatchPostingFailed {
        dispatch_id: i32,
        reason: String,
    },

    /// A computed movement line could not be resolved to an external
    /// product and was dropped from the batch.
    AdjustmentLineDropped {
        source: String,
        product_id: String,
    },

    /// A polled external status differed from the stored one.
    AdjustmentStatusChanged {
        adjustment_id: String,
        old_status: Option<String>,
        new_status: String,
    },

    // Automation workflow events
    AutomationTriggered {
        target: i64,
        attempts_used: u32,
    },
    AutomationExhausted {
        target: i64,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the receiver is gone.
    /// Event delivery must never abort the business operation that emitted it.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event.clone()).await {
            warn!("Event dropped: {} ({:?})", e, event);
        }
    }
}

/// Background loop draining the event channel. Currently events are logged;
/// the loop is the seam where outbound notifications would attach.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::BinPosted {
                bin_id,
                adjustment_number,
                line_count,
            } => {
                info!(
                    "Bin {} posted as {} with {} lines",
                    bin_id, adjustment_number, line_count
                );
            }
            Event::DispatchPosted {
                dispatch_id,
                adjustment_number,
                line_count,
            } => {
                info!(
                    "Dispatch {} posted as {} with {} lines",
                    dispatch_id, adjustment_number, line_count
                );
            }
            Event::AdjustmentLineDropped { source, product_id } => {
                warn!(
                    "Adjustment line dropped for {}: product {} did not resolve",
                    source, product_id
                );
            }
            Event::AdjustmentStatusChanged {
                adjustment_id,
                old_status,
                new_status,
            } => {
                info!(
                    "Adjustment {} status: {:?} -> {}",
                    adjustment_id, old_status, new_status
                );
            }
            Event::AutomationExhausted { target } => {
                warn!("Automation trigger exhausted retries for target {}", target);
            }
            other => info!("Event: {:?}", other),
        }
    }

    info!("Event processing loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_or_log_survives_closed_receiver() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);
        // Must not panic or error out
        sender.send_or_log(Event::BomCreated(Uuid::new_v4())).await;
    }

    #[tokio::test]
    async fn events_round_trip_through_channel() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);
        sender
            .send(Event::AutomationTriggered {
                target: 124,
                attempts_used: 1,
            })
            .await
            .unwrap();

        match rx.recv().await {
            Some(Event::AutomationTriggered {
                target,
                attempts_used,
            }) => {
                assert_eq!(target, 124);
                assert_eq!(attempts_used, 1);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
