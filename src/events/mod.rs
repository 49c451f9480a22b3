use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Handle for publishing events onto the internal processing channel.
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
}

// Events emitted by the request lifecycle and the allocation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    RequestApproved {
        request_id: Uuid,
        beneficiary_id: Uuid,
        outcome: String,
        delivered: Decimal,
    },
    RequestRejected {
        request_id: Uuid,
        beneficiary_id: Uuid,
    },
    RequestReverted {
        request_id: Uuid,
    },
    InventoryDepleted {
        request_id: Uuid,
        product_id: i64,
        quantity: Decimal,
        batches_touched: u32,
    },
    MovementRecorded {
        header_id: i64,
        detail_count: usize,
    },
    PartialAllocationWarning {
        request_id: Uuid,
        required: Decimal,
        delivered: Decimal,
    },
}

/// Creates a bounded event channel with the given capacity.
pub fn event_channel(capacity: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(capacity);
    (EventSender::new(tx), rx)
}

/// Drains the event channel, logging each event. Runs until all senders drop.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    info!("Event processor started");
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::RequestApproved {
                request_id,
                outcome,
                delivered,
                ..
            } => {
                info!(
                    request_id = %request_id,
                    outcome = %outcome,
                    delivered = %delivered,
                    "Request approved"
                );
            }
            Event::RequestRejected { request_id, .. } => {
                info!(request_id = %request_id, "Request rejected");
            }
            Event::RequestReverted { request_id } => {
                info!(request_id = %request_id, "Request reverted to pending");
            }
            Event::InventoryDepleted {
                request_id,
                product_id,
                quantity,
                batches_touched,
            } => {
                info!(
                    request_id = %request_id,
                    product_id,
                    quantity = %quantity,
                    batches_touched,
                    "Inventory depleted"
                );
            }
            Event::MovementRecorded {
                header_id,
                detail_count,
            } => {
                info!(header_id, detail_count, "Movement ledger entry recorded");
            }
            Event::PartialAllocationWarning {
                request_id,
                required,
                delivered,
            } => {
                warn!(
                    request_id = %request_id,
                    required = %required,
                    delivered = %delivered,
                    "Allocation only partially fulfilled"
                );
            }
        }
    }
    info!("Event processor stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn events_round_trip_through_channel() {
        let (sender, mut receiver) = event_channel(8);
        let id = Uuid::new_v4();
        sender
            .send(Event::RequestApproved {
                request_id: id,
                beneficiary_id: Uuid::new_v4(),
                outcome: "fulfilled".to_string(),
                delivered: dec!(5),
            })
            .await
            .unwrap();

        match receiver.recv().await {
            Some(Event::RequestApproved { request_id, .. }) => assert_eq!(request_id, id),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn send_fails_after_receiver_drops() {
        let (sender, receiver) = event_channel(1);
        drop(receiver);
        let result = sender.send(Event::RequestReverted {
            request_id: Uuid::new_v4(),
        });
        assert!(result.await.is_err());
    }
}
