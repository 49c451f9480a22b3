use crate::{
    db::DbPool,
    events::EventSender,
    services::{
        allocation::AllocationService,
        ledger::LedgerService,
        notifications::LogNotifier,
        requests::RequestService,
        units::UnitConversionService,
    },
};
use std::sync::Arc;

pub mod approve_request_command;
pub mod reject_request_command;
pub mod revert_request_command;

pub use approve_request_command::ApproveRequestCommand;
pub use reject_request_command::RejectRequestCommand;
pub use revert_request_command::RevertRequestCommand;

/// Wires the request workflow service graph over shared handles.
pub(crate) fn request_service(
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
) -> RequestService {
    let units = Arc::new(UnitConversionService::new(db_pool.clone()));
    let allocation = Arc::new(AllocationService::new(db_pool.clone(), units.clone()));
    let ledger = Arc::new(LedgerService::new(db_pool.clone(), event_sender.clone()));
    RequestService::new(
        db_pool,
        event_sender,
        allocation,
        ledger,
        units,
        Arc::new(LogNotifier),
    )
}
