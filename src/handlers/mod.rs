use crate::{
    db::DbPool,
    events::EventSender,
    services::{
        allocation::AllocationService,
        ledger::LedgerService,
        notifications::Notifier,
        requests::RequestService,
        units::UnitConversionService,
    },
};
use std::sync::Arc;

pub mod ledger;
pub mod requests;

/// Aggregated service handles shared by HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub requests: Arc<RequestService>,
    pub allocation: Arc<AllocationService>,
    pub ledger: Arc<LedgerService>,
    pub units: Arc<UnitConversionService>,
}

impl AppServices {
    pub fn new(
        db: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let units = Arc::new(UnitConversionService::new(db.clone()));
        let allocation = Arc::new(AllocationService::new(db.clone(), units.clone()));
        let ledger = Arc::new(LedgerService::new(db.clone(), event_sender.clone()));
        let requests = Arc::new(RequestService::new(
            db,
            event_sender,
            allocation.clone(),
            ledger.clone(),
            units.clone(),
            notifier,
        ));
        Self {
            requests,
            allocation,
            ledger,
            units,
        }
    }
}
