pub mod allocation;
pub mod ledger;
pub mod notifications;
pub mod requests;
pub mod units;
