pub mod donation_request;
pub mod inventory_batch;
pub mod movement_detail;
pub mod movement_header;
pub mod product;
pub mod storage_location;
pub mod unit;
pub mod unit_conversion;

pub use donation_request::{Entity as DonationRequest, RequestStatus};
pub use inventory_batch::Entity as InventoryBatch;
pub use movement_detail::{Entity as MovementDetail, TransactionKind};
pub use movement_header::Entity as MovementHeader;
pub use product::Entity as Product;
pub use storage_location::Entity as StorageLocation;
pub use unit::Entity as Unit;
pub use unit_conversion::Entity as UnitConversion;
