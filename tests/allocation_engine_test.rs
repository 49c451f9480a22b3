mod common;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use common::TestApp;
use foodbank_api::entities::{
    donation_request::RequestStatus,
    inventory_batch::Entity as InventoryBatch,
    movement_detail::TransactionKind,
};
use foodbank_api::{
    events::{self, Event, EventSender},
    services::{
        allocation::AllocationService,
        ledger::LedgerService,
        notifications::{LogNotifier, Notification, NotificationError, Notifier},
        requests::RequestService,
        units::UnitConversionService,
    },
};
use rust_decimal_macros::dec;
use sea_orm::EntityTrait;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Notifier that records every notification for later assertions.
struct RecordingNotifier(Mutex<Vec<Notification>>);

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notification: Notification) -> Result<(), NotificationError> {
        self.0.lock().unwrap().push(notification);
        Ok(())
    }
}

/// Builds a request service over the test database with a custom notifier
/// and event channel.
fn build_request_service(
    app: &TestApp,
    notifier: Arc<dyn Notifier>,
    event_sender: Arc<EventSender>,
) -> RequestService {
    let db = app.state.db.clone();
    let units = Arc::new(UnitConversionService::new(db.clone()));
    let allocation = Arc::new(AllocationService::new(db.clone(), units.clone()));
    let ledger = Arc::new(LedgerService::new(db.clone(), event_sender.clone()));
    RequestService::new(db, event_sender, allocation, ledger, units, notifier)
}

#[tokio::test]
async fn approval_converts_units_and_fulfills_from_one_batch() {
    let app = TestApp::new().await;

    let kg = app.seed_unit("kg", "mass", true).await;
    let g = app.seed_unit("g", "mass", false).await;
    app.seed_conversion(kg.id, g.id, dec!(1000)).await;

    let rice = app.seed_product("Rice", Some(g.id)).await;
    let warehouse = app.seed_location("Main warehouse").await;
    let batch = app
        .seed_batch(rice.id, warehouse.id, dec!(6000), Utc::now())
        .await;

    let request = app.seed_request("rice", dec!(5), Some(kg.id)).await;

    let result = app
        .state
        .services
        .requests
        .approve(request.id, Uuid::new_v4(), None)
        .await
        .expect("approval should succeed");

    assert!(result.success);
    assert!(result.warning.is_none(), "fulfilled approval has no warning");
    assert!(result.message.contains("inventory updated"));

    // 5 kg -> 5000 g taken from the 6000 g batch
    let batch_after = InventoryBatch::find_by_id(batch.id)
        .one(app.state.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(batch_after.quantity_available, dec!(1000));

    let updated = app
        .state
        .services
        .requests
        .get_request(request.id)
        .await
        .unwrap();
    assert_eq!(updated.status(), Some(RequestStatus::Approved));
    assert!(updated.responded_at.is_some());

    // One ledger header with one egress detail for the delivered quantity
    let headers = app.state.services.ledger.list_headers().await.unwrap();
    assert_eq!(headers.len(), 1);
    let details = app
        .state
        .services
        .ledger
        .list_details(headers[0].id)
        .await
        .unwrap();
    assert_eq!(details.len(), 1);
    assert_eq!(details[0].quantity, dec!(5000));
    assert_eq!(details[0].product_id, rice.id);
    assert_eq!(
        TransactionKind::from_str(&details[0].transaction_kind),
        Some(TransactionKind::Egress)
    );

    // Header and detail notes name the requested food type
    assert!(headers[0].note.as_deref().unwrap_or_default().contains("rice"));
    assert!(details[0].note.as_deref().unwrap_or_default().contains("rice"));
}

#[tokio::test]
async fn partial_allocation_drains_batches_oldest_first() {
    let app = TestApp::new().await;

    let beans = app.seed_product("Beans", None).await;
    let warehouse = app.seed_location("Main warehouse").await;
    let older = app
        .seed_batch(
            beans.id,
            warehouse.id,
            dec!(4),
            Utc::now() - Duration::minutes(30),
        )
        .await;
    let newer = app
        .seed_batch(beans.id, warehouse.id, dec!(3), Utc::now())
        .await;

    let request = app.seed_request("beans", dec!(10), None).await;

    let result = app
        .state
        .services
        .requests
        .approve(request.id, Uuid::new_v4(), None)
        .await
        .expect("approval should succeed");

    assert!(result.success);
    assert!(result.message.contains("Delivered 7 of 10"));
    let warning = result.warning.expect("partial approval carries a warning");
    assert!(warning.contains("3"));

    let db = app.state.db.as_ref();
    let older_after = InventoryBatch::find_by_id(older.id)
        .one(db)
        .await
        .unwrap()
        .unwrap();
    let newer_after = InventoryBatch::find_by_id(newer.id)
        .one(db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(older_after.quantity_available, dec!(0));
    assert_eq!(newer_after.quantity_available, dec!(0));
}

#[tokio::test]
async fn depletion_takes_only_what_is_needed() {
    let app = TestApp::new().await;

    let flour = app.seed_product("Flour", None).await;
    let warehouse = app.seed_location("Main warehouse").await;
    let older = app
        .seed_batch(
            flour.id,
            warehouse.id,
            dec!(4),
            Utc::now() - Duration::minutes(30),
        )
        .await;
    let newer = app
        .seed_batch(flour.id, warehouse.id, dec!(10), Utc::now())
        .await;

    let allocation = app.state.services.allocation.clone();
    let batches = allocation.find_batches(flour.id).await.unwrap();
    assert_eq!(batches[0].id, older.id, "oldest-updated batch comes first");

    let outcome = allocation.deplete_batches(dec!(6), &batches).await;
    assert_eq!(outcome.delivered, dec!(6));
    assert_eq!(outcome.remaining, dec!(0));
    assert_eq!(outcome.batches_touched, 2);
    assert_eq!(outcome.batches_attempted, 2);

    let db = app.state.db.as_ref();
    let older_after = InventoryBatch::find_by_id(older.id)
        .one(db)
        .await
        .unwrap()
        .unwrap();
    let newer_after = InventoryBatch::find_by_id(newer.id)
        .one(db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(older_after.quantity_available, dec!(0));
    assert_eq!(newer_after.quantity_available, dec!(8));
}

#[tokio::test]
async fn no_matching_products_yields_no_stock_and_no_ledger() {
    let app = TestApp::new().await;

    let request = app.seed_request("chocolate", dec!(5), None).await;

    let result = app
        .state
        .services
        .requests
        .approve(request.id, Uuid::new_v4(), None)
        .await
        .expect("approval still succeeds without stock");

    assert!(result.success);
    assert!(result.message.contains("No stock"));
    assert!(result.warning.is_some());

    // The request is approved regardless of stock
    let updated = app
        .state
        .services
        .requests
        .get_request(request.id)
        .await
        .unwrap();
    assert_eq!(updated.status(), Some(RequestStatus::Approved));

    // A header with zero details is never created
    let headers = app.state.services.ledger.list_headers().await.unwrap();
    assert!(headers.is_empty());
}

#[tokio::test]
async fn conversion_refused_across_magnitude_groups() {
    let app = TestApp::new().await;

    let kg = app.seed_unit("kg", "mass", true).await;
    let liter = app.seed_unit("l", "volume", true).await;
    // Even a stored row must not make volume convertible to mass
    app.seed_conversion(kg.id, liter.id, dec!(1)).await;

    let factor = app.state.services.units.resolve(kg.id, liter.id).await.unwrap();
    assert!(factor.is_none());
}

#[tokio::test]
async fn conversion_round_trip_is_identity() {
    let app = TestApp::new().await;

    let kg = app.seed_unit("kg", "mass", true).await;
    let g = app.seed_unit("g", "mass", false).await;
    app.seed_conversion(kg.id, g.id, dec!(1000)).await;

    let units = &app.state.services.units;
    let forward = units.resolve(kg.id, g.id).await.unwrap().unwrap();
    let backward = units.resolve(g.id, kg.id).await.unwrap().unwrap();

    assert_eq!(forward, dec!(1000));
    assert_eq!(backward, dec!(0.001));
    assert_eq!(forward * backward, dec!(1));
}

#[tokio::test]
async fn identity_conversion_needs_no_lookup() {
    let app = TestApp::new().await;

    // Unit id that does not exist; identity must still resolve
    let factor = app.state.services.units.resolve(42, 42).await.unwrap();
    assert_eq!(factor, Some(dec!(1)));
}

#[tokio::test]
async fn missing_conversion_proceeds_unconverted_with_warning() {
    let app = TestApp::new().await;

    let kg = app.seed_unit("kg", "mass", true).await;
    let g = app.seed_unit("g", "mass", false).await;
    // No conversion row seeded between kg and g

    let lentils = app.seed_product("Lentils", Some(g.id)).await;
    let warehouse = app.seed_location("Main warehouse").await;
    app.seed_batch(lentils.id, warehouse.id, dec!(10), Utc::now())
        .await;

    let request = app.seed_request("lentils", dec!(5), Some(kg.id)).await;

    let result = app
        .state
        .services
        .requests
        .approve(request.id, Uuid::new_v4(), None)
        .await
        .expect("approval should succeed");

    assert!(result.success);
    let warning = result.warning.expect("missing conversion warns the caller");
    assert!(warning.contains("conversion"));

    // Raw quantity was applied: 5 taken from the 10 available
    let batches = app
        .state
        .services
        .allocation
        .find_batches(lentils.id)
        .await
        .unwrap();
    assert_eq!(batches[0].quantity_available, dec!(5));
}

#[tokio::test]
async fn revert_resets_request_but_not_inventory() {
    let app = TestApp::new().await;

    let rice = app.seed_product("Rice", None).await;
    let warehouse = app.seed_location("Main warehouse").await;
    let batch = app
        .seed_batch(rice.id, warehouse.id, dec!(10), Utc::now())
        .await;

    let request = app.seed_request("rice", dec!(4), None).await;
    let requests = app.state.services.requests.clone();

    requests
        .approve(request.id, Uuid::new_v4(), None)
        .await
        .expect("approval should succeed");

    let result = requests.revert(request.id).await.expect("revert succeeds");
    assert!(result.success);
    assert!(result.message.contains("not restored"));

    let reverted = requests.get_request(request.id).await.unwrap();
    assert_eq!(reverted.status(), Some(RequestStatus::Pending));
    assert!(reverted.responded_at.is_none());

    // Inventory stays at its depleted level
    let batch_after = InventoryBatch::find_by_id(batch.id)
        .one(app.state.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(batch_after.quantity_available, dec!(6));
}

#[tokio::test]
async fn rejection_leaves_inventory_untouched() {
    let app = TestApp::new().await;

    let rice = app.seed_product("Rice", None).await;
    let warehouse = app.seed_location("Main warehouse").await;
    let batch = app
        .seed_batch(rice.id, warehouse.id, dec!(10), Utc::now())
        .await;

    let request = app.seed_request("rice", dec!(4), None).await;

    let result = app
        .state
        .services
        .requests
        .reject(request.id, Uuid::new_v4(), Some("  out of service area  ".to_string()))
        .await
        .expect("rejection succeeds");
    assert!(result.success);

    let updated = app
        .state
        .services
        .requests
        .get_request(request.id)
        .await
        .unwrap();
    assert_eq!(updated.status(), Some(RequestStatus::Rejected));
    assert_eq!(updated.admin_comment.as_deref(), Some("out of service area"));

    let batch_after = InventoryBatch::find_by_id(batch.id)
        .one(app.state.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(batch_after.quantity_available, dec!(10));
}

#[tokio::test]
async fn already_decided_request_cannot_be_decided_again() {
    let app = TestApp::new().await;

    let request = app.seed_request("rice", dec!(1), None).await;
    let requests = app.state.services.requests.clone();

    requests
        .approve(request.id, Uuid::new_v4(), None)
        .await
        .expect("first approval succeeds");

    let second = requests.approve(request.id, Uuid::new_v4(), None).await;
    assert!(second.is_err());

    let rejection = requests.reject(request.id, Uuid::new_v4(), None).await;
    assert!(rejection.is_err());
}

#[tokio::test]
async fn allocation_spans_multiple_products() {
    let app = TestApp::new().await;

    let warehouse = app.seed_location("Main warehouse").await;
    let white_rice = app.seed_product("White Rice", None).await;
    let brown_rice = app.seed_product("Brown Rice", None).await;
    app.seed_batch(white_rice.id, warehouse.id, dec!(3), Utc::now())
        .await;
    app.seed_batch(brown_rice.id, warehouse.id, dec!(5), Utc::now())
        .await;

    // Case-insensitive substring match picks up both products
    let request = app.seed_request("RICE", dec!(6), None).await;

    let result = app
        .state
        .services
        .requests
        .approve(request.id, Uuid::new_v4(), None)
        .await
        .expect("approval should succeed");
    assert!(result.success);
    assert!(result.warning.is_none());

    // 3 from the first product, 3 from the second; one detail per product
    let headers = app.state.services.ledger.list_headers().await.unwrap();
    assert_eq!(headers.len(), 1);
    let details = app
        .state
        .services
        .ledger
        .list_details(headers[0].id)
        .await
        .unwrap();
    assert_eq!(details.len(), 2);
    let total: rust_decimal::Decimal = details.iter().map(|d| d.quantity).sum();
    assert_eq!(total, dec!(6));
}

#[tokio::test]
async fn rejection_notification_carries_the_admin_comment() {
    let app = TestApp::new().await;

    let notifier = Arc::new(RecordingNotifier(Mutex::new(Vec::new())));
    let service = build_request_service(&app, notifier.clone(), app.state.event_sender.clone());

    let commented = app.seed_request("beans", dec!(2), None).await;
    service
        .reject(
            commented.id,
            Uuid::new_v4(),
            Some("  out of coverage area  ".to_string()),
        )
        .await
        .expect("rejection succeeds");

    let plain = app.seed_request("beans", dec!(2), None).await;
    service
        .reject(plain.id, Uuid::new_v4(), Some("   ".to_string()))
        .await
        .expect("rejection succeeds");

    let sent = notifier.0.lock().unwrap();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].title, "Request rejected");
    assert!(sent[0].body.contains("out of coverage area"));
    // A blank comment falls back to the generic body
    assert!(!sent[1].body.contains("Administrator comment"));
}

#[tokio::test]
async fn approval_publishes_depletion_events_per_product() {
    let app = TestApp::new().await;

    let warehouse = app.seed_location("Main warehouse").await;
    let white_rice = app.seed_product("White Rice", None).await;
    let brown_rice = app.seed_product("Brown Rice", None).await;
    app.seed_batch(white_rice.id, warehouse.id, dec!(3), Utc::now())
        .await;
    app.seed_batch(brown_rice.id, warehouse.id, dec!(5), Utc::now())
        .await;

    let request = app.seed_request("rice", dec!(6), None).await;

    let (event_sender, mut event_rx) = events::event_channel(64);
    let service = build_request_service(&app, Arc::new(LogNotifier), Arc::new(event_sender));

    service
        .approve(request.id, Uuid::new_v4(), None)
        .await
        .expect("approval succeeds");

    let mut depleted = Vec::new();
    while let Ok(event) = event_rx.try_recv() {
        if let Event::InventoryDepleted {
            request_id,
            product_id,
            quantity,
            batches_touched,
        } = event
        {
            assert_eq!(request_id, request.id);
            depleted.push((product_id, quantity, batches_touched));
        }
    }

    assert_eq!(
        depleted,
        vec![(white_rice.id, dec!(3), 1), (brown_rice.id, dec!(3), 1)]
    );
}
