use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request},
    Router,
};
use chrono::{DateTime, Utc};
use foodbank_api::{
    config::AppConfig,
    db,
    entities::{
        donation_request, inventory_batch, product, storage_location, unit, unit_conversion,
    },
    events,
    handlers::AppServices,
    services::notifications::LogNotifier,
    AppState,
};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

/// Helper harness for spinning up an application backed by an in-memory
/// SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        // A single connection keeps the in-memory database alive for the
        // whole test.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_sender, event_rx) = events::event_channel(256);
        let event_task = tokio::spawn(events::process_events(event_rx));
        let event_sender = Arc::new(event_sender);

        let services = AppServices::new(db_arc.clone(), event_sender.clone(), Arc::new(LogNotifier));

        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            services,
        };

        let router = foodbank_api::app(state.clone());

        Self {
            router,
            state,
            _event_task: event_task,
        }
    }

    /// Send a JSON request against the router.
    #[allow(dead_code)]
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    #[allow(dead_code)]
    pub async fn read_json(response: axum::response::Response) -> Value {
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("failed to read response body")
            .to_bytes();
        serde_json::from_slice(&bytes).expect("response body is not valid json")
    }

    pub async fn seed_unit(&self, code: &str, magnitude_group: &str, is_base: bool) -> unit::Model {
        unit::ActiveModel {
            code: Set(code.to_string()),
            name: Set(code.to_string()),
            magnitude_group: Set(magnitude_group.to_string()),
            is_base: Set(is_base),
            ..Default::default()
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("seed unit")
    }

    pub async fn seed_conversion(
        &self,
        origin_unit_id: i64,
        destination_unit_id: i64,
        factor: Decimal,
    ) -> unit_conversion::Model {
        unit_conversion::ActiveModel {
            origin_unit_id: Set(origin_unit_id),
            destination_unit_id: Set(destination_unit_id),
            factor: Set(factor),
            ..Default::default()
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("seed conversion")
    }

    pub async fn seed_product(&self, name: &str, unit_id: Option<i64>) -> product::Model {
        product::ActiveModel {
            name: Set(name.to_string()),
            unit_id: Set(unit_id),
            ..Default::default()
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("seed product")
    }

    pub async fn seed_location(&self, name: &str) -> storage_location::Model {
        storage_location::ActiveModel {
            name: Set(name.to_string()),
            ..Default::default()
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("seed location")
    }

    pub async fn seed_batch(
        &self,
        product_id: i64,
        location_id: i64,
        quantity: Decimal,
        updated_at: DateTime<Utc>,
    ) -> inventory_batch::Model {
        inventory_batch::ActiveModel {
            product_id: Set(product_id),
            location_id: Set(location_id),
            quantity_available: Set(quantity),
            updated_at: Set(updated_at),
            ..Default::default()
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("seed batch")
    }

    pub async fn seed_request(
        &self,
        food_type: &str,
        quantity: Decimal,
        unit_id: Option<i64>,
    ) -> donation_request::Model {
        donation_request::ActiveModel {
            id: Set(Uuid::new_v4()),
            beneficiary_id: Set(Uuid::new_v4()),
            food_type: Set(food_type.to_string()),
            quantity: Set(quantity),
            unit_id: Set(unit_id),
            status: Set("pending".to_string()),
            admin_comment: Set(None),
            responded_at: Set(None),
            created_at: Set(Utc::now()),
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("seed request")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}
