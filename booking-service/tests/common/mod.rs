//! Test helper module for booking-service integration tests.
//!
//! Each test gets its own Postgres schema. Tests return early when
//! `TEST_DATABASE_URL` is not set.

#![allow(dead_code)]

use booking_service::clock::{Clock, FixedClock};
use booking_service::config::{BookingCodeConfig, BookingConfig, DatabaseConfig};
use booking_service::models::TransitionPolicy;
use booking_service::services::{init_metrics, Database};
use booking_service::startup::Application;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use service_core::config::Config as CoreConfig;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

// Counter for unique schema names
static SCHEMA_COUNTER: AtomicU32 = AtomicU32::new(0);

/// "Today" for every spawned app.
pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 11, 20).unwrap()
}

/// A clock the test can move forward between requests.
pub struct TestClock(Mutex<NaiveDate>);

impl Clock for TestClock {
    fn now(&self) -> DateTime<Utc> {
        FixedClock::on(*self.0.lock().unwrap()).now()
    }
}

fn unique_schema_name() -> String {
    let counter = SCHEMA_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("test_booking_{}_{}", std::process::id(), counter)
}

/// Parse a money field from a response body.
pub fn money(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().expect("money string"),
        Value::Number(n) => n.to_string().parse().expect("money number"),
        other => panic!("not a money value: {}", other),
    }
}

pub fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

/// Test application wrapper for integration tests.
pub struct TestApp {
    pub address: String,
    pub http_port: u16,
    pub db: Database,
    pub client: reqwest::Client,
    clock: Arc<TestClock>,
    base_url: String,
    schema_name: String,
}

impl TestApp {
    pub async fn spawn() -> Option<Self> {
        Self::spawn_with(TransitionPolicy::Permissive, BookingCodeConfig::default()).await
    }

    /// Spawn a new test application on a random port, or `None` without a test database.
    pub async fn spawn_with(
        status_transitions: TransitionPolicy,
        booking_code: BookingCodeConfig,
    ) -> Option<Self> {
        let Ok(base_url) = std::env::var("TEST_DATABASE_URL") else {
            eprintln!("TEST_DATABASE_URL not set; skipping");
            return None;
        };

        init_metrics();

        let schema_name = unique_schema_name();

        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(2)
            .connect(&base_url)
            .await
            .expect("Failed to connect to test database");

        sqlx::query(&format!("DROP SCHEMA IF EXISTS {} CASCADE", schema_name))
            .execute(&pool)
            .await
            .ok();
        sqlx::query(&format!("CREATE SCHEMA {}", schema_name))
            .execute(&pool)
            .await
            .expect("Failed to create test schema");

        pool.close().await;

        let separator = if base_url.contains('?') { "&" } else { "?" };
        let db_url_with_schema = format!(
            "{}{}options=-c search_path%3D{}",
            base_url, separator, schema_name
        );

        let config = BookingConfig {
            common: CoreConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            service_name: "booking-service-test".to_string(),
            service_version: "0.1.0".to_string(),
            log_level: "warn".to_string(),
            otlp_endpoint: None,
            database: DatabaseConfig {
                url: db_url_with_schema.clone(),
                max_connections: 10,
                min_connections: 1,
            },
            booking_code,
            status_transitions,
        };

        let clock = Arc::new(TestClock(Mutex::new(today())));
        let app = Application::build_with_clock(config, clock.clone())
            .await
            .expect("Failed to build test application");

        let http_port = app.http_port();
        let db = app.db().clone();

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        let address = format!("http://127.0.0.1:{}", http_port);
        let client = reqwest::Client::new();
        for _ in 0..50 {
            if client
                .get(format!("{}/health", address))
                .send()
                .await
                .is_ok()
            {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        Some(TestApp {
            address,
            http_port,
            db,
            client,
            clock,
            base_url,
            schema_name,
        })
    }

    /// Move the app's "today" for subsequent requests.
    pub fn set_today(&self, date: NaiveDate) {
        *self.clock.0.lock().unwrap() = date;
    }

    pub async fn get(&self, path: &str) -> (StatusCode, Value) {
        let res = self
            .client
            .get(format!("{}{}", self.address, path))
            .send()
            .await
            .expect("request failed");
        Self::read(res).await
    }

    pub async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let res = self
            .client
            .post(format!("{}{}", self.address, path))
            .json(&body)
            .send()
            .await
            .expect("request failed");
        Self::read(res).await
    }

    pub async fn put(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let res = self
            .client
            .put(format!("{}{}", self.address, path))
            .json(&body)
            .send()
            .await
            .expect("request failed");
        Self::read(res).await
    }

    pub async fn delete(&self, path: &str) -> (StatusCode, Value) {
        let res = self
            .client
            .delete(format!("{}{}", self.address, path))
            .send()
            .await
            .expect("request failed");
        Self::read(res).await
    }

    async fn read(res: reqwest::Response) -> (StatusCode, Value) {
        let status = res.status();
        let body = res.json::<Value>().await.unwrap_or(Value::Null);
        (status, body)
    }

    /// Create a booking and return its `data` object.
    pub async fn create_booking(&self, client_name: &str) -> Value {
        self.create_booking_with(json!({
            "client_id": Uuid::new_v4(),
            "client_name": client_name,
            "pax_count": 2,
            "travel_date_from": "2025-12-10",
            "travel_date_to": "2025-12-14"
        }))
        .await
    }

    pub async fn create_booking_with(&self, body: Value) -> Value {
        let (status, body) = self.post("/bookings", body).await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["data"].clone()
    }

    /// Scenario A hotel: 150/night for two nights, sold at 200.
    pub async fn add_hotel(&self, booking_id: &str) -> Value {
        let (status, body) = self
            .post(
                "/booking-hotels",
                json!({
                    "booking_id": booking_id,
                    "hotel_name": "Hotel Nile View",
                    "check_in": "2025-12-10",
                    "check_out": "2025-12-12",
                    "number_of_rooms": 1,
                    "cost_per_night": "150",
                    "sell_price": "200"
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["data"].clone()
    }

    /// Scenario B tour: self-operated, 100 + 120 + 80 + 0, sold at 600.
    pub async fn add_tour(&self, booking_id: &str, sell_price: &str) -> Value {
        let (status, body) = self
            .post(
                "/booking-tours",
                json!({
                    "booking_id": booking_id,
                    "tour_name": "Pyramids day tour",
                    "tour_date": "2025-12-11",
                    "operation_type": "self-operated",
                    "guide_cost": "100",
                    "vehicle_cost": "120",
                    "entrance_fees": "80",
                    "other_costs": "0",
                    "pax_count": 2,
                    "sell_price": sell_price
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["data"].clone()
    }

    pub async fn pay(&self, booking_id: &str, amount: &str) -> Value {
        let (status, body) = self
            .post(
                "/client-payments",
                json!({ "booking_id": booking_id, "amount": amount }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["data"].clone()
    }

    /// Drop this test's schema.
    pub async fn cleanup(&self) {
        self.db.pool().close().await;
        if let Ok(pool) = sqlx::postgres::PgPoolOptions::new()
            .max_connections(1)
            .connect(&self.base_url)
            .await
        {
            sqlx::query(&format!("DROP SCHEMA IF EXISTS {} CASCADE", self.schema_name))
                .execute(&pool)
                .await
                .ok();
            pool.close().await;
        }
    }
}
