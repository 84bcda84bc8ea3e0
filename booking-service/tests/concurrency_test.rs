//! Concurrent booking creation and concurrent edits to one booking.

mod common;

use booking_service::config::BookingCodeConfig;
use booking_service::models::TransitionPolicy;
use common::{dec, money, TestApp};
use futures::future::join_all;
use reqwest::StatusCode;
use serde_json::json;
use std::collections::BTreeSet;
use uuid::Uuid;

#[tokio::test]
async fn concurrent_creates_never_share_a_code() {
    let Some(app) = TestApp::spawn_with(
        TransitionPolicy::Permissive,
        BookingCodeConfig {
            max_attempts: 25,
            ..BookingCodeConfig::default()
        },
    )
    .await
    else {
        return;
    };

    let requests = (0..10).map(|i| {
        app.post(
            "/bookings",
            json!({
                "client_id": Uuid::new_v4(),
                "client_name": format!("Concurrent {}", i)
            }),
        )
    });
    let responses = join_all(requests).await;

    let mut codes = BTreeSet::new();
    for (status, body) in &responses {
        assert_eq!(*status, StatusCode::CREATED, "{}", body);
        codes.insert(body["data"]["booking_code"].as_str().unwrap().to_string());
    }
    assert_eq!(codes.len(), 10);

    let expected: BTreeSet<String> = (1046..1056).map(|n| format!("Funny-{}", n)).collect();
    assert_eq!(codes, expected);

    app.cleanup().await;
}

#[tokio::test]
async fn concurrent_line_adds_keep_totals_consistent() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let booking = app.create_booking("Busy booking").await;
    let booking_id = booking["booking_id"].as_str().unwrap().to_string();

    let requests = (0..8).map(|_| {
        app.post(
            "/booking-transfers",
            json!({
                "booking_id": booking_id,
                "pickup_location": "Hotel",
                "dropoff_location": "Airport",
                "cost_price": "12.50",
                "sell_price": "20"
            }),
        )
    });
    for (status, body) in join_all(requests).await {
        assert_eq!(status, StatusCode::CREATED, "{}", body);
    }

    let (_, body) = app.get(&format!("/bookings/{}", booking_id)).await;
    let detail = &body["data"];
    assert_eq!(detail["transfers"].as_array().unwrap().len(), 8);
    assert_eq!(money(&detail["total_cost_price"]), dec("100"));
    assert_eq!(money(&detail["total_sell_price"]), dec("160"));
    assert_eq!(money(&detail["gross_profit"]), dec("60"));

    app.cleanup().await;
}
