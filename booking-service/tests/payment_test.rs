//! Client receipts and supplier payables over HTTP.

mod common;

use common::{dec, money, TestApp};
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn paying_in_full_marks_booking_paid() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let booking = app.create_booking("Full payer").await;
    let booking_id = booking["booking_id"].as_str().unwrap();
    app.add_tour(booking_id, "600").await;

    let first = app.pay(booking_id, "250").await;
    assert_eq!(first["booking"]["payment_status"], "partial");

    let second = app.pay(booking_id, "349.995").await;
    assert_eq!(money(&second["payment"]["amount"]), dec("350.00"));
    assert_eq!(money(&second["booking"]["amount_received"]), dec("600"));
    assert_eq!(second["booking"]["payment_status"], "paid");
    assert_eq!(second["payment"]["payment_date"], "2025-11-20");

    app.cleanup().await;
}

#[tokio::test]
async fn deleting_a_payment_restores_the_balance() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let booking = app.create_booking("Refund").await;
    let booking_id = booking["booking_id"].as_str().unwrap();
    app.add_hotel(booking_id).await;
    let paid = app.pay(booking_id, "200").await;
    assert_eq!(paid["booking"]["payment_status"], "paid");

    let payment_id = paid["payment"]["payment_id"].as_str().unwrap();
    let (status, body) = app.delete(&format!("/client-payments/{}", payment_id)).await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(money(&body["data"]["booking"]["amount_received"]), dec("0"));
    assert_eq!(body["data"]["booking"]["payment_status"], "pending");

    let (_, body) = app
        .get(&format!("/client-payments?booking_id={}", booking_id))
        .await;
    assert!(body["data"].as_array().unwrap().is_empty());

    app.cleanup().await;
}

#[tokio::test]
async fn non_positive_payments_are_rejected() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let booking = app.create_booking("Zero").await;
    let booking_id = booking["booking_id"].as_str().unwrap();

    for amount in ["0", "-10", "0.004"] {
        let (status, body) = app
            .post(
                "/client-payments",
                json!({ "booking_id": booking_id, "amount": amount }),
            )
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{}", amount);
        assert_eq!(body["error"]["field"], "amount");
    }

    app.cleanup().await;
}

#[tokio::test]
async fn client_payments_are_listed_per_booking() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let a = app.create_booking("A").await;
    let b = app.create_booking("B").await;
    let a_id = a["booking_id"].as_str().unwrap();
    let b_id = b["booking_id"].as_str().unwrap();
    app.pay(a_id, "10").await;
    app.pay(a_id, "20").await;
    app.pay(b_id, "30").await;

    let (_, body) = app.get(&format!("/client-payments?booking_id={}", a_id)).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (_, body) = app.get("/client-payments").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 3);

    app.cleanup().await;
}

#[tokio::test]
async fn marking_a_supplier_payment_paid_stamps_today() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let booking = app.create_booking("Supplier").await;
    let booking_id = booking["booking_id"].as_str().unwrap();

    let (status, body) = app
        .post(
            "/supplier-payments",
            json!({
                "booking_id": booking_id,
                "supplier_type": "hotel",
                "supplier_name": "Hotel Nile View",
                "amount": "300",
                "due_date": "2025-11-15"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["status"], "pending");
    assert!(body["data"]["payment_date"].is_null());
    let payment_id = body["data"]["payment_id"].as_str().unwrap().to_string();

    let (_, summary) = app.get("/supplier-payments/summary").await;
    assert_eq!(summary["data"]["totals"]["overdue_count"], 1);
    assert_eq!(money(&summary["data"]["totals"]["pending_amount"]), dec("300"));

    let (status, body) = app
        .put(
            &format!("/supplier-payments/{}", payment_id),
            json!({ "status": "paid" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["status"], "paid");
    assert_eq!(body["data"]["payment_date"], "2025-11-20");

    let (_, listed) = app.get("/supplier-payments?status=pending").await;
    assert!(listed["data"].as_array().unwrap().is_empty());

    let (_, summary) = app.get("/supplier-payments/summary").await;
    assert_eq!(summary["data"]["totals"]["paid_count"], 1);
    assert_eq!(summary["data"]["totals"]["overdue_count"], 0);

    app.cleanup().await;
}

#[tokio::test]
async fn supplier_payment_for_unknown_booking_is_not_found() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };

    let (status, body) = app
        .post(
            "/supplier-payments",
            json!({
                "booking_id": uuid::Uuid::new_v4(),
                "supplier_type": "other",
                "supplier_name": "Nobody",
                "amount": "10"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    app.cleanup().await;
}

#[tokio::test]
async fn booking_with_payments_cannot_be_deleted() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let booking = app.create_booking("Paid up").await;
    let booking_id = booking["booking_id"].as_str().unwrap();
    app.pay(booking_id, "50").await;

    let (status, body) = app.delete(&format!("/bookings/{}", booking_id)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "REFERENTIAL_INTEGRITY");

    app.cleanup().await;
}
