//! Line item pricing and booking aggregation over HTTP.

mod common;

use common::{dec, money, TestApp};
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn hotel_cost_is_nightly_rate_times_nights_times_rooms() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let booking = app.create_booking("Scenario A").await;
    let booking_id = booking["booking_id"].as_str().unwrap();

    let mutation = app.add_hotel(booking_id).await;

    assert_eq!(mutation["line"]["nights"], 2);
    assert_eq!(money(&mutation["line"]["total_cost"]), dec("300"));
    assert_eq!(money(&mutation["line"]["margin"]), dec("-100"));
    assert_eq!(money(&mutation["booking"]["total_cost_price"]), dec("300"));
    assert_eq!(money(&mutation["booking"]["total_sell_price"]), dec("200"));
    assert_eq!(money(&mutation["booking"]["gross_profit"]), dec("-100"));

    app.cleanup().await;
}

#[tokio::test]
async fn self_operated_tour_sums_its_cost_components() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let booking = app.create_booking("Scenario B").await;
    let booking_id = booking["booking_id"].as_str().unwrap();

    let mutation = app.add_tour(booking_id, "600").await;

    assert_eq!(mutation["line"]["operation_type"], "self-operated");
    assert_eq!(money(&mutation["line"]["total_cost"]), dec("300"));
    assert_eq!(money(&mutation["line"]["margin"]), dec("300"));
    assert_eq!(money(&mutation["booking"]["gross_profit"]), dec("300"));

    app.cleanup().await;
}

#[tokio::test]
async fn booking_totals_follow_lines_and_payments() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let booking = app.create_booking("Scenario C").await;
    let booking_id = booking["booking_id"].as_str().unwrap();

    app.add_hotel(booking_id).await;
    app.add_tour(booking_id, "450").await;
    let payment = app.pay(booking_id, "500").await;

    let totals = &payment["booking"];
    assert_eq!(money(&totals["total_sell_price"]), dec("650"));
    assert_eq!(money(&totals["total_cost_price"]), dec("600"));
    assert_eq!(money(&totals["gross_profit"]), dec("50"));
    assert_eq!(money(&totals["amount_received"]), dec("500"));
    assert_eq!(totals["payment_status"], "partial");

    let (status, body) = app.get(&format!("/bookings/{}", booking_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["hotels"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["tours"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["client_payments"].as_array().unwrap().len(), 1);
    assert_eq!(money(&body["data"]["total_sell_price"]), dec("650"));

    app.cleanup().await;
}

#[tokio::test]
async fn deleting_the_only_line_zeroes_totals_and_keeps_booking() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let booking = app.create_booking("Scenario D").await;
    let booking_id = booking["booking_id"].as_str().unwrap();

    let mutation = app.add_hotel(booking_id).await;
    let line_id = mutation["line"]["line_id"].as_str().unwrap();

    let (status, body) = app.delete(&format!("/booking-hotels/{}", line_id)).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(money(&body["data"]["total_cost_price"]), dec("0"));
    assert_eq!(money(&body["data"]["total_sell_price"]), dec("0"));
    assert_eq!(money(&body["data"]["gross_profit"]), dec("0"));
    assert_eq!(body["data"]["payment_status"], "pending");

    let (status, _) = app.get(&format!("/bookings/{}", booking_id)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.delete(&format!("/booking-hotels/{}", line_id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    app.cleanup().await;
}

#[tokio::test]
async fn updating_a_line_reprices_it_and_the_booking() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let booking = app.create_booking("Reprice").await;
    let booking_id = booking["booking_id"].as_str().unwrap();
    let mutation = app.add_hotel(booking_id).await;
    let line_id = mutation["line"]["line_id"].as_str().unwrap();

    let (status, body) = app
        .put(
            &format!("/booking-hotels/{}", line_id),
            json!({ "number_of_rooms": 2, "sell_price": "800" }),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(money(&body["data"]["line"]["total_cost"]), dec("600"));
    assert_eq!(money(&body["data"]["line"]["margin"]), dec("200"));
    assert_eq!(money(&body["data"]["booking"]["total_cost_price"]), dec("600"));
    assert_eq!(money(&body["data"]["booking"]["gross_profit"]), dec("200"));

    app.cleanup().await;
}

#[tokio::test]
async fn transfer_and_flight_costs_are_taken_as_given() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let booking = app.create_booking("Flat costs").await;
    let booking_id = booking["booking_id"].as_str().unwrap();

    let (status, body) = app
        .post(
            "/booking-transfers",
            json!({
                "booking_id": booking_id,
                "pickup_location": "CAI airport",
                "dropoff_location": "Giza",
                "cost_price": "40",
                "sell_price": "65"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(money(&body["data"]["line"]["margin"]), dec("25"));

    let (status, body) = app
        .post(
            "/booking-flights",
            json!({
                "booking_id": booking_id,
                "airline": "EgyptAir",
                "pax_count": 3,
                "cost_price": "900",
                "sell_price": "1050"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(money(&body["data"]["line"]["total_cost"]), dec("900"));
    assert_eq!(money(&body["data"]["booking"]["total_cost_price"]), dec("940"));
    assert_eq!(money(&body["data"]["booking"]["total_sell_price"]), dec("1115"));

    app.cleanup().await;
}

#[tokio::test]
async fn inverted_hotel_dates_are_rejected_without_side_effects() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let booking = app.create_booking("Bad dates").await;
    let booking_id = booking["booking_id"].as_str().unwrap();

    let (status, body) = app
        .post(
            "/booking-hotels",
            json!({
                "booking_id": booking_id,
                "hotel_name": "Backwards Inn",
                "check_in": "2025-12-12",
                "check_out": "2025-12-10",
                "cost_per_night": "150",
                "sell_price": "200"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (_, body) = app.get(&format!("/bookings/{}", booking_id)).await;
    assert!(body["data"]["hotels"].as_array().unwrap().is_empty());
    assert_eq!(money(&body["data"]["total_cost_price"]), dec("0"));

    app.cleanup().await;
}

#[tokio::test]
async fn line_for_unknown_booking_is_not_found() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };

    let (status, body) = app
        .post(
            "/booking-transfers",
            json!({
                "booking_id": uuid::Uuid::new_v4(),
                "pickup_location": "A",
                "dropoff_location": "B",
                "cost_price": "10",
                "sell_price": "20"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    app.cleanup().await;
}

#[tokio::test]
async fn line_status_in_booking_detail_reflects_the_read_date() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    app.set_today(chrono::NaiveDate::from_ymd_opt(2025, 10, 20).unwrap());
    let booking = app.create_booking("Late supplier").await;
    let booking_id = booking["booking_id"].as_str().unwrap();

    let (status, body) = app
        .post(
            "/booking-transfers",
            json!({
                "booking_id": booking_id,
                "pickup_location": "Luxor airport",
                "dropoff_location": "Winter Palace",
                "cost_price": "60",
                "sell_price": "90",
                "payment_due_date": "2025-11-01"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["line"]["payment_status"], "pending");

    app.set_today(chrono::NaiveDate::from_ymd_opt(2025, 11, 10).unwrap());

    let (status, body) = app.get(&format!("/bookings/{}", booking_id)).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["transfers"][0]["payment_status"], "overdue");

    let (_, body) = app.get("/reports/outstanding").await;
    let lines = body["data"]["line_payables"].as_array().unwrap();
    assert_eq!(lines.len(), 1, "{}", body);
    assert_eq!(lines[0]["payment_status"], "overdue");

    app.cleanup().await;
}

#[tokio::test]
async fn amounts_too_large_to_store_are_validation_errors() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let booking = app.create_booking("Whale").await;
    let booking_id = booking["booking_id"].as_str().unwrap();

    let (status, body) = app
        .post(
            "/booking-transfers",
            json!({
                "booking_id": booking_id,
                "pickup_location": "A",
                "dropoff_location": "B",
                "cost_price": "10000000000000",
                "sell_price": "20"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{}", body);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["field"], "cost_price");

    let (_, body) = app.get(&format!("/bookings/{}", booking_id)).await;
    assert!(body["data"]["transfers"].as_array().unwrap().is_empty());

    app.cleanup().await;
}

#[tokio::test]
async fn null_in_an_update_clears_the_due_date() {
    let Some(app) = TestApp::spawn().await else {
        return;
    };
    let booking = app.create_booking("Rescheduled").await;
    let booking_id = booking["booking_id"].as_str().unwrap();

    let (status, body) = app
        .post(
            "/booking-transfers",
            json!({
                "booking_id": booking_id,
                "pickup_location": "Aswan",
                "dropoff_location": "Abu Simbel",
                "vehicle_type": "Minibus",
                "cost_price": "120",
                "sell_price": "180",
                "payment_due_date": "2025-11-01"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["line"]["payment_status"], "overdue");
    let line_id = body["data"]["line"]["line_id"].as_str().unwrap().to_string();

    let (status, body) = app
        .put(
            &format!("/booking-transfers/{}", line_id),
            json!({ "payment_due_date": null }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert!(body["data"]["line"]["payment_due_date"].is_null());
    assert_eq!(body["data"]["line"]["payment_status"], "pending");
    assert_eq!(body["data"]["line"]["vehicle_type"], "Minibus");

    app.cleanup().await;
}
