//! End-to-end ticketing flow over the HTTP API.

#![allow(clippy::panic, clippy::indexing_slicing)]

mod common;

use reqwest::StatusCode;
use reqwest::header;
use serde_json::json;
use tokio_test::assert_ok;

use common::{TestApp, json_body};

#[tokio::test]
async fn organizer_publishes_and_participant_gets_one_ticket() {
    let app = TestApp::spawn().await;
    let budi = app.sign_up("budi@example.com", "Budi", "organizer").await;
    let ani = app.sign_up("ani@example.com", "Ani", "participant").await;

    let event_id = app.create_event(&budi, "Jazz  Night").await;

    // Drafts are hidden from the public list and from participants.
    let list = json_body(app.get("/api/v1/events", None).await).await;
    assert_eq!(list["data"].as_array().map(Vec::len), Some(0));
    let detail = app.get(&format!("/api/v1/events/{event_id}"), Some(&ani)).await;
    assert_eq!(detail.status(), StatusCode::NOT_FOUND);
    let own = app.get(&format!("/api/v1/events/{event_id}"), Some(&budi)).await;
    assert_eq!(own.status(), StatusCode::OK);

    let draft_reg = app
        .post(&format!("/api/v1/events/{event_id}/registration"), &ani)
        .await;
    assert_eq!(draft_reg.status(), StatusCode::CONFLICT);

    let published = app
        .post(&format!("/api/v1/events/{event_id}/publish"), &budi)
        .await;
    assert_eq!(published.status(), StatusCode::OK);
    assert_eq!(json_body(published).await["is_published"], true);

    let list = json_body(app.get("/api/v1/events", None).await).await;
    assert_eq!(list["data"][0]["id"], event_id.as_str());

    let status = json_body(
        app.get(&format!("/api/v1/events/{event_id}/registration"), Some(&ani))
            .await,
    )
    .await;
    assert_eq!(status["registered"], false);

    let first = app
        .post(&format!("/api/v1/events/{event_id}/registration"), &ani)
        .await;
    assert_eq!(first.status(), StatusCode::CREATED);
    assert_eq!(
        first.headers().get(header::LOCATION).map(|v| v.as_bytes()),
        Some(&b"/api/v1/tickets"[..])
    );
    let first = json_body(first).await;
    assert_eq!(first["status"], "registered");
    assert_eq!(first["ticket"]["code"], first["ticket"]["id"]);
    assert_eq!(first["ticket"]["status"], "paid");
    assert_eq!(first["ticket"]["participant_name"], "Ani");

    let second = app
        .post(&format!("/api/v1/events/{event_id}/registration"), &ani)
        .await;
    assert_eq!(second.status(), StatusCode::OK);
    let second = json_body(second).await;
    assert_eq!(second["status"], "already_registered");
    assert_eq!(second["ticket"]["id"], first["ticket"]["id"]);

    let mine = json_body(app.get("/api/v1/tickets", Some(&ani)).await).await;
    assert_eq!(mine["data"].as_array().map(Vec::len), Some(1));
    assert_eq!(mine["data"][0]["event"]["name"], "Jazz  Night");
    let Some(qr_path) = mine["data"][0]["qr_path"].as_str() else {
        panic!("ticket has no qr_path: {mine}");
    };

    let qr = app.get(qr_path, Some(&ani)).await;
    assert_eq!(qr.status(), StatusCode::OK);
    assert_eq!(
        qr.headers().get(header::CONTENT_TYPE).map(|v| v.as_bytes()),
        Some(&b"image/png"[..])
    );
    assert_eq!(
        qr.headers()
            .get(header::CONTENT_DISPOSITION)
            .map(|v| v.as_bytes()),
        Some(&b"attachment; filename=\"Tixly-Ticket-Jazz_Night.png\""[..])
    );
    let png = assert_ok!(qr.bytes().await);
    assert!(png.starts_with(b"\x89PNG"));

    let attendees = json_body(
        app.get(&format!("/api/v1/events/{event_id}/attendees"), Some(&budi))
            .await,
    )
    .await;
    assert_eq!(attendees["total"], 1);
    assert_eq!(attendees["attendees"][0]["participant_email"], "ani@example.com");

    let scan = assert_ok!(
        app.client
            .post(app.url("/api/v1/tickets/scan"))
            .bearer_auth(&budi)
            .json(&json!({ "code": first["ticket"]["code"] }))
            .send()
            .await
    );
    assert_eq!(scan.status(), StatusCode::OK);
    let scan = json_body(scan).await;
    assert_eq!(scan["valid"], true);
    assert_eq!(scan["event"]["id"], event_id.as_str());
}

#[tokio::test]
async fn guard_redirects_wrong_role_and_anonymous_callers() {
    let app = TestApp::spawn().await;
    let ani = app.sign_up("ani@example.com", "Ani", "peserta").await;

    let res = app.get("/api/v1/organizer/events", Some(&ani)).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        res.headers().get(header::LOCATION).map(|v| v.as_bytes()),
        Some(&b"/api/v1/auth/sign-in"[..])
    );

    let res = app.get("/api/v1/tickets", None).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = app.get("/api/v1/tickets", Some("not-a-token")).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let me = json_body(app.get("/api/v1/auth/me", Some(&ani)).await).await;
    assert_eq!(me["role"], "participant");
}

#[tokio::test]
async fn sign_in_returns_role_home_and_sign_out_revokes() {
    let app = TestApp::spawn().await;
    let _ = app.sign_up("budi@example.com", "Budi", "panitia").await;

    let wrong = assert_ok!(
        app.client
            .post(app.url("/api/v1/auth/sign-in"))
            .json(&json!({ "email": "budi@example.com", "password": "salah-sekali" }))
            .send()
            .await
    );
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let res = assert_ok!(
        app.client
            .post(app.url("/api/v1/auth/sign-in"))
            .json(&json!({ "email": "BUDI@example.com", "password": "rahasia123" }))
            .send()
            .await
    );
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["home_path"], "/api/v1/organizer/events");
    let Some(token) = body["token"].as_str() else {
        panic!("sign-in returned no token: {body}");
    };

    let out = app.post("/api/v1/auth/sign-out", token).await;
    assert_eq!(out.status(), StatusCode::NO_CONTENT);
    let after = app.get("/api/v1/organizer/events", Some(token)).await;
    assert_eq!(after.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unpublish_and_delete_need_confirmation_and_keep_tickets() {
    let app = TestApp::spawn().await;
    let budi = app.sign_up("budi@example.com", "Budi", "organizer").await;
    let ani = app.sign_up("ani@example.com", "Ani", "participant").await;
    let event_id = app.create_event(&budi, "Tech Meetup").await;
    let _ = app
        .post(&format!("/api/v1/events/{event_id}/publish"), &budi)
        .await;
    let reg = app
        .post(&format!("/api/v1/events/{event_id}/registration"), &ani)
        .await;
    assert_eq!(reg.status(), StatusCode::CREATED);

    let res = app
        .post(&format!("/api/v1/events/{event_id}/unpublish"), &budi)
        .await;
    assert_eq!(res.status(), StatusCode::PRECONDITION_REQUIRED);
    let res = app
        .post(&format!("/api/v1/events/{event_id}/unpublish?confirm=true"), &budi)
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let dashboard = json_body(app.get("/api/v1/organizer/events", Some(&budi)).await).await;
    assert_eq!(dashboard["drafts"][0]["id"], event_id.as_str());
    assert_eq!(dashboard["published"].as_array().map(Vec::len), Some(0));

    let rival = app.sign_up("citra@example.com", "Citra", "organizer").await;
    let res = assert_ok!(
        app.client
            .delete(app.url(&format!("/api/v1/events/{event_id}?confirm=true")))
            .bearer_auth(&rival)
            .send()
            .await
    );
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = assert_ok!(
        app.client
            .delete(app.url(&format!("/api/v1/events/{event_id}")))
            .bearer_auth(&budi)
            .send()
            .await
    );
    assert_eq!(res.status(), StatusCode::PRECONDITION_REQUIRED);
    let res = assert_ok!(
        app.client
            .delete(app.url(&format!("/api/v1/events/{event_id}?confirm=true")))
            .bearer_auth(&budi)
            .send()
            .await
    );
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let mine = json_body(app.get("/api/v1/tickets", Some(&ani)).await).await;
    assert_eq!(mine["data"].as_array().map(Vec::len), Some(1));
    assert!(mine["data"][0]["event"].is_null());
    assert_eq!(mine["data"][0]["ticket"]["event_id"], event_id.as_str());
}

#[tokio::test]
async fn health_and_openapi_are_public() {
    let app = TestApp::spawn().await;
    let health = json_body(app.get("/health", None).await).await;
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["issuance_mode"], "atomic");
    assert_eq!(health["session_listener"], true);

    let doc = json_body(app.get("/api-docs/openapi.json", None).await).await;
    assert!(doc["paths"]["/api/v1/tickets/scan"].is_object());
}

#[tokio::test]
async fn price_beyond_the_storable_range_is_a_bad_request() {
    let app = TestApp::spawn().await;
    let budi = app.sign_up("budi@example.com", "Budi", "organizer").await;
    let res = assert_ok!(
        app.client
            .post(app.url("/api/v1/events"))
            .bearer_auth(&budi)
            .json(&json!({
                "name": "Jazz Night",
                "date": "2026-12-05",
                "location": "Jakarta",
                "price": 9_223_372_036_854_775_808_u64,
                "description": "",
            }))
            .send()
            .await
    );
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
