//! HTTP surface of the storefront, driven in-process.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use keepsake_core::order::SubmissionError;
use keepsake_integration_tests::{SOLD_OUT_MUG, ScriptedIntake, TSHIRT, bkash, customer, test_state};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tower::ServiceExt;

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, value)
}

async fn open_shirt_flow(app: &Router) -> String {
    let (status, flow) = call(
        app,
        Method::POST,
        "/api/flows",
        Some(json!({ "product_id": TSHIRT })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    flow["id"].as_str().unwrap().to_string()
}

fn multipart_body(boundary: &str, files: &[(&str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, content_type, bytes) in files {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"images\"; filename=\"{name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}

#[tokio::test]
async fn test_health() {
    let app = keepsake_storefront::app(test_state(Arc::new(ScriptedIntake::accepting())));
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_product_options() {
    let app = keepsake_storefront::app(test_state(Arc::new(ScriptedIntake::accepting())));

    let (status, body) = call(&app, Method::GET, "/api/products/1/options", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["family"], "apparel");
    let axes: Vec<&str> = body["axes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|axis| axis["id"].as_str().unwrap())
        .collect();
    assert_eq!(axes, ["size", "color", "printArea"]);

    let (status, _) = call(&app, Method::GET, "/api/products/99/options", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_checkout_over_http() {
    let intake = Arc::new(ScriptedIntake::accepting());
    let app = keepsake_storefront::app(test_state(Arc::clone(&intake)));
    let id = open_shirt_flow(&app).await;
    let flow = format!("/api/flows/{id}");

    // Leaving options early lists what is missing.
    let (status, body) = call(&app, Method::POST, &format!("{flow}/advance"), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["fields"].as_array().unwrap().len(), 3);

    for (axis, key) in [("size", "XL"), ("color", "blue"), ("printArea", "front")] {
        let (status, _) = call(
            &app,
            Method::PUT,
            &format!("{flow}/selections/{axis}"),
            Some(json!({ "key": key })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = call(
        &app,
        Method::PATCH,
        &format!("{flow}/design"),
        Some(json!({ "custom_text": "Hello", "delivery": "express" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let unit: Decimal = body["price"]["unit_subtotal"].as_str().unwrap().parse().unwrap();
    assert_eq!(unit, Decimal::from(625));

    let boundary = "keepsake-test-boundary";
    let upload = Request::builder()
        .method(Method::POST)
        .uri(format!("{flow}/images"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(multipart_body(
            boundary,
            &[
                ("front.png", "image/png", &[1, 2, 3]),
                ("notes.txt", "text/plain", b"hi"),
            ],
        )))
        .unwrap();
    let response = app.clone().oneshot(upload).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["report"]["accepted"].as_array().unwrap().len(), 1);
    assert_eq!(body["report"]["rejections"][0]["filename"], "notes.txt");

    let (status, _) = call(
        &app,
        Method::PUT,
        &format!("{flow}/customer"),
        Some(serde_json::to_value(customer()).unwrap()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(
        &app,
        Method::PUT,
        &format!("{flow}/payment"),
        Some(serde_json::to_value(bkash()).unwrap()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("{flow}/step"),
        Some(json!({ "step": "confirm" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["step"], "confirm");

    let (status, body) = call(&app, Method::POST, &format!("{flow}/submit"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tracking_id"], "KS-0001");
    assert!(
        body["chat_link"]
            .as_str()
            .unwrap()
            .starts_with("https://wa.me/8801700000000?text=")
    );

    let (status, receipt) = call(&app, Method::GET, &format!("{flow}/receipt"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(receipt["payload"]["customer_name"], "Nusrat Jahan");
    assert_eq!(intake.calls(), 1);

    // Submitted flows no longer accept edits.
    let (status, _) = call(
        &app,
        Method::PUT,
        &format!("{flow}/quantity"),
        Some(json!({ "quantity": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_intake_failure_is_retryable_over_http() {
    let intake = Arc::new(ScriptedIntake::with_script(vec![Err(
        SubmissionError::Unavailable {
            status: 502,
            message: "upstream down".to_string(),
        },
    )]));
    let app = keepsake_storefront::app(test_state(Arc::clone(&intake)));
    let id = open_shirt_flow(&app).await;
    let flow = format!("/api/flows/{id}");

    for (axis, key) in [("size", "M"), ("color", "red"), ("printArea", "back")] {
        call(
            &app,
            Method::PUT,
            &format!("{flow}/selections/{axis}"),
            Some(json!({ "key": key })),
        )
        .await;
    }
    call(
        &app,
        Method::PUT,
        &format!("{flow}/customer"),
        Some(serde_json::to_value(customer()).unwrap()),
    )
    .await;
    call(
        &app,
        Method::PUT,
        &format!("{flow}/payment"),
        Some(json!({ "method": "cash_on_delivery" })),
    )
    .await;
    call(
        &app,
        Method::POST,
        &format!("{flow}/step"),
        Some(json!({ "step": "confirm" })),
    )
    .await;

    let (status, body) = call(&app, Method::POST, &format!("{flow}/submit"), None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["retryable"], true);

    let (_, view) = call(&app, Method::GET, &flow, None).await;
    assert_eq!(view["step"], "confirm");
    assert_eq!(view["submitting"], false);

    let (status, _) = call(&app, Method::POST, &format!("{flow}/submit"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(intake.calls(), 2);
}

#[tokio::test]
async fn test_quote_and_bad_requests() {
    let app = keepsake_storefront::app(test_state(Arc::new(ScriptedIntake::accepting())));

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/flows",
        Some(json!({ "product_id": SOLD_OUT_MUG })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = call(
        &app,
        Method::GET,
        &format!("/api/flows/{}", uuid::Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let id = open_shirt_flow(&app).await;
    let (status, body) = call(
        &app,
        Method::PUT,
        &format!("/api/flows/{id}/selections/size"),
        Some(json!({ "key": "XXXL" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("XXXL"));

    let (_, view) = call(&app, Method::GET, &format!("/api/flows/{id}"), None).await;
    let (status, quote) = call(
        &app,
        Method::POST,
        "/api/quote",
        Some(json!({ "product_id": TSHIRT, "session": view["session"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(quote["total"], view["price"]["total"]);
}

#[tokio::test]
async fn test_closing_a_flow_discards_it() {
    let app = keepsake_storefront::app(test_state(Arc::new(ScriptedIntake::accepting())));
    let id = open_shirt_flow(&app).await;
    let flow = format!("/api/flows/{id}");

    let (status, _) = call(&app, Method::DELETE, &flow, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = call(&app, Method::GET, &flow, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = call(&app, Method::DELETE, &flow, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_quote_refuses_session_past_image_cap() {
    let app = keepsake_storefront::app(test_state(Arc::new(ScriptedIntake::accepting())));
    let id = open_shirt_flow(&app).await;
    let (_, view) = call(&app, Method::GET, &format!("/api/flows/{id}"), None).await;

    let images: Vec<Value> = (0..20)
        .map(|i| {
            json!({
                "id": uuid::Uuid::new_v4(),
                "filename": format!("ref-{i}.png"),
                "content_type": "image/png",
                "data_url": "data:image/png;base64,iVBORw==",
                "byte_size": 4,
            })
        })
        .collect();
    let mut session = view["session"].clone();
    session["images"] = Value::Array(images);

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/quote",
        Some(json!({ "product_id": TSHIRT, "session": session })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"].as_array().unwrap().len(), 1);
    assert_eq!(body["fields"][0]["field"]["kind"], "images");
    assert!(body.get("total").is_none());
}
