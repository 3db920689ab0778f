//! End-to-end tests: serve the router on an ephemeral port and call it.

use reportkit_render_http::{ApiState, serve};
use tokio::net::TcpListener;

async fn spawn_server() -> (String, tokio::task::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind listener");
    let addr = listener.local_addr().expect("Failed to read local address");
    let handle = tokio::spawn(async move {
        serve(listener, ApiState::default())
            .await
            .expect("Failed to serve");
    });
    (format!("http://{addr}"), handle)
}

fn sample_payload() -> serde_json::Value {
    serde_json::json!({
        "title": "Reporte Mensual",
        "currencySymbol": "$",
        "timezoneOffset": -3,
        "filename": "Reporte_Enero.xlsx",
        "summary": {
            "total_models": 25,
            "total_brands": 3,
            "avg_price": 18500000,
            "filters": { "brand": ["Kia"] }
        },
        "sheets": [
            {
                "name": "Evolución",
                "chart_type": "line",
                "chart_title": "Evolución de Precios",
                "data": [
                    { "Mes": "Ene", "Kia": 0, "Toyota": 100 },
                    { "Mes": "Feb", "Kia": 120, "Toyota": 110 }
                ]
            },
            { "name": "Vacía", "chart_type": "bar", "data": [] }
        ]
    })
}

#[tokio::test]
async fn test_health_endpoint() {
    let (base, handle) = spawn_server().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{base}/api/health"))
        .send()
        .await
        .expect("Failed to send health check request");
    assert_eq!(response.status(), 200);
    let json: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(json["status"], "ok");

    let response = client
        .get(format!("{base}/api/generate-excel"))
        .send()
        .await
        .expect("Failed to send GET");
    let json: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(json["service"], "excel-chart-generator");

    handle.abort();
}

#[tokio::test]
async fn test_generate_excel_returns_workbook_attachment() {
    let (base, handle) = spawn_server().await;
    let response = reqwest::Client::new()
        .post(format!("{base}/api/generate-excel"))
        .json(&sample_payload())
        .send()
        .await
        .expect("Failed to send generate request");

    assert_eq!(response.status(), 200);
    let headers = response.headers().clone();
    assert_eq!(
        headers[reqwest::header::CONTENT_TYPE],
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
    assert_eq!(
        headers[reqwest::header::CONTENT_DISPOSITION],
        "attachment; filename=\"Reporte_Enero.xlsx\""
    );
    let body = response.bytes().await.expect("Failed to read body");
    assert!(body.starts_with(b"PK"));

    handle.abort();
}

#[tokio::test]
async fn test_generate_ppt_swaps_extension() {
    let (base, handle) = spawn_server().await;
    let response = reqwest::Client::new()
        .post(format!("{base}/api/generate-ppt"))
        .json(&sample_payload())
        .send()
        .await
        .expect("Failed to send generate request");

    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers()[reqwest::header::CONTENT_DISPOSITION],
        "attachment; filename=\"Reporte_Enero.pptx\""
    );
    let body = response.bytes().await.expect("Failed to read body");
    assert!(body.starts_with(b"PK"));

    handle.abort();
}

#[tokio::test]
async fn test_malformed_body_still_returns_error_workbook() {
    let (base, handle) = spawn_server().await;
    let response = reqwest::Client::new()
        .post(format!("{base}/api/generate-excel"))
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body("{ definitely not json")
        .send()
        .await
        .expect("Failed to send generate request");

    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers()[reqwest::header::CONTENT_DISPOSITION],
        "attachment; filename=\"Error_Report.xlsx\""
    );
    let body = response.bytes().await.expect("Failed to read body");
    assert!(body.starts_with(b"PK"));

    handle.abort();
}

#[tokio::test]
async fn test_preflight_is_permissive() {
    let (base, handle) = spawn_server().await;
    let response = reqwest::Client::new()
        .request(reqwest::Method::OPTIONS, format!("{base}/api/generate-ppt"))
        .header(reqwest::header::ORIGIN, "http://localhost:3000")
        .header(reqwest::header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .send()
        .await
        .expect("Failed to send preflight");

    assert_eq!(response.status(), 200);
    assert!(
        response
            .headers()
            .contains_key(reqwest::header::ACCESS_CONTROL_ALLOW_ORIGIN)
    );

    handle.abort();
}
