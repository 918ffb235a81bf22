// Route table
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    close_chart, export_csv, get_chart, health_check, hover, list_meters, open_chart, select_range,
};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/meters", get(list_meters))
        .route("/charts", post(open_chart))
        .route("/charts/:view_id", get(get_chart).delete(close_chart))
        .route("/charts/:view_id/selection", post(select_range))
        .route("/charts/:view_id/hover", post(hover))
        .route("/charts/:view_id/gauges/:gauge_id/csv", get(export_csv))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::chart_service::ChartService;
    use crate::application::measurement_repository::fake::InMemoryRepository;
    use crate::application::meter_service::MeterService;
    use crate::domain::meter::Measurements;
    use crate::domain::statistics::PriceTable;
    use crate::infrastructure::config::{ChartSettings, Labels};
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    // 2015-01-01T00:00:00Z and one reading a day after it
    const START: i64 = 1_420_070_400_000;
    const DAY: i64 = 86_400_000;

    fn measurements() -> Measurements {
        serde_json::from_value(json!({
            "meters": [{
                "id": "pool",
                "name": "Pool",
                "gauges": [
                    {"id": "power", "name": "Power", "unit": "kWh", "gaugeValues": [
                        {"updated": "2015-01-01T02:00:00+0200", "value": "1000"},
                        {"updated": "2015-01-02T02:00:00+0200", "value": "1100"},
                        {"updated": "2015-01-03T02:00:00+0200", "value": "1300"}
                    ]},
                    {"id": "notes", "name": "Notes", "dataType": "STRING", "gaugeValues": [
                        {"updated": "2015-01-02T10:00:00+0200", "value": "backwash"}
                    ]}
                ]
            }]
        }))
        .unwrap()
    }

    fn app(repository: InMemoryRepository) -> Router {
        let repository = Arc::new(repository);
        let state = Arc::new(AppState {
            meter_service: MeterService::new(repository.clone()),
            chart_service: ChartService::new(
                repository,
                ChartSettings::default(),
                PriceTable::default(),
                Labels::default(),
            ),
        });
        build_router(state)
    }

    fn pool_app() -> Router {
        app(InMemoryRepository::with_meters(measurements().meters))
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    async fn open(app: &Router) -> Value {
        let response = app
            .clone()
            .oneshot(json_request("POST", "/charts", json!({ "tag_id": "pool" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await
    }

    #[tokio::test]
    async fn test_health_check() {
        let response = pool_app().oneshot(get_request("/healthz")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_list_meters() {
        let response = pool_app().oneshot(get_request("/meters")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let meters = body_json(response).await;
        assert_eq!(meters[0]["name"], "Pool");
        assert_eq!(meters[0]["gauges"].as_array().unwrap().len(), 1);
        assert_eq!(meters[0]["gauges"][0]["unit"], "kWh");
    }

    #[tokio::test]
    async fn test_fetch_failure_is_bad_gateway() {
        let app = app(InMemoryRepository::failing());

        let response = app.clone().oneshot(get_request("/meters")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let response = app
            .oneshot(json_request("POST", "/charts", json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_open_chart_returns_model() {
        let chart = open(&pool_app()).await;

        assert!(chart["viewId"].as_u64().is_some());
        assert_eq!(chart["series"][0]["data"][0], json!([START, 1000.0]));
        assert_eq!(chart["changeSeries"][0]["data"][0], json!([START, null]));
        assert_eq!(chart["changeSeries"][0]["data"][2], json!([START + 2 * DAY, 200.0]));
        assert_eq!(chart["pointDetails"].as_array().unwrap().len(), 2);
        assert_eq!(chart["pointDetails"][1]["kind"], "comment");
        assert_eq!(chart["pointDetails"][1]["value"], "backwash");
        assert_eq!(chart["viewports"]["redraws"], 1);
        assert_eq!(chart["labels"]["euro_day"], "€ (daily)");
    }

    #[tokio::test]
    async fn test_selection_hover_and_close() {
        let app = pool_app();
        let view_id = open(&app).await["viewId"].as_u64().unwrap();

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/charts/{}/selection", view_id),
                json!({ "xaxis": { "from": START, "to": START + 3 * DAY } }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let viewports = body_json(response).await;
        assert_eq!(viewports["change"]["x"]["to"], json!((START + 3 * DAY) as f64));

        let hover_uri = format!("/charts/{}/hover", view_id);
        let response = app
            .clone()
            .oneshot(json_request("POST", &hover_uri, json!({ "timestamp": 500, "x": START + 2 * DAY })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let rows = body_json(response).await;
        assert_eq!(rows[0]["value"], 1300.0);
        assert_eq!(rows[0]["euroDay"], "14.70");
        assert_eq!(rows[0]["euroTotal"], "22.05");

        let response = app
            .clone()
            .oneshot(json_request("POST", &hover_uri, json!({ "timestamp": 550, "x": START })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        // Browsers report high resolution event times
        let response = app
            .clone()
            .oneshot(json_request("POST", &hover_uri, json!({ "timestamp": 1234.567, "x": START })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let rows = body_json(response).await;
        assert_eq!(rows[0]["value"], 1000.0);

        let chart_uri = format!("/charts/{}", view_id);
        let response = app
            .clone()
            .oneshot(Request::builder().method("DELETE").uri(&chart_uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app.oneshot(get_request(&chart_uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_export_csv_follows_save_capability() {
        let app = pool_app();
        let view_id = open(&app).await["viewId"].as_u64().unwrap();
        let uri = format!("/charts/{}/gauges/power/csv", view_id);

        let response = app.clone().oneshot(get_request(&uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_string();
        assert!(disposition.starts_with("attachment; filename=\"Pool_Power_"));

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8(body.to_vec()).unwrap();
        let lines: Vec<&str> = text.trim_start_matches('\u{feff}').lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[2], "2015-01-03 02:00:00;1300");
        assert_eq!(lines[4], "2015-01-01 02:00:00;1000");

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(&uri)
                    .header(header::ACCEPT, "application/octet-stream")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/octet-stream");

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(&uri)
                    .header(header::ACCEPT, "application/json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);

        let response = app
            .oneshot(get_request(&format!("/charts/{}/gauges/unknown/csv", view_id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
