use crate::errors::{EngineError, EngineResult};
use crate::state::{AppState, RiskResult};
use crate::wire::{self, TradeRequestMsg};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use portable_atomic::Ordering::Relaxed;
use std::sync::Arc;

const PROTOBUF: &str = "application/x-protobuf";

pub fn router(state: Arc<AppState>) -> axum::Router {
    axum::Router::new()
        .route("/api/risk", axum::routing::post(post_risk))
        .route("/api/risk/json", axum::routing::post(post_risk_json))
        .route("/api/health", axum::routing::get(get_health))
        .route("/api/counters", axum::routing::get(get_counters))
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .with_state(state)
}

/// POST /api/risk -- protobuf TradeRequestMsg in, protobuf ValuationResultMsg out
pub async fn post_risk(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    match run_calculation(&state, move || wire::decode_request(&body)).await {
        Ok(result) => ([(header::CONTENT_TYPE, PROTOBUF)], wire::encode_result(&result)).into_response(),
        Err(resp) => resp,
    }
}

/// POST /api/risk/json -- same calculation with JSON bodies
pub async fn post_risk_json(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let decode = move || -> EngineResult<TradeRequestMsg> { Ok(serde_json::from_slice(&body)?) };
    match run_calculation(&state, decode).await {
        Ok(result) => Json(result).into_response(),
        Err(resp) => resp,
    }
}

/// GET /api/health -- liveness plus uptime
pub async fn get_health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let uptime = chrono::Utc::now() - state.started_at;
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "started_at": state.started_at.to_rfc3339(),
        "uptime_secs": uptime.num_seconds(),
        "max_path_count": state.config.engine.max_path_count,
    }))
}

/// GET /api/counters -- performance counters (lock-free reads)
pub async fn get_counters(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "requests_received": state.counters.requests_received.load(Relaxed),
        "calculations_ok": state.counters.calculations_ok.load(Relaxed),
        "decode_errors": state.counters.decode_errors.load(Relaxed),
        "invalid_requests": state.counters.invalid_requests.load(Relaxed),
        "simulation_failures": state.counters.simulation_failures.load(Relaxed),
        "config_errors": state.counters.config_errors.load(Relaxed),
        "paths_simulated": state.counters.paths_simulated.load(Relaxed),
    }))
}

/// Decode and price on the blocking pool; simulation is CPU-bound and must
/// not stall the async workers.
async fn run_calculation<F>(state: &Arc<AppState>, decode: F) -> Result<RiskResult, Response>
where
    F: FnOnce() -> EngineResult<TradeRequestMsg> + Send + 'static,
{
    let request_id = uuid::Uuid::new_v4();
    state.counters.requests_received.fetch_add(1, Relaxed);

    let worker = Arc::clone(state);
    let outcome = tokio::task::spawn_blocking(move || {
        let msg = decode()?;
        worker.calculator.calculate_risk_msg(&msg)
    })
    .await;

    match outcome {
        Ok(Ok(result)) => {
            state.counters.calculations_ok.fetch_add(1, Relaxed);
            state.counters.paths_simulated.fetch_add(result.path_count as u64, Relaxed);
            tracing::info!(
                request_id = %request_id,
                trade_id = %result.trade_id,
                counterparty_id = %result.counterparty_id,
                paths = result.path_count,
                pv = result.pv,
                pfe = result.pfe,
                "risk calculated"
            );
            Ok(result)
        }
        Ok(Err(e)) => {
            state.counters.record_error(&e);
            match e {
                EngineError::SimulationFailure(_) => {
                    tracing::error!(request_id = %request_id, error = %e, "calculation failed")
                }
                _ => tracing::warn!(request_id = %request_id, error = %e, "request rejected"),
            }
            Err(error_response(&e))
        }
        Err(join_err) => {
            tracing::error!(request_id = %request_id, error = %join_err, "calculation task aborted");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "internal", "message": join_err.to_string() })),
            )
                .into_response())
        }
    }
}

fn status_for(e: &EngineError) -> StatusCode {
    match e {
        EngineError::Decode(_) => StatusCode::BAD_REQUEST,
        EngineError::InvalidParameter { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::SimulationFailure(_) | EngineError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(e: &EngineError) -> Response {
    (
        status_for(e),
        Json(serde_json::json!({
            "error": e.kind(),
            "field": e.field(),
            "message": e.to_string(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, EngineConfig};

    fn test_state() -> Arc<AppState> {
        AppState::new(AppConfig {
            engine: EngineConfig::default(),
            server_port: 0,
        })
    }

    fn request() -> TradeRequestMsg {
        TradeRequestMsg {
            trade_id: "TRD_3".into(),
            counterparty_id: "CPTY_B".into(),
            trade_type: "OPTION".into(),
            strike: 100.0,
            maturity: 1.0,
            spot_price: 95.0,
            volatility: 0.2,
            risk_free_rate: 0.05,
            path_count: Some(10_000),
            rng_seed: Some(1),
            ..Default::default()
        }
    }

    async fn body_bytes(resp: Response) -> Bytes {
        axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap()
    }

    #[tokio::test]
    async fn test_protobuf_endpoint() {
        let state = test_state();
        let body = Bytes::from(wire::encode_request(&request()));
        let resp = post_risk(State(state.clone()), body).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let res = wire::decode_result(&body_bytes(resp).await).unwrap();
        assert_eq!(res.trade_id, "TRD_3");
        assert_eq!(res.path_count, 10_000);
        assert_eq!(state.counters.calculations_ok.load(Relaxed), 1);
        assert_eq!(state.counters.paths_simulated.load(Relaxed), 10_000);
    }

    #[tokio::test]
    async fn test_json_endpoint_matches_protobuf() {
        let state = test_state();
        // Full-precision inputs must survive the JSON body bit for bit
        let msg = TradeRequestMsg {
            volatility: 0.2345678901234567,
            risk_free_rate: 0.04999999999999999,
            ..request()
        };
        let json = serde_json::to_vec(&msg).unwrap();
        let resp = post_risk_json(State(state.clone()), Bytes::from(json)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let v: serde_json::Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();

        let pb = post_risk(State(state), Bytes::from(wire::encode_request(&msg))).await;
        let res = wire::decode_result(&body_bytes(pb).await).unwrap();
        assert_eq!(v["pv"].as_f64().unwrap(), res.present_value);
        assert_eq!(v["pfe"].as_f64().unwrap(), res.pfe);
        assert_eq!(v["standard_error"].as_f64().unwrap(), res.standard_error);
        assert_eq!(v["analytic_pv"].as_f64().unwrap(), res.analytic_pv);
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let state = test_state();

        let resp = post_risk(State(state.clone()), Bytes::from_static(&[0xFF, 0xFF, 0xFF])).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let bad = TradeRequestMsg { path_count: Some(0), ..request() };
        let resp = post_risk(State(state.clone()), Bytes::from(wire::encode_request(&bad))).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let v: serde_json::Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
        assert_eq!(v["error"], "invalid_parameter");
        assert_eq!(v["field"], "path_count");

        assert_eq!(state.counters.decode_errors.load(Relaxed), 1);
        assert_eq!(state.counters.invalid_requests.load(Relaxed), 1);
        assert_eq!(state.counters.calculations_ok.load(Relaxed), 0);
    }

    #[tokio::test]
    async fn test_health() {
        let Json(v) = get_health(State(test_state())).await;
        assert_eq!(v["status"], "ok");
        assert!(v["uptime_secs"].as_i64().unwrap() >= 0);
    }
}
