use std::collections::BTreeMap;

use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use steelcut::config::number_lines;
use steelcut::solver::plan_cutting;
use steelcut::types::{AllocationBatch, CutterSettings, OrderLine, Strategy, Summary, Warning};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

#[derive(Deserialize, Serialize)]
struct PlanRequest {
    lines: Vec<OrderLine>,
    settings: CutterSettings,
    #[serde(default)]
    strategy: Strategy,
    /// Saw speed per order line index, replacing the cutter speed for that line.
    #[serde(default)]
    speeds: BTreeMap<usize, f64>,
}

#[derive(Serialize)]
struct PlanResponse {
    results: Vec<AllocationBatch>,
    warnings: Vec<Warning>,
    summary: Summary,
}

async fn plan(
    Json(mut req): Json<PlanRequest>,
) -> Result<Json<PlanResponse>, (StatusCode, String)> {
    tracing::info!(
        body = serde_json::to_string(&req).unwrap_or_default(),
        "POST /plan"
    );

    if req.lines.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "at least one order line is required".to_string(),
        ));
    }
    number_lines(&mut req.lines);

    let mut plan = plan_cutting(&req.lines, &req.settings, req.strategy);
    for (&index, &speed) in &req.speeds {
        plan.override_speed(index, speed);
    }
    let summary = plan.summary();

    Ok(Json(PlanResponse {
        results: plan.results,
        warnings: plan.warnings,
        summary,
    }))
}

fn app() -> Router {
    Router::new()
        .route("/up", get(|| async { "ok" }))
        .route("/plan", post(plan))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

#[tokio::main]
async fn main() {
    let _sentry = std::env::var("SENTRY_DSN").ok().map(|dsn| {
        sentry::init((
            dsn.as_str(),
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open("development.log")
        .expect("failed to open development.log");

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_target(false)
        .with_ansi(false)
        .with_max_level(Level::INFO)
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3001".to_string());
    let addr = format!("0.0.0.0:{port}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind listener");
    eprintln!("Listening on {addr}");
    axum::serve(listener, app())
        .await
        .expect("server error");
}
