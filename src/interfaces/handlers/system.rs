use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use humantime::format_duration;
use serde::Serialize;
use std::time::Duration;
use sysinfo::System;

use crate::{constants::START_TIME, repositories::project::ProjectRepository, AppState};

#[derive(Serialize)]
struct HealthCheckResponse {
    status: &'static str,
    uptime: String,
    timestamp: String,
    start_at: String,
    store: &'static str,
    store_status: &'static str,
    storage: &'static str,
    version: &'static str,
    memory_usage: String,
}

#[get("/health")]
pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let now_utc = Utc::now();
    let uptime = now_utc.signed_duration_since(*START_TIME);
    let human_uptime = format_duration(Duration::from_secs(uptime.num_seconds().max(0) as u64));

    let store_status = match state.project_handler.project_repo.check_connection().await {
        Ok(()) => "OK",
        Err(e) => {
            tracing::warn!("Health check: record store unavailable: {}", e);
            "Unavailable"
        }
    };

    let mut sys = System::new_all();
    sys.refresh_all();
    let memory_usage = sysinfo::get_current_pid()
        .ok()
        .and_then(|pid| sys.process(pid))
        .map_or("Unknown".to_string(), |p| {
            format!("{:.2} MB", p.memory() as f64 / 1024.0 / 1024.0)
        });

    let response = HealthCheckResponse {
        status: if store_status == "OK" { "healthy" } else { "degraded" },
        uptime: human_uptime.to_string(),
        timestamp: now_utc.to_rfc3339(),
        start_at: START_TIME.to_rfc3339(),
        store: state.store_kind,
        store_status,
        storage: state.storage_kind,
        version: env!("CARGO_PKG_VERSION"),
        memory_usage,
    };

    HttpResponse::Ok().json(response)
}
