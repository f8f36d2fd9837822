// src/handlers/status.rs
use actix_web::{ web, HttpRequest, HttpResponse };
use actix_web::http::header::{ CacheControl, CacheDirective };
use log::{ debug, error };
use serde::Deserialize;
use tokio::task::JoinError;
use crate::aggregator::Aggregator;
use crate::config::Config;
use crate::models::server::{ ServerStatus, StatusResponse };
use crate::utils::{ client_ip, log_request_headers };

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    /// Cache buster appended by browsers; only logged.
    t: Option<String>,
}

/// `GET /status`. Always answers 200: failed lookups are already degraded by
/// the aggregator, and a failed aggregation degrades every configured server.
pub async fn get_status(
    req: HttpRequest,
    query: web::Query<StatusQuery>,
    aggregator: web::Data<Aggregator>,
    config: web::Data<Config>
) -> HttpResponse {
    log_request_headers(&req);
    debug!(
        "Status request from {:?} (t={})",
        client_ip(&req),
        query.t.as_deref().unwrap_or("-")
    );

    let task_aggregator = aggregator.get_ref().clone();
    let batch = tokio::spawn(async move { task_aggregator.collect().await }).await;
    let servers = response_servers(batch, &aggregator, &config);
    debug!("Building status response with {} servers", servers.len());

    HttpResponse::Ok()
        .insert_header(CacheControl(vec![CacheDirective::NoStore]))
        .json(StatusResponse { servers })
}

/// Caps a finished batch for the response. A failed aggregation returns
/// every configured server degraded, uncapped.
fn response_servers(
    batch: Result<Vec<ServerStatus>, JoinError>,
    aggregator: &Aggregator,
    config: &Config
) -> Vec<ServerStatus> {
    match batch {
        Ok(servers) => config.truncate_for_response(servers),
        Err(e) => {
            error!("Error in server status aggregation: {}", e);
            aggregator.degraded_all()
        }
    }
}
