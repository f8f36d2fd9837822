// src/utils.rs
use actix_web::HttpRequest;
use std::net::IpAddr;
use log::debug;

/// Client address for request logs: first `X-Forwarded-For` hop, else the peer.
pub fn client_ip(req: &HttpRequest) -> Option<IpAddr> {
    req.headers()
        .get("X-Forwarded-For")
        .and_then(|value| value.to_str().ok())
        .and_then(|hops| hops.split(',').next())
        .and_then(|first| first.trim().parse().ok())
        .or_else(|| req.peer_addr().map(|addr| addr.ip()))
}

pub fn log_request_headers(req: &HttpRequest) {
    for (name, value) in req.headers() {
        debug!("{} {}: {:?}", req.path(), name, value);
    }
}

pub fn format_address(host: &str, port: u16) -> String {
    format!("{}:{}", host, port)
}

/// Joins the provider base URL and a host without doubling slashes.
pub fn provider_url(base: &str, host: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), host.trim_start_matches('/'))
}
