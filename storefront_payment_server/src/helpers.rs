use std::{net::IpAddr, str::FromStr};

use actix_web::{http::header::USER_AGENT, HttpRequest};
use log::{debug, trace};
use regex::Regex;
use storefront_payment_engine::settlement_objects::EventProvenance;

use crate::config::ServerOptions;

/// Get the remote IP address from the request. It uses 3 sources to determine the IP address, in decreasing order
/// of preference:
/// 1. The `X-Forwarded-For` header, iif `use_x_forwarded_for` is set to true in the configuration.
/// 2. The `Forwarded` header, iif `use_forwarded` is set to true in the configuration.
/// 3. The peer address from the connection info.
pub fn get_remote_ip(req: &HttpRequest, use_x_forwarded_for: bool, use_forwarded: bool) -> Option<IpAddr> {
    let mut result = None;
    if use_x_forwarded_for {
        trace!("Checking X-Forwarded-For header");
        // The left-most entry is the originating client
        result = req
            .headers()
            .get("X-Forwarded-For")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| IpAddr::from_str(s.trim()).ok());
        if let Some(ip) = result {
            debug!("Using X-Forwarded-For header for remote address: {ip}");
        }
    }
    if use_forwarded && result.is_none() {
        trace!("Checking Forwarded header");
        result = req
            .headers()
            .get("Forwarded")
            .and_then(|v| v.to_str().ok())
            .and_then(forwarded_for);
        if let Some(ip) = result {
            debug!("Using Forwarded header for remote address: {ip}");
        }
    }
    result.or_else(|| {
        let peer_addr = req.connection_info().peer_addr().map(|a| a.to_string());
        trace!("Using Peer address for remote address: {:?}", peer_addr);
        peer_addr.and_then(|s| IpAddr::from_str(&s).ok())
    })
}

fn forwarded_for(header: &str) -> Option<IpAddr> {
    let re = Regex::new(r#"for="?(?P<ip>[^;,"]+)"?"#).ok()?;
    re.captures(header)
        .and_then(|caps| caps.name("ip"))
        .map(|m| m.as_str().trim_start_matches('[').trim_end_matches(']'))
        .and_then(|s| IpAddr::from_str(s).ok())
}

pub fn get_user_agent(req: &HttpRequest) -> Option<String> {
    req.headers().get(USER_AGENT).and_then(|v| v.to_str().ok()).map(String::from)
}

/// Attaches the caller's IP address and user agent to `provenance` for the audit log.
pub fn with_request_details(provenance: EventProvenance, req: &HttpRequest, options: &ServerOptions) -> EventProvenance {
    let ip = get_remote_ip(req, options.use_x_forwarded_for, options.use_forwarded).map(|ip| ip.to_string());
    provenance.with_ip_address(ip).with_user_agent(get_user_agent(req))
}
