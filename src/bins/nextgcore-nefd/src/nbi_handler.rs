//! Northbound request handler (3gpp-traffic-influence/v1)

use ogs_sbi::message::{SbiRequest, SbiResponse};
use ogs_sbi::server::{
    send_bad_request, send_method_not_allowed, send_not_found, send_not_implemented,
};
use serde::de::DeserializeOwned;

use crate::models::TrafficInfluSub;
use crate::traffic_influence::TrafficInfluenceService;

/// Decode the JSON body of `request`, or the 400 response to send
fn decode_body<T: DeserializeOwned>(request: &SbiRequest) -> Result<T, SbiResponse> {
    let body = match request.http.content.as_deref() {
        Some(content) if !content.trim().is_empty() => content,
        _ => return Err(send_bad_request("Missing request body", Some("MISSING_BODY"))),
    };

    serde_json::from_str(body)
        .map_err(|e| send_bad_request(&format!("Invalid JSON: {e}"), Some("INVALID_JSON")))
}

/// NEF northbound request handler
pub async fn nef_nbi_request_handler(
    service: &TrafficInfluenceService,
    request: SbiRequest,
) -> SbiResponse {
    let method = request.header.method.as_str();
    let path = request.header.path();

    log::debug!("NEF NBI: {method} {}", request.header.uri);

    let parts: Vec<&str> = path.trim_matches('/').split('/').collect();

    match parts.as_slice() {
        ["3gpp-traffic-influence", "v1", af_id, "subscriptions"] if !af_id.is_empty() => match method {
            "GET" => handle_subscription_list(service, af_id).await,
            "POST" => handle_subscription_create(service, af_id, &request).await,
            _ => send_method_not_allowed(method, "subscriptions"),
        },
        ["3gpp-traffic-influence", "v1", af_id, "subscriptions", sub_id] if !af_id.is_empty() => {
            match method {
                "GET" => handle_subscription_get(service, af_id, sub_id).await,
                "PUT" => handle_subscription_update(service, af_id, sub_id, &request).await,
                "PATCH" => {
                    send_not_implemented("partial update of a subscription is not supported")
                }
                "DELETE" => handle_subscription_delete(service, af_id, sub_id).await,
                _ => send_method_not_allowed(method, "subscriptions/{subscriptionId}"),
            }
        }
        _ => {
            log::debug!("Unknown path: {path}");
            send_not_found(&format!("Resource not found: {path}"), None)
        }
    }
}

async fn handle_subscription_list(service: &TrafficInfluenceService, af_id: &str) -> SbiResponse {
    match service.get_all(af_id).await {
        Ok(subs) => SbiResponse::ok()
            .with_json_body(&subs)
            .unwrap_or_else(|_| SbiResponse::with_status(200)),
        Err(e) => e.to_response(),
    }
}

async fn handle_subscription_create(
    service: &TrafficInfluenceService,
    af_id: &str,
    request: &SbiRequest,
) -> SbiResponse {
    let sub: TrafficInfluSub = match decode_body(request) {
        Ok(sub) => sub,
        Err(response) => return response,
    };

    match service.create(af_id, sub).await {
        Ok((location, stored)) => SbiResponse::with_status(201)
            .with_header("Location", location)
            .with_json_body(&stored)
            .unwrap_or_else(|_| SbiResponse::with_status(201)),
        Err(e) => {
            log::warn!("Traffic influence create failed (af={af_id}): {e}");
            e.to_response()
        }
    }
}

async fn handle_subscription_get(
    service: &TrafficInfluenceService,
    af_id: &str,
    sub_id: &str,
) -> SbiResponse {
    match service.get(af_id, sub_id).await {
        Ok(sub) => SbiResponse::ok()
            .with_json_body(&sub)
            .unwrap_or_else(|_| SbiResponse::with_status(200)),
        Err(e) => e.to_response(),
    }
}

async fn handle_subscription_update(
    service: &TrafficInfluenceService,
    af_id: &str,
    sub_id: &str,
    request: &SbiRequest,
) -> SbiResponse {
    let sub: TrafficInfluSub = match decode_body(request) {
        Ok(sub) => sub,
        Err(response) => return response,
    };

    match service.update(af_id, sub_id, sub).await {
        Ok(stored) => SbiResponse::ok()
            .with_json_body(&stored)
            .unwrap_or_else(|_| SbiResponse::with_status(200)),
        Err(e) => {
            log::warn!("Traffic influence update failed (af={af_id}, sub={sub_id}): {e}");
            e.to_response()
        }
    }
}

async fn handle_subscription_delete(
    service: &TrafficInfluenceService,
    af_id: &str,
    sub_id: &str,
) -> SbiResponse {
    match service.delete(af_id, sub_id).await {
        Ok(()) => SbiResponse::no_content(),
        Err(e) => {
            log::warn!("Traffic influence delete failed (af={af_id}, sub={sub_id}): {e}");
            e.to_response()
        }
    }
}
