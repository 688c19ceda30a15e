//! Test doubles for the NEF collaborators

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use nextgcore_nefd::models::{AppSessionContext, SearchResult};
use nextgcore_nefd::{
    NefContext, NrfClient, PcfClient, PcfDiscovery, PolicySessionClient, SbiConf,
    TrafficInfluenceService,
};
use ogs_sbi::{NfType, SbiError, SbiRequest, SbiResult};
use serde_json::Value;

/// Static PCF base URL used by [`service`]
pub const PCF_SVC: &str = "http://10.0.0.7:7777";

/// In-memory PCF recording every app session operation
#[derive(Default)]
pub struct MockPcf {
    pub fail_post: AtomicBool,
    pub fail_delete: AtomicBool,
    next_id: AtomicUsize,
    calls: Mutex<Vec<String>>,
    contexts: Mutex<Vec<AppSessionContext>>,
}

impl MockPcf {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_context(&self) -> Option<AppSessionContext> {
        self.contexts.lock().unwrap().last().cloned()
    }

    pub fn set_fail_post(&self, fail: bool) {
        self.fail_post.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_delete(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl PcfClient for MockPcf {
    async fn post_app_sessions(
        &self,
        api_root: &str,
        context: &AppSessionContext,
    ) -> SbiResult<String> {
        self.calls.lock().unwrap().push("post".to_string());
        self.contexts.lock().unwrap().push(context.clone());
        if self.fail_post.load(Ordering::SeqCst) {
            return Err(SbiError::from_status(503, "pcf overloaded"));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("{api_root}/app-sessions/as-{id}"))
    }

    async fn delete_app_session(&self, _api_root: &str, app_session_id: &str) -> SbiResult<()> {
        self.calls.lock().unwrap().push(format!("delete {app_session_id}"));
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(SbiError::Timeout);
        }
        Ok(())
    }
}

/// Registry that must not be consulted
pub struct UnusedNrf;

#[async_trait]
impl NrfClient for UnusedNrf {
    async fn search_nf_instances(&self, _: NfType, _: NfType) -> SbiResult<SearchResult> {
        Err(SbiError::ConnectionError("registry disabled".to_string()))
    }
}

pub fn static_pcf_conf() -> SbiConf {
    SbiConf {
        use_nrf: false,
        pcf_svc: PCF_SVC.to_string(),
        ..Default::default()
    }
}

/// Service over a fresh store, a static PCF and `pcf`
pub fn service(pcf: Arc<MockPcf>) -> TrafficInfluenceService {
    TrafficInfluenceService::new(
        Arc::new(NefContext::new()),
        PcfDiscovery::new(static_pcf_conf(), Arc::new(UnusedNrf)),
        PolicySessionClient::new(pcf),
        "0",
    )
}

/// Subscription document of the single UE example
pub fn valid_subscription() -> Value {
    serde_json::json!({
        "afAppId": "app1",
        "ipv4Addr": "12.1.1.1",
        "notificationDestination": "http://notifications",
        "dnn": "internet",
        "snssai": {"sst": 1, "sd": "010203"},
        "trafficFilters": [{"flowId": 1, "flowDescriptions": ["permit ip 0.0.0.0 0.0.0.0"]}],
        "trafficRoutes": [{"dnai": "DNAI1"}]
    })
}

pub fn json_request(method: &str, uri: &str, body: &Value) -> SbiRequest {
    let request = match method {
        "POST" => SbiRequest::post(uri),
        "PUT" => SbiRequest::put(uri),
        "PATCH" => SbiRequest::patch(uri),
        _ => panic!("unexpected method {method}"),
    };
    request.with_json_body(body).unwrap()
}

/// Subscription id carried by a resource location
pub fn sub_id_of(location: &str) -> String {
    location.rsplit('/').next().unwrap().to_string()
}
