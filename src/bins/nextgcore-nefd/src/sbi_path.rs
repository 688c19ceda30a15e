//! NEF SBI Path Functions
//!
//! Outbound SBI towards the NRF (Nnrf_NFDiscovery) and the PCF
//! (Npcf_PolicyAuthorization). The traits are the seams the orchestration
//! depends on; the `Sbi*` types implement them over `ogs_sbi::SbiClient`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hyper::Uri;
use ogs_sbi::{
    HttpVersion, NfType, SbiClient, SbiClientConfig, SbiError, SbiRequest, SbiResponse,
    SbiResult, SbiServiceType,
};
use tokio::sync::Mutex;

use crate::models::{AppSessionContext, SearchResult};

/// Registry operations used by the NEF
#[async_trait]
pub trait NrfClient: Send + Sync {
    /// Nnrf_NFDiscovery search by target and requester NF type
    async fn search_nf_instances(
        &self,
        target_nf_type: NfType,
        requester_nf_type: NfType,
    ) -> SbiResult<SearchResult>;
}

/// Policy authorization operations used by the NEF
#[async_trait]
pub trait PcfClient: Send + Sync {
    /// `POST {api_root}/app-sessions`, returning the `Location` header
    async fn post_app_sessions(
        &self,
        api_root: &str,
        context: &AppSessionContext,
    ) -> SbiResult<String>;

    /// `POST {api_root}/app-sessions/{appSessionId}/delete`
    async fn delete_app_session(&self, api_root: &str, app_session_id: &str) -> SbiResult<()>;
}

/// SBI clients cached per peer authority
pub struct SbiClientPool {
    http_version: HttpVersion,
    request_timeout: Duration,
    clients: Mutex<HashMap<String, Arc<SbiClient>>>,
}

impl SbiClientPool {
    pub fn new(http_version: HttpVersion, request_timeout: Duration) -> Self {
        Self {
            http_version,
            request_timeout,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Client for the authority of `base_url`, plus the path of `base_url`
    /// without a trailing slash
    pub async fn client_for(&self, base_url: &str) -> SbiResult<(Arc<SbiClient>, String)> {
        let config = SbiClientConfig::from_uri(base_url)?
            .with_http_version(self.http_version)
            .with_request_timeout(self.request_timeout);
        let uri: Uri = base_url
            .parse()
            .map_err(|e| SbiError::InvalidUri(format!("{base_url}: {e}")))?;
        let prefix = uri.path().trim_end_matches('/').to_string();

        let mut clients = self.clients.lock().await;
        let client = clients
            .entry(config.base_uri())
            .or_insert_with(|| Arc::new(SbiClient::new(config)))
            .clone();
        Ok((client, prefix))
    }

    pub async fn len(&self) -> usize {
        self.clients.lock().await.len()
    }

    /// Drop every cached client
    pub async fn clear(&self) {
        let mut clients = self.clients.lock().await;
        for client in clients.values() {
            client.close().await;
        }
        clients.clear();
    }
}

fn check_status(response: SbiResponse) -> SbiResult<SbiResponse> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(SbiError::from_status(response.status, response.problem_summary()))
    }
}

/// NRF client over SBI
pub struct SbiNrfClient {
    nrf_uri: String,
    pool: Arc<SbiClientPool>,
}

impl SbiNrfClient {
    pub fn new(nrf_uri: impl Into<String>, pool: Arc<SbiClientPool>) -> Self {
        Self {
            nrf_uri: nrf_uri.into(),
            pool,
        }
    }
}

#[async_trait]
impl NrfClient for SbiNrfClient {
    async fn search_nf_instances(
        &self,
        target_nf_type: NfType,
        requester_nf_type: NfType,
    ) -> SbiResult<SearchResult> {
        let (client, prefix) = self.pool.client_for(&self.nrf_uri).await?;
        let request = SbiRequest::get(format!(
            "{prefix}/{}/v1/nf-instances",
            SbiServiceType::NnrfDisc
        ))
        .with_param("target-nf-type", target_nf_type.to_str())
        .with_param("requester-nf-type", requester_nf_type.to_str())
        .with_header("Accept", "application/json");

        let response = check_status(client.send_request(request).await?)?;
        Ok(response.json_body()?)
    }
}

/// PCF client over SBI
pub struct SbiPcfClient {
    pool: Arc<SbiClientPool>,
}

impl SbiPcfClient {
    pub fn new(pool: Arc<SbiClientPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PcfClient for SbiPcfClient {
    async fn post_app_sessions(
        &self,
        api_root: &str,
        context: &AppSessionContext,
    ) -> SbiResult<String> {
        let (client, prefix) = self.pool.client_for(api_root).await?;
        let request = SbiRequest::post(format!("{prefix}/app-sessions")).with_json_body(context)?;

        let response = check_status(client.send_request(request).await?)?;
        response
            .http
            .get_header("Location")
            .cloned()
            .ok_or_else(|| SbiError::InvalidResponse("missing Location header".to_string()))
    }

    async fn delete_app_session(&self, api_root: &str, app_session_id: &str) -> SbiResult<()> {
        let (client, prefix) = self.pool.client_for(api_root).await?;
        let request = SbiRequest::post(format!("{prefix}/app-sessions/{app_session_id}/delete"));

        check_status(client.send_request(request).await?)?;
        Ok(())
    }
}
