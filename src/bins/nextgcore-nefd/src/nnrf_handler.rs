//! PCF discovery
//!
//! Locates the Npcf_PolicyAuthorization API root, either through the NRF or
//! from the statically configured PCF address.

use std::sync::Arc;

use ogs_sbi::{NfType, SbiServiceType};

use crate::config::SbiConf;
use crate::error::{NefError, NefResult};
use crate::models::{IpEndPoint, NfProfile};
use crate::sbi_path::NrfClient;

pub struct PcfDiscovery {
    sbi: SbiConf,
    nrf: Arc<dyn NrfClient>,
}

impl PcfDiscovery {
    pub fn new(sbi: SbiConf, nrf: Arc<dyn NrfClient>) -> Self {
        Self { sbi, nrf }
    }

    /// API root of Npcf_PolicyAuthorization.
    ///
    /// `Ok(None)` means the NRF answered but no PCF offers the service.
    pub async fn find_policy_endpoint(&self) -> NefResult<Option<String>> {
        if !self.sbi.use_nrf {
            if self.sbi.pcf_svc.is_empty() {
                return Err(NefError::Config(
                    "NRF is disabled and PCF svc is not set".to_string(),
                ));
            }
            return Ok(Some(static_policy_endpoint(&self.sbi.pcf_svc)));
        }

        let result = self
            .nrf
            .search_nf_instances(NfType::Pcf, NfType::Nef)
            .await
            .map_err(|e| NefError::upstream("PCF discovery", self.sbi.nrf_svc.clone(), e))?;

        let Some(pcf) = result.nf_instances.first() else {
            log::warn!("No PCF instance registered in NRF");
            return Ok(None);
        };
        if result.nf_instances.len() > 1 {
            log::warn!(
                "Multiple PCFs are not supported yet, using [{}] out of {}",
                pcf.nf_instance_id,
                result.nf_instances.len()
            );
        }

        let api_root = policy_authorization_api_root(pcf);
        if api_root.is_none() {
            log::warn!(
                "PCF [{}] does not offer {}",
                pcf.nf_instance_id,
                SbiServiceType::NpcfPolicyauthorization
            );
        }
        Ok(api_root)
    }
}

/// Policy authorization API root for a statically configured PCF
pub fn static_policy_endpoint(pcf_svc: &str) -> String {
    format!("{pcf_svc}/{}/v1", SbiServiceType::NpcfPolicyauthorization)
}

fn endpoint_host(endpoint: &IpEndPoint) -> Option<String> {
    if let Some(ipv4) = endpoint.ipv4_address.as_deref().filter(|a| !a.is_empty()) {
        return Some(ipv4.to_string());
    }
    endpoint
        .ipv6_address
        .as_deref()
        .filter(|a| !a.is_empty())
        .map(|ipv6| format!("[{ipv6}]"))
}

/// `scheme://ip:port/npcf-policyauthorization/{apiVersionInUri}` built from
/// the first IP endpoint and first version of the profile's policy
/// authorization service
pub fn policy_authorization_api_root(profile: &NfProfile) -> Option<String> {
    let service_name = SbiServiceType::NpcfPolicyauthorization.to_name();
    let service = profile
        .nf_services
        .iter()
        .find(|service| service.service_name == service_name)?;

    let endpoint = service.ip_end_points.first()?;
    let host = endpoint_host(endpoint)?;
    let port = endpoint.port.unwrap_or_else(|| service.scheme.default_port());
    let version = service.versions.first()?;

    log::info!(
        "Found PCF [{}] supporting {service_name} (ip={host}, port={port}, apiVersion={})",
        profile.nf_instance_id,
        version.api_version_in_uri
    );

    Some(format!(
        "{}://{host}:{port}/{service_name}/{}",
        service.scheme, version.api_version_in_uri
    ))
}
