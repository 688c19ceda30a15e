//! JSON documents exchanged by the NEF
//!
//! - `TrafficInfluSub` and its parts (TS 29.522, northbound)
//! - `AppSessionContext` and its parts (TS 29.514, Npcf_PolicyAuthorization)
//! - `SearchResult` and the NF profile parts it carries (TS 29.510, Nnrf_NFDiscovery)
//!
//! Only the members the NEF reads or writes are typed. Other members of a
//! traffic influence subscription are kept in `extra` and returned as
//! received.

use ogs_sbi::UriScheme;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Single Network Slice Selection Assistance Information
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snssai {
    pub sst: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sd: Option<String>,
}

/// Flow information of a traffic filter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowInfo {
    pub flow_id: i32,
    /// IPFilterRule strings, e.g. "permit out ip from any to 10.0.0.1"
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flow_descriptions: Vec<String>,
}

/// Explicit N6 routing information
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteInformation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv4_addr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv6_addr: Option<String>,
    pub port_number: i32,
}

/// A DNAI and how to reach it; shared by TS 29.522 and TS 29.514
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteToLocation {
    #[serde(default)]
    pub dnai: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_info: Option<RouteInformation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_prof_id: Option<String>,
}

/// Traffic influence subscription (TS 29.522 TrafficInfluSub)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficInfluSub {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub af_service_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub af_app_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub af_trans_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_relo_ind: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dnn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snssai: Option<Snssai>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_group_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub any_ue_ind: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpsi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv4_addr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv6_addr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mac_addr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dnai_chg_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_destination: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_test_notification: Option<bool>,
    /// Link to this subscription, set by the NEF to the subscription id
    #[serde(rename = "self", skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub traffic_filters: Vec<FlowInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub eth_traffic_filters: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub traffic_routes: Vec<RouteToLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tfc_corr_ind: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supp_feat: Option<String>,
    /// Members not interpreted by the NEF (tempValidities, geoAreas, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Returns the value when it is present and not empty
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl TrafficInfluSub {
    /// The subscription targets one UE (GPSI or UE address given)
    pub fn is_single_ue(&self) -> bool {
        non_empty(&self.gpsi).is_some()
            || non_empty(&self.ipv4_addr).is_some()
            || non_empty(&self.ipv6_addr).is_some()
    }

    /// The subscription targets a group or any UE
    pub fn is_group_or_any_ue(&self) -> bool {
        non_empty(&self.external_group_id).is_some() || self.any_ue_ind.unwrap_or(false)
    }
}

/// Traffic correlation information (TS 29.514)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficCorrelationInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corr_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tfc_corr_id: Option<String>,
}

/// AF routing requirement (TS 29.514)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AfRoutingRequirement {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_reloc: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub route_to_locs: Vec<RouteToLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tfc_corre_info: Option<TrafficCorrelationInfo>,
}

/// Request part of an application session context (TS 29.514)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSessionContextReqData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub af_app_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub af_rout_req: Option<AfRoutingRequirement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ue_ipv4: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ue_mac: Option<String>,
    pub notif_uri: String,
    pub supp_feat: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dnn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slice_info: Option<Snssai>,
}

/// Application session context (TS 29.514)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSessionContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asc_req_data: Option<AppSessionContextReqData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asc_resp_data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evs_notif: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpEndPoint {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv4_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv6_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transport: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NfServiceVersion {
    pub api_version_in_uri: String,
    #[serde(default)]
    pub api_full_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<String>,
}

/// NF service as advertised in an NF profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NfService {
    #[serde(default)]
    pub service_instance_id: String,
    pub service_name: String,
    #[serde(default)]
    pub versions: Vec<NfServiceVersion>,
    #[serde(default)]
    pub scheme: UriScheme,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nf_service_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fqdn: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ip_end_points: Vec<IpEndPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_prefix: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NfProfile {
    pub nf_instance_id: String,
    /// Kept as text so profiles of NF types unknown to this crate still decode
    #[serde(default)]
    pub nf_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nf_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fqdn: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ipv4_addresses: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nf_services: Vec<NfService>,
}

/// Nnrf_NFDiscovery search result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validity_period: Option<i32>,
    #[serde(default)]
    pub nf_instances: Vec<NfProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nrf_supported_features: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_traffic_influ_sub_from_json() {
        let sub: TrafficInfluSub = serde_json::from_value(json!({
            "afServiceId": "svc",
            "afAppId": "app1",
            "dnn": "internet",
            "snssai": {"sst": 1, "sd": "000001"},
            "ipv4Addr": "12.1.1.1",
            "notificationDestination": "http://notifications",
            "trafficFilters": [{"flowId": 1, "flowDescriptions": ["permit out ip from any to 10.0.0.1"]}],
            "trafficRoutes": [{"dnai": "DNAI1", "routeInfo": {"ipv4Addr": "10.60.0.1", "portNumber": 0}}],
            "suppFeat": "0",
            "tempValidities": [{"startTime": "10:00:00"}]
        }))
        .unwrap();

        assert_eq!(sub.af_app_id.as_deref(), Some("app1"));
        assert_eq!(sub.snssai, Some(Snssai { sst: 1, sd: Some("000001".into()) }));
        assert_eq!(sub.traffic_filters[0].flow_descriptions.len(), 1);
        assert_eq!(sub.traffic_routes[0].route_info.as_ref().unwrap().port_number, 0);
        assert!(sub.extra.contains_key("tempValidities"));
        assert!(sub.is_single_ue());
        assert!(!sub.is_group_or_any_ue());
    }

    #[test]
    fn test_unknown_members_survive_a_round_trip() {
        let input = json!({
            "afTransId": "t1",
            "geoAreas": ["area"],
            "self": "sub-1"
        });
        let sub: TrafficInfluSub = serde_json::from_value(input.clone()).unwrap();
        assert_eq!(sub.self_link.as_deref(), Some("sub-1"));
        assert_eq!(serde_json::to_value(&sub).unwrap(), input);
    }

    #[test]
    fn test_classification_ignores_empty_strings() {
        let sub = TrafficInfluSub {
            gpsi: Some(String::new()),
            ipv4_addr: Some(String::new()),
            external_group_id: Some("group-1".into()),
            ..Default::default()
        };
        assert!(!sub.is_single_ue());
        assert!(sub.is_group_or_any_ue());

        let any_ue = TrafficInfluSub {
            any_ue_ind: Some(true),
            ..Default::default()
        };
        assert!(any_ue.is_group_or_any_ue());
    }

    #[test]
    fn test_app_session_context_wire_names() {
        let ctx = AppSessionContext {
            asc_req_data: Some(AppSessionContextReqData {
                af_app_id: Some("app1".into()),
                af_rout_req: Some(AfRoutingRequirement {
                    app_reloc: Some(true),
                    route_to_locs: vec![RouteToLocation {
                        dnai: "DNAI1".into(),
                        ..Default::default()
                    }],
                    tfc_corre_info: Some(TrafficCorrelationInfo {
                        corr_type: None,
                        tfc_corr_id: Some("flow".into()),
                    }),
                }),
                ue_ipv4: Some("12.1.1.1".into()),
                notif_uri: "http://notifications".into(),
                supp_feat: "0".into(),
                ..Default::default()
            }),
            ..Default::default()
        };

        let value = serde_json::to_value(&ctx).unwrap();
        let req = &value["ascReqData"];
        assert_eq!(req["afAppId"], "app1");
        assert_eq!(req["afRoutReq"]["appReloc"], true);
        assert_eq!(req["afRoutReq"]["routeToLocs"][0]["dnai"], "DNAI1");
        assert_eq!(req["afRoutReq"]["tfcCorreInfo"]["tfcCorrId"], "flow");
        assert_eq!(req["ueIpv4"], "12.1.1.1");
        assert_eq!(req["notifUri"], "http://notifications");
        assert!(req.get("supi").is_none());
    }

    #[test]
    fn test_search_result_from_nrf() {
        let result: SearchResult = serde_json::from_value(json!({
            "validityPeriod": 3600,
            "nfInstances": [{
                "nfInstanceId": "pcf-1",
                "nfType": "PCF",
                "nfStatus": "REGISTERED",
                "nfServices": [{
                    "serviceInstanceId": "1",
                    "serviceName": "npcf-policyauthorization",
                    "versions": [{"apiVersionInUri": "v1", "apiFullVersion": "1.0.0"}],
                    "scheme": "http",
                    "nfServiceStatus": "REGISTERED",
                    "ipEndPoints": [{"ipv4Address": "10.0.0.7", "port": 7777}]
                }]
            }]
        }))
        .unwrap();

        let service = &result.nf_instances[0].nf_services[0];
        assert_eq!(service.scheme, UriScheme::Http);
        assert_eq!(service.ip_end_points[0].port, Some(7777));
        assert_eq!(service.versions[0].api_version_in_uri, "v1");
    }
}
