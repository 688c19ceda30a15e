//! Traffic influence orchestration
//!
//! Binds each northbound subscription to one Npcf_PolicyAuthorization app
//! session. Create, update and delete hold the AF write lock across the
//! remote calls, so operations on one AF are serialized while different AFs
//! proceed independently. A subscription is stored only once its app session
//! exists, and is removed as soon as the app session is known to be gone.

use std::sync::Arc;

use crate::context::NefContext;
use crate::error::{NefError, NefResult};
use crate::models::{
    non_empty, AfRoutingRequirement, AppSessionContext, AppSessionContextReqData,
    RouteInformation, RouteToLocation, TrafficCorrelationInfo, TrafficInfluSub,
};
use crate::nnrf_handler::PcfDiscovery;
use crate::npcf_handler::PolicySessionClient;

/// Rejects documents that do not address exactly a single UE.
///
/// Group and any-UE subscriptions would be stored in the UDR, which is not
/// provided.
pub fn classify(sub: &TrafficInfluSub) -> NefResult<()> {
    if sub.is_single_ue() {
        return Ok(());
    }
    if sub.is_group_or_any_ue() {
        return Err(NefError::NotImplemented(
            "udr policies not supported yet".to_string(),
        ));
    }
    // No UE identifier at all: report the mandatory one
    Err(NefError::Validation("field Ipv4Addr not provided".to_string()))
}

fn missing(field: &str) -> NefError {
    NefError::Validation(format!("field {field} not provided"))
}

/// Mandatory members of a single UE subscription, checked in a fixed order
pub fn validate_subscription_data(sub: &TrafficInfluSub) -> NefResult<()> {
    if non_empty(&sub.ipv4_addr).is_none() {
        return Err(missing("Ipv4Addr"));
    }
    if non_empty(&sub.notification_destination).is_none() {
        return Err(missing("NotificationDestination"));
    }
    if non_empty(&sub.dnn).is_none() {
        return Err(missing("Dnn"));
    }

    if sub.traffic_filters.is_empty() {
        return Err(missing("TrafficFilters"));
    }
    for filter in &sub.traffic_filters {
        if filter.flow_descriptions.is_empty() {
            return Err(NefError::Validation("no FlowDescription provided".to_string()));
        }
        if filter.flow_descriptions.iter().any(String::is_empty) {
            return Err(NefError::Validation(
                "invalid flow descriptor: empty FlowDescription".to_string(),
            ));
        }
    }

    if sub.traffic_routes.is_empty() {
        return Err(missing("TrafficRoutes"));
    }
    if sub.traffic_routes.iter().any(|route| route.dnai.is_empty()) {
        return Err(NefError::Validation(
            "invalid route info: field Dnai not provided".to_string(),
        ));
    }

    Ok(())
}

fn route_to_location(route: &RouteToLocation) -> RouteToLocation {
    RouteToLocation {
        dnai: route.dnai.clone(),
        route_info: route.route_info.as_ref().map(|info| RouteInformation {
            ipv4_addr: info.ipv4_addr.clone(),
            ipv6_addr: None,
            port_number: info.port_number,
        }),
        route_prof_id: route.route_prof_id.clone(),
    }
}

/// App session context requesting the routing of a validated subscription
pub fn traffic_influence_to_policy_authorization(
    sub: &TrafficInfluSub,
    supp_feat: &str,
) -> AppSessionContext {
    // A single correlation id: the first flow of the first filter
    let tfc_corre_info = sub
        .traffic_filters
        .first()
        .and_then(|filter| filter.flow_descriptions.first())
        .map(|flow| TrafficCorrelationInfo {
            corr_type: None,
            tfc_corr_id: Some(flow.clone()),
        });

    let af_rout_req = AfRoutingRequirement {
        app_reloc: sub.app_relo_ind,
        route_to_locs: sub.traffic_routes.iter().map(route_to_location).collect(),
        tfc_corre_info,
    };

    AppSessionContext {
        asc_req_data: Some(AppSessionContextReqData {
            af_app_id: sub.af_app_id.clone(),
            af_rout_req: Some(af_rout_req),
            supi: non_empty(&sub.gpsi).map(str::to_string),
            ue_ipv4: sub.ipv4_addr.clone(),
            ue_mac: non_empty(&sub.mac_addr).map(str::to_string),
            notif_uri: sub.notification_destination.clone().unwrap_or_default(),
            supp_feat: supp_feat.to_string(),
            dnn: sub.dnn.clone(),
            slice_info: sub.snssai.clone(),
        }),
        ..Default::default()
    }
}

fn af_not_found(af_id: &str) -> NefError {
    NefError::NotFound(format!("could not find AF {af_id}"))
}

fn sub_not_found(sub_id: &str) -> NefError {
    NefError::NotFound(format!("could not find traffic influence subscription {sub_id}"))
}

fn no_app_session(sub_id: &str) -> NefError {
    NefError::NotFound(format!("subscription {sub_id} has no policy authorization session"))
}

pub struct TrafficInfluenceService {
    context: Arc<NefContext>,
    discovery: PcfDiscovery,
    sessions: PolicySessionClient,
    supported_features: String,
}

impl TrafficInfluenceService {
    pub fn new(
        context: Arc<NefContext>,
        discovery: PcfDiscovery,
        sessions: PolicySessionClient,
        supported_features: impl Into<String>,
    ) -> Self {
        Self {
            context,
            discovery,
            sessions,
            supported_features: supported_features.into(),
        }
    }

    pub fn context(&self) -> &Arc<NefContext> {
        &self.context
    }

    /// Classify, validate and translate a subscription document
    fn prepare(&self, sub: &TrafficInfluSub) -> NefResult<AppSessionContext> {
        classify(sub)?;
        validate_subscription_data(sub)?;
        Ok(traffic_influence_to_policy_authorization(
            sub,
            &self.supported_features,
        ))
    }

    async fn policy_endpoint(&self) -> NefResult<String> {
        self.discovery
            .find_policy_endpoint()
            .await?
            .ok_or(NefError::NoPolicyFunction)
    }

    /// Create a subscription for `af_id`.
    ///
    /// Returns the resource location and the stored document.
    pub async fn create(
        &self,
        af_id: &str,
        sub: TrafficInfluSub,
    ) -> NefResult<(String, TrafficInfluSub)> {
        let af = self.context.af_get_or_create(af_id);
        let mut subs = af.write().await;

        let app_session = self.prepare(&sub)?;
        let api_root = self.policy_endpoint().await?;
        let app_session_id = self.sessions.create_session(&api_root, &app_session).await?;

        let (location, ctx) = subs.new_subscription(sub);
        ctx.set_app_session_id(app_session_id);
        log::info!(
            "Traffic influence subscription created (af={af_id}, sub={}, appSession={})",
            ctx.sub_id(),
            ctx.app_session_id().unwrap_or_default()
        );
        Ok((location, ctx.data().clone()))
    }

    /// Replace the document of an existing subscription
    pub async fn update(
        &self,
        af_id: &str,
        sub_id: &str,
        sub: TrafficInfluSub,
    ) -> NefResult<TrafficInfluSub> {
        let af = self.context.af_find(af_id).ok_or_else(|| af_not_found(af_id))?;
        let mut subs = af.write().await;

        let app_session_id = subs
            .get_subscription(sub_id)
            .ok_or_else(|| sub_not_found(sub_id))?
            .app_session_id()
            .map(str::to_string)
            .ok_or_else(|| no_app_session(sub_id))?;

        let app_session = self.prepare(&sub)?;
        let api_root = self.policy_endpoint().await?;

        match self
            .sessions
            .replace_session(&api_root, &app_session_id, &app_session)
            .await
        {
            Ok(new_id) => {
                let ctx = subs
                    .get_subscription_mut(sub_id)
                    .ok_or_else(|| sub_not_found(sub_id))?;
                ctx.replace(sub, new_id);
                log::info!("Traffic influence subscription updated (af={af_id}, sub={sub_id})");
                Ok(ctx.data().clone())
            }
            Err(err @ NefError::SessionReleased { .. }) => {
                if subs.delete_subscription(sub_id).is_ok() {
                    log::warn!(
                        "Traffic influence subscription dropped, app session [{app_session_id}] \
                         is gone (af={af_id}, sub={sub_id})"
                    );
                }
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Release the app session, then remove the subscription
    pub async fn delete(&self, af_id: &str, sub_id: &str) -> NefResult<()> {
        let af = self.context.af_find(af_id).ok_or_else(|| af_not_found(af_id))?;
        let mut subs = af.write().await;

        let app_session_id = subs
            .get_subscription(sub_id)
            .ok_or_else(|| sub_not_found(sub_id))?
            .app_session_id()
            .map(str::to_string)
            .ok_or_else(|| no_app_session(sub_id))?;

        let api_root = self.policy_endpoint().await?;
        self.sessions.delete_session(&api_root, &app_session_id).await?;

        subs.delete_subscription(sub_id)?;
        log::info!("Traffic influence subscription deleted (af={af_id}, sub={sub_id})");
        Ok(())
    }

    pub async fn get(&self, af_id: &str, sub_id: &str) -> NefResult<TrafficInfluSub> {
        let af = self.context.af_find(af_id).ok_or_else(|| af_not_found(af_id))?;
        let subs = af.read().await;
        subs.get_subscription(sub_id)
            .map(|ctx| ctx.data().clone())
            .ok_or_else(|| sub_not_found(sub_id))
    }

    pub async fn get_all(&self, af_id: &str) -> NefResult<Vec<TrafficInfluSub>> {
        let af = self.context.af_find(af_id).ok_or_else(|| af_not_found(af_id))?;
        let subs = af.read().await;
        Ok(subs.list_subscriptions())
    }
}
