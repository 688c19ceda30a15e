//! Property-Based Tests for traffic influence handling
//!
//! - every mandatory member, when missing alone, is reported by name
//! - resource locations embed the AF and subscription ids verbatim
//! - classification agrees with the UE identifiers present

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::context::{traffic_influence_location, AfContext};
    use crate::error::NefError;
    use crate::models::{FlowInfo, RouteToLocation, TrafficInfluSub};
    use crate::traffic_influence::{
        classify, traffic_influence_to_policy_authorization, validate_subscription_data,
    };

    // Strategy for non-empty identifier-like strings
    fn arb_token() -> impl Strategy<Value = String> {
        "[A-Za-z0-9._-]{1,16}"
    }

    // Strategy for complete single UE documents
    fn arb_valid_sub() -> impl Strategy<Value = TrafficInfluSub> {
        (
            (1u8..=254, 0u8..=255, 0u8..=255, 1u8..=254),
            arb_token(),
            arb_token(),
            prop::collection::vec(prop::collection::vec(arb_token(), 1..4), 1..4),
            prop::collection::vec(arb_token(), 1..4),
        )
            .prop_map(|((a, b, c, d), dnn, notif, filters, dnais)| TrafficInfluSub {
                ipv4_addr: Some(format!("{a}.{b}.{c}.{d}")),
                notification_destination: Some(format!("http://{notif}")),
                dnn: Some(dnn),
                traffic_filters: filters
                    .into_iter()
                    .enumerate()
                    .map(|(i, flow_descriptions)| FlowInfo {
                        flow_id: i as i32 + 1,
                        flow_descriptions,
                    })
                    .collect(),
                traffic_routes: dnais
                    .into_iter()
                    .map(|dnai| RouteToLocation {
                        dnai,
                        ..Default::default()
                    })
                    .collect(),
                ..Default::default()
            })
    }

    /// Remove one mandatory member; returns the message naming it
    fn knock_out(sub: &mut TrafficInfluSub, which: usize) -> &'static str {
        match which {
            0 => {
                sub.ipv4_addr = None;
                "field Ipv4Addr not provided"
            }
            1 => {
                sub.notification_destination = Some(String::new());
                "field NotificationDestination not provided"
            }
            2 => {
                sub.dnn = None;
                "field Dnn not provided"
            }
            3 => {
                sub.traffic_filters.clear();
                "field TrafficFilters not provided"
            }
            4 => {
                sub.traffic_filters[0].flow_descriptions.clear();
                "no FlowDescription provided"
            }
            5 => {
                sub.traffic_filters[0].flow_descriptions[0].clear();
                "invalid flow descriptor: empty FlowDescription"
            }
            6 => {
                sub.traffic_routes.clear();
                "field TrafficRoutes not provided"
            }
            _ => {
                sub.traffic_routes[0].dnai.clear();
                "invalid route info: field Dnai not provided"
            }
        }
    }

    proptest! {
        #[test]
        fn prop_complete_documents_validate(sub in arb_valid_sub()) {
            prop_assert!(classify(&sub).is_ok());
            prop_assert!(validate_subscription_data(&sub).is_ok());
        }

        #[test]
        fn prop_missing_member_is_named(mut sub in arb_valid_sub(), which in 0usize..8) {
            let expected = knock_out(&mut sub, which);
            match validate_subscription_data(&sub) {
                Err(NefError::Validation(message)) => prop_assert_eq!(message, expected),
                other => prop_assert!(false, "unexpected result {:?}", other),
            }
        }

        #[test]
        fn prop_translation_keeps_every_route(sub in arb_valid_sub(), supp_feat in "[0-9a-f]{0,4}") {
            let ctx = traffic_influence_to_policy_authorization(&sub, &supp_feat);
            let req = ctx.asc_req_data.expect("request data");
            let rout = req.af_rout_req.expect("routing requirement");

            let dnais: Vec<&str> = rout.route_to_locs.iter().map(|r| r.dnai.as_str()).collect();
            let expected: Vec<&str> = sub.traffic_routes.iter().map(|r| r.dnai.as_str()).collect();
            prop_assert_eq!(dnais, expected);
            prop_assert_eq!(
                rout.tfc_corre_info.and_then(|info| info.tfc_corr_id),
                Some(sub.traffic_filters[0].flow_descriptions[0].clone())
            );
            prop_assert_eq!(req.supp_feat, supp_feat);
            prop_assert_eq!(req.ue_ipv4, sub.ipv4_addr);
        }

        #[test]
        fn prop_location_format(af_id in arb_token(), sub_id in arb_token()) {
            let location = traffic_influence_location(&af_id, &sub_id);
            prop_assert_eq!(
                &location,
                &format!("/3gpp-traffic-influence/v1/{af_id}/subscriptions/{sub_id}")
            );
            prop_assert_eq!(location.rsplit('/').next(), Some(sub_id.as_str()));
        }

        #[test]
        fn prop_stored_location_addresses_subscription(af_id in arb_token(), sub in arb_valid_sub()) {
            let af = AfContext::new(&af_id);
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let (location, sub_id, stored) = runtime.block_on(async {
                let mut subs = af.write().await;
                let (location, ctx) = subs.new_subscription(sub);
                let sub_id = ctx.sub_id().to_string();
                let stored = subs.get_subscription(&sub_id).is_some();
                (location, sub_id, stored)
            });

            prop_assert_eq!(&location, &traffic_influence_location(&af_id, &sub_id));
            prop_assert!(stored);
        }

        #[test]
        fn prop_classification(
            gpsi in prop::option::of("[0-9]{0,10}"),
            ipv6 in prop::option::of("(2001:db8::[0-9]{1,4})?"),
            group in prop::option::of("[a-z]{0,6}"),
            any_ue in prop::option::of(any::<bool>()),
        ) {
            let sub = TrafficInfluSub {
                gpsi: gpsi.clone(),
                ipv6_addr: ipv6.clone(),
                external_group_id: group.clone(),
                any_ue_ind: any_ue,
                ..Default::default()
            };

            let single = [gpsi, ipv6].iter().flatten().any(|v| !v.is_empty());
            let group_or_any = group.is_some_and(|g| !g.is_empty()) || any_ue == Some(true);

            match classify(&sub) {
                Ok(()) => prop_assert!(single),
                Err(NefError::NotImplemented(_)) => prop_assert!(!single && group_or_any),
                Err(NefError::Validation(_)) => prop_assert!(!single && !group_or_any),
                Err(other) => prop_assert!(false, "unexpected error {}", other),
            }
        }
    }
}
