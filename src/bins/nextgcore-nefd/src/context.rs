//! NEF Context Management
//!
//! Two level subscription store: AF id -> AF context -> subscription id ->
//! subscription context.
//!
//! The AF map is guarded by its own lock. Each AF context carries an async
//! read-write lock over its subscriptions; the guard types returned by
//! [`AfContext::read`] and [`AfContext::write`] are the only way to reach
//! the subscriptions, so the locking discipline is enforced by the types.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use tokio::sync::{RwLock as AsyncRwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{NefError, NefResult};
use crate::models::TrafficInfluSub;

/// Northbound API root of the traffic influence resources
pub const TRAFFIC_INFLUENCE_API_ROOT: &str = "/3gpp-traffic-influence/v1";

/// Resource location of a subscription
pub fn traffic_influence_location(af_id: &str, sub_id: &str) -> String {
    format!("{TRAFFIC_INFLUENCE_API_ROOT}/{af_id}/subscriptions/{sub_id}")
}

/// One accepted traffic influence subscription
#[derive(Debug, Clone)]
pub struct TrafficInfluSubCtx {
    sub_id: String,
    location: String,
    data: TrafficInfluSub,
    /// Id of the PCF app session backing this subscription
    app_session_id: Option<String>,
}

impl TrafficInfluSubCtx {
    pub fn sub_id(&self) -> &str {
        &self.sub_id
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn data(&self) -> &TrafficInfluSub {
        &self.data
    }

    pub fn app_session_id(&self) -> Option<&str> {
        self.app_session_id.as_deref().filter(|id| !id.is_empty())
    }

    pub fn set_app_session_id(&mut self, app_session_id: impl Into<String>) {
        self.app_session_id = Some(app_session_id.into());
    }

    /// Replace the document and the app session id, keeping id and location
    pub fn replace(&mut self, mut data: TrafficInfluSub, app_session_id: impl Into<String>) {
        data.self_link = Some(self.sub_id.clone());
        self.data = data;
        self.app_session_id = Some(app_session_id.into());
    }
}

/// Subscriptions of one AF. Reachable only through an [`AfContext`] guard.
#[derive(Debug)]
pub struct AfSubscriptions {
    af_id: String,
    subs: HashMap<String, TrafficInfluSubCtx>,
}

impl AfSubscriptions {
    fn new(af_id: &str) -> Self {
        Self {
            af_id: af_id.to_string(),
            subs: HashMap::new(),
        }
    }

    /// Store `data` under a fresh subscription id.
    ///
    /// The document's `self` member is stamped with the new id.
    pub fn new_subscription(&mut self, mut data: TrafficInfluSub) -> (String, &mut TrafficInfluSubCtx) {
        let sub_id = uuid::Uuid::new_v4().to_string();
        let location = traffic_influence_location(&self.af_id, &sub_id);
        data.self_link = Some(sub_id.clone());

        log::debug!("Subscription added (af={}, sub={sub_id})", self.af_id);

        let ctx = self.subs.entry(sub_id.clone()).or_insert(TrafficInfluSubCtx {
            sub_id,
            location: location.clone(),
            data,
            app_session_id: None,
        });
        (location, ctx)
    }

    pub fn get_subscription(&self, sub_id: &str) -> Option<&TrafficInfluSubCtx> {
        self.subs.get(sub_id)
    }

    pub fn get_subscription_mut(&mut self, sub_id: &str) -> Option<&mut TrafficInfluSubCtx> {
        self.subs.get_mut(sub_id)
    }

    /// Documents of all subscriptions, in no particular order
    pub fn list_subscriptions(&self) -> Vec<TrafficInfluSub> {
        self.subs.values().map(|sub| sub.data.clone()).collect()
    }

    pub fn delete_subscription(&mut self, sub_id: &str) -> NefResult<TrafficInfluSubCtx> {
        match self.subs.remove(sub_id) {
            Some(sub) => {
                log::debug!("Subscription removed (af={}, sub={sub_id})", self.af_id);
                Ok(sub)
            }
            None => Err(NefError::NotFound(format!(
                "could not find traffic influence subscription {sub_id}"
            ))),
        }
    }

    pub fn len(&self) -> usize {
        self.subs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subs.is_empty()
    }
}

/// Per-AF context
#[derive(Debug)]
pub struct AfContext {
    af_id: String,
    subscriptions: AsyncRwLock<AfSubscriptions>,
}

impl AfContext {
    pub fn new(af_id: &str) -> Self {
        Self {
            af_id: af_id.to_string(),
            subscriptions: AsyncRwLock::new(AfSubscriptions::new(af_id)),
        }
    }

    pub fn af_id(&self) -> &str {
        &self.af_id
    }

    /// Shared access for lookups
    pub async fn read(&self) -> RwLockReadGuard<'_, AfSubscriptions> {
        self.subscriptions.read().await
    }

    /// Exclusive access for insert, replace and remove
    pub async fn write(&self) -> RwLockWriteGuard<'_, AfSubscriptions> {
        self.subscriptions.write().await
    }
}

/// NEF context: the AF registry
#[derive(Debug, Default)]
pub struct NefContext {
    af_list: RwLock<HashMap<String, Arc<AfContext>>>,
}

impl NefContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new AF. Returns `None` when the AF is already known.
    pub fn af_add(&self, af_id: &str) -> Option<Arc<AfContext>> {
        let mut af_list = self.af_list.write().unwrap_or_else(PoisonError::into_inner);
        if af_list.contains_key(af_id) {
            return None;
        }
        let af = Arc::new(AfContext::new(af_id));
        af_list.insert(af_id.to_string(), af.clone());
        log::debug!("AF added (af={af_id})");
        Some(af)
    }

    pub fn af_find(&self, af_id: &str) -> Option<Arc<AfContext>> {
        let af_list = self.af_list.read().unwrap_or_else(PoisonError::into_inner);
        af_list.get(af_id).cloned()
    }

    /// Existing AF context, or a new one registered under `af_id`
    pub fn af_get_or_create(&self, af_id: &str) -> Arc<AfContext> {
        if let Some(af) = self.af_find(af_id) {
            return af;
        }

        let mut af_list = self.af_list.write().unwrap_or_else(PoisonError::into_inner);
        af_list
            .entry(af_id.to_string())
            .or_insert_with(|| {
                log::debug!("AF added (af={af_id})");
                Arc::new(AfContext::new(af_id))
            })
            .clone()
    }

    pub fn af_count(&self) -> usize {
        self.af_list.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn af_remove_all(&self) {
        self.af_list
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// Global NEF context
static GLOBAL_NEF_CONTEXT: OnceLock<Arc<NefContext>> = OnceLock::new();

/// Get the global NEF context
pub fn nef_self() -> Arc<NefContext> {
    GLOBAL_NEF_CONTEXT
        .get_or_init(|| Arc::new(NefContext::new()))
        .clone()
}

/// Initialize the global NEF context
pub fn nef_context_init() {
    let _ = nef_self();
}

/// Finalize the global NEF context
pub fn nef_context_final() {
    nef_self().af_remove_all();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_data() -> TrafficInfluSub {
        TrafficInfluSub {
            af_app_id: Some("app1".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_af_add() {
        let ctx = NefContext::new();
        let af = ctx.af_add("af-test").unwrap();
        assert_eq!(af.af_id(), "af-test");
        assert!(af.read().await.is_empty());

        // Re-adding is a no-op
        assert!(ctx.af_add("af-test").is_none());
        assert_eq!(ctx.af_count(), 1);
        assert!(Arc::ptr_eq(&af, &ctx.af_find("af-test").unwrap()));
    }

    #[tokio::test]
    async fn test_new_subscription() {
        let af = AfContext::new("af-test");
        let mut subs = af.write().await;

        let (loc, ctx) = subs.new_subscription(sample_data());
        let sub_id = ctx.sub_id().to_string();

        assert_eq!(loc, format!("/3gpp-traffic-influence/v1/af-test/subscriptions/{sub_id}"));
        assert_eq!(ctx.location(), loc);
        assert_eq!(ctx.data().self_link.as_deref(), Some(sub_id.as_str()));
        assert_eq!(ctx.data().af_app_id.as_deref(), Some("app1"));
        assert!(ctx.app_session_id().is_none());

        assert_eq!(subs.len(), 1);
        assert_eq!(subs.get_subscription(&sub_id).unwrap().location(), loc);
    }

    #[tokio::test]
    async fn test_subscription_ids_are_unique() {
        let af = AfContext::new("af-test");
        let mut subs = af.write().await;
        let (first, _) = subs.new_subscription(sample_data());
        let (second, _) = subs.new_subscription(sample_data());
        assert_ne!(first, second);
        assert_eq!(subs.list_subscriptions().len(), 2);
    }

    #[tokio::test]
    async fn test_get_subscription() {
        let af = AfContext::new("af-test");
        let sub_id = {
            let mut subs = af.write().await;
            let (_, ctx) = subs.new_subscription(sample_data());
            ctx.sub_id().to_string()
        };

        let subs = af.read().await;
        assert!(subs.get_subscription(&sub_id).is_some());
        assert!(subs.get_subscription("fakeSubId").is_none());
    }

    #[tokio::test]
    async fn test_delete_subscription() {
        let af = AfContext::new("af-test");
        let mut subs = af.write().await;
        let (_, ctx) = subs.new_subscription(sample_data());
        let sub_id = ctx.sub_id().to_string();
        let (_, sibling) = subs.new_subscription(sample_data());
        let sibling_id = sibling.sub_id().to_string();

        let removed = subs.delete_subscription(&sub_id).unwrap();
        assert_eq!(removed.sub_id(), sub_id);
        assert_eq!(subs.len(), 1);
        assert!(subs.get_subscription(&sibling_id).is_some());

        assert!(matches!(
            subs.delete_subscription(&sub_id),
            Err(NefError::NotFound(_))
        ));
        assert_eq!(subs.len(), 1);
    }

    #[tokio::test]
    async fn test_replace_keeps_identity() {
        let af = AfContext::new("af-test");
        let mut subs = af.write().await;
        let (loc, ctx) = subs.new_subscription(sample_data());
        ctx.set_app_session_id("pcf-1");
        let sub_id = ctx.sub_id().to_string();

        let updated = TrafficInfluSub {
            af_app_id: Some("app2".to_string()),
            ..Default::default()
        };
        let ctx = subs.get_subscription_mut(&sub_id).unwrap();
        ctx.replace(updated, "pcf-2");

        assert_eq!(ctx.sub_id(), sub_id);
        assert_eq!(ctx.location(), loc);
        assert_eq!(ctx.app_session_id(), Some("pcf-2"));
        assert_eq!(ctx.data().af_app_id.as_deref(), Some("app2"));
        assert_eq!(ctx.data().self_link.as_deref(), Some(sub_id.as_str()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_af_get_or_create_concurrent() {
        let ctx = Arc::new(NefContext::new());

        let handles: Vec<_> = (0..32)
            .map(|i| {
                let ctx = ctx.clone();
                tokio::spawn(async move {
                    let af_id = format!("af-{}", i % 4);
                    ctx.af_get_or_create(&af_id)
                })
            })
            .collect();

        let mut contexts = Vec::new();
        for handle in handles {
            contexts.push(handle.await.unwrap());
        }

        assert_eq!(ctx.af_count(), 4);
        for af in &contexts {
            let registered = ctx.af_find(af.af_id()).unwrap();
            assert!(Arc::ptr_eq(af, &registered));
        }
    }

    #[test]
    fn test_af_get_or_create_is_idempotent() {
        let ctx = NefContext::new();
        let first = ctx.af_get_or_create("af-1");
        let second = ctx.af_get_or_create("af-1");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(ctx.af_count(), 1);
    }

    #[test]
    fn test_poisoned_registry_stays_usable() {
        let ctx = Arc::new(NefContext::new());
        let af = ctx.af_add("af-1").unwrap();

        let holder = ctx.clone();
        let _ = std::thread::spawn(move || {
            let _guard = holder.af_list.write().unwrap();
            panic!("registry writer died");
        })
        .join();
        assert!(ctx.af_list.is_poisoned());

        assert!(Arc::ptr_eq(&af, &ctx.af_find("af-1").unwrap()));
        assert!(ctx.af_add("af-1").is_none());
        assert!(ctx.af_add("af-2").is_some());
        assert!(Arc::ptr_eq(&af, &ctx.af_get_or_create("af-1")));
        assert_eq!(ctx.af_count(), 2);

        ctx.af_remove_all();
        assert_eq!(ctx.af_count(), 0);
    }

    #[test]
    fn test_global_context() {
        nef_context_init();
        let a = nef_self();
        let b = nef_self();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
