//! Npcf_PolicyAuthorization app session lifecycle
//!
//! One remote attempt per operation; nothing here retries.

use std::sync::Arc;

use ogs_sbi::SbiError;

use crate::error::{NefError, NefResult};
use crate::models::AppSessionContext;
use crate::sbi_path::PcfClient;

/// App session id carried by a PCF `Location` header
pub fn app_session_id_from_location(location: &str) -> Option<&str> {
    let (_, tail) = location.split_once("/app-sessions/")?;
    let id = tail.split(['/', '?']).next().unwrap_or(tail);
    (!id.is_empty()).then_some(id)
}

pub struct PolicySessionClient {
    pcf: Arc<dyn PcfClient>,
}

impl PolicySessionClient {
    pub fn new(pcf: Arc<dyn PcfClient>) -> Self {
        Self { pcf }
    }

    /// Create an app session and return its id
    pub async fn create_session(
        &self,
        api_root: &str,
        context: &AppSessionContext,
    ) -> NefResult<String> {
        let location = self
            .pcf
            .post_app_sessions(api_root, context)
            .await
            .map_err(|e| {
                log::error!("Cannot create policy authorization subscription at {api_root}: {e}");
                NefError::upstream("create app session", api_root, e)
            })?;

        let app_session_id = app_session_id_from_location(&location).ok_or_else(|| {
            NefError::upstream(
                "create app session",
                api_root,
                SbiError::InvalidResponse(format!("no app session id in Location {location}")),
            )
        })?;

        log::info!("Activated policy authorization subscription [{app_session_id}]");
        Ok(app_session_id.to_string())
    }

    /// Delete `app_session_id`, then create a session from `context`.
    ///
    /// A failed delete returns its error without creating anything. A
    /// failed create after a successful delete returns
    /// [`NefError::SessionReleased`].
    pub async fn replace_session(
        &self,
        api_root: &str,
        app_session_id: &str,
        context: &AppSessionContext,
    ) -> NefResult<String> {
        self.delete_session(api_root, app_session_id).await?;

        let new_id = self
            .create_session(api_root, context)
            .await
            .map_err(|e| NefError::SessionReleased {
                app_session_id: app_session_id.to_string(),
                source: Box::new(e),
            })?;

        log::info!("Updated policy authorization subscription [{app_session_id}] -> [{new_id}]");
        Ok(new_id)
    }

    pub async fn delete_session(&self, api_root: &str, app_session_id: &str) -> NefResult<()> {
        self.pcf
            .delete_app_session(api_root, app_session_id)
            .await
            .map_err(|e| {
                log::error!("Cannot delete policy authorization subscription [{app_session_id}]: {e}");
                NefError::upstream("delete app session", app_session_id, e)
            })?;

        log::info!("Removed policy authorization subscription [{app_session_id}]");
        Ok(())
    }
}
