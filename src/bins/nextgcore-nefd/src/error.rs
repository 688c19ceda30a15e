//! NEF error taxonomy and its northbound mapping

use ogs_sbi::{send_error, SbiError, SbiResponse};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NefError {
    /// Malformed or incomplete subscription document
    #[error("{0}")]
    Validation(String),

    /// Unknown AF or subscription
    #[error("{0}")]
    NotFound(String),

    /// Group and any-UE subscriptions
    #[error("{0}")]
    NotImplemented(String),

    #[error("no PCF available")]
    NoPolicyFunction,

    /// The NRF or the PCF failed, or the transport to it did
    #[error("{operation} on {resource} failed: {source}")]
    Upstream {
        operation: &'static str,
        resource: String,
        #[source]
        source: SbiError,
    },

    /// The app session was deleted by a replace whose create then failed
    #[error("app session {app_session_id} was released but no replacement was created: {source}")]
    SessionReleased {
        app_session_id: String,
        #[source]
        source: Box<NefError>,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

pub type NefResult<T> = Result<T, NefError>;

impl NefError {
    pub fn upstream(operation: &'static str, resource: impl Into<String>, source: SbiError) -> Self {
        Self::Upstream {
            operation,
            resource: resource.into(),
            source,
        }
    }

    /// Northbound HTTP status
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::NotFound(_) => 404,
            Self::NotImplemented(_) => 501,
            Self::NoPolicyFunction
            | Self::Upstream { .. }
            | Self::SessionReleased { .. }
            | Self::Config(_) => 500,
        }
    }

    /// ProblemDetails cause
    pub fn cause(&self) -> &'static str {
        match self {
            Self::Validation(_) => "MANDATORY_IE_INCORRECT",
            Self::NotFound(_) => "SUBSCRIPTION_NOT_FOUND",
            Self::NotImplemented(_) => "NOT_IMPLEMENTED",
            Self::NoPolicyFunction => "PCF_NOT_AVAILABLE",
            Self::Upstream { .. } => "UPSTREAM_FAILURE",
            Self::SessionReleased { .. } => "APP_SESSION_RELEASED",
            Self::Config(_) => "SYSTEM_FAILURE",
        }
    }

    fn title(&self) -> &'static str {
        match self.status_code() {
            400 => "Bad Request",
            404 => "Not Found",
            501 => "Not Implemented",
            _ => "Internal Server Error",
        }
    }

    /// ProblemDetails response for this error
    pub fn to_response(&self) -> SbiResponse {
        send_error(self.status_code(), self.title(), &self.to_string(), Some(self.cause()))
    }
}
