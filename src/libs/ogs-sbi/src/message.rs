//! SBI messages
//!
//! Transport independent view of an HTTP exchange: request line, query
//! parameters, headers and a textual (JSON) body.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const CONTENT_TYPE_JSON: &str = "application/json";

/// Method and target of a request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SbiHeader {
    pub method: String,
    /// Origin form target (`/path?query`) or an absolute URI
    pub uri: String,
}

impl SbiHeader {
    pub fn with_method_uri(method: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            uri: uri.into(),
        }
    }

    /// Target without its query string
    pub fn path(&self) -> &str {
        match self.uri.split_once('?') {
            Some((path, _)) => path,
            None => &self.uri,
        }
    }
}

/// Parts shared by requests and responses
#[derive(Debug, Clone, Default)]
pub struct SbiHttpMessage {
    pub params: HashMap<String, String>,
    pub headers: HashMap<String, String>,
    pub content: Option<String>,
}

impl SbiHttpMessage {
    pub fn set_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.insert(key.into(), value.into());
    }

    pub fn get_param(&self, key: &str) -> Option<&String> {
        self.params.get(key)
    }

    pub fn set_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(key.into(), value.into());
    }

    /// Header value; names compare case-insensitively as in HTTP
    pub fn get_header(&self, key: &str) -> Option<&String> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, value)| value)
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = Some(content.into());
    }

    fn set_json<T: Serialize>(&mut self, body: &T) -> Result<(), serde_json::Error> {
        self.content = Some(serde_json::to_string(body)?);
        self.set_header("Content-Type", CONTENT_TYPE_JSON);
        Ok(())
    }

    /// Decode the body; an absent body decodes as JSON `null`
    fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(self.content.as_deref().unwrap_or("null"))
    }
}

#[derive(Debug, Clone, Default)]
pub struct SbiRequest {
    pub header: SbiHeader,
    pub http: SbiHttpMessage,
}

impl SbiRequest {
    pub fn new(method: &str, uri: impl Into<String>) -> Self {
        Self {
            header: SbiHeader::with_method_uri(method, uri),
            http: SbiHttpMessage::default(),
        }
    }

    pub fn get(uri: impl Into<String>) -> Self {
        Self::new("GET", uri)
    }

    pub fn post(uri: impl Into<String>) -> Self {
        Self::new("POST", uri)
    }

    pub fn put(uri: impl Into<String>) -> Self {
        Self::new("PUT", uri)
    }

    pub fn delete(uri: impl Into<String>) -> Self {
        Self::new("DELETE", uri)
    }

    pub fn patch(uri: impl Into<String>) -> Self {
        Self::new("PATCH", uri)
    }

    pub fn with_json_body<T: Serialize>(mut self, body: &T) -> Result<Self, serde_json::Error> {
        self.http.set_json(body)?;
        Ok(self)
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.http.set_param(key, value);
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.http.set_header(key, value);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct SbiResponse {
    pub status: u16,
    pub http: SbiHttpMessage,
}

impl SbiResponse {
    pub fn with_status(status: u16) -> Self {
        Self {
            status,
            http: SbiHttpMessage::default(),
        }
    }

    pub fn ok() -> Self {
        Self::with_status(200)
    }

    pub fn no_content() -> Self {
        Self::with_status(204)
    }

    pub fn with_json_body<T: Serialize>(mut self, body: &T) -> Result<Self, serde_json::Error> {
        self.http.set_json(body)?;
        Ok(self)
    }

    pub fn with_body(mut self, content: impl Into<String>, content_type: impl Into<String>) -> Self {
        self.http.set_content(content);
        self.http.set_header("Content-Type", content_type);
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.http.set_header(key, value);
        self
    }

    /// 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json_body<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        self.http.json()
    }

    /// One line description of an error response for logs and errors:
    /// `detail (cause)` for a ProblemDetails body, the raw body otherwise
    pub fn problem_summary(&self) -> String {
        match self.json_body::<ProblemDetails>() {
            Ok(ProblemDetails {
                detail, cause, ..
            }) if detail.is_some() || cause.is_some() => format!(
                "{} ({})",
                detail.unwrap_or_default(),
                cause.unwrap_or_default()
            ),
            _ => self.http.content.clone().unwrap_or_default(),
        }
    }
}

/// RFC 7807 problem report carried by SBI error responses
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProblemDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// 3GPP application error cause, e.g. `MANDATORY_IE_INCORRECT`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

impl ProblemDetails {
    pub fn with_status(status: i32) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn with_title(self, title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..self
        }
    }

    pub fn with_detail(self, detail: impl Into<String>) -> Self {
        Self {
            detail: Some(detail.into()),
            ..self
        }
    }

    pub fn with_cause(self, cause: impl Into<String>) -> Self {
        Self {
            cause: Some(cause.into()),
            ..self
        }
    }
}
