//! External permission services
//!
//! The engine talks to the permission backend through [`PermissionSource`]:
//! role templates, persisted overrides, and the bulk save call. Two implementations
//! ship with the crate, an HTTP client and an in-memory store.

use crate::config::SourceConfig;
use crate::error::DataSourceKind;
use crate::matrix::RolePermissions;
use crate::permission::Role;
use crate::template::TemplateData;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Failure reported by a permission source
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("access denied")]
    AccessDenied,
    #[error("session expired")]
    SessionExpired,
    /// No data exists for the role; treated as an empty map
    #[error("not found")]
    NotFound,
    #[error("unavailable: {0}")]
    Unavailable(String),
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Counts returned by the bulk save endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkSaveResult {
    #[serde(default)]
    pub created: usize,
    #[serde(default)]
    pub updated: usize,
}

/// Permission backend
///
/// Implement this trait to plug in another transport.
#[async_trait::async_trait]
pub trait PermissionSource: Send + Sync {
    /// Role template defaults, dict or list shaped
    async fn get_role_template(&self, role: Role) -> Result<TemplateData, SourceError>;

    /// Persisted overrides for a role
    async fn get_role_permissions(&self, role: Role) -> Result<TemplateData, SourceError>;

    /// Persist overrides for several roles at once
    async fn save_bulk_role_permissions(
        &self,
        payload: &[RolePermissions],
    ) -> Result<BulkSaveResult, SourceError>;

    /// Source name for logging
    fn name(&self) -> &str {
        "permission-source"
    }
}

#[async_trait::async_trait]
impl<S: PermissionSource + ?Sized> PermissionSource for Arc<S> {
    async fn get_role_template(&self, role: Role) -> Result<TemplateData, SourceError> {
        (**self).get_role_template(role).await
    }

    async fn get_role_permissions(&self, role: Role) -> Result<TemplateData, SourceError> {
        (**self).get_role_permissions(role).await
    }

    async fn save_bulk_role_permissions(
        &self,
        payload: &[RolePermissions],
    ) -> Result<BulkSaveResult, SourceError> {
        (**self).save_bulk_role_permissions(payload).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// REST client for the permission API
///
/// - `GET  {base}/roles/{role}/template`
/// - `GET  {base}/roles/{role}/permissions`
/// - `POST {base}/roles/permissions/bulk`
pub struct HttpPermissionSource {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpPermissionSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Build from configuration; the bearer token is read from the configured
    /// environment variable
    pub fn from_config(config: &SourceConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let token = config.token_env.as_ref().and_then(|var| std::env::var(var).ok());
        if config.token_env.is_some() && token.is_none() {
            log::warn!(
                "Token variable {:?} is not set; requests go out unauthenticated",
                config.token_env
            );
        }
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn fetch(&self, path: &str) -> Result<TemplateData, SourceError> {
        let request = self.authorize(self.client.get(self.url(path)));
        let response = request.send().await.map_err(|e| SourceError::Unavailable(e.to_string()))?;
        let response = check_status(response)?;

        let value: serde_json::Value =
            response.json().await.map_err(|e| SourceError::Malformed(e.to_string()))?;
        TemplateData::from_value(value).map_err(|e| SourceError::Malformed(e.to_string()))
    }
}

/// Map HTTP status codes onto the source error taxonomy
pub fn classify_status(status: reqwest::StatusCode) -> Option<SourceError> {
    match status {
        s if s.is_success() => None,
        reqwest::StatusCode::UNAUTHORIZED => Some(SourceError::SessionExpired),
        reqwest::StatusCode::FORBIDDEN => Some(SourceError::AccessDenied),
        reqwest::StatusCode::NOT_FOUND => Some(SourceError::NotFound),
        s => Some(SourceError::Unavailable(format!("HTTP {}", s))),
    }
}

fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SourceError> {
    match classify_status(response.status()) {
        Some(err) => Err(err),
        None => Ok(response),
    }
}

#[async_trait::async_trait]
impl PermissionSource for HttpPermissionSource {
    async fn get_role_template(&self, role: Role) -> Result<TemplateData, SourceError> {
        self.fetch(&format!("roles/{}/template", role)).await
    }

    async fn get_role_permissions(&self, role: Role) -> Result<TemplateData, SourceError> {
        self.fetch(&format!("roles/{}/permissions", role)).await
    }

    async fn save_bulk_role_permissions(
        &self,
        payload: &[RolePermissions],
    ) -> Result<BulkSaveResult, SourceError> {
        let request = self.authorize(self.client.post(self.url("roles/permissions/bulk")));
        let response = request
            .json(payload)
            .send()
            .await
            .map_err(|e| SourceError::Unavailable(e.to_string()))?;
        let response = check_status(response)?;
        response.json().await.map_err(|e| SourceError::Malformed(e.to_string()))
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// In-memory permission backend
///
/// Holds templates and overrides per role and persists saves into the override map.
/// Failures can be injected per role and data kind.
#[derive(Clone, Default)]
pub struct MemoryPermissionSource {
    templates: Arc<RwLock<BTreeMap<Role, TemplateData>>>,
    overrides: Arc<RwLock<BTreeMap<Role, TemplateData>>>,
    failures: Arc<RwLock<BTreeMap<(Role, DataSourceKind), SourceError>>>,
    save_failure: Arc<RwLock<Option<SourceError>>>,
    saves: Arc<RwLock<Vec<Vec<RolePermissions>>>>,
}

impl MemoryPermissionSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_template(self, role: Role, data: impl Into<TemplateData>) -> Self {
        self.set_template(role, data);
        self
    }

    pub fn with_overrides(self, role: Role, data: impl Into<TemplateData>) -> Self {
        self.set_overrides(role, data);
        self
    }

    /// Make every fetch of `kind` for `role` fail
    pub fn with_failure(self, role: Role, kind: DataSourceKind, error: SourceError) -> Self {
        self.set_failure(role, kind, error);
        self
    }

    pub fn with_save_failure(self, error: SourceError) -> Self {
        if let Ok(mut failure) = self.save_failure.write() {
            *failure = Some(error);
        }
        self
    }

    pub fn set_template(&self, role: Role, data: impl Into<TemplateData>) {
        if let Ok(mut templates) = self.templates.write() {
            templates.insert(role, data.into());
        }
    }

    pub fn set_overrides(&self, role: Role, data: impl Into<TemplateData>) {
        if let Ok(mut overrides) = self.overrides.write() {
            overrides.insert(role, data.into());
        }
    }

    pub fn set_failure(&self, role: Role, kind: DataSourceKind, error: SourceError) {
        if let Ok(mut failures) = self.failures.write() {
            failures.insert((role, kind), error);
        }
    }

    /// Every payload passed to the save call, oldest first
    pub fn saved_payloads(&self) -> Vec<Vec<RolePermissions>> {
        self.saves.read().map(|saves| saves.clone()).unwrap_or_default()
    }

    fn read(
        &self,
        map: &RwLock<BTreeMap<Role, TemplateData>>,
        role: Role,
        kind: DataSourceKind,
    ) -> Result<TemplateData, SourceError> {
        let failures = self.failures.read().map_err(|e| SourceError::Unavailable(e.to_string()))?;
        if let Some(error) = failures.get(&(role, kind)) {
            return Err(error.clone());
        }
        let map = map.read().map_err(|e| SourceError::Unavailable(e.to_string()))?;
        map.get(&role).cloned().ok_or(SourceError::NotFound)
    }
}

#[async_trait::async_trait]
impl PermissionSource for MemoryPermissionSource {
    async fn get_role_template(&self, role: Role) -> Result<TemplateData, SourceError> {
        self.read(&self.templates, role, DataSourceKind::Template)
    }

    async fn get_role_permissions(&self, role: Role) -> Result<TemplateData, SourceError> {
        self.read(&self.overrides, role, DataSourceKind::Override)
    }

    async fn save_bulk_role_permissions(
        &self,
        payload: &[RolePermissions],
    ) -> Result<BulkSaveResult, SourceError> {
        if let Some(error) = self.save_failure.read().ok().and_then(|f| f.clone()) {
            return Err(error);
        }

        let mut overrides =
            self.overrides.write().map_err(|e| SourceError::Unavailable(e.to_string()))?;
        let mut result = BulkSaveResult::default();
        for entry in payload {
            let mut existing = overrides.remove(&entry.role).unwrap_or_default().into_external();
            for (key, record) in &entry.permissions {
                if existing.insert(key.clone(), (*record).into()).is_some() {
                    result.updated += 1;
                } else {
                    result.created += 1;
                }
            }
            overrides.insert(entry.role, TemplateData::Dict(existing));
        }

        if let Ok(mut saves) = self.saves.write() {
            saves.push(payload.to_vec());
        }
        Ok(result)
    }

    fn name(&self) -> &str {
        "memory"
    }
}
