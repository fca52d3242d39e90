//! Persistence and library collaborators
//!
//! The traits are the seams the orchestrator and the library manager talk
//! through; [`RestBackend`] implements both over the RIS HTTP API.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, instrument, warn};

use crate::config::BackendConfig;
use crate::error::{ImportError, Result};
use crate::library::{LibraryFolder, LibrarySnapshot};
use crate::publication::{PersistedPublication, Publication};
use crate::retry::{RetryConfig, with_retry};

/// Stores canonical publication records
#[async_trait]
pub trait PublicationStore: Send + Sync {
    /// Persist `publication`; the returned record carries the server id
    async fn persist(&self, publication: &Publication) -> Result<PersistedPublication>;
}

/// Stores the library folder hierarchy and publication filings
#[async_trait]
pub trait LibraryStore: Send + Sync {
    async fn load_library(&self) -> Result<LibrarySnapshot>;

    async fn create_folder(&self, name: &str, parent: Option<&str>) -> Result<LibraryFolder>;

    async fn rename_folder(&self, folder_id: &str, name: &str) -> Result<()>;

    async fn move_folder(&self, folder_id: &str, new_parent: Option<&str>) -> Result<()>;

    async fn set_expanded(&self, folder_id: &str, expanded: bool) -> Result<()>;

    /// Delete a folder; the server removes its descendants as well
    async fn delete_folder(&self, folder_id: &str) -> Result<()>;

    async fn add_publication(&self, folder_id: &str, publication_id: &str) -> Result<()>;

    async fn remove_publication(&self, folder_id: &str, publication_id: &str) -> Result<()>;

    async fn move_publication(
        &self,
        publication_id: &str,
        from_folder: &str,
        to_folder: &str,
    ) -> Result<()>;
}

#[async_trait]
impl<T: PublicationStore + ?Sized> PublicationStore for Arc<T> {
    async fn persist(&self, publication: &Publication) -> Result<PersistedPublication> {
        (**self).persist(publication).await
    }
}

#[async_trait]
impl<T: LibraryStore + ?Sized> LibraryStore for Arc<T> {
    async fn load_library(&self) -> Result<LibrarySnapshot> {
        (**self).load_library().await
    }

    async fn create_folder(&self, name: &str, parent: Option<&str>) -> Result<LibraryFolder> {
        (**self).create_folder(name, parent).await
    }

    async fn rename_folder(&self, folder_id: &str, name: &str) -> Result<()> {
        (**self).rename_folder(folder_id, name).await
    }

    async fn move_folder(&self, folder_id: &str, new_parent: Option<&str>) -> Result<()> {
        (**self).move_folder(folder_id, new_parent).await
    }

    async fn set_expanded(&self, folder_id: &str, expanded: bool) -> Result<()> {
        (**self).set_expanded(folder_id, expanded).await
    }

    async fn delete_folder(&self, folder_id: &str) -> Result<()> {
        (**self).delete_folder(folder_id).await
    }

    async fn add_publication(&self, folder_id: &str, publication_id: &str) -> Result<()> {
        (**self).add_publication(folder_id, publication_id).await
    }

    async fn remove_publication(&self, folder_id: &str, publication_id: &str) -> Result<()> {
        (**self).remove_publication(folder_id, publication_id).await
    }

    async fn move_publication(
        &self,
        publication_id: &str,
        from_folder: &str,
        to_folder: &str,
    ) -> Result<()> {
        (**self)
            .move_publication(publication_id, from_folder, to_folder)
            .await
    }
}

/// Validate a collaborator response and return its JSON body
///
/// A non-success status or a `{"success": false}` body is a failure. The
/// message is taken from `error`, then `message`, then the raw body.
pub(crate) fn check_envelope(status: StatusCode, body: &str) -> Result<Value> {
    let value: Value = if body.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.trim().to_string()))
    };

    let explicit_failure = value.get("success").and_then(Value::as_bool) == Some(false);
    if status.is_success() && !explicit_failure {
        if value.is_string() {
            return Err(ImportError::BackendError {
                status: status.as_u16(),
                message: "response body is not JSON".to_string(),
            });
        }
        return Ok(value);
    }

    let message = value
        .get("error")
        .or_else(|| value.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| value.as_str().map(str::to_string))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request rejected")
                .to_string()
        });

    Err(ImportError::BackendError {
        status: status.as_u16(),
        message,
    })
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct FolderEnvelope {
    #[serde(default)]
    folder: Option<LibraryFolder>,
    #[serde(default, rename = "folderId")]
    folder_id: Option<Value>,
}

/// HTTP implementation of both stores
#[derive(Clone)]
pub struct RestBackend {
    client: Client,
    config: BackendConfig,
    retry_config: RetryConfig,
}

impl RestBackend {
    pub fn new(config: BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(format!("pubmed-import-rs/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            config,
            retry_config: RetryConfig::default(),
        })
    }

    /// Retry policy for idempotent reads; writes are never retried
    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Value> {
        let mut request = self
            .client
            .request(method.clone(), self.config.url(path))
            .query(query);
        if let Some(token) = &self.config.auth_token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!(method = %method, path, "Sending backend request");
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        check_envelope(status, &text).inspect_err(|e| {
            warn!(method = %method, path, error = %e, "Backend request failed");
        })
    }

    async fn library_action(&self, method: Method, body: Value) -> Result<Value> {
        self.send(method, "/library", &[], Some(&body)).await
    }
}

#[async_trait]
impl PublicationStore for RestBackend {
    #[instrument(skip(self, publication), fields(pmid = %publication.pubmed_id))]
    async fn persist(&self, publication: &Publication) -> Result<PersistedPublication> {
        let record = serde_json::to_value(publication)?;
        let body = json!({ "publication": record });
        let value = self
            .send(Method::POST, "/publications", &[], Some(&body))
            .await?;

        let server_id = value
            .get("publication")
            .and_then(|p| p.get("id"))
            .or_else(|| value.get("id"))
            .and_then(id_string)
            .ok_or_else(|| ImportError::BackendError {
                status: StatusCode::OK.as_u16(),
                message: "response did not include a publication id".to_string(),
            })?;

        debug!(server_id = %server_id, "Publication persisted");
        Ok(PersistedPublication::new(server_id, publication.clone()))
    }
}

#[async_trait]
impl LibraryStore for RestBackend {
    #[instrument(skip(self))]
    async fn load_library(&self) -> Result<LibrarySnapshot> {
        let value = with_retry(
            || self.send(Method::GET, "/library", &[], None),
            &self.retry_config,
            "load library",
        )
        .await?;
        Ok(serde_json::from_value(value)?)
    }

    #[instrument(skip(self))]
    async fn create_folder(&self, name: &str, parent: Option<&str>) -> Result<LibraryFolder> {
        let value = self
            .library_action(
                Method::POST,
                json!({"action": "createFolder", "name": name, "parentId": parent}),
            )
            .await?;
        let envelope: FolderEnvelope = serde_json::from_value(value)?;

        let folder = match (envelope.folder, envelope.folder_id.as_ref().and_then(id_string)) {
            (Some(folder), _) => folder,
            (None, Some(id)) => LibraryFolder::new(id, name, parent),
            (None, None) => {
                return Err(ImportError::BackendError {
                    status: StatusCode::OK.as_u16(),
                    message: "response did not include the new folder".to_string(),
                });
            }
        };
        Ok(folder)
    }

    #[instrument(skip(self))]
    async fn rename_folder(&self, folder_id: &str, name: &str) -> Result<()> {
        self.library_action(
            Method::PUT,
            json!({"action": "rename", "folderId": folder_id, "name": name}),
        )
        .await
        .map(|_| ())
    }

    #[instrument(skip(self))]
    async fn move_folder(&self, folder_id: &str, new_parent: Option<&str>) -> Result<()> {
        self.library_action(
            Method::PUT,
            json!({"action": "move", "folderId": folder_id, "newParentId": new_parent}),
        )
        .await
        .map(|_| ())
    }

    #[instrument(skip(self))]
    async fn set_expanded(&self, folder_id: &str, expanded: bool) -> Result<()> {
        self.library_action(
            Method::PUT,
            json!({"action": "toggleExpanded", "folderId": folder_id, "expanded": expanded}),
        )
        .await
        .map(|_| ())
    }

    #[instrument(skip(self))]
    async fn delete_folder(&self, folder_id: &str) -> Result<()> {
        self.send(Method::DELETE, "/library", &[("folderId", folder_id)], None)
            .await
            .map(|_| ())
    }

    #[instrument(skip(self))]
    async fn add_publication(&self, folder_id: &str, publication_id: &str) -> Result<()> {
        self.library_action(
            Method::POST,
            json!({"action": "addPublication", "folderId": folder_id, "publicationId": publication_id}),
        )
        .await
        .map(|_| ())
    }

    #[instrument(skip(self))]
    async fn remove_publication(&self, folder_id: &str, publication_id: &str) -> Result<()> {
        self.library_action(
            Method::POST,
            json!({"action": "removePublication", "folderId": folder_id, "publicationId": publication_id}),
        )
        .await
        .map(|_| ())
    }

    #[instrument(skip(self))]
    async fn move_publication(
        &self,
        publication_id: &str,
        from_folder: &str,
        to_folder: &str,
    ) -> Result<()> {
        self.library_action(
            Method::POST,
            json!({
                "action": "movePublication",
                "publicationId": publication_id,
                "fromFolderId": from_folder,
                "toFolderId": to_folder,
            }),
        )
        .await
        .map(|_| ())
    }
}
