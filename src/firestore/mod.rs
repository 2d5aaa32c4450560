//! REST client for the document database.
//!
//! Covers single-document CRUD, structured queries with exhaustive result
//! collection, and atomic multi-document commits. Real-time listeners and
//! multi-request transactions are native-SDK-only capabilities and are
//! deliberately absent from this fallback path.

pub mod batch;
pub mod codec;
pub mod models;
pub mod query;


use reqwest::{Method, StatusCode};
use thiserror::Error;

use crate::core::transport::{parse_streamed_array, status_error, Transport, TransportError};
use crate::credentials::CredentialError;

use self::batch::{BatchWrite, WriteBatch};
use self::codec::{encode_fields, DocumentFields};
use self::models::{Direction, Document, RunQueryRequest, RunQueryResponse};
use self::query::Query;

const FIRESTORE_V1_API: &str =
    "https://firestore.googleapis.com/v1/projects/{project_id}/databases/(default)/documents";

/// Errors that can occur during document-store operations.
#[derive(Error, Debug)]
pub enum FirestoreError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Credential(#[from] CredentialError),
}

/// Client for the document database's REST surface.
#[derive(Clone)]
pub struct FirestoreClient {
    pub(crate) transport: Transport,
    pub(crate) base_url: String,
    /// Caller-supplied end-user token; when absent the service identity is
    /// attached by the transport middleware.
    pub(crate) bearer: Option<String>,
}

impl FirestoreClient {
    pub fn new(transport: Transport, project_id: &str) -> Self {
        let base_url = FIRESTORE_V1_API.replace("{project_id}", project_id);
        Self::new_with_url(transport, base_url)
    }

    /// Creates a client with a custom base URL (emulators, tests). The URL
    /// must end with the `/documents` resource root.
    pub fn new_with_url(transport: Transport, base_url: String) -> Self {
        Self {
            transport,
            base_url,
            bearer: None,
        }
    }

    /// Returns a client that performs operations on behalf of an end user,
    /// attaching the supplied short-lived session token instead of the
    /// service identity. The token's lifecycle is the caller's concern.
    pub fn as_user(&self, session_token: &str) -> Self {
        Self {
            transport: self.transport.clone(),
            base_url: self.base_url.clone(),
            bearer: Some(session_token.to_string()),
        }
    }

    /// Resource name relative to the API root, as commit payloads expect.
    pub(crate) fn resource_name(&self, document_path: &str) -> String {
        let tail = self
            .base_url
            .split_once("/v1/")
            .map(|(_, tail)| tail)
            .unwrap_or(&self.base_url);
        format!("{}/{}", tail, document_path)
    }

    /// Fetches a single document. A 404 is not an error: it decodes to
    /// `None`. Any other non-2xx response is a transport error.
    pub async fn get_document(&self, path: &str) -> Result<Option<Document>, FirestoreError> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .transport
            .send::<()>(Method::GET, &url, None, self.bearer.as_deref())
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(status_error(response, "Get document failed").await.into());
        }

        let document = response
            .json()
            .await
            .map_err(TransportError::Request)?;
        Ok(Some(document))
    }

    /// Runs a structured query, collecting every page before returning so
    /// callers never see partial results. The endpoint currently streams the
    /// full result in one response (array or newline-delimited); the
    /// signature leaves room for a paginated continuation.
    pub async fn run_query(&self, query: &Query) -> Result<Vec<Document>, FirestoreError> {
        let url = format!("{}:runQuery", self.base_url);
        let request = RunQueryRequest {
            structured_query: query.to_wire(),
        };

        let body = self
            .transport
            .request_text(
                Method::POST,
                &url,
                Some(&request),
                self.bearer.as_deref(),
                "Run query failed",
            )
            .await?;

        let rows: Vec<RunQueryResponse> = parse_streamed_array(&body);
        Ok(rows.into_iter().filter_map(|row| row.document).collect())
    }

    /// Lists every document of a collection, optionally ordered, via a
    /// structured query.
    pub async fn list_collection(
        &self,
        collection_id: &str,
        order_by: Option<(&str, Direction)>,
    ) -> Result<Vec<Document>, FirestoreError> {
        let mut query = Query::new(collection_id);
        if let Some((field, direction)) = order_by {
            query = query.order_by(field, direction);
        }
        self.run_query(&query).await
    }

    /// Creates a document. When `document_id` is omitted the server assigns
    /// one; the created document (with its final resource name) is returned.
    pub async fn create_document(
        &self,
        collection_id: &str,
        document_id: Option<&str>,
        fields: &DocumentFields,
    ) -> Result<Document, FirestoreError> {
        let mut url = format!("{}/{}", self.base_url, collection_id);
        if let Some(id) = document_id {
            url.push_str("?documentId=");
            url.push_str(id);
        }

        let body = serde_json::json!({ "fields": encode_fields(fields) });
        let document = self
            .transport
            .request_json(
                Method::POST,
                &url,
                Some(&body),
                self.bearer.as_deref(),
                "Create document failed",
            )
            .await?;
        Ok(document)
    }

    /// Partially updates a document. The field mask sent on the wire is
    /// exactly the keys present in `fields`, so fields not named here are
    /// left untouched. Omitting the mask would silently delete every field
    /// not included in the call.
    pub async fn update_document(
        &self,
        path: &str,
        fields: &DocumentFields,
    ) -> Result<Document, FirestoreError> {
        let mut url = format!("{}/{}", self.base_url, path);
        for (i, field) in fields.keys().enumerate() {
            url.push(if i == 0 { '?' } else { '&' });
            url.push_str("updateMask.fieldPaths=");
            url.push_str(field);
        }

        let body = serde_json::json!({ "fields": encode_fields(fields) });
        let document = self
            .transport
            .request_json(
                Method::PATCH,
                &url,
                Some(&body),
                self.bearer.as_deref(),
                "Update document failed",
            )
            .await?;
        Ok(document)
    }

    /// Deletes a document. The server tolerates deleting an absent document;
    /// no 404 special case is applied here, unlike [`Self::get_document`].
    pub async fn delete_document(&self, path: &str) -> Result<(), FirestoreError> {
        let url = format!("{}/{}", self.base_url, path);
        self.transport
            .request_unit::<()>(
                Method::DELETE,
                &url,
                None,
                self.bearer.as_deref(),
                "Delete document failed",
            )
            .await?;
        Ok(())
    }

    /// Creates an empty write batch bound to this client.
    pub fn batch(&self) -> WriteBatch<'_> {
        WriteBatch::new(self)
    }

    /// Commits the given upsert writes as one atomic operation; the server
    /// guarantees all-or-nothing application.
    pub async fn commit_writes(&self, writes: &[BatchWrite]) -> Result<(), FirestoreError> {
        let mut batch = self.batch();
        for write in writes {
            batch.set(&write.document_path, &write.fields);
        }
        batch.commit().await?;
        Ok(())
    }
}
