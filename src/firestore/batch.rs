use reqwest::Method;

use super::codec::{encode_fields, DocumentFields};
use super::models::{CommitRequest, CommitResponse, Document, Write, WriteOperation, WriteResult};
use super::{FirestoreClient, FirestoreError};

/// One entry of an atomic multi-document write: an upsert of the given fields
/// at the given document path.
#[derive(Clone, Debug)]
pub struct BatchWrite {
    pub document_path: String,
    pub fields: DocumentFields,
}

/// An ordered set of writes submitted as one atomic commit. Either all
/// entries apply or none do (server-enforced); on failure the batch must not
/// be retried partially.
pub struct WriteBatch<'a> {
    client: &'a FirestoreClient,
    writes: Vec<Write>,
}

impl<'a> WriteBatch<'a> {
    pub(crate) fn new(client: &'a FirestoreClient) -> Self {
        Self {
            client,
            writes: Vec::new(),
        }
    }

    /// Queues an upsert: creates the document if absent, replaces the given
    /// fields if present.
    pub fn set(&mut self, document_path: &str, fields: &DocumentFields) -> &mut Self {
        self.writes.push(Write {
            update_mask: None,
            operation: WriteOperation::Update(Document {
                name: self.client.resource_name(document_path),
                fields: encode_fields(fields),
                create_time: None,
                update_time: None,
            }),
        });
        self
    }

    /// Queues a delete.
    pub fn delete(&mut self, document_path: &str) -> &mut Self {
        self.writes.push(Write {
            update_mask: None,
            operation: WriteOperation::Delete(self.client.resource_name(document_path)),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Commits the queued writes as one atomic operation. An empty batch
    /// commits trivially without a network call.
    pub async fn commit(self) -> Result<Vec<WriteResult>, FirestoreError> {
        if self.writes.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}:commit", self.client.base_url);
        let request = CommitRequest {
            writes: self.writes,
        };

        let response: CommitResponse = self
            .client
            .transport
            .request_json(
                Method::POST,
                &url,
                Some(&request),
                self.client.bearer.as_deref(),
                "Commit batch failed",
            )
            .await?;

        Ok(response.write_results)
    }
}
