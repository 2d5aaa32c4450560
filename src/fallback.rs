//! Capability interfaces behind which the native SDK adapter and this REST
//! client are interchangeable.
//!
//! The backing implementation is selected once, at process start, via
//! dependency injection (see [`crate::FirebaseApp`]) rather than a runtime
//! probe. The degenerate third case, no native adapter and no credential
//! material, fails every operation fast with `CredentialUnavailable` instead
//! of attempting a doomed network call.

use async_trait::async_trait;

use crate::auth::models::{IdentityUser, NewUser, UserUpdate};
use crate::auth::{AuthError, IdentityClient};
use crate::credentials::CredentialError;
use crate::firestore::batch::BatchWrite;
use crate::firestore::codec::DocumentFields;
use crate::firestore::models::{Direction, Document};
use crate::firestore::query::Query;
use crate::firestore::{FirestoreClient, FirestoreError};

/// The document-database operation set shared by the native adapter and the
/// REST client.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get_document(&self, path: &str) -> Result<Option<Document>, FirestoreError>;

    async fn list_collection(
        &self,
        collection_id: &str,
        order_by: Option<(&str, Direction)>,
    ) -> Result<Vec<Document>, FirestoreError>;

    async fn run_query(&self, query: &Query) -> Result<Vec<Document>, FirestoreError>;

    async fn create_document(
        &self,
        collection_id: &str,
        document_id: Option<&str>,
        fields: &DocumentFields,
    ) -> Result<Document, FirestoreError>;

    async fn update_document(
        &self,
        path: &str,
        fields: &DocumentFields,
    ) -> Result<Document, FirestoreError>;

    async fn delete_document(&self, path: &str) -> Result<(), FirestoreError>;

    async fn commit_writes(&self, writes: &[BatchWrite]) -> Result<(), FirestoreError>;
}

/// The identity-directory operation set shared by the native adapter and the
/// REST client.
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    async fn lookup_by_session_token(&self, session_token: &str)
        -> Result<IdentityUser, AuthError>;

    async fn lookup_by_local_id(&self, local_id: &str) -> Result<IdentityUser, AuthError>;

    async fn list_all_users(&self) -> Result<Vec<IdentityUser>, AuthError>;

    async fn create_user(&self, new_user: NewUser) -> Result<String, AuthError>;

    async fn update_user(&self, update: UserUpdate) -> Result<(), AuthError>;

    async fn delete_user(&self, local_id: &str) -> Result<(), AuthError>;
}

#[async_trait]
impl DocumentStore for FirestoreClient {
    async fn get_document(&self, path: &str) -> Result<Option<Document>, FirestoreError> {
        FirestoreClient::get_document(self, path).await
    }

    async fn list_collection(
        &self,
        collection_id: &str,
        order_by: Option<(&str, Direction)>,
    ) -> Result<Vec<Document>, FirestoreError> {
        FirestoreClient::list_collection(self, collection_id, order_by).await
    }

    async fn run_query(&self, query: &Query) -> Result<Vec<Document>, FirestoreError> {
        FirestoreClient::run_query(self, query).await
    }

    async fn create_document(
        &self,
        collection_id: &str,
        document_id: Option<&str>,
        fields: &DocumentFields,
    ) -> Result<Document, FirestoreError> {
        FirestoreClient::create_document(self, collection_id, document_id, fields).await
    }

    async fn update_document(
        &self,
        path: &str,
        fields: &DocumentFields,
    ) -> Result<Document, FirestoreError> {
        FirestoreClient::update_document(self, path, fields).await
    }

    async fn delete_document(&self, path: &str) -> Result<(), FirestoreError> {
        FirestoreClient::delete_document(self, path).await
    }

    async fn commit_writes(&self, writes: &[BatchWrite]) -> Result<(), FirestoreError> {
        FirestoreClient::commit_writes(self, writes).await
    }
}

#[async_trait]
impl IdentityDirectory for IdentityClient {
    async fn lookup_by_session_token(
        &self,
        session_token: &str,
    ) -> Result<IdentityUser, AuthError> {
        IdentityClient::lookup_by_session_token(self, session_token).await
    }

    async fn lookup_by_local_id(&self, local_id: &str) -> Result<IdentityUser, AuthError> {
        IdentityClient::lookup_by_local_id(self, local_id).await
    }

    async fn list_all_users(&self) -> Result<Vec<IdentityUser>, AuthError> {
        IdentityClient::list_all_users(self).await
    }

    async fn create_user(&self, new_user: NewUser) -> Result<String, AuthError> {
        IdentityClient::create_user(self, new_user).await
    }

    async fn update_user(&self, update: UserUpdate) -> Result<(), AuthError> {
        IdentityClient::update_user(self, update).await
    }

    async fn delete_user(&self, local_id: &str) -> Result<(), AuthError> {
        IdentityClient::delete_user(self, local_id).await
    }
}

/// Terminal "no backend" state: every operation fails immediately, without a
/// network attempt.
pub struct Unconfigured;

#[async_trait]
impl DocumentStore for Unconfigured {
    async fn get_document(&self, _path: &str) -> Result<Option<Document>, FirestoreError> {
        Err(CredentialError::Unavailable.into())
    }

    async fn list_collection(
        &self,
        _collection_id: &str,
        _order_by: Option<(&str, Direction)>,
    ) -> Result<Vec<Document>, FirestoreError> {
        Err(CredentialError::Unavailable.into())
    }

    async fn run_query(&self, _query: &Query) -> Result<Vec<Document>, FirestoreError> {
        Err(CredentialError::Unavailable.into())
    }

    async fn create_document(
        &self,
        _collection_id: &str,
        _document_id: Option<&str>,
        _fields: &DocumentFields,
    ) -> Result<Document, FirestoreError> {
        Err(CredentialError::Unavailable.into())
    }

    async fn update_document(
        &self,
        _path: &str,
        _fields: &DocumentFields,
    ) -> Result<Document, FirestoreError> {
        Err(CredentialError::Unavailable.into())
    }

    async fn delete_document(&self, _path: &str) -> Result<(), FirestoreError> {
        Err(CredentialError::Unavailable.into())
    }

    async fn commit_writes(&self, _writes: &[BatchWrite]) -> Result<(), FirestoreError> {
        Err(CredentialError::Unavailable.into())
    }
}

#[async_trait]
impl IdentityDirectory for Unconfigured {
    async fn lookup_by_session_token(
        &self,
        _session_token: &str,
    ) -> Result<IdentityUser, AuthError> {
        Err(CredentialError::Unavailable.into())
    }

    async fn lookup_by_local_id(&self, _local_id: &str) -> Result<IdentityUser, AuthError> {
        Err(CredentialError::Unavailable.into())
    }

    async fn list_all_users(&self) -> Result<Vec<IdentityUser>, AuthError> {
        Err(CredentialError::Unavailable.into())
    }

    async fn create_user(&self, _new_user: NewUser) -> Result<String, AuthError> {
        Err(CredentialError::Unavailable.into())
    }

    async fn update_user(&self, _update: UserUpdate) -> Result<(), AuthError> {
        Err(CredentialError::Unavailable.into())
    }

    async fn delete_user(&self, _local_id: &str) -> Result<(), AuthError> {
        Err(CredentialError::Unavailable.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_fails_fast_without_network() {
        let backend = Unconfigured;

        let err = DocumentStore::get_document(&backend, "officers/jk")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FirestoreError::Credential(CredentialError::Unavailable)
        ));

        let err = IdentityDirectory::list_all_users(&backend).await.unwrap_err();
        assert!(matches!(
            err,
            AuthError::Credential(CredentialError::Unavailable)
        ));
    }
}
