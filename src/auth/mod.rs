//! REST client for the identity directory (Identity Toolkit).
//!
//! Resolves "who is calling" from a session token, enumerates every account
//! for the administration screens, and creates/updates/deletes identities.
//! All calls are POST, authenticated with the service token, and carry
//! `targetProjectId` in the payload.

pub mod models;

#[cfg(test)]
mod tests;

use reqwest::Method;
use thiserror::Error;

use crate::core::transport::{Transport, TransportError};
use crate::credentials::CredentialError;

use self::models::{
    DeleteUserRequest, IdentityUser, LookupRequest, LookupResponse, NewUser, QueryUsersRequest,
    QueryUsersResponse, SignUpRequest, SignUpResponse, UpdateUserRequest, UserUpdate,
};

const IDENTITY_TOOLKIT_V1_API: &str = "https://identitytoolkit.googleapis.com/v1";

/// Errors that can occur during identity-directory operations.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Credential(#[from] CredentialError),
    /// The session token is malformed or was rejected by the provider.
    #[error("session token rejected: {0}")]
    Unauthorized(String),
    #[error("user not found")]
    UserNotFound,
}

/// Client for the identity directory's REST surface.
#[derive(Clone)]
pub struct IdentityClient {
    transport: Transport,
    base_url: String,
    project_id: String,
}

impl IdentityClient {
    pub fn new(transport: Transport, project_id: &str) -> Self {
        Self::new_with_url(transport, project_id, IDENTITY_TOOLKIT_V1_API.to_string())
    }

    /// Creates a client with a custom base URL (emulators, tests).
    pub fn new_with_url(transport: Transport, project_id: &str, base_url: String) -> Self {
        Self {
            transport,
            base_url,
            project_id: project_id.to_string(),
        }
    }

    fn endpoint(&self, operation: &str) -> String {
        format!("{}/accounts:{}", self.base_url, operation)
    }

    /// Resolves the account behind a caller-supplied session token. Fails
    /// with [`AuthError::Unauthorized`] when the provider rejects the token.
    pub async fn lookup_by_session_token(
        &self,
        session_token: &str,
    ) -> Result<IdentityUser, AuthError> {
        let request = LookupRequest {
            target_project_id: self.project_id.clone(),
            id_token: Some(session_token.to_string()),
            local_id: None,
        };

        let response: LookupResponse = self
            .transport
            .request_json(
                Method::POST,
                &self.endpoint("lookup"),
                Some(&request),
                None,
                "Token lookup failed",
            )
            .await
            .map_err(reject_as_unauthorized)?;

        response
            .users
            .into_iter()
            .next()
            .ok_or_else(|| AuthError::Unauthorized("no account matches the session token".into()))
    }

    /// Fetches one account by its stable id.
    pub async fn lookup_by_local_id(&self, local_id: &str) -> Result<IdentityUser, AuthError> {
        let request = LookupRequest {
            target_project_id: self.project_id.clone(),
            id_token: None,
            local_id: Some(vec![local_id.to_string()]),
        };

        let response: LookupResponse = self
            .transport
            .request_json(
                Method::POST,
                &self.endpoint("lookup"),
                Some(&request),
                None,
                "User lookup failed",
            )
            .await?;

        response.users.into_iter().next().ok_or(AuthError::UserNotFound)
    }

    /// Lists every account, looping on the provider's page token until it is
    /// absent. The account-management screen must show every account, so
    /// stopping after one page would be a correctness bug.
    pub async fn list_all_users(&self) -> Result<Vec<IdentityUser>, AuthError> {
        let mut users = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let request = QueryUsersRequest {
                target_project_id: self.project_id.clone(),
                page_token: page_token.take(),
            };

            let response: QueryUsersResponse = self
                .transport
                .request_json(
                    Method::POST,
                    &self.endpoint("query"),
                    Some(&request),
                    None,
                    "List users failed",
                )
                .await?;

            users.extend(response.user_info);

            match response.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(users)
    }

    /// Creates a user identity and returns its assigned `localId`.
    pub async fn create_user(&self, new_user: NewUser) -> Result<String, AuthError> {
        let request = SignUpRequest {
            target_project_id: self.project_id.clone(),
            email: new_user.email,
            password: new_user.password,
            display_name: new_user.display_name,
        };

        let response: SignUpResponse = self
            .transport
            .request_json(
                Method::POST,
                &self.endpoint("signUp"),
                Some(&request),
                None,
                "Create user failed",
            )
            .await?;

        Ok(response.local_id)
    }

    /// Updates a user identity; only the supplied fields are sent.
    pub async fn update_user(&self, update: UserUpdate) -> Result<(), AuthError> {
        let request = UpdateUserRequest {
            target_project_id: self.project_id.clone(),
            local_id: update.local_id,
            email: update.email,
            password: update.password,
            display_name: update.display_name,
        };

        self.transport
            .request_unit(
                Method::POST,
                &self.endpoint("update"),
                Some(&request),
                None,
                "Update user failed",
            )
            .await?;
        Ok(())
    }

    /// Deletes a user identity.
    pub async fn delete_user(&self, local_id: &str) -> Result<(), AuthError> {
        let request = DeleteUserRequest {
            target_project_id: self.project_id.clone(),
            local_id: local_id.to_string(),
        };

        self.transport
            .request_unit(
                Method::POST,
                &self.endpoint("delete"),
                Some(&request),
                None,
                "Delete user failed",
            )
            .await?;
        Ok(())
    }
}

/// 4xx rejections of a token lookup mean the token itself was refused.
fn reject_as_unauthorized(err: TransportError) -> AuthError {
    match err {
        TransportError::Status {
            status_code: 400 | 401 | 403,
            provider_message,
        } => AuthError::Unauthorized(provider_message),
        other => AuthError::Transport(other),
    }
}
