//! REST fallback for Firebase Admin functionality.
//!
//! Used by server runtimes where the native Admin SDK cannot be initialized
//! (missing native bindings, restricted environments). Reimplements, at the
//! wire level, the three things the native SDK hides: service-account OAuth2
//! token lifecycle, the tagged value codec, and the request/response shapes
//! for document CRUD, structured queries, atomic commits and the identity
//! directory.
//!
//! The backing implementation is decided once at startup:
//!
//! ```no_run
//! use firebase_admin_rest::{AppOptions, FirebaseApp};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let app = FirebaseApp::initialize(AppOptions::default());
//! let officer = app.documents().get_document("officers/jk").await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod core;
pub mod credentials;
pub mod fallback;
pub mod firestore;

use std::sync::Arc;

use tracing::{debug, warn};

use crate::core::transport::Transport;
use crate::credentials::token::TokenManager;
use crate::credentials::Credentials;
use crate::fallback::{DocumentStore, IdentityDirectory, Unconfigured};

pub use crate::auth::models::{IdentityUser, NewUser, UserUpdate};
pub use crate::auth::{AuthError, IdentityClient};
pub use crate::core::transport::TransportError;
pub use crate::credentials::CredentialError;
pub use crate::firestore::batch::BatchWrite;
pub use crate::firestore::codec::{DocumentFields, FieldValue};
pub use crate::firestore::models::{Direction, Document, FieldOperator};
pub use crate::firestore::query::Query;
pub use crate::firestore::{FirestoreClient, FirestoreError};

/// A caller-supplied native-SDK adapter. Out of scope for this crate; any
/// pair of implementations of the capability traits can be injected.
pub struct NativeAdapters {
    pub documents: Arc<dyn DocumentStore>,
    pub identity: Arc<dyn IdentityDirectory>,
}

/// Startup configuration for [`FirebaseApp::initialize`].
#[derive(Default)]
pub struct AppOptions {
    /// Explicit credential material; when absent the environment resolver
    /// chain runs.
    pub credentials: Option<Credentials>,
    /// When present, all operations delegate to the native client and the
    /// REST fallback is never constructed.
    pub native: Option<NativeAdapters>,
    /// Base-URL overrides, mainly for tests.
    pub firestore_url: Option<String>,
    pub identity_url: Option<String>,
}

/// Which backend the one-time startup decision selected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendMode {
    Native,
    Rest,
    Unconfigured,
}

enum Backend {
    Native(NativeAdapters),
    Rest {
        documents: FirestoreClient,
        identity: IdentityClient,
    },
    Unconfigured(Unconfigured),
}

/// The long-lived application value owning the backend decision. Constructed
/// once by the host's startup routine and passed explicitly to consumers;
/// the decision is not re-evaluated per request.
pub struct FirebaseApp {
    backend: Backend,
    storage_bucket: Option<String>,
}

impl FirebaseApp {
    pub fn initialize(options: AppOptions) -> Self {
        if let Some(native) = options.native {
            debug!("native admin client supplied, delegating all operations to it");
            return Self {
                backend: Backend::Native(native),
                storage_bucket: options.credentials.map(|c| c.storage_bucket),
            };
        }

        let credentials = options.credentials.or_else(Credentials::from_env);
        let credentials = match credentials {
            Some(credentials) => credentials,
            None => {
                warn!("no service-account credentials resolved; every operation will fail fast");
                return Self {
                    backend: Backend::Unconfigured(Unconfigured),
                    storage_bucket: None,
                };
            }
        };

        debug!(
            project_id = %credentials.project_id,
            emulator = credentials.emulator.is_configured(),
            "falling back to the REST admin client"
        );

        let transport = Transport::new(Arc::new(TokenManager::new(&credentials)));

        let firestore_url = options.firestore_url.or_else(|| {
            credentials.emulator.firestore.as_ref().map(|host| {
                format!(
                    "http://{}/v1/projects/{}/databases/(default)/documents",
                    host, credentials.project_id
                )
            })
        });
        let documents = match firestore_url {
            Some(url) => FirestoreClient::new_with_url(transport.clone(), url),
            None => FirestoreClient::new(transport.clone(), &credentials.project_id),
        };

        let identity_url = options.identity_url.or_else(|| {
            credentials
                .emulator
                .auth
                .as_ref()
                .map(|host| format!("http://{}/identitytoolkit.googleapis.com/v1", host))
        });
        let identity = match identity_url {
            Some(url) => IdentityClient::new_with_url(transport, &credentials.project_id, url),
            None => IdentityClient::new(transport, &credentials.project_id),
        };

        Self {
            backend: Backend::Rest {
                documents,
                identity,
            },
            storage_bucket: Some(credentials.storage_bucket),
        }
    }

    pub fn mode(&self) -> BackendMode {
        match &self.backend {
            Backend::Native(_) => BackendMode::Native,
            Backend::Rest { .. } => BackendMode::Rest,
            Backend::Unconfigured(_) => BackendMode::Unconfigured,
        }
    }

    pub fn documents(&self) -> &dyn DocumentStore {
        match &self.backend {
            Backend::Native(native) => native.documents.as_ref(),
            Backend::Rest { documents, .. } => documents,
            Backend::Unconfigured(unconfigured) => unconfigured,
        }
    }

    pub fn identity(&self) -> &dyn IdentityDirectory {
        match &self.backend {
            Backend::Native(native) => native.identity.as_ref(),
            Backend::Rest { identity, .. } => identity,
            Backend::Unconfigured(unconfigured) => unconfigured,
        }
    }

    pub fn storage_bucket(&self) -> Option<&str> {
        self.storage_bucket.as_deref()
    }
}
