use std::sync::Arc;

use parley_db::store::{ChatStore, UserStore};

use crate::auth::revocation::RevocationCache;
use crate::auth::session::SessionService;
use crate::config::ServerConfig;
use crate::middleware::auth::PublicRoutes;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Credential store.
    pub users: Arc<dyn UserStore>,
    /// Chats and memberships.
    pub chats: Arc<dyn ChatStore>,
    /// Revoked access tokens.
    pub revocations: Arc<dyn RevocationCache>,
    pub config: Arc<ServerConfig>,
    pub sessions: SessionService,
    /// Routes the auth guard lets through without a token.
    pub public_routes: Arc<PublicRoutes>,
}

impl AppState {
    /// Wire the session service and public route table around the given
    /// collaborators.
    pub fn new(
        users: Arc<dyn UserStore>,
        chats: Arc<dyn ChatStore>,
        revocations: Arc<dyn RevocationCache>,
        config: ServerConfig,
    ) -> Self {
        let sessions = SessionService::new(
            Arc::clone(&users),
            Arc::clone(&revocations),
            config.jwt.clone(),
            std::time::Duration::from_secs(config.revocation_ttl_secs),
        );

        Self {
            users,
            chats,
            revocations,
            config: Arc::new(config),
            sessions,
            public_routes: Arc::new(crate::routes::public_routes()),
        }
    }
}
