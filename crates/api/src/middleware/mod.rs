//! Authentication middleware and extractors.
//!
//! - [`auth::require_auth`] -- Router-wide guard over [`auth::PublicRoutes`].
//! - [`auth::AuthUser`] -- The authenticated caller; rejects if absent.
//! - [`auth::MaybeAuthUser`] -- The caller if known; never rejects.

pub mod auth;
