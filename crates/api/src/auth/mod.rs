//! Authentication primitives and the session lifecycle.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`jwt`] -- Access/refresh token generation, validation, and hashing.
//! - [`revocation`] -- Revoked access-token cache (Redis or in-process).
//! - [`cookies`] -- `access_token` / `refresh_token` cookies.
//! - [`session`] -- Signup, login, logout, and refresh orchestration.

pub mod cookies;
pub mod jwt;
pub mod password;
pub mod revocation;
pub mod session;
