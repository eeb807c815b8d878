//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods that
//! accept a [`sqlx::PgExecutor`] (pool or transaction) as the first argument.

pub mod chat_repo;
pub mod user_repo;

pub use chat_repo::ChatRepo;
pub use user_repo::UserRepo;
