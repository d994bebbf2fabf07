//! User infrastructure module
//!
//! Password hashing with Argon2, user repositories for both storage backends,
//! CV file storage and the user service.

mod cv_storage;
mod password;
mod postgres_repository;
mod repository;
mod service;

pub use cv_storage::{FsCvStorage, InMemoryCvStorage};
pub use password::{Argon2Hasher, PasswordHasher};
pub use postgres_repository::PostgresUserRepository;
pub use repository::InMemoryUserRepository;
pub use service::{ChangePasswordRequest, UpdateProfileRequest, UserService};

pub(crate) use postgres_repository::{row_to_user, USER_COLUMNS};
