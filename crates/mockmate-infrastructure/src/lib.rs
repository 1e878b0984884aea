//! File-backed configuration, secrets and history for MockMate.

pub mod config_service;
pub mod history_repository;
pub mod paths;
pub mod secret_service;

pub use crate::config_service::ConfigService;
pub use crate::history_repository::JsonHistoryRepository;
pub use crate::paths::MockmatePaths;
pub use crate::secret_service::SecretServiceImpl;
