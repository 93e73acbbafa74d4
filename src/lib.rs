use std::sync::Arc;

use zeroize::Zeroizing;

mod domain;
mod interfaces;
mod infrastructure;
pub mod errors;
pub mod settings;
pub mod constants;
pub mod graceful_shutdown;

pub use domain::{date_codec, entities, media, use_cases};
pub use interfaces::{handlers, repositories, routes};
pub use infrastructure::{db, storage, utils};

use errors::AppError;
use repositories::{in_memory::InMemoryProjectRepo, project::ProjectRepository, sqlx_repo::SqlxProjectRepo};
use settings::{AppConfig, StorageBackend};
use storage::{local::LocalFileStorage, remote::RemoteObjectStorage, FileStorage};
use use_cases::projects::ProjectHandler;

pub type AppProjectHandler = ProjectHandler<Arc<dyn ProjectRepository>, Arc<dyn FileStorage>>;

pub struct AppState {
    pub project_handler: AppProjectHandler,
    pub admin_token: Option<Zeroizing<String>>,
    pub local_storage: Option<LocalFileStorage>,
    pub store_kind: &'static str,
    pub storage_kind: &'static str,
}

impl AppState {
    /// Wires the record store and file storage chosen by the configuration.
    /// Without a pool, projects live in memory.
    pub fn new(config: &AppConfig, pool: Option<sqlx::PgPool>) -> Result<Self, AppError> {
        let (project_repo, store_kind) = match pool {
            Some(pool) => {
                let repo: Arc<dyn ProjectRepository> = Arc::new(SqlxProjectRepo::new(pool));
                (repo, "postgres")
            }
            None => {
                tracing::warn!("No database configured; projects are kept in memory");
                let repo: Arc<dyn ProjectRepository> = Arc::new(InMemoryProjectRepo::new());
                (repo, "memory")
            }
        };

        let (storage, local_storage, storage_kind) = match config.storage_backend {
            StorageBackend::Local => {
                let local = LocalFileStorage::new(&config.upload_dir, &config.public_base_url)?;
                let storage: Arc<dyn FileStorage> = Arc::new(local.clone());
                (storage, Some(local), "local")
            }
            StorageBackend::Remote => {
                let base_url = config.storage_url.as_deref().ok_or_else(|| {
                    AppError::InvalidInput("storage_url is required for remote storage".into())
                })?;
                let remote = RemoteObjectStorage::new(
                    base_url,
                    &config.storage_bucket,
                    config.storage_api_key(),
                );
                let storage: Arc<dyn FileStorage> = Arc::new(remote);
                (storage, None, "remote")
            }
        };

        let admin_token = config.admin_token();
        if admin_token.is_none() {
            tracing::warn!("No admin token configured; admin routes are open");
        }

        Ok(AppState {
            project_handler: ProjectHandler::new(project_repo, storage),
            admin_token,
            local_storage,
            store_kind,
            storage_kind,
        })
    }
}
