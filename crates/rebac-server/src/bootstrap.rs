//! Bootstrap: one-time store setup.
//!
//! Drives `Uninitialized → StoreCreated → ModelInstalled →
//! RootAdminSeeded → Operational`. Every transition is idempotent, so
//! re-running bootstrap at restart against an already-operational store is
//! a no-op success. A validation failure halts startup; that is fatal and
//! never retried automatically.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, instrument};

use rebac_domain::error::DomainError;
use rebac_domain::model::{AuthorizationModel, SchemaRegistry, Subject};
use rebac_storage::{StorageError, TupleStore};

use crate::config::BootstrapSettings;
use crate::manager::{ManagerError, RelationshipManager};
use crate::schema::USER_TYPE;

/// Stages of store initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapStage {
    Uninitialized,
    StoreCreated,
    ModelInstalled,
    RootAdminSeeded,
    Operational,
}

/// A failed bootstrap, carrying the last stage that completed.
#[derive(Debug, Error)]
#[error("bootstrap halted after {stage:?}: {cause}")]
pub struct BootstrapError {
    pub stage: BootstrapStage,
    #[source]
    pub cause: BootstrapCause,
}

/// What went wrong during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapCause {
    /// The model failed validation. Fatal; fix the model, not the data.
    #[error(transparent)]
    Schema(DomainError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Seed(ManagerError),
}

/// The handle a successful bootstrap leaves behind.
#[derive(Debug)]
pub struct Bootstrapped {
    /// The deployment's store id.
    pub store_id: String,
    /// The validated schema registry for the installed model.
    pub registry: Arc<SchemaRegistry>,
    /// Always `Operational` on success.
    pub stage: BootstrapStage,
}

/// One-time setup of the deployment's store.
pub struct Bootstrap<S: TupleStore> {
    store: Arc<S>,
}

impl<S: TupleStore> Bootstrap<S> {
    /// Creates a bootstrap runner over the given store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Runs all stages. Idempotent end to end.
    #[instrument(skip_all, fields(store_id = %settings.store_id))]
    pub async fn run(
        &self,
        settings: &BootstrapSettings,
        model: AuthorizationModel,
    ) -> Result<Bootstrapped, BootstrapError> {
        let halt = |stage: BootstrapStage, cause: BootstrapCause| BootstrapError { stage, cause };

        match self
            .store
            .create_store(&settings.store_id, &settings.store_name)
            .await
        {
            Ok(_) => info!("store created"),
            Err(StorageError::StoreAlreadyExists { .. }) => {
                debug!("store already present, continuing")
            }
            Err(e) => {
                return Err(halt(
                    BootstrapStage::Uninitialized,
                    BootstrapCause::Storage(e),
                ))
            }
        }

        // Validate before persisting so an invalid model never installs.
        SchemaRegistry::load(model.clone())
            .map_err(|e| halt(BootstrapStage::StoreCreated, BootstrapCause::Schema(e)))?;

        // The store keeps whichever model was installed first; the
        // registry is always built from the installed one.
        let installed = self
            .store
            .install_model(&settings.store_id, model)
            .await
            .map_err(|e| halt(BootstrapStage::StoreCreated, BootstrapCause::Storage(e)))?;
        let registry = Arc::new(
            SchemaRegistry::load(installed)
                .map_err(|e| halt(BootstrapStage::StoreCreated, BootstrapCause::Schema(e)))?,
        );

        let manager = RelationshipManager::new(
            Arc::clone(&self.store),
            Arc::clone(&registry),
            settings.store_id.clone(),
        );
        manager
            .initialize_root_admin(
                &settings.root_org_id,
                Subject::object(USER_TYPE, settings.root_admin_user_id.clone()),
            )
            .await
            .map_err(|e| halt(BootstrapStage::ModelInstalled, BootstrapCause::Seed(e)))?;

        info!("bootstrap complete, store operational");
        Ok(Bootstrapped {
            store_id: settings.store_id.clone(),
            registry,
            stage: BootstrapStage::Operational,
        })
    }
}
