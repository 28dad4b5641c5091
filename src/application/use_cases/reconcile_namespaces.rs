use std::sync::Arc;

use crate::application::services::ReconciliationService;
use crate::application::services::reconciliation::{NamespaceCleanup, ReconciliationError};
use crate::application::services::ReconciliationReport;
use crate::domain::value_objects::Namespace;

#[derive(Debug)]
pub enum ReconcileError {
    ValidationError(String),
    Failed(String),
}

impl std::fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReconcileError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ReconcileError::Failed(msg) => write!(f, "Reconciliation failed: {}", msg),
        }
    }
}

impl std::error::Error for ReconcileError {}

impl From<ReconciliationError> for ReconcileError {
    fn from(error: ReconciliationError) -> Self {
        ReconcileError::Failed(error.to_string())
    }
}

pub struct ReconcileNamespacesUseCase {
    reconciliation: Arc<ReconciliationService>,
}

impl ReconcileNamespacesUseCase {
    pub fn new(reconciliation: Arc<ReconciliationService>) -> Self {
        Self { reconciliation }
    }

    pub async fn sweep(&self) -> Result<ReconciliationReport, ReconcileError> {
        Ok(self.reconciliation.sweep().await?)
    }

    pub async fn namespace(&self, namespace: &str) -> Result<Option<NamespaceCleanup>, ReconcileError> {
        let namespace = Namespace::new(namespace).map_err(ReconcileError::ValidationError)?;
        Ok(self.reconciliation.reconcile_namespace(&namespace).await?)
    }
}
