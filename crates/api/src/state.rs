use std::sync::Arc;

use soraclean_core::registry::TaskRegistry;
use soraclean_db::ledger::CreditLedger;
use soraclean_kie::api::KieApi;
use soraclean_kie::submit::JobSubmitter;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Credits, subscriptions and processing history.
    pub ledger: Arc<dyn CreditLedger>,
    /// In-flight and finished provider tasks.
    pub registry: Arc<TaskRegistry>,
    /// Provider REST client, also used to fetch finished artifacts.
    pub kie: Arc<KieApi>,
    /// Creates provider jobs and registers the deferred ones.
    pub submitter: Arc<JobSubmitter>,
}

impl AppState {
    /// Wire the provider client, registry and submitter from configuration.
    pub fn new(config: ServerConfig, ledger: Arc<dyn CreditLedger>) -> Self {
        let registry = Arc::new(TaskRegistry::new());
        let kie = Arc::new(KieApi::new(
            config.provider.api_url.clone(),
            config.provider.api_key.clone().unwrap_or_default(),
        ));
        let submitter = Arc::new(JobSubmitter::new(
            Arc::clone(&kie),
            Arc::clone(&registry),
            config.callback_url(),
        ));

        Self {
            config: Arc::new(config),
            ledger,
            registry,
            kie,
            submitter,
        }
    }
}
