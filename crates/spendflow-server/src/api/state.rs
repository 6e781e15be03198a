use spendflow_ai::llm::LlmClient;
use spendflow_storage::Storage;
use std::sync::Arc;

use crate::config::ServerConfig;

/// Application context shared across all API handlers.
///
/// The storage handle is constructed once in `main` and owned here for the
/// whole process lifetime; handlers receive it through `State` instead of
/// reading a process global.
pub struct AppContext {
    pub storage: Arc<Storage>,
    pub llm: Arc<dyn LlmClient>,
    pub config: ServerConfig,
}

pub type AppState = Arc<AppContext>;
