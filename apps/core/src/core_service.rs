use std::sync::Arc;

use crate::action_executor::{problem_url, LaunchError, Navigator, SystemNavigator};
use crate::builtin_commands::{register_builtin_commands, BuiltinContext};
use crate::catalog_store::{CatalogStore, StoreError};
use crate::catalog_sync::{CatalogSyncService, SyncError, SyncStatus};
use crate::command_registry::{
    classify_input, is_help_request, CommandError, CommandRegistry, InputMode,
    SlashCommandSuggestion,
};
use crate::config::{validate, Config, ConfigError};
use crate::contract::{
    CoreRequest, CoreResponse, ExecuteResponse, OpenResponse, SuggestionsResponse, SyncResponse,
    UrlResponse,
};
use crate::model::{ProblemRecord, SearchResult};
use crate::provider::{CatalogProvider, HttpCatalogProvider, ProviderError};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),
    #[error("launch error: {0}")]
    Launch(#[from] LaunchError),
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error("item not found: {0}")]
    ItemNotFound(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl From<SyncError> for ServiceError {
    fn from(value: SyncError) -> Self {
        match value {
            SyncError::Provider(error) => Self::Provider(error),
            SyncError::Store(error) => Self::Store(error),
        }
    }
}

#[derive(Debug)]
pub enum InputOutcome {
    Suggestions(Vec<SlashCommandSuggestion>),
    Executed(String),
    Results(Vec<SearchResult>),
}

pub struct CoreService {
    config: Config,
    store: Arc<CatalogStore>,
    sync: Arc<CatalogSyncService>,
    commands: Arc<CommandRegistry>,
    navigator: Arc<dyn Navigator>,
}

impl CoreService {
    pub fn new(config: Config) -> Result<Self, ServiceError> {
        let provider = HttpCatalogProvider::new(&config.provider_endpoint)?;
        let store = CatalogStore::from_config(&config);
        Self::with_parts(config, store, Arc::new(provider), Arc::new(SystemNavigator))
    }

    pub fn with_parts(
        config: Config,
        store: CatalogStore,
        provider: Arc<dyn CatalogProvider>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ServiceError> {
        validate(&config)?;
        let store = Arc::new(store);
        let sync = Arc::new(CatalogSyncService::new(
            Arc::clone(&store),
            provider,
            config.freshness_window(),
        ));
        let commands = Arc::new(CommandRegistry::new());
        register_builtin_commands(
            &commands,
            &BuiltinContext {
                sync: Arc::clone(&sync),
                navigator: Arc::clone(&navigator),
                problem_url_base: config.problem_url_base.clone(),
                daily_problem_url: config.daily_problem_url.clone(),
            },
        );

        Ok(Self {
            config,
            store,
            sync,
            commands,
            navigator,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Arc<CatalogStore> {
        &self.store
    }

    pub fn sync_service(&self) -> &Arc<CatalogSyncService> {
        &self.sync
    }

    pub fn commands(&self) -> &Arc<CommandRegistry> {
        &self.commands
    }

    /// `limit` 0 means the configured maximum; larger limits are clamped to it.
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, ServiceError> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        let max = self.config.max_results as usize;
        let effective_limit = if limit == 0 { max } else { limit.min(max) };
        let all = self.store.get_all()?;
        Ok(crate::search::search(&all, query, effective_limit))
    }

    pub fn all_problems(&self) -> Result<Vec<ProblemRecord>, ServiceError> {
        Ok(self.store.get_all()?)
    }

    pub async fn sync(&self, force: bool) -> Result<bool, ServiceError> {
        let report = |current: usize, total: usize| {
            log::info!("sync progress: {current}/{total} problems");
        };
        if force {
            self.sync.refresh(Some(&report)).await?;
            return Ok(true);
        }
        Ok(self.sync.sync(Some(&report)).await?)
    }

    pub fn sync_status(&self) -> Result<SyncStatus, ServiceError> {
        Ok(self.sync.status()?)
    }

    pub fn problem_url(&self, slug: &str) -> String {
        problem_url(&self.config.problem_url_base, slug)
    }

    pub fn open_problem(&self, slug: &str) -> Result<String, ServiceError> {
        let slug = slug.trim();
        if slug.is_empty() {
            return Err(ServiceError::InvalidRequest("slug is required".into()));
        }
        let problem = self
            .store
            .get_by_slug(slug)?
            .ok_or_else(|| ServiceError::ItemNotFound(slug.to_string()))?;
        let url = self.problem_url(&problem.slug);
        self.navigator.open(&url)?;
        Ok(url)
    }

    pub fn suggest_commands(&self, input: &str) -> Vec<SlashCommandSuggestion> {
        self.commands.get_suggestions(input)
    }

    pub async fn execute_command(&self, input: &str) -> Result<bool, ServiceError> {
        Ok(self.commands.execute_command(input).await?)
    }

    /// Routes one line of input: `/`-prefixed text runs an exact command or
    /// returns suggestions (always suggestions in help mode); anything else
    /// is a catalog search.
    pub async fn handle_input(&self, input: &str) -> Result<InputOutcome, ServiceError> {
        match classify_input(input) {
            InputMode::Command => {
                if is_help_request(input) {
                    return Ok(InputOutcome::Suggestions(self.suggest_commands(input)));
                }
                if self.commands.execute_command(input).await? {
                    return Ok(InputOutcome::Executed(input.to_string()));
                }
                Ok(InputOutcome::Suggestions(self.suggest_commands(input)))
            }
            InputMode::Search => Ok(InputOutcome::Results(self.search(input, 0)?)),
        }
    }

    pub async fn handle_command(&self, request: CoreRequest) -> Result<CoreResponse, ServiceError> {
        match request {
            CoreRequest::SearchProblems { query, limit } => Ok(CoreResponse::SearchResults(
                self.search(&query, limit.unwrap_or(0))?,
            )),
            CoreRequest::GetAllProblems => Ok(CoreResponse::Problems(self.all_problems()?)),
            CoreRequest::SyncProblems { force } => {
                let synced = self.sync(force).await?;
                Ok(CoreResponse::Sync(SyncResponse {
                    synced,
                    total_count: self.store.count()?,
                }))
            }
            CoreRequest::GetProblemUrl { slug } => {
                if slug.trim().is_empty() {
                    return Err(ServiceError::InvalidRequest("slug is required".into()));
                }
                Ok(CoreResponse::Url(UrlResponse {
                    url: self.problem_url(slug.trim()),
                }))
            }
            CoreRequest::OpenProblem { slug } => {
                let url = self.open_problem(&slug)?;
                Ok(CoreResponse::Open(OpenResponse { opened: true, url }))
            }
            CoreRequest::CheckSyncStatus => {
                Ok(CoreResponse::SyncStatus(self.sync_status()?.into()))
            }
            CoreRequest::SuggestCommands { input } => {
                let help_mode = is_help_request(&input);
                Ok(CoreResponse::Suggestions(SuggestionsResponse {
                    help_mode,
                    suggestions: self
                        .suggest_commands(&input)
                        .into_iter()
                        .map(Into::into)
                        .collect(),
                }))
            }
            CoreRequest::ExecuteCommand { input } => Ok(CoreResponse::Execute(ExecuteResponse {
                executed: self.execute_command(&input).await?,
            })),
        }
    }
}
