use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog_sync::SyncStatus;
use crate::command_registry::SlashCommandSuggestion;
use crate::model::{ProblemRecord, SearchResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CoreRequest {
    SearchProblems {
        query: String,
        #[serde(default)]
        limit: Option<usize>,
    },
    GetAllProblems,
    SyncProblems {
        #[serde(default)]
        force: bool,
    },
    GetProblemUrl {
        slug: String,
    },
    OpenProblem {
        slug: String,
    },
    CheckSyncStatus,
    SuggestCommands {
        input: String,
    },
    ExecuteCommand {
        input: String,
    },
}

impl CoreRequest {
    pub const KNOWN_TYPES: [&'static str; 8] = [
        "SEARCH_PROBLEMS",
        "GET_ALL_PROBLEMS",
        "SYNC_PROBLEMS",
        "GET_PROBLEM_URL",
        "OPEN_PROBLEM",
        "CHECK_SYNC_STATUS",
        "SUGGEST_COMMANDS",
        "EXECUTE_COMMAND",
    ];

    pub fn is_known_type(kind: &str) -> bool {
        Self::KNOWN_TYPES.contains(&kind)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    pub synced: bool,
    pub total_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UrlResponse {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OpenResponse {
    pub opened: bool,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatusResponse {
    pub is_stale: bool,
    pub last_sync: Option<DateTime<Utc>>,
    pub total_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionDto {
    pub id: String,
    pub matched_alias: String,
    pub aliases: Vec<String>,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionsResponse {
    pub help_mode: bool,
    pub suggestions: Vec<SuggestionDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExecuteResponse {
    pub executed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum CoreResponse {
    SearchResults(Vec<SearchResult>),
    Problems(Vec<ProblemRecord>),
    Sync(SyncResponse),
    SyncStatus(SyncStatusResponse),
    Open(OpenResponse),
    Url(UrlResponse),
    Suggestions(SuggestionsResponse),
    Execute(ExecuteResponse),
}

impl From<SyncStatus> for SyncStatusResponse {
    fn from(value: SyncStatus) -> Self {
        Self {
            is_stale: value.is_stale,
            last_sync: value.last_sync,
            total_count: value.total_count,
        }
    }
}

impl From<SlashCommandSuggestion> for SuggestionDto {
    fn from(value: SlashCommandSuggestion) -> Self {
        Self {
            id: value.command.id,
            matched_alias: value.matched_alias,
            aliases: value.command.aliases,
            description: value.command.description,
        }
    }
}
