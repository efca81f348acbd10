use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn from_level(level: i64) -> Self {
        match level {
            1 => Self::Easy,
            2 => Self::Medium,
            3 => Self::Hard,
            _ => Self::Medium,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
        }
    }
}

impl Display for Difficulty {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown value: {0}")]
pub struct UnknownVariant(pub String);

impl FromStr for Difficulty {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Easy" => Ok(Self::Easy),
            "Medium" => Ok(Self::Medium),
            "Hard" => Ok(Self::Hard),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolveStatus {
    Ac,
    Notac,
}

impl SolveStatus {
    /// Any non-empty status other than `ac` counts as attempted but unsolved.
    pub fn from_provider(raw: Option<&str>) -> Option<Self> {
        match raw.map(str::trim) {
            None | Some("") => None,
            Some("ac") => Some(Self::Ac),
            Some(_) => Some(Self::Notac),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ac => "ac",
            Self::Notac => "notac",
        }
    }
}

impl FromStr for SolveStatus {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "ac" => Ok(Self::Ac),
            "notac" => Ok(Self::Notac),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemRecord {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub difficulty: Difficulty,
    pub is_paid_only: bool,
    pub ac_rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SolveStatus>,
}

impl ProblemRecord {
    pub fn new(id: i64, title: &str, slug: &str, difficulty: Difficulty) -> Self {
        Self {
            id,
            title: title.to_string(),
            slug: slug.to_string(),
            difficulty,
            is_paid_only: false,
            ac_rate: 0.0,
            status: None,
        }
    }

    pub fn with_ac_rate(mut self, ac_rate: f64) -> Self {
        self.ac_rate = ac_rate;
        self
    }

    pub fn paid_only(mut self, is_paid_only: bool) -> Self {
        self.is_paid_only = is_paid_only;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncMetadata {
    pub last_fetched_at: DateTime<Utc>,
    pub total_count: usize,
    pub schema_version: String,
}

impl SyncMetadata {
    pub fn new(last_fetched_at: DateTime<Utc>, total_count: usize) -> Self {
        Self {
            last_fetched_at,
            total_count,
            schema_version: SCHEMA_VERSION.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Id,
    Title,
    Slug,
}

impl MatchType {
    /// Exact id string wins, then a slug containing the query, then title.
    pub fn classify(record: &ProblemRecord, query: &str) -> Self {
        if record.id.to_string() == query {
            return Self::Id;
        }
        if record.slug.to_lowercase().contains(&query.to_lowercase()) {
            return Self::Slug;
        }
        Self::Title
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    #[serde(flatten)]
    pub problem: ProblemRecord,
    pub match_type: MatchType,
}

#[cfg(test)]
mod tests {
    use super::{Difficulty, MatchType, ProblemRecord, SolveStatus};

    #[test]
    fn unknown_difficulty_level_maps_to_medium() {
        assert_eq!(Difficulty::from_level(1), Difficulty::Easy);
        assert_eq!(Difficulty::from_level(3), Difficulty::Hard);
        assert_eq!(Difficulty::from_level(0), Difficulty::Medium);
        assert_eq!(Difficulty::from_level(7), Difficulty::Medium);
    }

    #[test]
    fn provider_status_maps_to_solve_status() {
        assert_eq!(SolveStatus::from_provider(None), None);
        assert_eq!(SolveStatus::from_provider(Some("ac")), Some(SolveStatus::Ac));
        assert_eq!(
            SolveStatus::from_provider(Some("notac")),
            Some(SolveStatus::Notac)
        );
    }

    #[test]
    fn match_type_prefers_exact_id_then_slug() {
        let record = ProblemRecord::new(1, "Two Sum", "two-sum", Difficulty::Easy);
        assert_eq!(MatchType::classify(&record, "1"), MatchType::Id);
        assert_eq!(MatchType::classify(&record, "TWO"), MatchType::Slug);
        assert_eq!(MatchType::classify(&record, "sum"), MatchType::Slug);
        assert_eq!(MatchType::classify(&record, "o s"), MatchType::Title);
    }
}
