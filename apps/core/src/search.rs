use crate::model::{MatchType, ProblemRecord, SearchResult};

pub const DEFAULT_LIMIT: usize = 50;

/// Results keep the order of `problems`; there is no relevance scoring.
pub fn search(problems: &[ProblemRecord], query: &str, limit: usize) -> Vec<SearchResult> {
    if limit == 0 || query.trim().is_empty() {
        return Vec::new();
    }

    let needle = query.to_lowercase();
    problems
        .iter()
        .filter(|problem| matches_problem(problem, query, &needle))
        .take(limit)
        .map(|problem| SearchResult {
            problem: problem.clone(),
            match_type: MatchType::classify(problem, query),
        })
        .collect()
}

fn matches_problem(problem: &ProblemRecord, query: &str, needle: &str) -> bool {
    problem.id.to_string().contains(query)
        || problem.title.to_lowercase().contains(needle)
        || problem.slug.to_lowercase().contains(needle)
}
