use chrono::{DateTime, Utc};
use serde::Deserialize;

/// GET /api/statistics response
#[allow(dead_code)]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Statistics {
    pub private_project_count: u64,
    pub private_repo_count: u64,
    pub public_project_count: u64,
    pub public_repo_count: u64,
    pub total_project_count: u64,
    pub total_repo_count: u64,
}

/// One row of GET /api/repositories/top
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RepositorySummary {
    pub id: i64,
    /// Fully-qualified `project/repo` name
    pub name: String,
    pub project_id: i64,
    #[serde(default)]
    pub description: Option<String>,
    pub pull_count: i64,
    #[serde(default)]
    pub star_count: i64,
    pub tags_count: i64,
    pub creation_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

/// GET /api/search response. Projects are not inspected.
#[allow(dead_code)]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub repository: Vec<SearchRepository>,
    #[serde(default)]
    pub project: Vec<serde_json::Value>,
}

#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchRepository {
    #[serde(default)]
    pub project_id: i64,
    #[serde(default)]
    pub project_name: String,
    #[serde(default)]
    pub project_public: i64,
    #[serde(default)]
    pub pull_count: i64,
    pub repository_name: String,
    #[serde(default)]
    pub tags_count: i64,
}

/// One row of GET /api/repositories/{repo}/tags
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TagSummary {
    pub name: String,
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub digest: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
}

/// A repository paired with its retention score. Lower scores are deleted first.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRepository {
    pub repository: RepositorySummary,
    pub score: f64,
}

/// Result of a pop-and-delete loop
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeletionSummary {
    pub deleted: Vec<String>,
    pub failed: Vec<String>,
}
