//! Automated tag pruning.
//!
//! For each repository, tags whose whole-day age exceeds `day` become
//! candidates. Candidates are ranked by creation time, newest on top, and
//! popped one by one until only `max` of them remain; every popped tag is
//! deleted. Tags younger than `day` are never touched.

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::{debug, error, info};

use crate::harbor::HarborClient;
use crate::models::{DeletionSummary, SearchRepository, TagSummary};
use crate::output;
use crate::policy::age_in_days;
use crate::ranking::RankingQueue;

#[derive(Debug, Clone)]
pub struct TagRetentionArgs {
    /// Tags created within this many days are left alone
    pub day: i64,
    /// Old tags kept per repository
    pub max: usize,
    /// Restrict the run to the repository with exactly this name
    pub repo_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TagAge {
    pub tag: TagSummary,
    pub age_days: f64,
}

/// Decision for one repository
#[derive(Debug, Clone, PartialEq)]
pub struct TagPrunePlan {
    pub repository: String,
    /// Too young to be considered
    pub young: Vec<TagAge>,
    /// Old tags that stay, at most `max`
    pub kept: Vec<TagAge>,
    /// Old tags to delete, in deletion order
    pub to_delete: Vec<TagAge>,
}

impl TagPrunePlan {
    pub fn old_count(&self) -> usize {
        self.kept.len() + self.to_delete.len()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagRetentionSummary {
    pub repositories_scanned: usize,
    /// Entries are `repo:tag`
    pub deletions: DeletionSummary,
}

pub fn plan_tag_pruning(
    repository: &str,
    tags: Vec<TagSummary>,
    now: DateTime<Utc>,
    day: i64,
    max: usize,
) -> TagPrunePlan {
    let mut young = Vec::new();
    let mut queue = RankingQueue::descending();

    for tag in tags {
        let age_days = age_in_days(tag.created, now);
        if age_days.trunc() as i64 > day {
            debug!("[PUSH] {} created: {} days past: {:.2}", tag.name, tag.created, age_days);
            queue.push(tag.created.timestamp() as f64, TagAge { tag, age_days });
        } else {
            debug!("[noPUSH] {} created: {} days past: {:.2}", tag.name, tag.created, age_days);
            young.push(TagAge { tag, age_days });
        }
    }

    let mut to_delete = Vec::new();
    while queue.len() > max {
        match queue.pop() {
            Some(candidate) => {
                debug!("[POP] {} <==> {}", candidate.tag.name, candidate.tag.created.timestamp());
                to_delete.push(candidate);
            }
            None => break,
        }
    }

    TagPrunePlan {
        repository: repository.to_string(),
        young,
        kept: queue.drain_ordered(),
        to_delete,
    }
}

/// Repositories to process: everything search returns, or the exact name match
pub async fn select_repositories(
    client: &HarborClient,
    repo_name: Option<&str>,
) -> Result<Vec<SearchRepository>> {
    let found = client.search(repo_name.unwrap_or_default()).await?;
    let repositories = match repo_name {
        Some(name) => found
            .repository
            .into_iter()
            .filter(|repo| repo.repository_name == name)
            .collect(),
        None => found.repository,
    };
    Ok(repositories)
}

/// Delete the planned tags in order. Failures are logged and the loop goes on.
pub async fn erase_tags(client: &HarborClient, plan: &TagPrunePlan) -> DeletionSummary {
    let mut summary = DeletionSummary::default();
    for candidate in &plan.to_delete {
        let label = format!("{}:{}", plan.repository, candidate.tag.name);
        match client.delete_tag(&plan.repository, &candidate.tag.name).await {
            Ok(()) => {
                info!("deleted tag {}", label);
                summary.deleted.push(label);
            }
            Err(e) => {
                error!("{:#}", e);
                summary.failed.push(label);
            }
        }
    }
    summary
}

/// Run tag pruning across the selected repositories.
///
/// A failed listing aborts the whole run; failed deletes do not.
pub async fn run(
    client: &HarborClient,
    args: &TagRetentionArgs,
    now: DateTime<Utc>,
) -> Result<TagRetentionSummary> {
    output::print_tag_run_header(args);

    let repositories = select_repositories(client, args.repo_name.as_deref()).await?;
    if repositories.is_empty() {
        output::print_no_repositories(args.repo_name.as_deref());
    }

    let mut summary = TagRetentionSummary::default();
    for repo in &repositories {
        output::print_repo_header(&repo.repository_name, repo.tags_count);

        let tags = client.list_tags(&repo.repository_name).await?;
        let plan = plan_tag_pruning(&repo.repository_name, tags, now, args.day, args.max);
        output::print_tag_plan(&plan, args);

        let deletions = erase_tags(client, &plan).await;
        summary.repositories_scanned += 1;
        summary.deletions.deleted.extend(deletions.deleted);
        summary.deletions.failed.extend(deletions.failed);
    }

    output::print_tag_summary(&summary);
    Ok(summary)
}
