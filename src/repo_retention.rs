//! Interactive repository retention.
//!
//! Every public repository is scored against the retention policy and ranked
//! lowest score first. After the operator confirms how many to remove, that
//! many are soft-deleted from the low end of the ranking.

use std::io::{BufRead, Write};

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::{error, info};

use crate::error::AppError;
use crate::harbor::HarborClient;
use crate::models::{DeletionSummary, RepositorySummary, ScoredRepository};
use crate::output;
use crate::policy::RetentionPolicy;
use crate::prompt;
use crate::ranking::RankingQueue;

/// Two queues fed from the same scored repositories. `report` is drained for
/// display, `candidates` is consumed by the deletion loop.
#[derive(Debug, Clone)]
pub struct RepoRanking {
    pub report: RankingQueue<ScoredRepository>,
    pub candidates: RankingQueue<ScoredRepository>,
}

pub fn rank_repositories(
    repositories: Vec<RepositorySummary>,
    policy: &RetentionPolicy,
    now: DateTime<Utc>,
) -> RepoRanking {
    let mut report = RankingQueue::ascending();
    let mut candidates = RankingQueue::ascending();

    for repository in repositories {
        let score = policy.score(&repository, now);
        let scored = ScoredRepository { repository, score };
        report.push(score, scored.clone());
        candidates.push(score, scored);
    }

    RepoRanking { report, candidates }
}

/// Fetch every public repository and rank it
pub async fn analyse<W: Write>(
    client: &HarborClient,
    policy: &RetentionPolicy,
    now: DateTime<Utc>,
    out: &mut W,
) -> Result<RepoRanking> {
    let stats = client.statistics().await?;
    output::print_public_repo_count(out, stats.public_repo_count)?;

    let repositories = if stats.public_repo_count == 0 {
        Vec::new()
    } else {
        client.top_repositories(stats.public_repo_count).await?
    };

    Ok(rank_repositories(repositories, policy, now))
}

/// Soft-delete up to `count` repositories from the low end of `candidates`
pub async fn erase(
    client: &HarborClient,
    candidates: &mut RankingQueue<ScoredRepository>,
    count: usize,
) -> DeletionSummary {
    let mut summary = DeletionSummary::default();
    for _ in 0..count {
        let Some(candidate) = candidates.pop() else {
            break;
        };
        let name = candidate.repository.name;
        match client.delete_repository(&name).await {
            Ok(()) => {
                info!("soft deleted repository {} (score {:.2})", name, candidate.score);
                summary.deleted.push(name);
            }
            Err(e) => {
                error!("{:#}", e);
                summary.failed.push(name);
            }
        }
    }
    summary
}

/// Analyse, report, confirm and delete. Everything the operator sees goes to `out`.
///
/// Returns `None` when the confirmed count was rejected; nothing is deleted then.
pub async fn run<R: BufRead, W: Write>(
    client: &HarborClient,
    policy: &RetentionPolicy,
    now: DateTime<Utc>,
    input: R,
    out: &mut W,
) -> Result<Option<DeletionSummary>> {
    let mut ranking = analyse(client, policy, now, out).await?;
    output::print_ranking(out, &ranking.report.drain_ordered())?;

    let count = match prompt::confirm_deletion_count(input, out) {
        Ok(count) => count,
        Err(AppError::CountOutOfRange(count)) => {
            output::print_count_rejected(out, count)?;
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    output::print_soft_deletion_start(out, count)?;
    let summary = erase(client, &mut ranking.candidates, count).await;
    output::print_deletion_summary(out, &summary)?;
    output::print_gc_hint(out)?;

    Ok(Some(summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::tests::{now, repo, sample_policy};
    use crate::session::Session;
    use serde_json::json;
    use std::io::Cursor;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> HarborClient {
        HarborClient::new(&server.uri(), false)
            .unwrap()
            .with_session(Session::new("sid"))
    }

    fn top_json() -> serde_json::Value {
        let repos = [
            repo(31, "prj2/photon", 5, 3, 200),
            repo(30, "sf3prj/hello-world", 0, 3, 210),
            repo(29, "prj5/hello-world", 4, 4, 205),
        ];
        json!(repos
            .iter()
            .map(|r| json!({
                "id": r.id,
                "name": r.name,
                "project_id": r.project_id,
                "description": "",
                "pull_count": r.pull_count,
                "star_count": 0,
                "tags_count": r.tags_count,
                "creation_time": r.creation_time.to_rfc3339(),
                "update_time": r.update_time.to_rfc3339()
            }))
            .collect::<Vec<_>>())
    }

    async fn mount_listing(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/api/statistics"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"public_repo_count": 3})))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/repositories/top"))
            .and(query_param("count", "3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(top_json()))
            .mount(server)
            .await;
    }

    async fn delete_paths(server: &MockServer) -> Vec<String> {
        server
            .received_requests()
            .await
            .unwrap()
            .into_iter()
            .filter(|r| r.method.as_str() == "DELETE")
            .map(|r| r.url.path().to_string())
            .collect()
    }

    #[test]
    fn test_report_is_ascending_with_insertion_ties() {
        let repos = vec![
            repo(31, "prj2/photon", 5, 3, 200),
            repo(30, "sf3prj/hello-world", 0, 3, 210),
            repo(29, "prj5/hello-world", 4, 4, 205),
        ];
        let mut ranking = rank_repositories(repos, &sample_policy(), now());

        let report = ranking.report.drain_ordered();
        let names: Vec<_> = report.iter().map(|s| s.repository.name.as_str()).collect();
        let scores: Vec<_> = report.iter().map(|s| format!("{:.2}", s.score)).collect();
        assert_eq!(names, vec!["sf3prj/hello-world", "prj2/photon", "prj5/hello-world"]);
        assert_eq!(scores, vec!["0.78", "0.83", "0.83"]);

        assert_eq!(ranking.candidates.len(), 3);
    }

    #[tokio::test]
    async fn test_confirmed_count_deletes_lowest_score() {
        let server = MockServer::start().await;
        mount_listing(&server).await;
        Mock::given(method("DELETE"))
            .and(path("/api/repositories/sf3prj/hello-world"))
            .and(header("Cookie", "beegosessionID=sid"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let mut out = Vec::new();
        let summary = run(&client(&server), &sample_policy(), now(), Cursor::new("1\ny\n"), &mut out)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(summary.deleted, vec!["sf3prj/hello-world"]);
        assert_eq!(delete_paths(&server).await, vec!["/api/repositories/sf3prj/hello-world"]);

        let out = String::from_utf8(out).unwrap();
        let report = out.find("sf3prj/hello-world").unwrap();
        let prompt = out.find("Number of repositories to delete").unwrap();
        let hint = out.find("garbage-collect --dry-run").unwrap();
        assert!(report < prompt && prompt < hint);
        assert!(out.contains("You entered: 1"));
        assert!(out.contains("docker-compose stop"));
        assert!(out.contains("docker-compose start"));
    }

    #[tokio::test]
    async fn test_out_of_range_count_deletes_nothing() {
        let server = MockServer::start().await;
        mount_listing(&server).await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut out = Vec::new();
        let result = run(&client(&server), &sample_policy(), now(), Cursor::new("51\ny\n"), &mut out)
            .await
            .unwrap();
        assert!(result.is_none());

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("Not allowed to proceed"));
        assert!(!out.contains("garbage-collect"));
    }

    #[tokio::test]
    async fn test_deletion_continues_past_failures_and_stops_when_empty() {
        let server = MockServer::start().await;
        mount_listing(&server).await;
        Mock::given(method("DELETE"))
            .and(path("/api/repositories/prj2/photon"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let mut out = Vec::new();
        let summary = run(&client(&server), &sample_policy(), now(), Cursor::new("10\ny\n"), &mut out)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(summary.deleted, vec!["sf3prj/hello-world", "prj5/hello-world"]);
        assert_eq!(summary.failed, vec!["prj2/photon"]);
        assert_eq!(
            delete_paths(&server).await,
            vec![
                "/api/repositories/sf3prj/hello-world",
                "/api/repositories/prj2/photon",
                "/api/repositories/prj5/hello-world"
            ]
        );
    }

    #[tokio::test]
    async fn test_statistics_failure_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/statistics"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/repositories/top"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let mut out = Vec::new();
        let result = run(&client(&server), &sample_policy(), now(), Cursor::new("1\ny\n"), &mut out).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_top_repositories_failure_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/statistics"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"public_repo_count": 3})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/repositories/top"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut out = Vec::new();
        let err = run(&client(&server), &sample_policy(), now(), Cursor::new("1\ny\n"), &mut out)
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to fetch top repositories"));

        let out = String::from_utf8(out).unwrap();
        assert!(!out.contains("Number of repositories to delete"));
    }

    #[tokio::test]
    async fn test_empty_registry_skips_top_and_reports_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/statistics"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"public_repo_count": 0})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/repositories/top"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let mut out = Vec::new();
        let mut ranking = analyse(&client(&server), &sample_policy(), now(), &mut out)
            .await
            .unwrap();
        assert!(ranking.report.drain_ordered().is_empty());
        assert!(String::from_utf8(out).unwrap().contains("Current public repository count"));
    }
}
