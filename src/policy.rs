//! Retention policy model and repository scoring.
//!
//! A policy weighs three metrics of a repository: days since its last update,
//! its pull count and its tag count. Each metric maps onto a weight through an
//! ordered list of half-open `[low, high)` buckets, and the score is the
//! weighted sum `base_update * uf + base_pull * pf + base_tags * tf`.
//! Lower scores mark repositories that are cheaper to lose.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::load_yaml;
use crate::error::AppError;
use crate::models::RepositorySummary;

/// Weight used when the update age falls outside every bucket: the term drops out.
pub const UPDATE_TIME_FALLBACK: f64 = 0.0;
/// Weight used when a pull or tag count falls outside every bucket: neutral.
pub const COUNT_FALLBACK: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    pub update_time: Factor,
    pub pull_count: Factor,
    pub tags_count: Factor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Factor {
    pub base: f64,
    #[serde(default)]
    pub factors: Vec<Bucket>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub weight: f64,
    pub range: BucketRange,
}

/// Half-open integer range `[low, high)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketRange {
    pub low: i64,
    pub high: i64,
}

impl BucketRange {
    pub fn contains(&self, value: i64) -> bool {
        self.low <= value && value < self.high
    }
}

impl Factor {
    /// Weight of the first bucket containing `value`, in file order
    pub fn weight_for(&self, value: i64) -> Option<f64> {
        self.factors
            .iter()
            .find(|bucket| bucket.range.contains(value))
            .map(|bucket| bucket.weight)
    }
}

/// Every intermediate value of a score, kept for the debug trace
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBreakdown {
    pub age_days: f64,
    pub update_weight: f64,
    pub pull_weight: f64,
    pub tags_weight: f64,
    pub score: f64,
}

impl RetentionPolicy {
    pub fn load(path: &Path) -> Result<Self, AppError> {
        load_yaml(path)
    }

    pub fn score(&self, repo: &RepositorySummary, now: DateTime<Utc>) -> f64 {
        self.breakdown(repo, now).score
    }

    pub fn breakdown(&self, repo: &RepositorySummary, now: DateTime<Utc>) -> ScoreBreakdown {
        let age_days = age_in_days(repo.update_time, now);

        let update_weight = self
            .update_time
            .weight_for(age_days.trunc() as i64)
            .unwrap_or_else(|| {
                debug!("out of range: day = {:.2}, uf is {:.1}", age_days, UPDATE_TIME_FALLBACK);
                UPDATE_TIME_FALLBACK
            });
        let pull_weight = self.pull_count.weight_for(repo.pull_count).unwrap_or_else(|| {
            debug!("out of range: pull_count = {}, pf is {:.1}", repo.pull_count, COUNT_FALLBACK);
            COUNT_FALLBACK
        });
        let tags_weight = self.tags_count.weight_for(repo.tags_count).unwrap_or_else(|| {
            debug!("out of range: tags_count = {}, tf is {:.1}", repo.tags_count, COUNT_FALLBACK);
            COUNT_FALLBACK
        });

        let score = self.update_time.base * update_weight
            + self.pull_count.base * pull_weight
            + self.tags_count.base * tags_weight;
        let breakdown = ScoreBreakdown {
            age_days,
            update_weight,
            pull_weight,
            tags_weight,
            score,
        };

        debug!(
            "score = {:.2} * {:.2} + {:.2} * {:.2} + {:.2} * {:.2} = {:.2}  repo_id: {} day: {:.2}",
            self.update_time.base,
            breakdown.update_weight,
            self.pull_count.base,
            breakdown.pull_weight,
            self.tags_count.base,
            breakdown.tags_weight,
            breakdown.score,
            repo.id,
            breakdown.age_days
        );

        breakdown
    }
}

/// Fractional days between `then` and `now`
pub fn age_in_days(then: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let hours = (now - then).num_milliseconds() as f64 / 3_600_000.0;
    hours / 24.0
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::io::Write;

    pub(crate) fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    pub(crate) fn repo(id: i64, name: &str, pulls: i64, tags: i64, age_days: i64) -> RepositorySummary {
        let updated = now() - Duration::days(age_days);
        RepositorySummary {
            id,
            name: name.to_string(),
            project_id: 1,
            description: None,
            pull_count: pulls,
            star_count: 0,
            tags_count: tags,
            creation_time: updated,
            update_time: updated,
        }
    }

    fn factor(base: f64, buckets: &[(f64, i64, i64)]) -> Factor {
        Factor {
            base,
            factors: buckets
                .iter()
                .map(|&(weight, low, high)| Bucket {
                    weight,
                    range: BucketRange { low, high },
                })
                .collect(),
        }
    }

    /// Gives 0.78 to an unpulled repository and 0.83 to a pulled one.
    pub(crate) fn sample_policy() -> RetentionPolicy {
        RetentionPolicy {
            update_time: factor(0.5, &[(1.0, 0, 36500)]),
            pull_count: factor(0.1, &[(0.8, 0, 1), (1.3, 1, 1000)]),
            tags_count: factor(0.2, &[(1.0, 0, 100)]),
        }
    }

    #[test]
    fn test_first_matching_bucket_wins() {
        let f = factor(1.0, &[(0.3, 0, 10), (0.9, 5, 15)]);
        assert_eq!(f.weight_for(7), Some(0.3));
        assert_eq!(f.weight_for(12), Some(0.9));
        assert_eq!(f.weight_for(15), None);
    }

    #[test]
    fn test_overlapping_buckets_in_score() {
        let policy = RetentionPolicy {
            update_time: factor(0.0, &[]),
            pull_count: factor(1.0, &[(0.25, 0, 10), (0.75, 5, 15)]),
            tags_count: factor(0.0, &[]),
        };
        let b = policy.breakdown(&repo(1, "p/r", 7, 1, 0), now());
        assert_eq!(b.pull_weight, 0.25);
        assert_eq!(b.score, 0.25);
    }

    #[test]
    fn test_update_age_out_of_range_drops_term() {
        let policy = RetentionPolicy {
            update_time: factor(0.5, &[(1.0, 0, 30)]),
            pull_count: factor(0.1, &[(2.0, 0, 100)]),
            tags_count: factor(0.2, &[(3.0, 0, 100)]),
        };
        let b = policy.breakdown(&repo(1, "p/r", 1, 1, 400), now());
        assert_eq!(b.update_weight, 0.0);
        assert!((b.score - (0.1 * 2.0 + 0.2 * 3.0)).abs() < 1e-9);
    }

    #[test]
    fn test_counts_out_of_range_are_neutral() {
        let policy = RetentionPolicy {
            update_time: factor(0.5, &[(1.0, 0, 30)]),
            pull_count: factor(0.1, &[(2.0, 0, 100)]),
            tags_count: factor(0.2, &[(3.0, 0, 100)]),
        };
        let b = policy.breakdown(&repo(1, "p/r", 5000, 500, 3), now());
        assert_eq!(b.pull_weight, 1.0);
        assert_eq!(b.tags_weight, 1.0);
        assert!((b.score - (0.5 + 0.1 + 0.2)).abs() < 1e-9);
    }

    #[test]
    fn test_update_age_is_truncated_to_whole_days() {
        let policy = RetentionPolicy {
            update_time: factor(1.0, &[(0.2, 0, 10), (0.6, 10, 20)]),
            pull_count: factor(0.0, &[]),
            tags_count: factor(0.0, &[]),
        };
        let mut r = repo(1, "p/r", 0, 0, 0);
        r.update_time = now() - Duration::hours(10 * 24 - 1);
        let b = policy.breakdown(&r, now());
        assert!(b.age_days > 9.9 && b.age_days < 10.0);
        assert_eq!(b.update_weight, 0.2);
    }

    #[test]
    fn test_score_is_deterministic_for_fixed_now() {
        let policy = sample_policy();
        let r = repo(4, "prj3/hello-world", 4, 3, 120);
        assert_eq!(policy.score(&r, now()), policy.score(&r, now()));
    }

    #[test]
    fn test_sample_policy_scores() {
        let policy = sample_policy();
        let unpulled = policy.score(&repo(30, "sf3prj/hello-world", 0, 3, 200), now());
        let pulled = policy.score(&repo(31, "prj2/photon", 5, 3, 200), now());
        assert!((unpulled - 0.78).abs() < 1e-9);
        assert!((pulled - 0.83).abs() < 1e-9);
    }

    #[test]
    fn test_load_policy_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
update_time:
  base: 0.5
  factors:
    - weight: 0.1
      range: {{ low: 0, high: 30 }}
    - weight: 0.9
      range: {{ low: 30, high: 3650 }}
pull_count:
  base: 0.3
  factors:
    - weight: 0.5
      range: {{ low: 0, high: 10 }}
tags_count:
  base: 0.2
  factors: []
"#
        )
        .unwrap();

        let policy = RetentionPolicy::load(file.path()).unwrap();
        assert_eq!(policy.update_time.factors.len(), 2);
        assert_eq!(policy.update_time.factors[1].range, BucketRange { low: 30, high: 3650 });
        assert_eq!(policy.pull_count.base, 0.3);
        assert!(policy.tags_count.factors.is_empty());
    }

    #[test]
    fn test_bundled_policy_prefers_fresh_repositories() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("rp.yaml");
        let policy = RetentionPolicy::load(&path).unwrap();
        let fresh = policy.score(&repo(1, "p/fresh", 10, 5, 2), now());
        let stale = policy.score(&repo(2, "p/stale", 10, 5, 400), now());
        assert!(stale < fresh);
    }

    #[test]
    fn test_load_policy_missing_factor_table_fails() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "update_time:\n  base: 0.5\n  factors: []").unwrap();
        let err = RetentionPolicy::load(file.path()).unwrap_err();
        assert!(matches!(err, AppError::ConfigParse { .. }));
    }
}
