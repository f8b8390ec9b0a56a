//! Contest models: problems, submissions, leaderboard and stats.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::contest_submission;

/// Maximum number of leaderboard rows returned.
pub const LEADERBOARD_LIMIT: usize = 100;

/// Contest difficulty levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Expert,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Self::Beginner, Self::Intermediate, Self::Expert];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "Beginner",
            Self::Intermediate => "Intermediate",
            Self::Expert => "Expert",
        }
    }

    /// Parse an exact difficulty name. Anything else is `None`.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.as_str() == s)
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A test case of a generated problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    #[serde(default)]
    pub input: String,
    pub expected_output: String,
    #[serde(default)]
    pub is_hidden: bool,
}

/// A generated coding problem.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
    /// Starter code keyed by language name
    #[serde(default)]
    pub starter_code: BTreeMap<String, String>,
}

/// Problem generation request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct GenerateProblemRequest {
    pub difficulty: Option<String>,
    pub topic: Option<String>,
}

/// Problem generation response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GenerateProblemResponse {
    pub success: bool,
    pub problem: Problem,
}

/// Submission request: the problem snapshot, the candidate code and the
/// test cases to evaluate it against.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub problem_title: Option<String>,
    pub problem_description: Option<String>,
    pub difficulty: Option<String>,
    pub topic: Option<String>,
    pub language: Option<String>,
    pub code: Option<String>,
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
}

/// Outcome of one test case.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TestCaseResult {
    /// Position of the case in the submitted list
    pub index: usize,
    pub passed: bool,
    pub hidden: bool,
    pub message: String,
}

/// Persisted submission record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: Uuid,
    pub problem_title: String,
    pub problem_description: Option<String>,
    pub difficulty: Option<String>,
    pub topic: Option<String>,
    pub language: String,
    pub code: String,
    pub solved: bool,
    pub attempts: i32,
    pub last_attempted_at: DateTime<Utc>,
    pub solved_at: Option<DateTime<Utc>>,
    pub test_cases: Vec<TestCase>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<contest_submission::Model> for Submission {
    fn from(m: contest_submission::Model) -> Self {
        let test_cases = serde_json::from_value(m.test_cases).unwrap_or_else(|e| {
            tracing::warn!("Stored test cases for submission {} are unreadable: {}", m.id, e);
            Vec::new()
        });
        Self {
            id: m.id,
            problem_title: m.problem_title,
            problem_description: m.problem_description,
            difficulty: m.difficulty,
            topic: m.topic,
            language: m.language,
            code: m.code,
            solved: m.solved,
            attempts: m.attempts,
            last_attempted_at: m.last_attempted_at,
            solved_at: m.solved_at,
            test_cases,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Response of the submit endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmitResponse {
    pub success: bool,
    pub solved: bool,
    pub results: Vec<TestCaseResult>,
    pub submission: Submission,
}

/// List of the caller's submissions.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmissionsResponse {
    pub success: bool,
    pub submissions: Vec<Submission>,
}

/// One submission looked up by title; `null` when never attempted.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmissionResponse {
    pub success: bool,
    pub submission: Option<Submission>,
}

/// Leaderboard query parameters.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LeaderboardQuery {
    pub difficulty: Option<String>,
}

/// Per-user aggregate over contest submissions.
#[derive(Debug, Clone, PartialEq, FromQueryResult)]
pub struct UserTally {
    pub user_id: Uuid,
    pub total_attempted: i64,
    pub total_solved: i64,
    pub last_solved: Option<DateTime<Utc>>,
}

impl UserTally {
    pub fn success_rate(&self) -> f64 {
        if self.total_attempted == 0 {
            return 0.0;
        }
        self.total_solved as f64 / self.total_attempted as f64 * 100.0
    }
}

/// Rank users for the leaderboard.
///
/// Users without a solved problem are dropped. The rest are ordered by
/// solved count, then success rate, then most recent solve (all descending)
/// and cut to `limit`.
pub fn rank_leaderboard(tallies: Vec<UserTally>, limit: usize) -> Vec<UserTally> {
    let mut ranked: Vec<UserTally> = tallies
        .into_iter()
        .filter(|t| t.total_solved > 0)
        .collect();

    ranked.sort_by(|a, b| {
        b.total_solved
            .cmp(&a.total_solved)
            .then_with(|| b.success_rate().total_cmp(&a.success_rate()))
            .then_with(|| b.last_solved.cmp(&a.last_solved))
    });
    ranked.truncate(limit);
    ranked
}

/// Leaderboard row.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub user_id: Uuid,
    pub username: String,
    pub total_attempted: i64,
    pub total_solved: i64,
    /// Percentage of attempted problems that were solved
    pub success_rate: f64,
    pub last_solved: Option<DateTime<Utc>>,
}

impl LeaderboardEntry {
    pub fn new(tally: UserTally, username: String) -> Self {
        Self {
            success_rate: tally.success_rate(),
            user_id: tally.user_id,
            username,
            total_attempted: tally.total_attempted,
            total_solved: tally.total_solved,
            last_solved: tally.last_solved,
        }
    }
}

/// Leaderboard response. `difficulty` is "All" when unfiltered.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LeaderboardResponse {
    pub success: bool,
    pub leaderboard: Vec<LeaderboardEntry>,
    pub difficulty: String,
}

/// Attempted/solved counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DifficultyStats {
    pub attempted: u64,
    pub solved: u64,
}

/// Counters per known difficulty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct ByDifficulty {
    pub beginner: DifficultyStats,
    pub intermediate: DifficultyStats,
    pub expert: DifficultyStats,
}

impl ByDifficulty {
    fn slot(&mut self, difficulty: Difficulty) -> &mut DifficultyStats {
        match difficulty {
            Difficulty::Beginner => &mut self.beginner,
            Difficulty::Intermediate => &mut self.intermediate,
            Difficulty::Expert => &mut self.expert,
        }
    }
}

/// A user's contest statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContestStats {
    pub total_attempted: u64,
    pub total_solved: u64,
    pub by_difficulty: ByDifficulty,
}

impl ContestStats {
    /// Fold `(difficulty, solved)` pairs into totals. Rows with an unknown
    /// difficulty count toward the totals only.
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (Option<String>, bool)>,
    {
        let mut stats = ContestStats::default();
        for (difficulty, solved) in rows {
            stats.total_attempted += 1;
            if solved {
                stats.total_solved += 1;
            }
            if let Some(d) = difficulty.as_deref().and_then(Difficulty::parse) {
                let slot = stats.by_difficulty.slot(d);
                slot.attempted += 1;
                if solved {
                    slot.solved += 1;
                }
            }
        }
        stats
    }
}

/// Stats response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatsResponse {
    pub success: bool,
    pub stats: ContestStats,
}
