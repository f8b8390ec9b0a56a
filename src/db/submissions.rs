//! Database operations for contest submissions.

use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::*;
use uuid::Uuid;

use crate::entity::contest_submission::{self, Column};
use crate::error::{AppError, AppResult};
use crate::models::contest::{ContestStats, Difficulty, Submission, TestCase, UserTally};

/// One evaluated attempt at a problem.
#[derive(Debug, Clone)]
pub struct NewAttempt<'a> {
    pub problem_title: &'a str,
    pub problem_description: Option<&'a str>,
    pub difficulty: Option<&'a str>,
    pub topic: Option<&'a str>,
    pub language: &'a str,
    pub code: &'a str,
    pub solved: bool,
    pub test_cases: &'a [TestCase],
}

/// Record an attempt with a single `INSERT .. ON CONFLICT DO UPDATE`.
///
/// The first attempt inserts the row with the problem snapshot. Later
/// attempts increment `attempts` in place, refresh code and language, OR
/// the solved flag, and keep the first `solved_at` ever stamped.
pub async fn upsert_attempt(
    db: &DatabaseConnection,
    user_id: Uuid,
    attempt: &NewAttempt<'_>,
) -> AppResult<Submission> {
    let now = Utc::now();
    let test_cases = serde_json::to_value(attempt.test_cases)
        .map_err(|e| AppError::Internal(format!("Failed to encode test cases: {}", e)))?;

    let model = contest_submission::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        problem_title: Set(attempt.problem_title.to_string()),
        problem_description: Set(attempt.problem_description.map(str::to_string)),
        difficulty: Set(attempt.difficulty.map(str::to_string)),
        topic: Set(attempt.topic.map(str::to_string)),
        language: Set(attempt.language.to_string()),
        code: Set(attempt.code.to_string()),
        solved: Set(attempt.solved),
        attempts: Set(1),
        last_attempted_at: Set(now),
        solved_at: Set(attempt.solved.then_some(now)),
        test_cases: Set(test_cases),
        created_at: Set(now),
        updated_at: Set(now),
    };

    contest_submission::Entity::insert(model)
        .on_conflict(
            OnConflict::columns([Column::UserId, Column::ProblemTitle])
                .update_columns([
                    Column::Code,
                    Column::Language,
                    Column::LastAttemptedAt,
                    Column::UpdatedAt,
                ])
                .value(
                    Column::Attempts,
                    Expr::cust("contest_submissions.attempts + 1"),
                )
                .value(
                    Column::Solved,
                    Expr::cust("contest_submissions.solved OR excluded.solved"),
                )
                .value(
                    Column::SolvedAt,
                    Expr::cust("COALESCE(contest_submissions.solved_at, excluded.solved_at)"),
                )
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    find_by_title(db, user_id, attempt.problem_title)
        .await?
        .ok_or_else(|| AppError::Database("Submission missing after upsert".to_string()))
}

/// The user's submissions, most recently attempted first.
pub async fn list_for_user(db: &DatabaseConnection, user_id: Uuid) -> AppResult<Vec<Submission>> {
    let rows = contest_submission::Entity::find()
        .filter(Column::UserId.eq(user_id))
        .order_by_desc(Column::LastAttemptedAt)
        .all(db)
        .await?;

    Ok(rows.into_iter().map(Submission::from).collect())
}

/// The user's submission for one problem, if any.
pub async fn find_by_title(
    db: &DatabaseConnection,
    user_id: Uuid,
    problem_title: &str,
) -> AppResult<Option<Submission>> {
    let row = contest_submission::Entity::find()
        .filter(Column::UserId.eq(user_id))
        .filter(Column::ProblemTitle.eq(problem_title))
        .one(db)
        .await?;

    Ok(row.map(Submission::from))
}

/// Titles the user already attempted at this difficulty and topic.
pub async fn attempted_titles(
    db: &DatabaseConnection,
    user_id: Uuid,
    difficulty: Difficulty,
    topic: &str,
) -> AppResult<Vec<String>> {
    let titles = contest_submission::Entity::find()
        .select_only()
        .column(Column::ProblemTitle)
        .filter(Column::UserId.eq(user_id))
        .filter(Column::Difficulty.eq(difficulty.as_str()))
        .filter(Column::Topic.eq(topic))
        .order_by_asc(Column::CreatedAt)
        .into_tuple::<String>()
        .all(db)
        .await?;

    Ok(titles)
}

/// Per-user attempted/solved counts, optionally restricted to one difficulty.
pub async fn leaderboard_tallies(
    db: &DatabaseConnection,
    difficulty: Option<Difficulty>,
) -> AppResult<Vec<UserTally>> {
    let mut query = contest_submission::Entity::find()
        .select_only()
        .column(Column::UserId)
        .column_as(Expr::cust("COUNT(*)"), "total_attempted")
        .column_as(
            Expr::cust("SUM(CASE WHEN solved THEN 1 ELSE 0 END)"),
            "total_solved",
        )
        .column_as(Column::SolvedAt.max(), "last_solved")
        .group_by(Column::UserId);

    if let Some(d) = difficulty {
        query = query.filter(Column::Difficulty.eq(d.as_str()));
    }

    Ok(query.into_model::<UserTally>().all(db).await?)
}

/// Aggregate stats for one user.
pub async fn stats_for_user(db: &DatabaseConnection, user_id: Uuid) -> AppResult<ContestStats> {
    let rows = contest_submission::Entity::find()
        .select_only()
        .column(Column::Difficulty)
        .column(Column::Solved)
        .filter(Column::UserId.eq(user_id))
        .into_tuple::<(Option<String>, bool)>()
        .all(db)
        .await?;

    Ok(ContestStats::from_rows(rows))
}
