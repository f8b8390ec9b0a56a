//! Coding contest API handlers: problem generation, submission evaluation,
//! submission history, leaderboard and per-user statistics.

use actix_web::{HttpResponse, web};
use tracing::info;

use crate::auth::BearerAuth;
use crate::db::DbPool;
use crate::db::submissions::NewAttempt;
use crate::error::{AppError, AppResult};
use crate::models::contest::{
    Difficulty, GenerateProblemRequest, GenerateProblemResponse, LEADERBOARD_LIMIT,
    LeaderboardEntry, LeaderboardQuery, LeaderboardResponse, StatsResponse, SubmissionResponse,
    SubmissionsResponse, SubmitRequest, SubmitResponse, rank_leaderboard,
};
use crate::services::evaluator;
use crate::services::judge0::{CodeExecutor, ExecutionError, language_id};
use crate::services::llm::CompletionProvider;
use crate::services::problem_generator;

/// Non-blank string field of a request body.
fn required(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Evaluate a solution against the problem's test cases and record the attempt.
#[utoipa::path(
    post,
    path = "/api/contest/submit",
    tag = "Contest",
    request_body = SubmitRequest,
    responses(
        (status = 200, description = "Evaluation results and the stored submission", body = SubmitResponse),
        (status = 400, description = "Missing fields or unsupported language", body = crate::error::ErrorResponse),
        (status = 401, description = "Invalid token", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn submit(
    auth: BearerAuth,
    pool: web::Data<DbPool>,
    executor: web::Data<dyn CodeExecutor>,
    body: web::Json<SubmitRequest>,
) -> AppResult<HttpResponse> {
    let (Some(problem_title), Some(language), Some(code)) = (
        required(&body.problem_title),
        required(&body.language),
        required(&body.code),
    ) else {
        return Err(AppError::InvalidInput(
            "Problem title, language and code are required".to_string(),
        ));
    };
    if language_id(language).is_none() {
        return Err(ExecutionError::UnsupportedLanguage(language.to_string()).into());
    }

    let evaluation =
        evaluator::evaluate(executor.get_ref(), language, code, &body.test_cases).await;

    let attempt = NewAttempt {
        problem_title,
        problem_description: body.problem_description.as_deref(),
        difficulty: body.difficulty.as_deref(),
        topic: body.topic.as_deref(),
        language,
        code,
        solved: evaluation.solved,
        test_cases: &body.test_cases,
    };
    let submission =
        crate::db::submissions::upsert_attempt(pool.connection(), auth.user_id, &attempt).await?;

    info!(
        user_id = %auth.user_id,
        problem = problem_title,
        solved = evaluation.solved,
        attempts = submission.attempts,
        "Contest submission recorded"
    );

    Ok(HttpResponse::Ok().json(SubmitResponse {
        success: true,
        solved: evaluation.solved,
        results: evaluation.results,
        submission,
    }))
}

/// Generate a new problem the caller has not attempted yet.
#[utoipa::path(
    post,
    path = "/api/contest/generate",
    tag = "Contest",
    request_body = GenerateProblemRequest,
    responses(
        (status = 200, description = "Generated problem", body = GenerateProblemResponse),
        (status = 400, description = "Missing topic or unknown difficulty", body = crate::error::ErrorResponse),
        (status = 500, description = "The model returned an unusable problem", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn generate_problem(
    auth: BearerAuth,
    pool: web::Data<DbPool>,
    llm: web::Data<dyn CompletionProvider>,
    body: web::Json<GenerateProblemRequest>,
) -> AppResult<HttpResponse> {
    let topic = required(&body.topic)
        .map(str::trim)
        .ok_or_else(|| AppError::InvalidInput("Topic is required".to_string()))?;
    let difficulty = body
        .difficulty
        .as_deref()
        .and_then(Difficulty::parse)
        .ok_or_else(|| {
            AppError::InvalidInput(
                "Difficulty must be one of Beginner, Intermediate, Expert".to_string(),
            )
        })?;

    let previous =
        crate::db::submissions::attempted_titles(pool.connection(), auth.user_id, difficulty, topic)
            .await?;
    let problem =
        problem_generator::generate(llm.get_ref(), difficulty, topic, &previous).await?;

    Ok(HttpResponse::Ok().json(GenerateProblemResponse {
        success: true,
        problem,
    }))
}

/// List the caller's submissions, most recently attempted first.
#[utoipa::path(
    get,
    path = "/api/contest/submissions",
    tag = "Contest",
    responses(
        (status = 200, description = "Caller's submissions", body = SubmissionsResponse),
        (status = 401, description = "Invalid token", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_submissions(
    auth: BearerAuth,
    pool: web::Data<DbPool>,
) -> AppResult<HttpResponse> {
    let submissions =
        crate::db::submissions::list_for_user(pool.connection(), auth.user_id).await?;
    Ok(HttpResponse::Ok().json(SubmissionsResponse {
        success: true,
        submissions,
    }))
}

/// Fetch the caller's submission for one problem.
#[utoipa::path(
    get,
    path = "/api/contest/submission/{problem_title}",
    tag = "Contest",
    params(("problem_title" = String, Path, description = "Problem title")),
    responses(
        (status = 200, description = "Submission, or null when never attempted", body = SubmissionResponse),
        (status = 401, description = "Invalid token", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_submission(
    auth: BearerAuth,
    pool: web::Data<DbPool>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let submission =
        crate::db::submissions::find_by_title(pool.connection(), auth.user_id, &path).await?;
    Ok(HttpResponse::Ok().json(SubmissionResponse {
        success: true,
        submission,
    }))
}

/// Public leaderboard, optionally restricted to one difficulty.
#[utoipa::path(
    get,
    path = "/api/contest/leaderboard",
    tag = "Contest",
    params(("difficulty" = Option<String>, Query, description = "Beginner, Intermediate or Expert; anything else means all")),
    responses(
        (status = 200, description = "Ranked users", body = LeaderboardResponse),
    )
)]
pub async fn leaderboard(
    pool: web::Data<DbPool>,
    query: web::Query<LeaderboardQuery>,
) -> AppResult<HttpResponse> {
    let difficulty = query.difficulty.as_deref().and_then(Difficulty::parse);

    let tallies = crate::db::submissions::leaderboard_tallies(pool.connection(), difficulty).await?;
    let ranked = rank_leaderboard(tallies, LEADERBOARD_LIMIT);

    let user_ids: Vec<_> = ranked.iter().map(|t| t.user_id).collect();
    let mut usernames = crate::db::users::usernames_by_ids(pool.connection(), &user_ids).await?;

    let leaderboard = ranked
        .into_iter()
        .map(|tally| {
            let username = usernames.remove(&tally.user_id).unwrap_or_default();
            LeaderboardEntry::new(tally, username)
        })
        .collect();

    Ok(HttpResponse::Ok().json(LeaderboardResponse {
        success: true,
        leaderboard,
        difficulty: difficulty.map_or("All", |d| d.as_str()).to_string(),
    }))
}

/// The caller's attempted/solved totals, overall and per difficulty.
#[utoipa::path(
    get,
    path = "/api/contest/stats",
    tag = "Contest",
    responses(
        (status = 200, description = "Contest statistics", body = StatsResponse),
        (status = 401, description = "Invalid token", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn stats(auth: BearerAuth, pool: web::Data<DbPool>) -> AppResult<HttpResponse> {
    let stats = crate::db::submissions::stats_for_user(pool.connection(), auth.user_id).await?;
    Ok(HttpResponse::Ok().json(StatsResponse {
        success: true,
        stats,
    }))
}

/// Configure contest routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/contest/submit").route(web::post().to(submit)))
        .service(web::resource("/contest/generate").route(web::post().to(generate_problem)))
        .service(web::resource("/contest/submissions").route(web::get().to(list_submissions)))
        .service(
            web::resource("/contest/submission/{problem_title}")
                .route(web::get().to(get_submission)),
        )
        .service(web::resource("/contest/leaderboard").route(web::get().to(leaderboard)))
        .service(web::resource("/contest/stats").route(web::get().to(stats)));
}
