//! Database operations for users.

use chrono::Utc;
use sea_orm::*;
use uuid::Uuid;

use crate::entity::user;
use crate::error::{AppError, AppResult};
use crate::models::user::{GoogleUserInfo, User, normalize_email};

/// Create a password account. The caller passes an already hashed password.
///
/// Email and username collisions are reported separately; a race that slips
/// past the pre-check still hits the unique indexes.
pub async fn create_password_user(
    db: &DatabaseConnection,
    username: &str,
    email: &str,
    password_hash: &str,
) -> AppResult<User> {
    let email = normalize_email(email);

    if find_by_email(db, &email).await?.is_some() {
        return Err(AppError::InvalidInput("Email already registered".to_string()));
    }
    if find_by_username(db, username).await?.is_some() {
        return Err(AppError::InvalidInput("Username already taken".to_string()));
    }

    let now = Utc::now();
    let model = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(username.to_string()),
        email: Set(email),
        password_hash: Set(Some(password_hash.to_string())),
        google_id: Set(None),
        avatar_url: Set(None),
        contest_level: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let inserted = model.insert(db).await.map_err(map_unique_violation)?;
    Ok(inserted.into())
}

/// Find a user by (case-insensitive) email.
pub async fn find_by_email(db: &DatabaseConnection, email: &str) -> AppResult<Option<User>> {
    let result = user::Entity::find()
        .filter(user::Column::Email.eq(normalize_email(email)))
        .one(db)
        .await?;

    Ok(result.map(User::from))
}

/// Find a user by exact username.
pub async fn find_by_username(db: &DatabaseConnection, username: &str) -> AppResult<Option<User>> {
    let result = user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await?;

    Ok(result.map(User::from))
}

/// Find a user by ID.
pub async fn find_by_id(db: &DatabaseConnection, id: Uuid) -> AppResult<Option<User>> {
    let result = user::Entity::find_by_id(id).one(db).await?;
    Ok(result.map(User::from))
}

/// Find usernames for a set of user ids.
pub async fn usernames_by_ids(
    db: &DatabaseConnection,
    ids: &[Uuid],
) -> AppResult<std::collections::HashMap<Uuid, String>> {
    if ids.is_empty() {
        return Ok(Default::default());
    }

    let rows = user::Entity::find()
        .filter(user::Column::Id.is_in(ids.iter().copied()))
        .all(db)
        .await?;

    Ok(rows.into_iter().map(|m| (m.id, m.username)).collect())
}

/// Store the user's contest level preference.
pub async fn update_contest_level(
    db: &DatabaseConnection,
    id: Uuid,
    level: &str,
) -> AppResult<Option<User>> {
    let Some(existing) = user::Entity::find_by_id(id).one(db).await? else {
        return Ok(None);
    };

    let mut active: user::ActiveModel = existing.into();
    active.contest_level = Set(Some(level.to_string()));
    active.updated_at = Set(Utc::now());
    let updated = active.update(db).await?;

    Ok(Some(updated.into()))
}

/// Resolve a Google login to a local account.
///
/// Lookup order: Google id, then email, then a new account. Attaching a
/// Google identity to an existing account by email requires `link_by_email`
/// and a provider-verified email.
pub async fn upsert_from_google(
    db: &DatabaseConnection,
    info: &GoogleUserInfo,
    link_by_email: bool,
) -> AppResult<User> {
    let existing = user::Entity::find()
        .filter(user::Column::GoogleId.eq(info.sub.as_str()))
        .one(db)
        .await?;

    if let Some(m) = existing {
        return Ok(m.into());
    }

    let email = info
        .email
        .as_deref()
        .map(normalize_email)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Google account has no email address".to_string()))?;

    let by_email = user::Entity::find()
        .filter(user::Column::Email.eq(email.as_str()))
        .one(db)
        .await?;

    if let Some(m) = by_email {
        if !link_by_email || !info.email_verified {
            tracing::warn!(
                user_id = %m.id,
                verified = info.email_verified,
                "Refusing to link Google identity to existing account by email"
            );
            return Err(AppError::Unauthorized(
                "An account with this email already exists".to_string(),
            ));
        }

        tracing::info!(user_id = %m.id, "Linking Google identity to existing account by email");
        let avatar = m.avatar_url.clone().or_else(|| info.picture.clone());
        let mut active: user::ActiveModel = m.into();
        active.google_id = Set(Some(info.sub.clone()));
        active.avatar_url = Set(avatar);
        active.updated_at = Set(Utc::now());
        let updated = active.update(db).await?;
        return Ok(updated.into());
    }

    let username = available_username(db, info, &email).await?;
    let now = Utc::now();
    let model = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(username),
        email: Set(email),
        password_hash: Set(None),
        google_id: Set(Some(info.sub.clone())),
        avatar_url: Set(info.picture.clone()),
        contest_level: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let inserted = model.insert(db).await.map_err(map_unique_violation)?;
    tracing::info!(user_id = %inserted.id, "Created account from Google login");
    Ok(inserted.into())
}

/// Display name (or email local part), suffixed with part of the Google id
/// when already taken.
async fn available_username(
    db: &DatabaseConnection,
    info: &GoogleUserInfo,
    email: &str,
) -> AppResult<String> {
    let base = info
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| email.split('@').next().unwrap_or(email))
        .to_string();

    if find_by_username(db, &base).await?.is_none() {
        return Ok(base);
    }

    let suffix = info
        .sub
        .char_indices()
        .rev()
        .nth(5)
        .map_or(info.sub.as_str(), |(i, _)| &info.sub[i..]);
    Ok(format!("{}-{}", base, suffix))
}

fn map_unique_violation(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::InvalidInput(
            "A user with this email or username already exists".to_string(),
        ),
        _ => err.into(),
    }
}
