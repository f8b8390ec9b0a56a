//! User entity for password and Google OAuth accounts.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub username: String,
    /// Always stored lower-cased
    #[sea_orm(unique)]
    pub email: String,
    /// Argon2 PHC string; absent for OAuth-only accounts
    pub password_hash: Option<String>,
    #[sea_orm(unique)]
    pub google_id: Option<String>,
    pub avatar_url: Option<String>,
    pub contest_level: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::chat::Entity")]
    Chats,
    #[sea_orm(has_many = "super::contest_submission::Entity")]
    ContestSubmissions,
}

impl Related<super::chat::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Chats.def()
    }
}

impl Related<super::contest_submission::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ContestSubmissions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
