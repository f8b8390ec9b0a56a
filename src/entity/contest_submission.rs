//! Contest submission entity, one row per (user, problem title).

use sea_orm::entity::prelude::*;
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "contest_submissions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub problem_title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub problem_description: Option<String>,
    pub difficulty: Option<String>,
    pub topic: Option<String>,
    pub language: String,
    #[sea_orm(column_type = "Text")]
    pub code: String,
    pub solved: bool,
    pub attempts: i32,
    pub last_attempted_at: DateTimeUtc,
    /// Stamped on the first solve only
    pub solved_at: Option<DateTimeUtc>,
    /// Test cases captured when the problem was first submitted
    #[sea_orm(column_type = "JsonBinary")]
    pub test_cases: JsonValue,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
