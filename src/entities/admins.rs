use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "admins")]
pub struct Model {
    /// Admin user id, lowercased at write time.
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,

    /// Argon2id password hash
    pub password_hash: String,

    /// Recovery answers, compared by exact string equality.
    pub answer1: String,

    pub answer2: String,

    /// Bearer token issued at login (64-char hex). None until first login.
    pub api_token: Option<String>,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
