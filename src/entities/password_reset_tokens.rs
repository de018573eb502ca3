use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "password_reset_tokens")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Owning user. Weak back-reference; historical rows may pile up until
    /// cleanup reaps them.
    pub user_id: i32,

    /// Raw random token (64-char hex). The token itself is the secret.
    #[sea_orm(unique)]
    pub token: String,

    /// RFC 3339 creation timestamp
    pub created_at: String,

    /// Unix seconds. Stored as an integer so expiry participates in
    /// SQL-level conditional updates.
    pub expires_at: i64,

    pub used: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
