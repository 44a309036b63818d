use sea_orm::entity::prelude::*;

/// Pending password-reset request. One outstanding request per username;
/// re-requests overwrite. The candidate password is stored as an Argon2 hash,
/// never in clear, and the row is deleted once the code is consumed.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "password_resets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub username: String,

    /// Four digit one-time code, 1000..=9999.
    pub code: i32,

    pub new_password_hash: String,

    /// RFC 3339 issuance time, checked against the configured TTL.
    pub issued_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
