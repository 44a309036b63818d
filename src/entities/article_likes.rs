use sea_orm::entity::prelude::*;

/// One row per like entry. Row id order is the append order of the likes
/// sequence. There is deliberately no unique constraint on
/// (`article_id`, `username`): deduplication is application logic.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "article_likes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub article_id: i32,

    pub username: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
