use sea_orm::entity::prelude::*;

/// Membership of a review id in an article's review set. Detaching and
/// deleting the review record are separate writes, so a dangling entry or an
/// orphaned review is observable between the two steps.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "article_reviews")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub article_id: i32,

    pub review_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
