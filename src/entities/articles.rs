use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "articles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,

    pub content: String,

    pub image_url: String,

    /// Display string in `dd/mm/yyyy` form, not a real date column.
    pub upload_date: String,

    /// Username of the owning user. Not a foreign key; kept consistent only
    /// by the cascade service on rename/delete.
    pub owner_username: String,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
