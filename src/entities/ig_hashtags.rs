use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "ig_hashtag_id")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Hashtag as queried, without the leading `#`
    #[sea_orm(unique)]
    pub name: String,

    /// Platform-assigned hashtag id
    #[sea_orm(unique)]
    pub ig_hashtag_id: String,

    /// RFC 3339, always at UTC+09:00
    pub timestamp: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
