use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "profile")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_name = "profileid")]
    pub profile_id: i32,
    #[sea_orm(column_name = "profilename")]
    pub profile_name: String,
    #[sea_orm(column_name = "profilepicture")]
    pub profile_picture: String,
    #[sea_orm(column_name = "isonline")]
    pub is_online: bool,
    #[sea_orm(column_name = "watchhistoryid")]
    pub watch_history_id: i32,
    #[sea_orm(column_name = "customerid")]
    pub customer_id: i32,
    pub account_status: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::CustomerId"
    )]
    Customer,
    #[sea_orm(
        belongs_to = "super::watch_history::Entity",
        from = "Column::WatchHistoryId",
        to = "super::watch_history::Column::WatchHistoryId"
    )]
    WatchHistory,
    #[sea_orm(has_many = "super::reviews::Entity")]
    Reviews,
    #[sea_orm(has_many = "super::marks_as_favorite::Entity")]
    MarksAsFavorite,
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl Related<super::watch_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WatchHistory.def()
    }
}

impl Related<super::reviews::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl Related<super::marks_as_favorite::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MarksAsFavorite.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
