use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "favorites")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_name = "movieid")]
    pub movie_id: i32,
    #[sea_orm(column_name = "lastseen")]
    pub last_seen: Date,
    #[sea_orm(column_name = "totaltimewatched")]
    pub total_time_watched: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::marks_as_favorite::Entity")]
    MarksAsFavorite,
}

impl Related<super::marks_as_favorite::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MarksAsFavorite.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
