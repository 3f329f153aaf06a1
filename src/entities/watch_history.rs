use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "watchhistory")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_name = "watchhistoryid")]
    pub watch_history_id: i32,
    #[sea_orm(column_name = "movieid")]
    pub movie_id: i32,
    #[sea_orm(column_name = "watchdate")]
    pub watch_date: Date,
    /// Minutes watched.
    #[sea_orm(column_name = "durationwatched")]
    pub duration_watched: f64,
    pub completion_percentage: Option<f64>,
    pub viewing_category: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::profile::Entity")]
    Profile,
}

impl Related<super::profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Profile.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
