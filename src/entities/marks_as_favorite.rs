use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "marksasfavorite")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_name = "profileid")]
    pub profile_id: i32,
    #[sea_orm(primary_key, auto_increment = false, column_name = "movieid")]
    pub movie_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::profile::Entity",
        from = "Column::ProfileId",
        to = "super::profile::Column::ProfileId"
    )]
    Profile,
    #[sea_orm(
        belongs_to = "super::favorites::Entity",
        from = "Column::MovieId",
        to = "super::favorites::Column::MovieId"
    )]
    Favorites,
}

impl Related<super::profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Profile.def()
    }
}

impl Related<super::favorites::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Favorites.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
