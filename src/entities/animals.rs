use sea_orm::entity::prelude::*;

/// Animal listing row. The PostGIS `address` geography column is written and
/// queried through raw SQL only, so it is deliberately absent here; the plain
/// latitude/longitude columns mirror it for entity reads.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "animals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub animal_id: Uuid,
    pub name: String,
    pub gender: String,
    pub age_in_weeks: i32,
    pub neutered: bool,
    pub description: String,
    pub address_display_name: String,
    pub rehomer_id: Uuid,
    pub address_latitude: f64,
    pub address_longitude: f64,
    pub created_at: DateTimeUtc,
    pub last_updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::animal_photos::Entity")]
    AnimalPhotos,
}

impl Related<super::animal_photos::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AnimalPhotos.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
