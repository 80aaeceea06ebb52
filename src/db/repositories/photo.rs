//! Photo row persistence for the gallery saga.

use anyhow::Result;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};

use crate::domain::AnimalId;
use crate::entities::{animal_photos, prelude::*};
use crate::models::AnimalPhoto;

pub struct PhotoRepository {
    conn: DatabaseConnection,
}

impl PhotoRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self, animal_id: AnimalId) -> Result<Vec<AnimalPhoto>> {
        let models = AnimalPhotos::find()
            .filter(animal_photos::Column::AnimalId.eq(animal_id.value()))
            .order_by_asc(animal_photos::Column::Order)
            .all(&self.conn)
            .await?;
        Ok(models
            .into_iter()
            .map(|m| AnimalPhoto {
                url: m.photo_url,
                order: m.order,
            })
            .collect())
    }

    pub async fn count(&self, animal_id: AnimalId) -> Result<u64> {
        let count = AnimalPhotos::find()
            .filter(animal_photos::Column::AnimalId.eq(animal_id.value()))
            .count(&self.conn)
            .await?;
        Ok(count)
    }

    pub async fn insert(&self, animal_id: AnimalId, url: &str, order: i32) -> Result<()> {
        let model = animal_photos::ActiveModel {
            animal_id: Set(animal_id.value()),
            photo_url: Set(url.to_string()),
            order: Set(order),
            ..Default::default()
        };
        AnimalPhotos::insert(model).exec(&self.conn).await?;
        Ok(())
    }

    pub async fn delete_by_url(&self, animal_id: AnimalId, url: &str) -> Result<()> {
        AnimalPhotos::delete_many()
            .filter(animal_photos::Column::AnimalId.eq(animal_id.value()))
            .filter(animal_photos::Column::PhotoUrl.eq(url))
            .exec(&self.conn)
            .await?;
        Ok(())
    }

    /// Re-inserts a previously deleted row with its original url and order.
    /// Conflict-tolerant so that a rollback racing another writer cannot fail
    /// on the (animal_id, photo_url) uniqueness constraint.
    pub async fn restore(&self, animal_id: AnimalId, photo: &AnimalPhoto) -> Result<()> {
        let model = animal_photos::ActiveModel {
            animal_id: Set(animal_id.value()),
            photo_url: Set(photo.url.clone()),
            order: Set(photo.order),
            ..Default::default()
        };
        AnimalPhotos::insert(model)
            .on_conflict(
                OnConflict::columns([
                    animal_photos::Column::AnimalId,
                    animal_photos::Column::PhotoUrl,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await?;
        Ok(())
    }
}
