//! Animal listing persistence, including the PostGIS within-radius query.

use std::collections::HashMap;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait, FromQueryResult,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Statement,
};
use uuid::Uuid;

use crate::domain::{AnimalId, Gender, RehomerId};
use crate::entities::{animal_photos, animals, prelude::*};
use crate::models::{AdoptableAnimal, Animal, AnimalPatch, AnimalPhoto, Coordinates, NewAnimal};

/// Regional query row shape. `photos` arrives as a `json_agg` payload and is
/// decoded into [`AnimalPhoto`] entries during mapping.
#[derive(Debug, FromQueryResult)]
struct AdoptableRow {
    animal_id: Uuid,
    name: String,
    gender: String,
    age_in_weeks: i32,
    neutered: bool,
    description: String,
    address_latitude: f64,
    address_longitude: f64,
    rehomer_id: Uuid,
    distance_meters: f64,
    photos: serde_json::Value,
}

const ADOPTABLE_SELECT: &str = r#"
    SELECT
        a.animal_id,
        a.name,
        a.gender,
        a.age_in_weeks,
        a.neutered,
        a.description,
        a.address_latitude,
        a.address_longitude,
        a.rehomer_id,
        {DISTANCE} AS distance_meters,
        COALESCE(
            json_agg(json_build_object('url', p.photo_url, 'order', p."order") ORDER BY p."order" ASC)
                FILTER (WHERE p.photo_url IS NOT NULL),
            '[]'::json
        ) AS photos
    FROM animals a
    LEFT JOIN animal_photos p ON p.animal_id = a.animal_id
    WHERE {PREDICATE}
    GROUP BY a.animal_id, a.name, a.gender, a.age_in_weeks, a.neutered, a.description,
             a.address_latitude, a.address_longitude, a.rehomer_id, a.address
"#;

fn adoptable_sql(distance: &str, predicate: &str, suffix: &str) -> String {
    format!(
        "{}{}",
        ADOPTABLE_SELECT
            .replace("{DISTANCE}", distance)
            .replace("{PREDICATE}", predicate),
        suffix
    )
}

fn map_adoptable_row(row: AdoptableRow) -> Result<AdoptableAnimal> {
    let gender: Gender = row
        .gender
        .parse()
        .map_err(|e: String| anyhow!("animal {}: {e}", row.animal_id))?;
    let photos: Vec<AnimalPhoto> =
        serde_json::from_value(row.photos).context("malformed photo aggregate")?;
    Ok(AdoptableAnimal {
        animal_id: AnimalId::new(row.animal_id),
        name: row.name,
        gender,
        age_in_weeks: row.age_in_weeks,
        neutered: row.neutered,
        description: row.description,
        address_latitude: row.address_latitude,
        address_longitude: row.address_longitude,
        rehomer_id: RehomerId::new(row.rehomer_id),
        distance_meters: row.distance_meters,
        photos,
    })
}

fn map_listing(model: animals::Model, photos: Vec<AnimalPhoto>) -> Result<Animal> {
    let gender: Gender = model
        .gender
        .parse()
        .map_err(|e: String| anyhow!("animal {}: {e}", model.animal_id))?;
    Ok(Animal {
        id: AnimalId::new(model.animal_id),
        name: model.name,
        gender,
        age_in_weeks: model.age_in_weeks,
        neutered: model.neutered,
        description: model.description,
        address_display_name: model.address_display_name,
        rehomer_id: RehomerId::new(model.rehomer_id),
        location: Coordinates {
            latitude: model.address_latitude,
            longitude: model.address_longitude,
        },
        created_at: model.created_at,
        last_updated_at: model.last_updated_at,
        photos,
    })
}

pub struct AnimalRepository {
    conn: DatabaseConnection,
}

impl AnimalRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn exists(&self, rehomer_id: RehomerId, animal_id: AnimalId) -> Result<bool> {
        let count = Animals::find_by_id(animal_id.value())
            .filter(animals::Column::RehomerId.eq(rehomer_id.value()))
            .count(&self.conn)
            .await?;
        Ok(count > 0)
    }

    pub async fn insert(&self, rehomer_id: RehomerId, animal: &NewAnimal) -> Result<AnimalId> {
        let id = AnimalId::generate();
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            r"
            INSERT INTO animals (
                animal_id, name, gender, age_in_weeks, neutered, description,
                address_display_name, rehomer_id, address_latitude, address_longitude,
                address, created_at, last_updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                ST_SetSRID(ST_MakePoint($10, $9), 4326)::geography, NOW(), NOW()
            )
            ",
            [
                id.value().into(),
                animal.name.clone().into(),
                animal.gender.as_str().into(),
                animal.age_in_weeks.into(),
                animal.neutered.into(),
                animal.description.clone().into(),
                animal.address_display_name.clone().into(),
                rehomer_id.value().into(),
                animal.location.latitude.into(),
                animal.location.longitude.into(),
            ],
        );
        self.conn
            .execute(stmt)
            .await
            .context("failed to insert animal")?;
        Ok(id)
    }

    /// Applies a partial update. Returns false when no owned row matched.
    pub async fn update(
        &self,
        rehomer_id: RehomerId,
        animal_id: AnimalId,
        patch: &AnimalPatch,
    ) -> Result<bool> {
        let mut update = Animals::update_many()
            .filter(animals::Column::AnimalId.eq(animal_id.value()))
            .filter(animals::Column::RehomerId.eq(rehomer_id.value()))
            .col_expr(animals::Column::LastUpdatedAt, Expr::value(Utc::now()));

        if let Some(name) = &patch.name {
            update = update.col_expr(animals::Column::Name, Expr::value(name.clone()));
        }
        if let Some(gender) = patch.gender {
            update = update.col_expr(animals::Column::Gender, Expr::value(gender.as_str()));
        }
        if let Some(age) = patch.age_in_weeks {
            update = update.col_expr(animals::Column::AgeInWeeks, Expr::value(age));
        }
        if let Some(neutered) = patch.neutered {
            update = update.col_expr(animals::Column::Neutered, Expr::value(neutered));
        }
        if let Some(description) = &patch.description {
            update = update.col_expr(
                animals::Column::Description,
                Expr::value(description.clone()),
            );
        }
        if let Some(display_name) = &patch.address_display_name {
            update = update.col_expr(
                animals::Column::AddressDisplayName,
                Expr::value(display_name.clone()),
            );
        }

        let result = update.exec(&self.conn).await?;
        if result.rows_affected == 0 {
            return Ok(false);
        }

        // The geography column only moves through raw SQL.
        if let Some(location) = patch.location {
            let stmt = Statement::from_sql_and_values(
                DbBackend::Postgres,
                r"
                UPDATE animals
                SET address = ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography,
                    address_latitude = $2,
                    address_longitude = $1
                WHERE animal_id = $3 AND rehomer_id = $4
                ",
                [
                    location.longitude.into(),
                    location.latitude.into(),
                    animal_id.value().into(),
                    rehomer_id.value().into(),
                ],
            );
            self.conn
                .execute(stmt)
                .await
                .context("failed to update animal location")?;
        }

        Ok(true)
    }

    /// Deletes an owned animal row; photo rows go with it via FK cascade.
    pub async fn delete(&self, rehomer_id: RehomerId, animal_id: AnimalId) -> Result<()> {
        Animals::delete_many()
            .filter(animals::Column::AnimalId.eq(animal_id.value()))
            .filter(animals::Column::RehomerId.eq(rehomer_id.value()))
            .exec(&self.conn)
            .await?;
        Ok(())
    }

    pub async fn get_listing(
        &self,
        rehomer_id: RehomerId,
        animal_id: AnimalId,
    ) -> Result<Option<Animal>> {
        let Some(model) = Animals::find_by_id(animal_id.value())
            .filter(animals::Column::RehomerId.eq(rehomer_id.value()))
            .one(&self.conn)
            .await?
        else {
            return Ok(None);
        };

        let photos = AnimalPhotos::find()
            .filter(animal_photos::Column::AnimalId.eq(animal_id.value()))
            .order_by_asc(animal_photos::Column::Order)
            .all(&self.conn)
            .await?
            .into_iter()
            .map(|p| AnimalPhoto {
                url: p.photo_url,
                order: p.order,
            })
            .collect();

        map_listing(model, photos).map(Some)
    }

    pub async fn list_listings(
        &self,
        rehomer_id: RehomerId,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<Animal>, u64)> {
        let total = Animals::find()
            .filter(animals::Column::RehomerId.eq(rehomer_id.value()))
            .count(&self.conn)
            .await?;

        let models = Animals::find()
            .filter(animals::Column::RehomerId.eq(rehomer_id.value()))
            .order_by_desc(animals::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(&self.conn)
            .await?;

        let ids: Vec<Uuid> = models.iter().map(|m| m.animal_id).collect();
        let mut photos_by_animal: HashMap<Uuid, Vec<AnimalPhoto>> = HashMap::new();
        if !ids.is_empty() {
            let photo_models = AnimalPhotos::find()
                .filter(animal_photos::Column::AnimalId.is_in(ids))
                .order_by_asc(animal_photos::Column::Order)
                .all(&self.conn)
                .await?;
            for p in photo_models {
                photos_by_animal
                    .entry(p.animal_id)
                    .or_default()
                    .push(AnimalPhoto {
                        url: p.photo_url,
                        order: p.order,
                    });
            }
        }

        let mut listings = Vec::with_capacity(models.len());
        for model in models {
            let photos = photos_by_animal.remove(&model.animal_id).unwrap_or_default();
            listings.push(map_listing(model, photos)?);
        }
        Ok((listings, total))
    }

    pub async fn list_ids_for_rehomer(&self, rehomer_id: RehomerId) -> Result<Vec<AnimalId>> {
        let models = Animals::find()
            .filter(animals::Column::RehomerId.eq(rehomer_id.value()))
            .all(&self.conn)
            .await?;
        Ok(models.into_iter().map(|m| AnimalId::new(m.animal_id)).collect())
    }

    /// All animals within `radius_meters` of the point, distance ascending.
    /// Geographic (not planar) distance, delegated to PostGIS.
    pub async fn within_radius(
        &self,
        latitude: f64,
        longitude: f64,
        radius_meters: u32,
    ) -> Result<Vec<AdoptableAnimal>> {
        let sql = adoptable_sql(
            "ST_Distance(a.address, ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography)",
            "ST_DWithin(a.address, ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography, $3)",
            "    ORDER BY distance_meters ASC",
        );
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [longitude.into(), latitude.into(), f64::from(radius_meters).into()],
        );

        let rows = AdoptableRow::find_by_statement(stmt).all(&self.conn).await?;
        rows.into_iter().map(map_adoptable_row).collect()
    }

    /// Single public read; no reference point, so distance is reported as 0.
    pub async fn get_adoptable(&self, animal_id: AnimalId) -> Result<Option<AdoptableAnimal>> {
        let sql = adoptable_sql("0::double precision", "a.animal_id = $1", "");
        let stmt =
            Statement::from_sql_and_values(DbBackend::Postgres, sql, [animal_id.value().into()]);

        let row = AdoptableRow::find_by_statement(stmt).one(&self.conn).await?;
        row.map(map_adoptable_row).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adoptable_sql_substitutes_distance_and_predicate() {
        let sql = adoptable_sql("0::double precision", "a.animal_id = $1", "");
        assert!(sql.contains("0::double precision AS distance_meters"));
        assert!(sql.contains("WHERE a.animal_id = $1"));
        assert!(!sql.contains("{DISTANCE}"));
        assert!(!sql.contains("{PREDICATE}"));
    }

    #[test]
    fn photo_aggregate_decodes_into_ordered_photos() {
        let row = AdoptableRow {
            animal_id: Uuid::new_v4(),
            name: "Pip".to_string(),
            gender: "Male".to_string(),
            age_in_weeks: 12,
            neutered: false,
            description: "Small terrier".to_string(),
            address_latitude: 51.0,
            address_longitude: -2.0,
            rehomer_id: Uuid::new_v4(),
            distance_meters: 42.0,
            photos: serde_json::json!([
                {"url": "https://cdn.example/a/0.jpg", "order": 0},
                {"url": "https://cdn.example/a/1.jpg", "order": 1}
            ]),
        };
        let mapped = map_adoptable_row(row).unwrap();
        assert_eq!(mapped.photos.len(), 2);
        assert_eq!(mapped.photos[1].order, 1);
    }

    #[test]
    fn unknown_gender_is_rejected_during_mapping() {
        let row = AdoptableRow {
            animal_id: Uuid::new_v4(),
            name: "Pip".to_string(),
            gender: "Unknown".to_string(),
            age_in_weeks: 12,
            neutered: false,
            description: "Small terrier".to_string(),
            address_latitude: 51.0,
            address_longitude: -2.0,
            rehomer_id: Uuid::new_v4(),
            distance_meters: 42.0,
            photos: serde_json::json!([]),
        };
        assert!(map_adoptable_row(row).is_err());
    }
}
