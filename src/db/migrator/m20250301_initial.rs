use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// The address column is PostGIS geography, which the schema DSL cannot
// express, so this migration is raw SQL throughout.
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();

        conn.execute_unprepared("CREATE EXTENSION IF NOT EXISTS postgis")
            .await?;

        conn.execute_unprepared(
            r"
            CREATE TABLE IF NOT EXISTS animals (
                animal_id UUID PRIMARY KEY,
                name TEXT NOT NULL,
                gender TEXT NOT NULL,
                age_in_weeks INTEGER NOT NULL,
                neutered BOOLEAN NOT NULL,
                description TEXT NOT NULL,
                address_display_name TEXT NOT NULL,
                rehomer_id UUID NOT NULL,
                address_latitude DOUBLE PRECISION NOT NULL,
                address_longitude DOUBLE PRECISION NOT NULL,
                address GEOGRAPHY(POINT, 4326) NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                last_updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            ",
        )
        .await?;

        conn.execute_unprepared(
            r#"
            CREATE TABLE IF NOT EXISTS animal_photos (
                id SERIAL PRIMARY KEY,
                animal_id UUID NOT NULL REFERENCES animals(animal_id) ON DELETE CASCADE,
                photo_url TEXT NOT NULL,
                "order" INTEGER NOT NULL,
                UNIQUE (animal_id, photo_url)
            )
            "#,
        )
        .await?;

        conn.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_animals_address ON animals USING GIST (address)",
        )
        .await?;

        conn.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_animals_rehomer ON animals (rehomer_id)",
        )
        .await?;

        conn.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_animal_photos_animal ON animal_photos (animal_id)",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();
        conn.execute_unprepared("DROP TABLE IF EXISTS animal_photos")
            .await?;
        conn.execute_unprepared("DROP TABLE IF EXISTS animals").await?;
        Ok(())
    }
}
