//! Repository for the `entities` table.

use sqlx::PgPool;

use crate::models::entity::{EntityRow, EntitySummaryRow, UpsertEntity};

/// Column list for entities queries.
const COLUMNS: &str = "id, nom, description, image_reference, zones, \
    cadre_reference, metadata, created_at, updated_at";

/// CRUD operations for document templates. Templates are addressed by
/// name, which is unique.
pub struct EntityRepo;

impl EntityRepo {
    /// Insert a new entity or replace an existing one with the same
    /// name, returning the stored row.
    pub async fn upsert(pool: &PgPool, input: &UpsertEntity) -> Result<EntityRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO entities
                (nom, description, image_reference, zones, cadre_reference, metadata)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (nom) DO UPDATE SET
                description = EXCLUDED.description,
                image_reference = EXCLUDED.image_reference,
                zones = EXCLUDED.zones,
                cadre_reference = EXCLUDED.cadre_reference,
                metadata = EXCLUDED.metadata
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EntityRow>(&query)
            .bind(&input.nom)
            .bind(&input.description)
            .bind(&input.image_reference)
            .bind(&input.zones)
            .bind(&input.cadre_reference)
            .bind(&input.metadata)
            .fetch_one(pool)
            .await
    }

    /// Find an entity by name.
    pub async fn find_by_name(pool: &PgPool, nom: &str) -> Result<Option<EntityRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM entities WHERE nom = $1");
        sqlx::query_as::<_, EntityRow>(&query)
            .bind(nom)
            .fetch_optional(pool)
            .await
    }

    /// List entity summaries, newest first.
    pub async fn list(pool: &PgPool) -> Result<Vec<EntitySummaryRow>, sqlx::Error> {
        sqlx::query_as::<_, EntitySummaryRow>(
            "SELECT id, nom, description,
                    jsonb_array_length(zones)::bigint AS nombre_zones,
                    created_at
             FROM entities
             ORDER BY created_at DESC",
        )
        .fetch_all(pool)
        .await
    }

    /// Replace an entity's zones payload. Returns the updated row, or
    /// `None` when no entity has that name.
    pub async fn update_zones(
        pool: &PgPool,
        nom: &str,
        zones: &serde_json::Value,
    ) -> Result<Option<EntityRow>, sqlx::Error> {
        let query = format!(
            "UPDATE entities SET zones = $1 WHERE nom = $2 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EntityRow>(&query)
            .bind(zones)
            .bind(nom)
            .fetch_optional(pool)
            .await
    }

    /// Delete an entity by name. Returns true if a row was deleted.
    pub async fn delete(pool: &PgPool, nom: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM entities WHERE nom = $1")
            .bind(nom)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
