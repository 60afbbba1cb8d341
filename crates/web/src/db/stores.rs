//! Store repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use storefinder_core::{Email, GeoPoint, Slug, StoreId, UserId, avatar_url};

use super::RepositoryError;
use crate::models::store::{Location, Store, StoreAuthor, StoreInput, TagCount};

const STORE_COLUMNS: &str =
    "id, name, slug, description, tags, created_at, lng, lat, address, photo, author_id";

/// Size of the author avatar shown on the store page.
const AUTHOR_AVATAR_SIZE: u32 = 64;

#[derive(sqlx::FromRow)]
struct StoreRow {
    id: i32,
    name: String,
    slug: String,
    description: String,
    tags: Vec<String>,
    created_at: DateTime<Utc>,
    lng: f64,
    lat: f64,
    address: String,
    photo: Option<String>,
    author_id: i32,
}

impl TryFrom<StoreRow> for Store {
    type Error = RepositoryError;

    fn try_from(row: StoreRow) -> Result<Self, Self::Error> {
        let point = GeoPoint::new(row.lng, row.lat).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid location for store {}: {e}", row.id))
        })?;

        Ok(Self {
            id: StoreId::new(row.id),
            name: row.name,
            slug: Slug::from_stored(row.slug),
            description: row.description,
            tags: row.tags,
            created_at: row.created_at,
            location: Location {
                point,
                address: row.address,
            },
            photo: row.photo,
            author_id: UserId::new(row.author_id),
        })
    }
}

#[derive(sqlx::FromRow)]
struct StoreWithAuthorRow {
    #[sqlx(flatten)]
    store: StoreRow,
    author_name: String,
    author_email: String,
}

#[derive(sqlx::FromRow)]
struct NearRow {
    #[sqlx(flatten)]
    store: StoreRow,
    distance: f64,
}

#[derive(sqlx::FromRow)]
struct TagCountRow {
    tag: String,
    count: i64,
}

fn into_stores(rows: Vec<StoreRow>) -> Result<Vec<Store>, RepositoryError> {
    rows.into_iter().map(Store::try_from).collect()
}

/// Repository for store database operations.
pub struct StoreRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StoreRepository<'a> {
    /// Create a new store repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Pick a slug for `name` that doesn't collide with existing stores.
    ///
    /// Counts stores whose slug is the base slug or a numbered variant of it
    /// (ignoring `exclude`, the store being renamed). Read-then-write: two
    /// concurrent saves of the same name can still end up with equal slugs.
    async fn unique_slug(
        &self,
        name: &str,
        exclude: Option<StoreId>,
    ) -> Result<Slug, RepositoryError> {
        let slug = Slug::from_name(name);

        let existing: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM stores
             WHERE slug ~* $1 AND ($2::INTEGER IS NULL OR id <> $2)",
        )
        .bind(slug.conflict_pattern())
        .bind(exclude)
        .fetch_one(self.pool)
        .await?;

        let existing = usize::try_from(existing)
            .map_err(|e| RepositoryError::DataCorruption(format!("negative slug count: {e}")))?;

        Ok(slug.disambiguate(existing))
    }

    /// Create a store authored by `author_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(
        &self,
        input: &StoreInput,
        author_id: UserId,
    ) -> Result<Store, RepositoryError> {
        let slug = self.unique_slug(&input.name, None).await?;

        let row = sqlx::query_as::<_, StoreRow>(&format!(
            "INSERT INTO stores (name, slug, description, tags, lng, lat, address, photo, author_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {STORE_COLUMNS}"
        ))
        .bind(&input.name)
        .bind(slug.as_str())
        .bind(&input.description)
        .bind(&input.tags)
        .bind(input.location.point.lng())
        .bind(input.location.point.lat())
        .bind(&input.location.address)
        .bind(input.photo.as_deref())
        .bind(author_id)
        .fetch_one(self.pool)
        .await?;

        Store::try_from(row)
    }

    /// Replace a store's fields.
    ///
    /// The slug is regenerated only when the name changed. A `None` photo
    /// keeps the current one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the store doesn't exist.
    #[instrument(skip(self, input), fields(store_id = %id))]
    pub async fn update(&self, id: StoreId, input: &StoreInput) -> Result<Store, RepositoryError> {
        let current = self.get_by_id(id).await?.ok_or(RepositoryError::NotFound)?;

        let slug = if current.name == input.name {
            current.slug
        } else {
            self.unique_slug(&input.name, Some(id)).await?
        };

        let row = sqlx::query_as::<_, StoreRow>(&format!(
            "UPDATE stores
             SET name = $2, slug = $3, description = $4, tags = $5,
                 lng = $6, lat = $7, address = $8, photo = COALESCE($9, photo)
             WHERE id = $1
             RETURNING {STORE_COLUMNS}"
        ))
        .bind(id)
        .bind(&input.name)
        .bind(slug.as_str())
        .bind(&input.description)
        .bind(&input.tags)
        .bind(input.location.point.lng())
        .bind(input.location.point.lat())
        .bind(&input.location.address)
        .bind(input.photo.as_deref())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Store::try_from(row)
    }

    /// Get a store by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(&format!(
            "SELECT {STORE_COLUMNS} FROM stores WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Store::try_from).transpose()
    }

    /// Get a store by slug together with its author.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug_with_author(
        &self,
        slug: &str,
    ) -> Result<Option<(Store, StoreAuthor)>, RepositoryError> {
        let row = sqlx::query_as::<_, StoreWithAuthorRow>(
            "SELECT s.id, s.name, s.slug, s.description, s.tags, s.created_at,
                    s.lng, s.lat, s.address, s.photo, s.author_id,
                    u.name AS author_name, u.email AS author_email
             FROM stores s
             JOIN users u ON u.id = s.author_id
             WHERE s.slug = $1
             ORDER BY s.created_at
             LIMIT 1",
        )
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let email = Email::parse(&row.author_email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let store = Store::try_from(row.store)?;
        let author = StoreAuthor {
            id: store.author_id,
            name: row.author_name,
            avatar: avatar_url(&email, AUTHOR_AVATAR_SIZE),
        };

        Ok(Some((store, author)))
    }

    /// All stores, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Store>, RepositoryError> {
        self.list_by_tag(None).await
    }

    /// Stores carrying `tag`, newest first. With no tag, every store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_tag(&self, tag: Option<&str>) -> Result<Vec<Store>, RepositoryError> {
        let rows = sqlx::query_as::<_, StoreRow>(&format!(
            "SELECT {STORE_COLUMNS} FROM stores
             WHERE ($1::TEXT IS NULL OR $1 = ANY(tags))
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(tag)
        .fetch_all(self.pool)
        .await?;

        into_stores(rows)
    }

    /// Every tag in use with its store count, most used first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn tag_counts(&self) -> Result<Vec<TagCount>, RepositoryError> {
        let rows = sqlx::query_as::<_, TagCountRow>(
            "SELECT tag, COUNT(*) AS count
             FROM stores, UNNEST(tags) AS tag
             GROUP BY tag
             ORDER BY count DESC, tag ASC",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| TagCount {
                tag: r.tag,
                count: r.count,
            })
            .collect())
    }

    /// Full-text search over name and description, best matches first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str, limit: i64) -> Result<Vec<Store>, RepositoryError> {
        let rows = sqlx::query_as::<_, StoreRow>(&format!(
            "SELECT {STORE_COLUMNS} FROM stores
             WHERE search @@ websearch_to_tsquery('english', $1)
             ORDER BY ts_rank(search, websearch_to_tsquery('english', $1)) DESC, created_at DESC
             LIMIT $2"
        ))
        .bind(query)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        into_stores(rows)
    }

    /// Stores within `max_meters` of `point`, nearest first, with their
    /// distance in meters.
    ///
    /// A bounding box narrows candidates before the exact great-circle
    /// distance is computed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn near(
        &self,
        point: GeoPoint,
        max_meters: f64,
        limit: i64,
    ) -> Result<Vec<(Store, f64)>, RepositoryError> {
        let bbox = point.bounding_box(max_meters);

        let rows = sqlx::query_as::<_, NearRow>(&format!(
            "SELECT * FROM (
                 SELECT {STORE_COLUMNS},
                        2 * $3::FLOAT8 * ASIN(LEAST(1.0, SQRT(
                            POWER(SIN(RADIANS(lat - $2::FLOAT8) / 2), 2)
                            + COS(RADIANS($2::FLOAT8)) * COS(RADIANS(lat))
                              * POWER(SIN(RADIANS(lng - $1::FLOAT8) / 2), 2)
                        ))) AS distance
                 FROM stores
                 WHERE lat BETWEEN $4::FLOAT8 AND $5::FLOAT8
                   AND lng BETWEEN $6::FLOAT8 AND $7::FLOAT8
             ) candidates
             WHERE distance <= $8::FLOAT8
             ORDER BY distance
             LIMIT $9"
        ))
        .bind(point.lng())
        .bind(point.lat())
        .bind(GeoPoint::EARTH_RADIUS_METERS)
        .bind(bbox.min_lat)
        .bind(bbox.max_lat)
        .bind(bbox.min_lng)
        .bind(bbox.max_lng)
        .bind(max_meters)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|r| Ok((Store::try_from(r.store)?, r.distance)))
            .collect()
    }

    /// Stores with the given IDs, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_ids(&self, ids: &[StoreId]) -> Result<Vec<Store>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = ids.iter().map(StoreId::as_i32).collect();
        let rows = sqlx::query_as::<_, StoreRow>(&format!(
            "SELECT {STORE_COLUMNS} FROM stores
             WHERE id = ANY($1)
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        into_stores(rows)
    }

    /// Delete every store. Used by the seeder.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_all(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM stores").execute(self.pool).await?;
        Ok(result.rows_affected())
    }
}
