use async_trait::async_trait;
use masjid_directory_shared::{GeoPoint, Masjid, MasjidId, Review, TagCount, TopMasjid};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Postgres, QueryBuilder};
use tracing::{debug, error};

use super::rows::{
    decode_masajid, to_db_int, to_db_opt_int, MasjidRow, ReviewRow, TagCountRow, TopRatedRow,
    MASJID_COLUMNS, REVIEW_COLUMNS,
};
use crate::errors::MasjidRepositoryError;
use crate::interfaces::MasjidStore;
use crate::query::{search_terms, MasjidFilter, MasjidQuery};
use crate::reporting::group_reviews;
use crate::slug::SlugPattern;

/// Name of the unique index on `lower(slug)`.
const SLUG_UNIQUE_INDEX: &str = "masajid_slug_key";

/// The document expression indexed by `masajid_text_idx`.
const TEXT_DOCUMENT: &str = "to_tsvector('simple', name || ' ' || coalesce(description, '') \
     || ' ' || imam_name || ' ' || sec_name)";

/// Meters per degree of latitude on the mean-radius sphere.
const METERS_PER_DEGREE: f64 = 111_195.08;

/// PostgreSQL implementation of the masjid store.
///
/// Slug uniqueness is enforced by the `masajid_slug_key` index; violations
/// are reported as `SlugTaken` so the service can retry with another suffix.
pub struct PostgresMasjidStore {
    pool: sqlx::PgPool,
}

impl PostgresMasjidStore {
    /// Creates a store over an existing pool.
    ///
    /// # Arguments
    ///
    /// * `pool` - Configured PostgreSQL connection pool
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    /// Connects a new pool to `database_url`.
    ///
    /// # Arguments
    ///
    /// * `database_url` - PostgreSQL connection string
    /// * `max_connections` - Upper bound on pooled connections
    ///
    /// # Returns
    ///
    /// * `Ok(PostgresMasjidStore)` - Ready-to-use store
    /// * `Err(MasjidRepositoryError::StoreUnavailable)` - The database could not be reached
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
    ) -> Result<Self, MasjidRepositoryError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Translate a write failure, separating constraint violations from
    /// store faults.
    fn map_write_error(err: sqlx::Error, masjid: &Masjid) -> MasjidRepositoryError {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                if db_err.constraint() == Some(SLUG_UNIQUE_INDEX) {
                    return MasjidRepositoryError::SlugTaken(masjid.slug.clone());
                }
                return MasjidRepositoryError::AlreadyExists(masjid.id.to_string());
            }
            if db_err.is_check_violation() {
                return MasjidRepositoryError::invalid_field(
                    "location.coordinates",
                    db_err.message().to_string(),
                );
            }
        }
        error!(error = %err, masjid_id = %masjid.id, "Failed to write masjid");
        err.into()
    }

    fn map_review_error(err: sqlx::Error, review: &Review) -> MasjidRepositoryError {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_foreign_key_violation() {
                return MasjidRepositoryError::not_found(review.masjid);
            }
            if db_err.is_unique_violation() {
                return MasjidRepositoryError::AlreadyExists(review.id.to_string());
            }
        }
        error!(error = %err, review_id = %review.id, "Failed to insert review");
        err.into()
    }

    fn push_where(builder: &mut QueryBuilder<'_, Postgres>, filter: &MasjidFilter) {
        match filter {
            MasjidFilter::All => {}
            MasjidFilter::Tag(tag) => {
                builder.push(" WHERE ");
                builder.push_bind(tag.clone());
                builder.push(" = ANY(tags)");
            }
            MasjidFilter::Text(_) => {
                builder.push(format!(
                    " WHERE {} @@ to_tsquery('simple', ",
                    TEXT_DOCUMENT
                ));
                builder.push_bind(Self::ts_query(filter));
                builder.push(")");
            }
            MasjidFilter::Near {
                point,
                max_distance_meters,
            } => {
                // Bounding box on latitude uses the coordinate index; the
                // haversine distance does the exact cut.
                let delta = max_distance_meters / METERS_PER_DEGREE;
                builder.push(" WHERE latitude BETWEEN ");
                builder.push_bind(point.latitude - delta);
                builder.push(" AND ");
                builder.push_bind(point.latitude + delta);
                builder.push(" AND ");
                Self::push_distance(builder, point);
                builder.push(" <= ");
                builder.push_bind(*max_distance_meters);
            }
        }
    }

    fn push_order(builder: &mut QueryBuilder<'_, Postgres>, filter: &MasjidFilter) {
        match filter {
            MasjidFilter::All | MasjidFilter::Tag(_) => {
                builder.push(" ORDER BY created DESC");
            }
            MasjidFilter::Text(_) => {
                builder.push(format!(" ORDER BY ts_rank({}, to_tsquery('simple', ", TEXT_DOCUMENT));
                builder.push_bind(Self::ts_query(filter));
                builder.push(")) DESC");
            }
            MasjidFilter::Near { point, .. } => {
                builder.push(" ORDER BY ");
                Self::push_distance(builder, point);
                builder.push(" ASC");
            }
        }
    }

    /// Haversine great-circle distance in meters from `point` to each row.
    fn push_distance(builder: &mut QueryBuilder<'_, Postgres>, point: &GeoPoint) {
        builder.push("(2 * 6371008.8 * asin(least(1, sqrt(power(sin(radians(latitude - ");
        builder.push_bind(point.latitude);
        builder.push(") / 2), 2) + cos(radians(");
        builder.push_bind(point.latitude);
        builder.push(")) * cos(radians(latitude)) * power(sin(radians(longitude - ");
        builder.push_bind(point.longitude);
        builder.push(") / 2), 2)))))");
    }

    /// OR-query of the search terms, so that any term may match.
    fn ts_query(filter: &MasjidFilter) -> String {
        match filter {
            MasjidFilter::Text(text) => search_terms(text).join(" | "),
            _ => String::new(),
        }
    }

    fn push_pagination(builder: &mut QueryBuilder<'_, Postgres>, query: &MasjidQuery) {
        if let Some(limit) = query.limit {
            builder.push(" LIMIT ");
            builder.push_bind(limit as i64);
        }
        if query.skip > 0 {
            builder.push(" OFFSET ");
            builder.push_bind(query.skip as i64);
        }
    }
}

#[async_trait]
impl MasjidStore for PostgresMasjidStore {
    /// Runs the embedded migrations, which create both tables and every index.
    async fn ensure_indexes(&self) -> Result<(), MasjidRepositoryError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        debug!("Masjid schema and indexes are up to date");
        Ok(())
    }

    async fn find_slugs_matching(
        &self,
        pattern: &SlugPattern,
    ) -> Result<Vec<String>, MasjidRepositoryError> {
        let slugs = sqlx::query_scalar::<_, String>("SELECT slug FROM masajid WHERE slug ~* $1")
            .bind(pattern.as_str())
            .fetch_all(&self.pool)
            .await?;
        Ok(slugs)
    }

    async fn insert_masjid(&self, masjid: &Masjid) -> Result<(), MasjidRepositoryError> {
        let query = format!(
            "INSERT INTO masajid ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, \
             $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27)",
            MASJID_COLUMNS
        );

        sqlx::query(&query)
            .bind(masjid.id)
            .bind(&masjid.name)
            .bind(&masjid.slug)
            .bind(&masjid.imam_name)
            .bind(to_db_int("imam_phone_no", masjid.imam_phone_no)?)
            .bind(&masjid.sec_name)
            .bind(to_db_int("sec_phone_no", masjid.sec_phone_no)?)
            .bind(to_db_int("population", masjid.population)?)
            .bind(&masjid.langservice)
            .bind(&masjid.bank)
            .bind(&masjid.website)
            .bind(&masjid.acctname)
            .bind(to_db_opt_int("acctno", masjid.acctno)?)
            .bind(&masjid.madrasah_name)
            .bind(to_db_opt_int("madrasah_phone_no", masjid.madrasah_phone_no)?)
            .bind(&masjid.description)
            .bind(&masjid.tags)
            .bind(masjid.created)
            .bind(&masjid.location.kind)
            .bind(masjid.location.coordinates[0])
            .bind(masjid.location.coordinates[1])
            .bind(&masjid.location.address)
            .bind(&masjid.location.city)
            .bind(&masjid.location.state)
            .bind(&masjid.location.country)
            .bind(&masjid.photo)
            .bind(masjid.author)
            .execute(&self.pool)
            .await
            .map_err(|e| Self::map_write_error(e, masjid))?;
        Ok(())
    }

    async fn update_masjid(&self, masjid: &Masjid) -> Result<(), MasjidRepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE masajid SET
                name = $2, slug = $3, imam_name = $4, imam_phone_no = $5, sec_name = $6,
                sec_phone_no = $7, population = $8, langservice = $9, bank = $10, website = $11,
                acctname = $12, acctno = $13, madrasah_name = $14, madrasah_phone_no = $15,
                description = $16, tags = $17, location_type = $18, longitude = $19,
                latitude = $20, address = $21, city = $22, state = $23, country = $24,
                photo = $25
            WHERE id = $1
            "#,
        )
        .bind(masjid.id)
        .bind(&masjid.name)
        .bind(&masjid.slug)
        .bind(&masjid.imam_name)
        .bind(to_db_int("imam_phone_no", masjid.imam_phone_no)?)
        .bind(&masjid.sec_name)
        .bind(to_db_int("sec_phone_no", masjid.sec_phone_no)?)
        .bind(to_db_int("population", masjid.population)?)
        .bind(&masjid.langservice)
        .bind(&masjid.bank)
        .bind(&masjid.website)
        .bind(&masjid.acctname)
        .bind(to_db_opt_int("acctno", masjid.acctno)?)
        .bind(&masjid.madrasah_name)
        .bind(to_db_opt_int("madrasah_phone_no", masjid.madrasah_phone_no)?)
        .bind(&masjid.description)
        .bind(&masjid.tags)
        .bind(&masjid.location.kind)
        .bind(masjid.location.coordinates[0])
        .bind(masjid.location.coordinates[1])
        .bind(&masjid.location.address)
        .bind(&masjid.location.city)
        .bind(&masjid.location.state)
        .bind(&masjid.location.country)
        .bind(&masjid.photo)
        .execute(&self.pool)
        .await
        .map_err(|e| Self::map_write_error(e, masjid))?;

        if result.rows_affected() == 0 {
            return Err(MasjidRepositoryError::not_found(masjid.id));
        }
        Ok(())
    }

    async fn get_masjid(&self, id: MasjidId) -> Result<Option<Masjid>, MasjidRepositoryError> {
        let query = format!("SELECT {} FROM masajid WHERE id = $1", MASJID_COLUMNS);
        let row = sqlx::query_as::<_, MasjidRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Masjid::try_from).transpose()
    }

    async fn get_masjid_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<Masjid>, MasjidRepositoryError> {
        let query = format!(
            "SELECT {} FROM masajid WHERE lower(slug) = lower($1)",
            MASJID_COLUMNS
        );
        let row = sqlx::query_as::<_, MasjidRow>(&query)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Masjid::try_from).transpose()
    }

    async fn find_masajid(
        &self,
        query: &MasjidQuery,
    ) -> Result<Vec<Masjid>, MasjidRepositoryError> {
        if let MasjidFilter::Text(text) = &query.filter {
            if search_terms(text).is_empty() {
                return Ok(Vec::new());
            }
        }

        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM masajid",
            MASJID_COLUMNS
        ));
        Self::push_where(&mut builder, &query.filter);
        Self::push_order(&mut builder, &query.filter);
        Self::push_pagination(&mut builder, query);

        let rows = builder
            .build_query_as::<MasjidRow>()
            .fetch_all(&self.pool)
            .await?;
        decode_masajid(rows)
    }

    async fn insert_review(&self, review: &Review) -> Result<(), MasjidRepositoryError> {
        let query = format!(
            "INSERT INTO reviews ({}) VALUES ($1, $2, $3, $4, $5, $6)",
            REVIEW_COLUMNS
        );
        sqlx::query(&query)
            .bind(review.id)
            .bind(review.masjid)
            .bind(review.author)
            .bind(&review.text)
            .bind(review.rating)
            .bind(review.created)
            .execute(&self.pool)
            .await
            .map_err(|e| Self::map_review_error(e, review))?;
        Ok(())
    }

    async fn find_reviews(
        &self,
        masjid_ids: &[MasjidId],
    ) -> Result<Vec<Review>, MasjidRepositoryError> {
        if masjid_ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!(
            "SELECT {} FROM reviews WHERE masjid = ANY($1) ORDER BY created ASC",
            REVIEW_COLUMNS
        );
        let rows = sqlx::query_as::<_, ReviewRow>(&query)
            .bind(masjid_ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Review::from).collect())
    }

    async fn tag_counts(&self) -> Result<Vec<TagCount>, MasjidRepositoryError> {
        let rows = sqlx::query_as::<_, TagCountRow>(
            r#"
            SELECT tag, COUNT(*) AS count
            FROM masajid CROSS JOIN LATERAL unnest(tags) AS t(tag)
            GROUP BY tag
            ORDER BY count DESC, tag ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TagCount::try_from).collect()
    }

    async fn top_rated(
        &self,
        min_reviews: usize,
        limit: usize,
    ) -> Result<Vec<TopMasjid>, MasjidRepositoryError> {
        let rows = sqlx::query_as::<_, TopRatedRow>(
            r#"
            SELECT m.id, m.photo, m.name, m.slug, AVG(r.rating) AS average_rating
            FROM masajid m
            JOIN reviews r ON r.masjid = m.id
            GROUP BY m.id
            HAVING COUNT(r.id) >= $1
            ORDER BY average_rating DESC, m.created ASC, m.id ASC
            LIMIT $2
            "#,
        )
        .bind(min_reviews as i64)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<MasjidId> = rows.iter().map(|row| row.id).collect();
        let mut reviews = group_reviews(self.find_reviews(&ids).await?);

        Ok(rows
            .into_iter()
            .map(|row| TopMasjid {
                reviews: reviews.remove(&row.id).unwrap_or_default(),
                id: row.id,
                photo: row.photo,
                name: row.name,
                slug: row.slug,
                average_rating: row.average_rating,
            })
            .collect())
    }
}
