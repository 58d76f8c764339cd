use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::RecordSource;
use crate::error::Result;
use crate::models::{Collection, MediaFile, Page, Record, RecordFilter, SetHandle, Site, Values};

const RECORD_COLUMNS: &str =
    "id, is_public, created_at, modified_at, term_values, collection_ids, site_ids, media";

#[derive(sqlx::FromRow)]
struct RecordRow {
    id: i64,
    is_public: bool,
    created_at: DateTime<Utc>,
    modified_at: Option<DateTime<Utc>>,
    term_values: Json<Values>,
    collection_ids: Vec<i64>,
    site_ids: Vec<i64>,
    media: Json<Vec<MediaFile>>,
}

impl From<RecordRow> for Record {
    fn from(row: RecordRow) -> Self {
        Record {
            id: row.id,
            is_public: row.is_public,
            created: row.created_at,
            modified: row.modified_at,
            values: row.term_values.0,
            collections: row.collection_ids,
            sites: row.site_ids,
            media: row.media.0,
        }
    }
}

/// Record source reading the `records`, `collections` and `sites` tables.
#[derive(Clone)]
pub struct PgRecordSource {
    pool: PgPool,
}

impl PgRecordSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert or replace a record.
    #[tracing::instrument(skip(self, record), fields(record_id = record.id))]
    pub async fn upsert(&self, record: &Record) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO records (id, is_public, created_at, modified_at, term_values, collection_ids, site_ids, media)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                is_public = EXCLUDED.is_public,
                created_at = EXCLUDED.created_at,
                modified_at = EXCLUDED.modified_at,
                term_values = EXCLUDED.term_values,
                collection_ids = EXCLUDED.collection_ids,
                site_ids = EXCLUDED.site_ids,
                media = EXCLUDED.media
            "#,
        )
        .bind(record.id)
        .bind(record.is_public)
        .bind(record.created)
        .bind(record.modified)
        .bind(Json(&record.values))
        .bind(&record.collections)
        .bind(&record.sites)
        .bind(Json(&record.media))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Append the `WHERE` clause for a list filter.
fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &RecordFilter) {
    builder.push(" WHERE is_public");

    if let Some(site) = filter.site {
        builder.push(" AND ").push_bind(site).push(" = ANY(site_ids)");
    }

    match &filter.set {
        Some(SetHandle::Collection(id)) => {
            builder.push(" AND ").push_bind(*id).push(" = ANY(collection_ids)");
        }
        Some(SetHandle::Site(id)) => {
            builder.push(" AND ").push_bind(*id).push(" = ANY(site_ids)");
        }
        Some(SetHandle::Query { term, value }) => {
            builder
                .push(" AND term_values -> ")
                .push_bind(term.clone())
                .push(" ? ")
                .push_bind(value.clone());
        }
        None => {}
    }

    if let Some(lower) = filter.dates.lower() {
        builder
            .push(" AND COALESCE(modified_at, created_at) >= ")
            .push_bind(lower);
    }
    if let Some(upper) = filter.dates.upper() {
        builder
            .push(" AND COALESCE(modified_at, created_at) < ")
            .push_bind(upper);
    }
}

#[async_trait]
impl RecordSource for PgRecordSource {
    async fn find_by_id(&self, id: i64) -> Result<Option<Record>> {
        let row = sqlx::query_as::<_, RecordRow>(&format!(
            "SELECT {RECORD_COLUMNS} FROM records WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Record::from))
    }

    async fn find_by_value(
        &self,
        term: &str,
        value: &str,
        site: Option<i64>,
    ) -> Result<Option<Record>> {
        let row = sqlx::query_as::<_, RecordRow>(&format!(
            r#"
            SELECT {RECORD_COLUMNS} FROM records
            WHERE is_public
              AND term_values -> $1 ? $2
              AND ($3::BIGINT IS NULL OR $3 = ANY(site_ids))
            ORDER BY id
            LIMIT 1
            "#
        ))
        .bind(term)
        .bind(value)
        .bind(site)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Record::from))
    }

    #[tracing::instrument(skip(self, filter))]
    async fn query(&self, filter: &RecordFilter, offset: u64, limit: u64) -> Result<Page<Record>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM records");
        push_filter(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {RECORD_COLUMNS} FROM records"));
        push_filter(&mut select, filter);
        select
            .push(" ORDER BY id ASC LIMIT ")
            .push_bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .push(" OFFSET ")
            .push_bind(i64::try_from(offset).unwrap_or(i64::MAX));

        let rows = select
            .build_query_as::<RecordRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Page {
            rows: rows.into_iter().map(Record::from).collect(),
            total: u64::try_from(total).unwrap_or(0),
        })
    }

    async fn collections(&self) -> Result<Vec<Collection>> {
        let collections = sqlx::query_as::<_, Collection>(
            "SELECT id, title, description FROM collections ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(collections)
    }

    async fn sites(&self) -> Result<Vec<Site>> {
        let sites =
            sqlx::query_as::<_, Site>("SELECT id, slug, title, summary FROM sites ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
        Ok(sites)
    }
}
