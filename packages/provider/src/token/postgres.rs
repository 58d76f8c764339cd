use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;

use super::{NewToken, ResumptionToken, TokenStore};
use crate::error::{ProviderError, Result};
use crate::protocol::Verb;

#[derive(sqlx::FromRow)]
struct TokenRow {
    id: String,
    verb: String,
    metadata_prefix: String,
    page_cursor: i64,
    set_spec: Option<String>,
    from_date: Option<String>,
    until_date: Option<String>,
    expiration: DateTime<Utc>,
}

impl TryFrom<TokenRow> for ResumptionToken {
    type Error = ProviderError;

    fn try_from(row: TokenRow) -> Result<Self> {
        let verb = Verb::from_str(&row.verb).map_err(|_| ProviderError::CorruptToken {
            id: row.id.clone(),
            reason: format!("unknown verb '{}'", row.verb),
        })?;
        let cursor = u64::try_from(row.page_cursor).map_err(|_| ProviderError::CorruptToken {
            id: row.id.clone(),
            reason: format!("negative cursor {}", row.page_cursor),
        })?;

        Ok(ResumptionToken {
            id: row.id,
            verb,
            metadata_prefix: row.metadata_prefix,
            cursor,
            set: row.set_spec,
            from: row.from_date,
            until: row.until_date,
            expiration: row.expiration,
        })
    }
}

/// Token store backed by the `resumption_tokens` table.
///
/// Creation is a single insert and resolution a single point lookup, so
/// concurrent harvesters never contend on a token.
#[derive(Clone)]
pub struct PgTokenStore {
    pool: PgPool,
}

impl PgTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenStore for PgTokenStore {
    #[tracing::instrument(skip(self, token), fields(verb = %token.verb, cursor = token.cursor))]
    async fn create(&self, token: NewToken, ttl: Duration) -> Result<ResumptionToken> {
        let token = token.mint(Utc::now(), ttl)?;
        let cursor = i64::try_from(token.cursor).map_err(|_| ProviderError::CorruptToken {
            id: token.id.clone(),
            reason: format!("cursor {} out of range", token.cursor),
        })?;

        sqlx::query(
            r#"
            INSERT INTO resumption_tokens
                (id, verb, metadata_prefix, page_cursor, set_spec, from_date, until_date, expiration)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(&token.id)
        .bind(token.verb.as_ref())
        .bind(&token.metadata_prefix)
        .bind(cursor)
        .bind(&token.set)
        .bind(&token.from)
        .bind(&token.until)
        .bind(token.expiration)
        .execute(&self.pool)
        .await?;

        tracing::info!(token = %token.id, expiration = %token.expiration, "resumption token created");
        Ok(token)
    }

    #[tracing::instrument(skip(self))]
    async fn resolve(&self, id: &str) -> Result<Option<ResumptionToken>> {
        let row = sqlx::query_as::<_, TokenRow>(
            r#"
            SELECT id, verb, metadata_prefix, page_cursor, set_spec, from_date, until_date, expiration
            FROM resumption_tokens
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ResumptionToken::try_from).transpose()
    }

    #[tracing::instrument(skip(self))]
    async fn purge_expired(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM resumption_tokens WHERE expiration <= now()")
            .execute(&self.pool)
            .await?;

        let purged = result.rows_affected();
        if purged > 0 {
            tracing::debug!(purged, "expired resumption tokens purged");
        }
        Ok(purged)
    }
}
