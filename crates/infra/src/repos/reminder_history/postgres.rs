use super::IReminderHistoryRepo;
use fee_reminder_domain::{
    HistoryQuery, HistoryStatus, Page, ReminderHistoryEntry, ReminderKind, ID,
};
use sqlx::{
    types::{Json, Uuid},
    FromRow, PgPool, Postgres, QueryBuilder,
};
use std::convert::TryFrom;
use tracing::error;

pub struct PostgresReminderHistoryRepo {
    pool: PgPool,
}

impl PostgresReminderHistoryRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ReminderHistoryRaw {
    entry_uid: Uuid,
    client_uid: Uuid,
    kind: String,
    channel: Option<String>,
    status: String,
    title: String,
    description: String,
    client_details: serde_json::Value,
    metadata: serde_json::Value,
    created: i64,
}

impl TryFrom<ReminderHistoryRaw> for ReminderHistoryEntry {
    type Error = anyhow::Error;

    fn try_from(raw: ReminderHistoryRaw) -> anyhow::Result<Self> {
        Ok(Self {
            id: raw.entry_uid.into(),
            client_id: raw.client_uid.into(),
            kind: raw.kind.parse().map_err(anyhow::Error::msg)?,
            channel: raw
                .channel
                .map(|c| c.parse().map_err(anyhow::Error::msg))
                .transpose()?,
            status: raw.status.parse().map_err(anyhow::Error::msg)?,
            title: raw.title,
            description: raw.description,
            client_details: serde_json::from_value(raw.client_details)?,
            metadata: serde_json::from_value(raw.metadata)?,
            created: raw.created,
        })
    }
}

#[derive(Debug, FromRow)]
struct CountRaw {
    total: i64,
}

/// Appends the `WHERE` clause for the query filters
fn push_filters<'a>(builder: &mut QueryBuilder<'a, Postgres>, query: &'a HistoryQuery) {
    builder.push(" WHERE TRUE");
    if let Some(client_id) = &query.client_id {
        builder.push(" AND h.client_uid = ").push_bind(client_id.inner_ref());
    }
    if let Some(status) = &query.status {
        builder.push(" AND h.status = ").push_bind(status.as_str());
    }
    if let Some(kind) = &query.kind {
        builder.push(" AND h.kind = ").push_bind(kind.as_str());
    }
    if let Some(channel) = &query.channel {
        builder.push(" AND h.channel = ").push_bind(channel.as_str());
    }
    if let Some(start_ts) = query.start_ts {
        builder.push(" AND h.created >= ").push_bind(start_ts);
    }
    if let Some(end_ts) = query.end_ts {
        builder.push(" AND h.created <= ").push_bind(end_ts);
    }
    if let Some(search) = &query.search {
        let needle = search.to_lowercase();
        builder.push(" AND (");
        let fields = [
            "h.title",
            "h.description",
            "h.client_details->>'name'",
            "h.client_details->>'email'",
            "h.client_details->>'phone'",
        ];
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                builder.push(" OR ");
            }
            builder
                .push(format!("strpos(lower({}), ", field))
                .push_bind(needle.clone())
                .push(") > 0");
        }
        builder.push(")");
    }
}

#[async_trait::async_trait]
impl IReminderHistoryRepo for PostgresReminderHistoryRepo {
    async fn insert(&self, entry: &ReminderHistoryEntry) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO reminder_history
            (entry_uid, client_uid, kind, channel, status, title, description, client_details, metadata, created)
            VALUES($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(entry.id.inner_ref())
        .bind(entry.client_id.inner_ref())
        .bind(entry.kind.as_str())
        .bind(entry.channel.map(|c| c.as_str()))
        .bind(entry.status.as_str())
        .bind(&entry.title)
        .bind(&entry.description)
        .bind(Json(&entry.client_details))
        .bind(Json(&entry.metadata))
        .bind(entry.created)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Unable to insert reminder history entry: {:?}. DB returned error: {:?}",
                entry, e
            );
            e
        })?;
        Ok(())
    }

    async fn find(&self, entry_id: &ID) -> anyhow::Result<Option<ReminderHistoryEntry>> {
        let raw = sqlx::query_as::<_, ReminderHistoryRaw>(
            r#"
            SELECT * FROM reminder_history AS h
            WHERE h.entry_uid = $1
            "#,
        )
        .bind(entry_id.inner_ref())
        .fetch_optional(&self.pool)
        .await?;
        raw.map(ReminderHistoryEntry::try_from).transpose()
    }

    async fn find_by_query(&self, query: &HistoryQuery) -> anyhow::Result<Page<ReminderHistoryEntry>> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) AS total FROM reminder_history AS h");
        push_filters(&mut count, query);
        let total = count
            .build_query_as::<CountRaw>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!(
                    "Unable to count reminder history for query: {:?}. DB returned error: {:?}",
                    query, e
                );
                e
            })?
            .total;

        let mut select = QueryBuilder::new("SELECT * FROM reminder_history AS h");
        push_filters(&mut select, query);
        select
            .push(" ORDER BY h.created DESC, h.seq DESC LIMIT ")
            .push_bind(query.per_page.max(0))
            .push(" OFFSET ")
            .push_bind(query.skip().max(0));
        let raws = select
            .build_query_as::<ReminderHistoryRaw>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!(
                    "Unable to query reminder history: {:?}. DB returned error: {:?}",
                    query, e
                );
                e
            })?;

        let items = raws
            .into_iter()
            .map(ReminderHistoryEntry::try_from)
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Page::new(items, total, query.page, query.per_page))
    }

    async fn exists_since(
        &self,
        client_id: &ID,
        kind: ReminderKind,
        status: HistoryStatus,
        since: i64,
    ) -> anyhow::Result<bool> {
        let count = sqlx::query_as::<_, CountRaw>(
            r#"
            SELECT COUNT(*) AS total FROM reminder_history AS h
            WHERE h.client_uid = $1 AND
            h.kind = $2 AND
            h.status = $3 AND
            h.created >= $4
            "#,
        )
        .bind(client_id.inner_ref())
        .bind(kind.as_str())
        .bind(status.as_str())
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        Ok(count.total > 0)
    }
}
