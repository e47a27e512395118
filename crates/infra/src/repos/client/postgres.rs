use super::IClientRepo;
use chrono::NaiveDate;
use fee_reminder_domain::{Client, ReminderPreferences, ID};
use sqlx::{types::Uuid, FromRow, PgPool};
use std::convert::TryFrom;
use tracing::error;

pub struct PostgresClientRepo {
    pool: PgPool,
}

impl PostgresClientRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ClientRaw {
    client_uid: Uuid,
    name: String,
    email: String,
    phone: String,
    fee_amount: f64,
    fee_due_date: NaiveDate,
    membership_status: String,
    last_reminder_sent: Option<i64>,
    reminder_email: bool,
    reminder_sms: bool,
}

impl TryFrom<ClientRaw> for Client {
    type Error = anyhow::Error;

    fn try_from(raw: ClientRaw) -> anyhow::Result<Self> {
        Ok(Self {
            id: raw.client_uid.into(),
            name: raw.name,
            email: raw.email,
            phone: raw.phone,
            fee_amount: raw.fee_amount,
            fee_due_date: raw.fee_due_date,
            membership_status: raw
                .membership_status
                .parse()
                .map_err(anyhow::Error::msg)?,
            last_reminder_sent: raw.last_reminder_sent,
            reminder_preferences: ReminderPreferences {
                email: raw.reminder_email,
                sms: raw.reminder_sms,
            },
        })
    }
}

fn into_clients(raws: Vec<ClientRaw>) -> anyhow::Result<Vec<Client>> {
    raws.into_iter().map(Client::try_from).collect()
}

#[async_trait::async_trait]
impl IClientRepo for PostgresClientRepo {
    async fn insert(&self, client: &Client) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO clients
            (client_uid, name, email, phone, fee_amount, fee_due_date, membership_status, last_reminder_sent, reminder_email, reminder_sms)
            VALUES($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(client.id.inner_ref())
        .bind(&client.name)
        .bind(&client.email)
        .bind(&client.phone)
        .bind(client.fee_amount)
        .bind(client.fee_due_date)
        .bind(client.membership_status.as_str())
        .bind(client.last_reminder_sent)
        .bind(client.reminder_preferences.email)
        .bind(client.reminder_preferences.sms)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Unable to insert client: {:?}. DB returned error: {:?}",
                client, e
            );
            e
        })?;
        Ok(())
    }

    async fn save(&self, client: &Client) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE clients
            SET name = $2,
            email = $3,
            phone = $4,
            fee_amount = $5,
            fee_due_date = $6,
            membership_status = $7,
            last_reminder_sent = $8,
            reminder_email = $9,
            reminder_sms = $10
            WHERE client_uid = $1
            "#,
        )
        .bind(client.id.inner_ref())
        .bind(&client.name)
        .bind(&client.email)
        .bind(&client.phone)
        .bind(client.fee_amount)
        .bind(client.fee_due_date)
        .bind(client.membership_status.as_str())
        .bind(client.last_reminder_sent)
        .bind(client.reminder_preferences.email)
        .bind(client.reminder_preferences.sms)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Unable to save client: {:?}. DB returned error: {:?}",
                client, e
            );
            e
        })?;
        Ok(())
    }

    async fn find(&self, client_id: &ID) -> anyhow::Result<Option<Client>> {
        let raw = sqlx::query_as::<_, ClientRaw>(
            r#"
            SELECT * FROM clients AS c
            WHERE c.client_uid = $1
            "#,
        )
        .bind(client_id.inner_ref())
        .fetch_optional(&self.pool)
        .await?;
        raw.map(Client::try_from).transpose()
    }

    async fn delete(&self, client_id: &ID) -> anyhow::Result<Option<Client>> {
        let raw = sqlx::query_as::<_, ClientRaw>(
            r#"
            DELETE FROM clients AS c
            WHERE c.client_uid = $1
            RETURNING *
            "#,
        )
        .bind(client_id.inner_ref())
        .fetch_optional(&self.pool)
        .await?;
        raw.map(Client::try_from).transpose()
    }

    async fn find_active_with_due_date(&self) -> anyhow::Result<Vec<Client>> {
        let raws = sqlx::query_as::<_, ClientRaw>(
            r#"
            SELECT * FROM clients AS c
            WHERE c.membership_status = 'Active'
            AND c.fee_due_date IS NOT NULL
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Unable to query active clients. DB returned error: {:?}", e);
            e
        })?;
        into_clients(raws)
    }

    async fn update_last_reminder_sent(&self, client_id: &ID, timestamp: i64) -> anyhow::Result<()> {
        let res = sqlx::query(
            r#"
            UPDATE clients
            SET last_reminder_sent = $2
            WHERE client_uid = $1
            "#,
        )
        .bind(client_id.inner_ref())
        .bind(timestamp)
        .execute(&self.pool)
        .await?;
        if res.rows_affected() == 0 {
            return Err(anyhow::Error::msg(format!("Client {} not found", client_id)));
        }
        Ok(())
    }
}
