//! PostgreSQL implementation of the persistence layer.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sha2::{Digest, Sha256};
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use super::{EventStore, InsertOutcome, ProfileStore, StoreError, TicketStore};
use crate::domain::{
    Event, EventDetails, EventId, Profile, Role, Ticket, TicketId, TicketStatus, UserId,
};

type ProfileRow = (Uuid, String, String, String, DateTime<Utc>);
type EventRow = (
    Uuid,
    String,
    NaiveDate,
    String,
    i64,
    String,
    Uuid,
    bool,
    DateTime<Utc>,
);
type TicketRow = (
    Uuid,
    Uuid,
    Uuid,
    String,
    String,
    String,
    DateTime<Utc>,
    String,
);

const EVENT_COLUMNS: &str = "id, name, event_date, location, price, description, \
                             organizer_id, is_published, created_at";
const TICKET_COLUMNS: &str = "id, event_id, user_id, participant_name, participant_email, \
                              status, created_at, code";

/// PostgreSQL-backed stores using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new store over the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Applies pending migrations from `migrations/`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!()
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))
    }
}

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn price_to_db(price: u64) -> Result<i64, StoreError> {
    i64::try_from(price).map_err(|_| StoreError::Corrupt(format!("price out of range: {price}")))
}

fn profile_from_row(
    (user_id, email, display_name, role, created_at): ProfileRow,
) -> Result<Profile, StoreError> {
    let role = role
        .parse::<Role>()
        .map_err(|e| StoreError::Corrupt(e.to_string()))?;
    Ok(Profile {
        user_id: UserId::from_uuid(user_id),
        email,
        display_name,
        role,
        created_at,
    })
}

fn event_from_row(row: EventRow) -> Result<Event, StoreError> {
    let (id, name, date, location, price, description, organizer_id, is_published, created_at) =
        row;
    let price = u64::try_from(price)
        .map_err(|_| StoreError::Corrupt(format!("negative price on event {id}")))?;
    Ok(Event {
        id: EventId::from_uuid(id),
        details: EventDetails {
            name,
            date,
            location,
            price,
            description,
        },
        organizer_id: UserId::from_uuid(organizer_id),
        is_published,
        created_at,
    })
}

fn ticket_from_row(row: TicketRow) -> Result<Ticket, StoreError> {
    let (id, event_id, user_id, participant_name, participant_email, status, created_at, code) =
        row;
    let status = status
        .parse::<TicketStatus>()
        .map_err(|e| StoreError::Corrupt(e.to_string()))?;
    Ok(Ticket {
        id: TicketId::from_uuid(id),
        event_id: EventId::from_uuid(event_id),
        user_id: UserId::from_uuid(user_id),
        participant_name,
        participant_email,
        status,
        created_at,
        code,
    })
}

/// Advisory lock key serialising ticket issuance for one
/// (event, participant) pair.
fn ticket_lock_key(event_id: EventId, user_id: UserId) -> i64 {
    let mut hasher = Sha256::new();
    hasher.update(event_id.as_uuid().as_bytes());
    hasher.update(user_id.as_uuid().as_bytes());
    let digest = hasher.finalize();
    digest
        .first_chunk::<8>()
        .map_or(0, |bytes| i64::from_be_bytes(*bytes))
}

fn insert_ticket_query(ticket: &Ticket) -> Query<'_, Postgres, PgArguments> {
    sqlx::query(
        "INSERT INTO tickets (id, event_id, user_id, participant_name, participant_email, \
         status, created_at, code) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(*ticket.id.as_uuid())
    .bind(*ticket.event_id.as_uuid())
    .bind(*ticket.user_id.as_uuid())
    .bind(&ticket.participant_name)
    .bind(&ticket.participant_email)
    .bind(ticket.status.as_str())
    .bind(ticket.created_at)
    .bind(&ticket.code)
}

fn not_found(collection: &'static str, id: impl ToString) -> StoreError {
    StoreError::NotFound {
        collection,
        id: id.to_string(),
    }
}

#[async_trait]
impl ProfileStore for PostgresStore {
    async fn get(&self, user_id: UserId) -> Result<Option<Profile>, StoreError> {
        sqlx::query_as::<_, ProfileRow>(
            "SELECT user_id, email, display_name, role, created_at FROM profiles \
             WHERE user_id = $1",
        )
        .bind(*user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?
        .map(profile_from_row)
        .transpose()
    }

    async fn insert(&self, profile: &Profile) -> Result<(), StoreError> {
        let result = sqlx::query(
            "INSERT INTO profiles (user_id, email, display_name, role, created_at) \
             VALUES ($1, $2, $3, $4, $5) ON CONFLICT (user_id) DO NOTHING",
        )
        .bind(*profile.user_id.as_uuid())
        .bind(&profile.email)
        .bind(&profile.display_name)
        .bind(profile.role.as_str())
        .bind(profile.created_at)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::AlreadyExists {
                collection: "profiles",
                id: profile.user_id.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl EventStore for PostgresStore {
    async fn get(&self, id: EventId) -> Result<Option<Event>, StoreError> {
        sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"
        ))
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?
        .map(event_from_row)
        .transpose()
    }

    async fn insert(&self, event: &Event) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO events (id, name, event_date, location, price, description, \
             organizer_id, is_published, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(*event.id.as_uuid())
        .bind(&event.details.name)
        .bind(event.details.date)
        .bind(&event.details.location)
        .bind(price_to_db(event.details.price)?)
        .bind(&event.details.description)
        .bind(*event.organizer_id.as_uuid())
        .bind(event.is_published)
        .bind(event.created_at)
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(())
    }

    async fn find_by_organizer(&self, organizer_id: UserId) -> Result<Vec<Event>, StoreError> {
        sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE organizer_id = $1"
        ))
        .bind(*organizer_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?
        .into_iter()
        .map(event_from_row)
        .collect()
    }

    async fn find_by_published(&self, is_published: bool) -> Result<Vec<Event>, StoreError> {
        sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE is_published = $1"
        ))
        .bind(is_published)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?
        .into_iter()
        .map(event_from_row)
        .collect()
    }

    async fn update_details(
        &self,
        id: EventId,
        details: &EventDetails,
    ) -> Result<Event, StoreError> {
        sqlx::query_as::<_, EventRow>(&format!(
            "UPDATE events SET name = $2, event_date = $3, location = $4, price = $5, \
             description = $6 WHERE id = $1 RETURNING {EVENT_COLUMNS}"
        ))
        .bind(*id.as_uuid())
        .bind(&details.name)
        .bind(details.date)
        .bind(&details.location)
        .bind(price_to_db(details.price)?)
        .bind(&details.description)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?
        .map(event_from_row)
        .transpose()?
        .ok_or_else(|| not_found("events", id))
    }

    async fn set_published(&self, id: EventId, is_published: bool) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE events SET is_published = $2 WHERE id = $1")
            .bind(*id.as_uuid())
            .bind(is_published)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        if result.rows_affected() == 0 {
            return Err(not_found("events", id));
        }
        Ok(())
    }

    async fn delete(&self, id: EventId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        if result.rows_affected() == 0 {
            return Err(not_found("events", id));
        }
        Ok(())
    }
}

#[async_trait]
impl TicketStore for PostgresStore {
    async fn get(&self, id: TicketId) -> Result<Option<Ticket>, StoreError> {
        sqlx::query_as::<_, TicketRow>(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE id = $1"
        ))
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?
        .map(ticket_from_row)
        .transpose()
    }

    async fn find_by_participant_and_event(
        &self,
        user_id: UserId,
        event_id: EventId,
    ) -> Result<Option<Ticket>, StoreError> {
        sqlx::query_as::<_, TicketRow>(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE user_id = $1 AND event_id = $2 LIMIT 1"
        ))
        .bind(*user_id.as_uuid())
        .bind(*event_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?
        .map(ticket_from_row)
        .transpose()
    }

    async fn find_by_participant(&self, user_id: UserId) -> Result<Vec<Ticket>, StoreError> {
        sqlx::query_as::<_, TicketRow>(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE user_id = $1"
        ))
        .bind(*user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?
        .into_iter()
        .map(ticket_from_row)
        .collect()
    }

    async fn find_by_event(&self, event_id: EventId) -> Result<Vec<Ticket>, StoreError> {
        sqlx::query_as::<_, TicketRow>(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE event_id = $1"
        ))
        .bind(*event_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?
        .into_iter()
        .map(ticket_from_row)
        .collect()
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Ticket>, StoreError> {
        if code.is_empty() {
            return Ok(None);
        }
        sqlx::query_as::<_, TicketRow>(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE code = $1 LIMIT 1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?
        .map(ticket_from_row)
        .transpose()
    }

    async fn insert(&self, ticket: &Ticket) -> Result<(), StoreError> {
        insert_ticket_query(ticket)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn insert_unique(&self, ticket: &Ticket) -> Result<InsertOutcome, StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(ticket_lock_key(ticket.event_id, ticket.user_id))
            .execute(&mut *tx)
            .await
            .map_err(backend)?;

        let existing = sqlx::query_as::<_, TicketRow>(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE user_id = $1 AND event_id = $2 \
             ORDER BY created_at LIMIT 1"
        ))
        .bind(*ticket.user_id.as_uuid())
        .bind(*ticket.event_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(backend)?;

        let outcome = match existing {
            Some(row) => InsertOutcome::Conflict(ticket_from_row(row)?),
            None => {
                insert_ticket_query(ticket)
                    .execute(&mut *tx)
                    .await
                    .map_err(backend)?;
                InsertOutcome::Inserted(ticket.clone())
            }
        };
        tx.commit().await.map_err(backend)?;
        Ok(outcome)
    }

    async fn set_code(&self, id: TicketId, code: &str) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE tickets SET code = $2 WHERE id = $1")
            .bind(*id.as_uuid())
            .bind(code)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        if result.rows_affected() == 0 {
            return Err(not_found("tickets", id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrupt_role_is_reported() {
        let row: ProfileRow = (
            Uuid::new_v4(),
            "a@b.c".to_string(),
            "A".to_string(),
            "admin".to_string(),
            Utc::now(),
        );
        assert!(matches!(profile_from_row(row), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn negative_price_is_corrupt() {
        let row: EventRow = (
            Uuid::new_v4(),
            "Gig".to_string(),
            NaiveDate::MIN,
            "Bali".to_string(),
            -1,
            String::new(),
            Uuid::new_v4(),
            false,
            Utc::now(),
        );
        assert!(matches!(event_from_row(row), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn ticket_lock_key_is_per_pair() {
        let (event, user) = (EventId::new(), UserId::new());
        assert_eq!(ticket_lock_key(event, user), ticket_lock_key(event, user));
        assert_ne!(ticket_lock_key(event, user), ticket_lock_key(event, UserId::new()));
        assert_ne!(ticket_lock_key(event, user), ticket_lock_key(EventId::new(), user));

        let same = Uuid::new_v4();
        assert_ne!(
            ticket_lock_key(EventId::from_uuid(same), UserId::from_uuid(Uuid::nil())),
            ticket_lock_key(EventId::from_uuid(Uuid::nil()), UserId::from_uuid(same)),
        );
    }

    #[test]
    fn huge_price_does_not_fit_the_column() {
        assert!(price_to_db(u64::MAX).is_err());
        assert_eq!(price_to_db(50_000).ok(), Some(50_000));
    }
}
