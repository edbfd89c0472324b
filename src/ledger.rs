use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use crate::error::{BookingError, Result};
use crate::models::Appointment;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS appointments (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        client TEXT NOT NULL,
        phone TEXT NOT NULL DEFAULT '',
        service TEXT NOT NULL,
        date TEXT NOT NULL,
        time TEXT NOT NULL,
        note TEXT,
        created_at TEXT NOT NULL
    )",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_appointments_slot ON appointments (date, time)",
];

const SELECT: &str = "SELECT id, client, phone, service, date, time, note, created_at FROM appointments";

/// Fields of an appointment before it has an id. Date and time are expected
/// in canonical form.
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub client: String,
    pub phone: String,
    pub service: String,
    pub date: String,
    pub time: String,
    pub note: Option<String>,
}

/// Replacement values for an update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct Changes {
    pub client: Option<String>,
    pub phone: Option<String>,
    pub service: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub note: Option<Option<String>>,
}

/// Persisted appointments. The (date, time) pair is unique at the storage
/// level, so concurrent inserts for the same slot cannot both succeed.
#[derive(Clone)]
pub struct Ledger {
    pool: SqlitePool,
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn conflict_or(err: sqlx::Error, date: &str, time: &str) -> BookingError {
    if is_unique_violation(&err) {
        BookingError::SlotConflict {
            date: date.to_string(),
            time: time.to_string(),
        }
    } else {
        BookingError::Database(err)
    }
}

impl Ledger {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        let ledger = Self { pool };
        ledger.init().await?;
        info!("Ledger: connected to {}", database_url);
        Ok(ledger)
    }

    /// A private in-memory database. A single connection keeps every query on
    /// the same database.
    #[cfg(test)]
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        let ledger = Self { pool };
        ledger.init().await?;
        Ok(ledger)
    }

    async fn init(&self) -> Result<()> {
        for stmt in SCHEMA {
            sqlx::query(stmt).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Insert a booking unless its (date, time) is already taken.
    pub async fn try_book(&self, new: NewAppointment) -> Result<Appointment> {
        let created_at = chrono::Utc::now().to_rfc3339();
        let result = sqlx::query(
            "INSERT INTO appointments (client, phone, service, date, time, note, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&new.client)
        .bind(&new.phone)
        .bind(&new.service)
        .bind(&new.date)
        .bind(&new.time)
        .bind(&new.note)
        .bind(&created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_or(e, &new.date, &new.time))?;

        let id = result.last_insert_rowid();
        debug!("Ledger: inserted appointment {} at {} {}", id, new.date, new.time);
        Ok(Appointment {
            id,
            client: new.client,
            phone: new.phone,
            service: new.service,
            date: new.date,
            time: new.time,
            note: new.note,
            created_at,
        })
    }

    pub async fn get(&self, id: i64) -> Result<Appointment> {
        sqlx::query_as::<_, Appointment>(&format!("{SELECT} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(BookingError::NotFound(id))
    }

    /// Apply `changes` to appointment `id` in a single statement. Moving onto a
    /// slot held by a different appointment fails with `SlotConflict`.
    pub async fn update(&self, id: i64, changes: Changes) -> Result<Appointment> {
        let keep_note = changes.note.is_none();
        let result = sqlx::query_as::<_, Appointment>(
            "UPDATE appointments
             SET client = COALESCE(?, client),
                 phone = COALESCE(?, phone),
                 service = COALESCE(?, service),
                 date = COALESCE(?, date),
                 time = COALESCE(?, time),
                 note = CASE WHEN ? THEN note ELSE ? END
             WHERE id = ?
             RETURNING id, client, phone, service, date, time, note, created_at",
        )
        .bind(&changes.client)
        .bind(&changes.phone)
        .bind(&changes.service)
        .bind(&changes.date)
        .bind(&changes.time)
        .bind(keep_note)
        .bind(changes.note.clone().flatten())
        .bind(id)
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(Some(appt)) => Ok(appt),
            Ok(None) => Err(BookingError::NotFound(id)),
            Err(e) if is_unique_violation(&e) => {
                let current = self.get(id).await?;
                Err(BookingError::SlotConflict {
                    date: changes.date.unwrap_or(current.date),
                    time: changes.time.unwrap_or(current.time),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Permanently remove appointment `id`, returning what was removed.
    pub async fn delete(&self, id: i64) -> Result<Appointment> {
        sqlx::query_as::<_, Appointment>(
            "DELETE FROM appointments WHERE id = ?
             RETURNING id, client, phone, service, date, time, note, created_at",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(BookingError::NotFound(id))
    }

    pub async fn list_all(&self) -> Result<Vec<Appointment>> {
        let rows = sqlx::query_as::<_, Appointment>(&format!("{SELECT} ORDER BY date, time, id"))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn booked_times(&self, date: &str) -> Result<Vec<String>> {
        let times = sqlx::query_scalar::<_, String>(
            "SELECT time FROM appointments WHERE date = ? ORDER BY time",
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await?;
        Ok(times)
    }
}
