/// SQLite implementation of the habit storage interface
///
/// This module provides the concrete SQLite implementation for storing
/// and retrieving habits. It handles all SQL queries and row conversion.

use std::path::PathBuf;
use chrono::{DateTime, NaiveTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};

use crate::domain::{Habit, HabitId, UserId, Weekdays, TIME_FORMAT};
use crate::storage::{migrations, HabitStorage, PageRequest, StorageError};

/// Column list shared by every SELECT, in `row_to_habit` order
const HABIT_COLUMNS: &str = "id, owner_id, place, time, action, is_nice, related_id, prize,
    periodicity, duration, is_public, sunday, monday, tuesday, wednesday, thursday,
    friday, saturday, created_at, updated_at";

/// SQLite-based storage implementation
///
/// This struct holds a connection to the SQLite database and implements
/// all the storage operations defined in the HabitStorage trait.
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Create a new SQLite storage instance
    ///
    /// This opens the database file and runs any necessary migrations
    /// to ensure the schema is up to date.
    pub fn new(db_path: PathBuf) -> Result<Self, StorageError> {
        let conn = Connection::open(&db_path)
            .map_err(|e| StorageError::Connection(format!("Failed to open database: {}", e)))?;

        let storage = Self::with_connection(conn)?;
        tracing::info!("SQLite storage initialized at: {:?}", db_path);
        Ok(storage)
    }

    /// Create a storage instance backed by a private in-memory database
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StorageError::Connection(format!("Failed to open database: {}", e)))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        // Enable foreign key constraints
        conn.execute("PRAGMA foreign_keys = ON", [])
            .map_err(|e| StorageError::Connection(format!("Failed to enable foreign keys: {}", e)))?;

        migrations::initialize_database(&conn)?;

        Ok(Self { conn })
    }

    /// Fixed-width timestamps so text ordering matches time ordering
    fn timestamp(value: &DateTime<Utc>) -> String {
        value.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
    }

    fn parse_timestamp(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| Self::conversion_error(idx, e))
    }

    /// Convert one row selected with HABIT_COLUMNS into a Habit
    fn row_to_habit(row: &Row<'_>) -> rusqlite::Result<Habit> {
        let id_str: String = row.get(0)?;
        let id = HabitId::from_string(&id_str).map_err(|e| Self::conversion_error(0, e))?;

        let time_str: String = row.get(3)?;
        let time = NaiveTime::parse_from_str(&time_str, TIME_FORMAT)
            .map_err(|e| Self::conversion_error(3, e))?;

        let related_str: Option<String> = row.get(6)?;
        let related = related_str
            .map(|s| HabitId::from_string(&s))
            .transpose()
            .map_err(|e| Self::conversion_error(6, e))?;

        let created_at_str: String = row.get(18)?;
        let updated_at_str: String = row.get(19)?;

        Ok(Habit {
            id,
            owner: UserId(row.get(1)?),
            place: row.get(2)?,
            time,
            action: row.get(4)?,
            is_nice: row.get(5)?,
            related,
            prize: row.get(7)?,
            periodicity: row.get(8)?,
            duration: row.get(9)?,
            is_public: row.get(10)?,
            weekdays: Weekdays::from_flags([
                row.get(11)?,
                row.get(12)?,
                row.get(13)?,
                row.get(14)?,
                row.get(15)?,
                row.get(16)?,
                row.get(17)?,
            ]),
            created_at: Self::parse_timestamp(18, &created_at_str)?,
            updated_at: Self::parse_timestamp(19, &updated_at_str)?,
        })
    }

    /// Run a paged SELECT and collect the habits
    fn query_page(
        &self,
        filter: &str,
        owner: Option<UserId>,
        page: PageRequest,
    ) -> Result<Vec<Habit>, StorageError> {
        let sql = format!(
            "SELECT {} FROM habits WHERE {} ORDER BY created_at ASC, rowid ASC LIMIT ?1 OFFSET ?2",
            HABIT_COLUMNS, filter
        );
        let limit = i64::from(page.page_size);
        let offset = i64::try_from(page.offset()).unwrap_or(i64::MAX);

        let mut stmt = self.conn.prepare(&sql)?;
        let habit_iter = match owner {
            Some(owner) => stmt.query_map(params![limit, offset, owner.0], Self::row_to_habit)?,
            None => stmt.query_map(params![limit, offset], Self::row_to_habit)?,
        };

        let mut habits = Vec::new();
        for habit in habit_iter {
            habits.push(habit?);
        }
        Ok(habits)
    }
}

impl HabitStorage for SqliteStorage {
    /// Create a new habit in the database
    fn create_habit(&self, habit: &Habit) -> Result<(), StorageError> {
        let [sunday, monday, tuesday, wednesday, thursday, friday, saturday] =
            habit.weekdays.flags();

        self.conn.execute(
            "INSERT INTO habits (
                id, owner_id, place, time, action, is_nice, related_id, prize,
                periodicity, duration, is_public, sunday, monday, tuesday, wednesday,
                thursday, friday, saturday, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                      ?16, ?17, ?18, ?19, ?20)",
            params![
                habit.id.to_string(),
                habit.owner.0,
                habit.place,
                habit.time_display(),
                habit.action,
                habit.is_nice,
                habit.related.as_ref().map(|id| id.to_string()),
                habit.prize,
                habit.periodicity,
                habit.duration,
                habit.is_public,
                sunday,
                monday,
                tuesday,
                wednesday,
                thursday,
                friday,
                saturday,
                Self::timestamp(&habit.created_at),
                Self::timestamp(&habit.updated_at),
            ],
        )?;

        tracing::debug!("Created habit: {} ({})", habit.action, habit.id);
        Ok(())
    }

    /// Get a habit by its ID
    fn get_habit(&self, habit_id: &HabitId) -> Result<Habit, StorageError> {
        let sql = format!("SELECT {} FROM habits WHERE id = ?1", HABIT_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;

        match stmt.query_row(params![habit_id.to_string()], Self::row_to_habit) {
            Ok(habit) => Ok(habit),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(StorageError::HabitNotFound {
                habit_id: habit_id.to_string(),
            }),
            Err(e) => Err(StorageError::Query(e)),
        }
    }

    /// Overwrite an existing habit; owner and creation time are left alone
    fn update_habit(&self, habit: &Habit) -> Result<(), StorageError> {
        let [sunday, monday, tuesday, wednesday, thursday, friday, saturday] =
            habit.weekdays.flags();

        let rows_affected = self.conn.execute(
            "UPDATE habits SET
                place = ?2,
                time = ?3,
                action = ?4,
                is_nice = ?5,
                related_id = ?6,
                prize = ?7,
                periodicity = ?8,
                duration = ?9,
                is_public = ?10,
                sunday = ?11,
                monday = ?12,
                tuesday = ?13,
                wednesday = ?14,
                thursday = ?15,
                friday = ?16,
                saturday = ?17,
                updated_at = ?18
             WHERE id = ?1",
            params![
                habit.id.to_string(),
                habit.place,
                habit.time_display(),
                habit.action,
                habit.is_nice,
                habit.related.as_ref().map(|id| id.to_string()),
                habit.prize,
                habit.periodicity,
                habit.duration,
                habit.is_public,
                sunday,
                monday,
                tuesday,
                wednesday,
                thursday,
                friday,
                saturday,
                Self::timestamp(&habit.updated_at),
            ],
        )?;

        if rows_affected == 0 {
            return Err(StorageError::HabitNotFound {
                habit_id: habit.id.to_string(),
            });
        }

        tracing::debug!("Updated habit: {} ({})", habit.action, habit.id);
        Ok(())
    }

    /// Delete a habit permanently
    fn delete_habit(&self, habit_id: &HabitId) -> Result<(), StorageError> {
        let rows_affected = self.conn.execute(
            "DELETE FROM habits WHERE id = ?1",
            params![habit_id.to_string()],
        )?;

        if rows_affected == 0 {
            return Err(StorageError::HabitNotFound {
                habit_id: habit_id.to_string(),
            });
        }

        tracing::debug!("Deleted habit: {}", habit_id);
        Ok(())
    }

    fn list_habits_for_owner(
        &self,
        owner: UserId,
        page: PageRequest,
    ) -> Result<Vec<Habit>, StorageError> {
        self.query_page("owner_id = ?3", Some(owner), page)
    }

    fn count_habits_for_owner(&self, owner: UserId) -> Result<u64, StorageError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM habits WHERE owner_id = ?1",
            params![owner.0],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }

    fn list_public_habits(&self, page: PageRequest) -> Result<Vec<Habit>, StorageError> {
        self.query_page("is_public = 1", None, page)
    }

    fn count_public_habits(&self) -> Result<u64, StorageError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM habits WHERE is_public = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }

    fn count_referencing(&self, habit_id: &HabitId) -> Result<u64, StorageError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM habits WHERE related_id = ?1 AND id <> ?1",
            params![habit_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }
}
