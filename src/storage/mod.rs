/// Storage layer for persisting habit data
///
/// This module handles all database operations using SQLite. It provides
/// a clean interface for storing, listing and deleting habits.

pub mod sqlite;
pub mod migrations;

// Re-export the main storage types
pub use sqlite::*;

use serde::Deserialize;
use thiserror::Error;
use crate::domain::{Habit, HabitId, UserId};

/// Largest page a caller may ask for
pub const MAX_PAGE_SIZE: u32 = 100;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database connection error: {0}")]
    Connection(String),

    #[error("Database query error: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("Habit not found: {habit_id}")]
    HabitNotFound { habit_id: String },
}

/// One page of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    /// Build a page request, clamping out-of-range values
    pub fn new(page: Option<u32>, page_size: Option<u32>, default_size: u32) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: page_size.unwrap_or(default_size).clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }
}

/// Query-string form of a page request (`?page=2&page_size=20`)
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// Trait defining the storage interface for habits
///
/// This trait keeps the lifecycle code independent of SQLite so it can be
/// exercised against any backing store.
pub trait HabitStorage {
    /// Create a new habit
    fn create_habit(&self, habit: &Habit) -> Result<(), StorageError>;

    /// Get a habit by ID
    fn get_habit(&self, habit_id: &HabitId) -> Result<Habit, StorageError>;

    /// Get a habit by ID, None when it doesn't exist
    fn find_habit(&self, habit_id: &HabitId) -> Result<Option<Habit>, StorageError> {
        match self.get_habit(habit_id) {
            Ok(habit) => Ok(Some(habit)),
            Err(StorageError::HabitNotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Overwrite an existing habit
    fn update_habit(&self, habit: &Habit) -> Result<(), StorageError>;

    /// Delete a habit permanently
    fn delete_habit(&self, habit_id: &HabitId) -> Result<(), StorageError>;

    /// List one page of a user's habits
    fn list_habits_for_owner(
        &self,
        owner: UserId,
        page: PageRequest,
    ) -> Result<Vec<Habit>, StorageError>;

    /// Count all habits of a user
    fn count_habits_for_owner(&self, owner: UserId) -> Result<u64, StorageError>;

    /// List one page of public habits across all users
    fn list_public_habits(&self, page: PageRequest) -> Result<Vec<Habit>, StorageError>;

    /// Count all public habits
    fn count_public_habits(&self) -> Result<u64, StorageError>;

    /// Count habits whose related habit is the given one
    fn count_referencing(&self, habit_id: &HabitId) -> Result<u64, StorageError>;
}
