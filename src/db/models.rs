use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

use crate::error::BookswapError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct Family {
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// Full user row, including the password digest. Never serialized to clients.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub hashed_password: String,
    pub is_active: bool,
    pub family_id: i64,
}

/// Public projection of [`User`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserRead {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub is_active: bool,
    pub family_id: i64,
}

impl From<User> for UserRead {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            is_active: u.is_active,
            family_id: u.family_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub grade: Option<i64>,
    pub isbn: Option<String>,
    pub owner_id: i64,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ExchangeStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ExchangeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ExchangeStatus::Pending => "pending",
            ExchangeStatus::Accepted => "accepted",
            ExchangeStatus::Rejected => "rejected",
        }
    }

    /// Only a pending exchange can be answered; accepted and rejected are terminal.
    pub fn can_transition_to(self, next: ExchangeStatus) -> bool {
        matches!(
            (self, next),
            (
                ExchangeStatus::Pending,
                ExchangeStatus::Accepted | ExchangeStatus::Rejected
            )
        )
    }
}

impl fmt::Display for ExchangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct Exchange {
    pub id: i64,
    pub proposer_family_id: i64,
    pub receiver_family_id: i64,
    pub offered_book_id: i64,
    pub requested_book_id: i64,
    pub status: ExchangeStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewFamily {
    pub name: String,
    pub email: String,
}

impl NewFamily {
    pub fn validate(&self) -> Result<(), BookswapError> {
        require_non_blank("name", &self.name)?;
        require_email(&self.email)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FamilyPatch {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl FamilyPatch {
    pub fn validate(&self) -> Result<(), BookswapError> {
        if let Some(name) = &self.name {
            require_non_blank("name", name)?;
        }
        if let Some(email) = &self.email {
            require_email(email)?;
        }
        Ok(())
    }
}

/// A user ready for insertion; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub hashed_password: String,
    pub family_id: i64,
}

/// Field changes for a user; `hashed_password` is filled in by the handler.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub hashed_password: Option<String>,
    pub is_active: Option<bool>,
    pub family_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub grade: Option<i64>,
    #[serde(default)]
    pub isbn: Option<String>,
    pub owner_id: i64,
}

impl NewBook {
    pub fn validate(&self) -> Result<(), BookswapError> {
        require_non_blank("title", &self.title)?;
        require_non_blank("author", &self.author)?;
        if let Some(isbn) = &self.isbn {
            require_non_blank("isbn", isbn)?;
        }
        Ok(())
    }
}

/// Partial book update. For `grade` and `isbn`, an explicit `null` clears the value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub grade: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub isbn: Option<Option<String>>,
    pub owner_id: Option<i64>,
}

impl BookPatch {
    pub fn validate(&self) -> Result<(), BookswapError> {
        if let Some(title) = &self.title {
            require_non_blank("title", title)?;
        }
        if let Some(author) = &self.author {
            require_non_blank("author", author)?;
        }
        if let Some(Some(isbn)) = &self.isbn {
            require_non_blank("isbn", isbn)?;
        }
        Ok(())
    }

    pub fn apply(self, book: &mut Book) {
        if let Some(title) = self.title {
            book.title = title;
        }
        if let Some(author) = self.author {
            book.author = author;
        }
        if let Some(grade) = self.grade {
            book.grade = grade;
        }
        if let Some(isbn) = self.isbn {
            book.isbn = isbn;
        }
        if let Some(owner_id) = self.owner_id {
            book.owner_id = owner_id;
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewExchange {
    pub proposer_family_id: i64,
    pub receiver_family_id: i64,
    pub offered_book_id: i64,
    pub requested_book_id: i64,
}

/// Distinguishes a missing field (`None`) from an explicit `null` (`Some(None)`).
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

pub(crate) fn require_non_blank(field: &str, value: &str) -> Result<(), BookswapError> {
    if value.trim().is_empty() {
        return Err(BookswapError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}

pub(crate) fn require_email(value: &str) -> Result<(), BookswapError> {
    let valid = value
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid {
        return Err(BookswapError::Validation(
            "email must be a valid address".to_string(),
        ));
    }
    Ok(())
}
