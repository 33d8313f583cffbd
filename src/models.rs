use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorName(String);

impl AuthorName {
    pub fn new(raw: &str) -> Result<Self, AuthorNameEmptyError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Err(AuthorNameEmptyError)
        } else {
            Ok(Self(trimmed.into()))
        }
    }

    pub fn new_unchecked(raw: &str) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AuthorName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Error, Debug)]
#[error("Author name cannot be empty")]
pub struct AuthorNameEmptyError;

/// The mutable part of an author: everything an update is allowed to replace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorDetails {
    first_name: AuthorName,
    last_name: AuthorName,
    birth_date: Option<NaiveDate>,
    nationality: Option<String>,
}

impl AuthorDetails {
    pub const fn new(
        first_name: AuthorName,
        last_name: AuthorName,
        birth_date: Option<NaiveDate>,
        nationality: Option<String>,
    ) -> Self {
        Self {
            first_name,
            last_name,
            birth_date,
            nationality,
        }
    }

    pub const fn first_name(&self) -> &AuthorName {
        &self.first_name
    }

    pub const fn last_name(&self) -> &AuthorName {
        &self.last_name
    }

    pub const fn birth_date(&self) -> Option<NaiveDate> {
        self.birth_date
    }

    pub fn nationality(&self) -> Option<&str> {
        self.nationality.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    id: i64,
    details: AuthorDetails,
    created_at: NaiveDateTime,
}

impl Author {
    pub const fn new(id: i64, details: AuthorDetails, created_at: NaiveDateTime) -> Self {
        Self {
            id,
            details,
            created_at,
        }
    }

    pub const fn id(&self) -> i64 {
        self.id
    }

    pub const fn details(&self) -> &AuthorDetails {
        &self.details
    }

    pub const fn created_at(&self) -> NaiveDateTime {
        self.created_at
    }
}

#[derive(Error, Debug)]
#[error(transparent)]
pub struct FindAllAuthorsError(#[from] pub anyhow::Error);

#[derive(Debug)]
pub struct FindAuthorRequest {
    id: i64,
}

impl FindAuthorRequest {
    pub const fn new(id: i64) -> Self {
        Self { id }
    }

    pub const fn id(&self) -> i64 {
        self.id
    }
}

/// Absence is reported as `Ok(None)`, so only unexpected failures end up here.
#[derive(Error, Debug)]
#[error(transparent)]
pub struct FindAuthorError(#[from] pub anyhow::Error);

/// Persists an author. Without an id a new row is created; with an id the
/// mutable fields of that row are overwritten.
#[derive(Debug)]
pub struct SaveAuthorRequest {
    id: Option<i64>,
    details: AuthorDetails,
}

impl SaveAuthorRequest {
    pub const fn new(details: AuthorDetails) -> Self {
        Self { id: None, details }
    }

    pub const fn existing(id: i64, details: AuthorDetails) -> Self {
        Self {
            id: Some(id),
            details,
        }
    }

    pub const fn id(&self) -> Option<i64> {
        self.id
    }

    pub const fn details(&self) -> &AuthorDetails {
        &self.details
    }
}

#[derive(Error, Debug)]
pub enum SaveAuthorError {
    #[error("Author with id \"{id}\" does not exist")]
    NotFound { id: i64 },
    #[error(transparent)]
    Other(anyhow::Error),
}

#[derive(Debug)]
pub struct DeleteAuthorRequest {
    id: i64,
}

impl DeleteAuthorRequest {
    pub const fn new(id: i64) -> Self {
        Self { id }
    }

    pub const fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Error, Debug)]
pub enum DeleteAuthorError {
    #[error("Author with id \"{id}\" does not exist")]
    NotFound { id: i64 },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn author_name_is_trimmed() {
        let name = AuthorName::new("  Jane ").unwrap();
        assert_eq!(name.as_str(), "Jane");
        assert_eq!(name.to_string(), "Jane");
    }

    #[test]
    fn blank_author_name_is_rejected() {
        assert!(AuthorName::new("").is_err());
        assert!(AuthorName::new("   \t").is_err());
    }

    #[test]
    fn save_request_without_id_creates() {
        let details = AuthorDetails::new(
            AuthorName::new_unchecked("Jane"),
            AuthorName::new_unchecked("Austen"),
            None,
            Some("British".into()),
        );
        let req = SaveAuthorRequest::new(details.clone());
        assert_eq!(req.id(), None);

        let req = SaveAuthorRequest::existing(7, details);
        assert_eq!(req.id(), Some(7));
        assert_eq!(req.details().nationality(), Some("British"));
    }
}
