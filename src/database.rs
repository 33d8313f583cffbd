use crate::models::{
    Author, AuthorDetails, AuthorName, DeleteAuthorError, DeleteAuthorRequest,
    FindAllAuthorsError, FindAuthorError, FindAuthorRequest, SaveAuthorError, SaveAuthorRequest,
};
use crate::repositories::AuthorRepository;
use anyhow::{Context, anyhow};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{FromRow, Row, SqlitePool};
use std::str::FromStr;

static MIGRATOR: Migrator = sqlx::migrate!();

const AUTHOR_COLUMNS: &str =
    "author_id, first_name, last_name, birth_date, nationality, created_at";

pub async fn establish_pool(path: &str, max_connections: u32) -> anyhow::Result<SqlitePool> {
    let opts = SqliteConnectOptions::from_str(path)
        .with_context(|| format!("Invalid database path {path}"))?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal);
    // Every connection to an in-memory database opens its own empty copy.
    let max_connections = if is_in_memory(path) {
        1
    } else {
        max_connections
    };
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(opts)
        .await
        .with_context(|| format!("Failed to open database at {path}"))?;

    run_migrations(&pool).await?;
    tracing::info!(path, "database ready");

    Ok(pool)
}

fn is_in_memory(path: &str) -> bool {
    path.contains(":memory:") || path.contains("mode=memory")
}

pub async fn run_migrations(pool: &SqlitePool) -> anyhow::Result<()> {
    MIGRATOR
        .run(pool)
        .await
        .context("Failed to run database migrations")
}

#[derive(Debug, Clone)]
pub struct DefaultAuthorRepository {
    pool: SqlitePool,
}

impl DefaultAuthorRepository {
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl<'r> FromRow<'r, SqliteRow> for Author {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id = row.try_get("author_id")?;
        let first_name: &str = row.try_get("first_name")?;
        let last_name: &str = row.try_get("last_name")?;
        let birth_date = row.try_get("birth_date")?;
        let nationality = row.try_get("nationality")?;
        let created_at = row.try_get("created_at")?;

        let details = AuthorDetails::new(
            AuthorName::new_unchecked(first_name),
            AuthorName::new_unchecked(last_name),
            birth_date,
            nationality,
        );
        Ok(Self::new(id, details, created_at))
    }
}

#[async_trait]
impl AuthorRepository for DefaultAuthorRepository {
    async fn find_all_authors(&self) -> Result<Vec<Author>, FindAllAuthorsError> {
        let query = format!("SELECT {AUTHOR_COLUMNS} FROM authors ORDER BY author_id");
        let authors = sqlx::query_as(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|err| {
                let err = anyhow!(err).context("Failed to retrieve all authors");
                FindAllAuthorsError(err)
            })?;

        Ok(authors)
    }

    async fn find_author(&self, req: &FindAuthorRequest) -> Result<Option<Author>, FindAuthorError> {
        let query = format!("SELECT {AUTHOR_COLUMNS} FROM authors WHERE author_id = ?");
        let author = sqlx::query_as(&query)
            .bind(req.id())
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| {
                let err = anyhow!(err).context(format!(
                    r#"Failed to retrieve author with id "{}""#,
                    req.id()
                ));
                FindAuthorError(err)
            })?;

        Ok(author)
    }

    async fn save_author(&self, req: &SaveAuthorRequest) -> Result<Author, SaveAuthorError> {
        match req.id() {
            Some(id) => self.update_author(id, req.details()).await,
            None => self.insert_author(req.details()).await,
        }
    }

    async fn delete_author(&self, req: &DeleteAuthorRequest) -> Result<(), DeleteAuthorError> {
        let result = sqlx::query("DELETE FROM authors WHERE author_id = ?")
            .bind(req.id())
            .execute(&self.pool)
            .await
            .map_err(|err| {
                anyhow!(err).context(format!(r#"Failed to delete author with id "{}""#, req.id()))
            })?;

        if result.rows_affected() == 0 {
            return Err(DeleteAuthorError::NotFound { id: req.id() });
        }

        Ok(())
    }
}

impl DefaultAuthorRepository {
    async fn insert_author(&self, details: &AuthorDetails) -> Result<Author, SaveAuthorError> {
        let query = format!(
            "INSERT INTO authors (first_name, last_name, birth_date, nationality, created_at) \
             VALUES (?, ?, ?, ?, ?) RETURNING {AUTHOR_COLUMNS}"
        );
        let author = sqlx::query_as(&query)
            .bind(details.first_name().as_str())
            .bind(details.last_name().as_str())
            .bind(details.birth_date())
            .bind(details.nationality())
            .bind(Utc::now().naive_utc())
            .fetch_one(&self.pool)
            .await
            .map_err(|err| {
                let err = anyhow!(err).context(format!(
                    r#"Failed to create author "{} {}""#,
                    details.first_name(),
                    details.last_name()
                ));
                SaveAuthorError::Other(err)
            })?;

        Ok(author)
    }

    async fn update_author(&self, id: i64, details: &AuthorDetails) -> Result<Author, SaveAuthorError> {
        let query = format!(
            "UPDATE authors SET first_name = ?, last_name = ?, birth_date = ?, nationality = ? \
             WHERE author_id = ? RETURNING {AUTHOR_COLUMNS}"
        );
        let author = sqlx::query_as(&query)
            .bind(details.first_name().as_str())
            .bind(details.last_name().as_str())
            .bind(details.birth_date())
            .bind(details.nationality())
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| {
                let err =
                    anyhow!(err).context(format!(r#"Failed to update author with id "{id}""#));
                SaveAuthorError::Other(err)
            })?;

        author.ok_or(SaveAuthorError::NotFound { id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    async fn setup() -> DefaultAuthorRepository {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        run_migrations(&pool).await.unwrap();
        DefaultAuthorRepository::new(pool)
    }

    fn details(first: &str, last: &str) -> AuthorDetails {
        AuthorDetails::new(
            AuthorName::new(first).unwrap(),
            AuthorName::new(last).unwrap(),
            None,
            None,
        )
    }

    #[test]
    fn in_memory_urls_are_detected() {
        assert!(is_in_memory("sqlite::memory:"));
        assert!(is_in_memory("sqlite://authors.db?mode=memory"));
        assert!(!is_in_memory("sqlite://authors.db"));
    }

    #[tokio::test]
    async fn in_memory_pool_is_limited_to_one_connection() {
        let pool = establish_pool("sqlite::memory:", 5).await.unwrap();
        assert_eq!(pool.options().get_max_connections(), 1);

        let repo = DefaultAuthorRepository::new(pool);
        repo.save_author(&SaveAuthorRequest::new(details("Jane", "Austen")))
            .await
            .unwrap();
        assert_eq!(repo.find_all_authors().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn insert_assigns_id_and_created_at() {
        let repo = setup().await;

        let jane = repo
            .save_author(&SaveAuthorRequest::new(details("Jane", "Austen")))
            .await
            .unwrap();
        let mary = repo
            .save_author(&SaveAuthorRequest::new(details("Mary", "Shelley")))
            .await
            .unwrap();

        assert_eq!(jane.id(), 1);
        assert_eq!(mary.id(), 2);
        assert_eq!(jane.details().first_name().as_str(), "Jane");
        assert!(jane.created_at() <= mary.created_at());
    }

    #[tokio::test]
    async fn find_author_returns_none_when_absent() {
        let repo = setup().await;

        let found = repo.find_author(&FindAuthorRequest::new(42)).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn find_all_authors_in_insertion_order() {
        let repo = setup().await;
        assert!(repo.find_all_authors().await.unwrap().is_empty());

        for (first, last) in [("Jane", "Austen"), ("Mary", "Shelley"), ("Emily", "Bronte")] {
            repo.save_author(&SaveAuthorRequest::new(details(first, last)))
                .await
                .unwrap();
        }

        let names: Vec<_> = repo
            .find_all_authors()
            .await
            .unwrap()
            .iter()
            .map(|author| author.details().last_name().to_string())
            .collect();
        assert_eq!(names, ["Austen", "Shelley", "Bronte"]);
    }

    #[tokio::test]
    async fn update_keeps_id_and_created_at() {
        let repo = setup().await;
        let created = repo
            .save_author(&SaveAuthorRequest::new(details("Jane", "Austen")))
            .await
            .unwrap();

        let birth_date = NaiveDate::from_ymd_opt(1775, 12, 16);
        let new_details = AuthorDetails::new(
            AuthorName::new("J.").unwrap(),
            AuthorName::new("Austen").unwrap(),
            birth_date,
            Some("British".into()),
        );
        let updated = repo
            .save_author(&SaveAuthorRequest::existing(created.id(), new_details.clone()))
            .await
            .unwrap();

        assert_eq!(updated.id(), created.id());
        assert_eq!(updated.created_at(), created.created_at());
        assert_eq!(updated.details(), &new_details);

        let fetched = repo
            .find_author(&FindAuthorRequest::new(created.id()))
            .await
            .unwrap();
        assert_eq!(fetched, Some(updated));
    }

    #[tokio::test]
    async fn update_of_missing_author_is_not_found() {
        let repo = setup().await;

        let err = repo
            .save_author(&SaveAuthorRequest::existing(9, details("Jane", "Austen")))
            .await
            .unwrap_err();
        assert!(matches!(err, SaveAuthorError::NotFound { id: 9 }));
    }

    #[tokio::test]
    async fn delete_removes_row_and_ids_are_not_reused() {
        let repo = setup().await;
        let created = repo
            .save_author(&SaveAuthorRequest::new(details("Jane", "Austen")))
            .await
            .unwrap();

        repo.delete_author(&DeleteAuthorRequest::new(created.id()))
            .await
            .unwrap();
        assert!(
            repo.find_author(&FindAuthorRequest::new(created.id()))
                .await
                .unwrap()
                .is_none()
        );

        let err = repo
            .delete_author(&DeleteAuthorRequest::new(created.id()))
            .await
            .unwrap_err();
        assert!(matches!(err, DeleteAuthorError::NotFound { .. }));

        let next = repo
            .save_author(&SaveAuthorRequest::new(details("Mary", "Shelley")))
            .await
            .unwrap();
        assert!(next.id() > created.id());
    }
}
