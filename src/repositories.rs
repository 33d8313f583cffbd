use crate::models::{
    Author, DeleteAuthorError, DeleteAuthorRequest, FindAllAuthorsError, FindAuthorError,
    FindAuthorRequest, SaveAuthorError, SaveAuthorRequest,
};
use async_trait::async_trait;

#[async_trait]
pub trait AuthorRepository: Send + Sync + 'static {
    /// Returns every author in insertion order.
    async fn find_all_authors(&self) -> Result<Vec<Author>, FindAllAuthorsError>;

    async fn find_author(&self, req: &FindAuthorRequest) -> Result<Option<Author>, FindAuthorError>;

    /// Inserts a new author or overwrites the mutable fields of an existing one.
    /// The id and creation timestamp of an existing author are never changed.
    async fn save_author(&self, req: &SaveAuthorRequest) -> Result<Author, SaveAuthorError>;

    async fn delete_author(&self, req: &DeleteAuthorRequest) -> Result<(), DeleteAuthorError>;
}
