use crate::http::AppState;
use crate::models::{
    Author, AuthorDetails, AuthorName, DeleteAuthorError, DeleteAuthorRequest,
    FindAllAuthorsError, FindAuthorError, FindAuthorRequest, SaveAuthorError, SaveAuthorRequest,
};
use crate::repositories::AuthorRepository;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug)]
pub(crate) struct ApiSuccess<T: Serialize>(StatusCode, Json<T>);

impl<T: Serialize> ApiSuccess<T> {
    pub(crate) const fn new(status: StatusCode, data: T) -> Self {
        Self(status, Json(data))
    }
}

impl<T: Serialize> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    status_code: u16,
    message: String,
}

#[derive(Debug)]
pub(crate) enum ApiError {
    BadRequest(String),
    NotFound,
    InternalServerError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound => return StatusCode::NOT_FOUND.into_response(),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        let body = ErrorResponse {
            status_code: status.as_u16(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

impl ApiError {
    fn internal(cause: &anyhow::Error) -> Self {
        tracing::error!(error = ?cause, "request failed");
        Self::InternalServerError("Internal server error".to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<ParseAuthorHttpRequestError> for ApiError {
    fn from(err: ParseAuthorHttpRequestError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<FindAllAuthorsError> for ApiError {
    fn from(err: FindAllAuthorsError) -> Self {
        Self::internal(&err.0)
    }
}

impl From<FindAuthorError> for ApiError {
    fn from(err: FindAuthorError) -> Self {
        Self::internal(&err.0)
    }
}

impl From<SaveAuthorError> for ApiError {
    fn from(err: SaveAuthorError) -> Self {
        match err {
            SaveAuthorError::NotFound { .. } => Self::NotFound,
            SaveAuthorError::Other(cause) => Self::internal(&cause),
        }
    }
}

impl From<DeleteAuthorError> for ApiError {
    fn from(err: DeleteAuthorError) -> Self {
        match err {
            DeleteAuthorError::NotFound { .. } => Self::NotFound,
            DeleteAuthorError::Other(cause) => Self::internal(&cause),
        }
    }
}

/// Body accepted by create and update. Every field is optional at the JSON
/// level so that missing names are reported as 400 rather than a
/// deserialization failure.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorHttpRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub nationality: Option<String>,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseAuthorHttpRequestError {
    #[error("{field} is required")]
    Missing { field: &'static str },
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },
}

impl TryFrom<AuthorHttpRequest> for AuthorDetails {
    type Error = ParseAuthorHttpRequestError;

    fn try_from(value: AuthorHttpRequest) -> Result<Self, Self::Error> {
        let first_name = required_name(value.first_name, "firstName")?;
        let last_name = required_name(value.last_name, "lastName")?;
        Ok(Self::new(
            first_name,
            last_name,
            value.birth_date,
            value.nationality,
        ))
    }
}

fn required_name(
    value: Option<String>,
    field: &'static str,
) -> Result<AuthorName, ParseAuthorHttpRequestError> {
    let raw = value.ok_or(ParseAuthorHttpRequestError::Missing { field })?;
    AuthorName::new(&raw).map_err(|_| ParseAuthorHttpRequestError::Empty { field })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AuthorHttpResponse {
    author_id: i64,
    first_name: String,
    last_name: String,
    birth_date: Option<NaiveDate>,
    nationality: Option<String>,
    created_at: NaiveDateTime,
}

impl From<Author> for AuthorHttpResponse {
    fn from(value: Author) -> Self {
        let details = value.details();
        Self {
            author_id: value.id(),
            first_name: details.first_name().to_string(),
            last_name: details.last_name().to_string(),
            birth_date: details.birth_date(),
            nationality: details.nationality().map(str::to_string),
            created_at: value.created_at(),
        }
    }
}

pub(crate) async fn list_authors<AR: AuthorRepository>(
    State(state): State<AppState<AR>>,
) -> Result<ApiSuccess<Vec<AuthorHttpResponse>>, ApiError> {
    let authors = state.author_repo.find_all_authors().await?;
    let authors: Vec<_> = authors.into_iter().map(AuthorHttpResponse::from).collect();
    Ok(ApiSuccess::new(StatusCode::OK, authors))
}

pub(crate) async fn get_author<AR: AuthorRepository>(
    State(state): State<AppState<AR>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<ApiSuccess<AuthorHttpResponse>, ApiError> {
    let Path(id) = id?;
    state
        .author_repo
        .find_author(&FindAuthorRequest::new(id))
        .await?
        .ok_or(ApiError::NotFound)
        .map(|author| ApiSuccess::new(StatusCode::OK, author.into()))
}

pub(crate) async fn create_author<AR: AuthorRepository>(
    State(state): State<AppState<AR>>,
    body: Result<Json<AuthorHttpRequest>, JsonRejection>,
) -> Result<ApiSuccess<AuthorHttpResponse>, ApiError> {
    let Json(body) = body?;
    let req = SaveAuthorRequest::new(body.try_into()?);
    let author = state.author_repo.save_author(&req).await?;
    tracing::info!(id = author.id(), "author created");
    Ok(ApiSuccess::new(StatusCode::CREATED, author.into()))
}

pub(crate) async fn update_author<AR: AuthorRepository>(
    State(state): State<AppState<AR>>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<AuthorHttpRequest>, JsonRejection>,
) -> Result<ApiSuccess<AuthorHttpResponse>, ApiError> {
    let Path(id) = id?;
    let Json(body) = body?;
    let details: AuthorDetails = body.try_into()?;

    let author = state
        .author_repo
        .find_author(&FindAuthorRequest::new(id))
        .await?
        .ok_or(ApiError::NotFound)?;

    let req = SaveAuthorRequest::existing(author.id(), details);
    let author = state.author_repo.save_author(&req).await?;
    tracing::info!(id, "author updated");
    Ok(ApiSuccess::new(StatusCode::OK, author.into()))
}

pub(crate) async fn delete_author<AR: AuthorRepository>(
    State(state): State<AppState<AR>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    let author = state
        .author_repo
        .find_author(&FindAuthorRequest::new(id))
        .await?
        .ok_or(ApiError::NotFound)?;

    state
        .author_repo
        .delete_author(&DeleteAuthorRequest::new(author.id()))
        .await?;
    tracing::info!(id, "author deleted");
    Ok(StatusCode::OK)
}
