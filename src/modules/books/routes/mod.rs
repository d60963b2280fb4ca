//! HTTP handlers for `/api/books`.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use bookshelf_http::AppError;

use super::models::Book;
use super::repository::BookRepository;

type Repository = Arc<dyn BookRepository>;

/// Routes relative to the module mount point
pub fn router(repository: Repository) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route("/health", get(health_check))
        .route("/{id}", get(get_book).delete(delete_book))
        .with_state(repository)
}

async fn health_check() -> &'static str {
    "books module is healthy"
}

async fn list_books(State(repository): State<Repository>) -> Result<Json<Vec<Book>>, AppError> {
    let books = repository.find_all().await?;
    tracing::debug!(count = books.len(), "listed books");
    Ok(Json(books))
}

async fn get_book(
    State(repository): State<Repository>,
    Path(id): Path<i64>,
) -> Result<Json<Book>, AppError> {
    match repository.find_by_id(id).await? {
        Some(book) => Ok(Json(book)),
        None => Err(AppError::not_found(format!("book {id}"))),
    }
}

async fn create_book(
    State(repository): State<Repository>,
    payload: Result<Json<Book>, JsonRejection>,
) -> Result<Json<Book>, AppError> {
    let Json(book) = payload.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;

    let saved = repository.save(book).await?;
    tracing::info!(book_id = ?saved.id, "book saved");
    Ok(Json(saved))
}

/// Existence check and delete are separate repository calls; concurrent
/// deletes of one id may both answer 200 unless the store serializes them.
async fn delete_book(
    State(repository): State<Repository>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    if repository.find_by_id(id).await?.is_none() {
        return Err(AppError::not_found(format!("book {id}")));
    }

    repository.delete_by_id(id).await?;
    tracing::info!(book_id = id, "book deleted");
    Ok(StatusCode::OK)
}
