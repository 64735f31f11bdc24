//! Catalog API endpoints (books).

use api_types::book::{BookCreated, BookList, BookNew, BookView};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user};

fn map_book(book: engine::Book) -> BookView {
    BookView {
        id: book.id,
        title: book.title,
        author: book.author,
        isbn: book.isbn,
        category_id: book.category_id,
        description: book.description,
        publisher: book.publisher,
        pages: book.pages,
        publication_date: book.publication_date,
        total_copies: book.total_copies,
        available_copies: book.available_copies,
    }
}

pub async fn add(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<BookNew>,
) -> Result<(StatusCode, Json<BookCreated>), ServerError> {
    let mut cmd = engine::NewBookCmd::new(
        payload.title,
        payload.author,
        payload.isbn,
        payload.category_id,
        payload.total_copies,
        user.username.clone(),
        Utc::now(),
    );
    cmd.description = payload.description;
    cmd.publisher = payload.publisher;
    cmd.pages = payload.pages;
    cmd.publication_date = payload.publication_date;

    let id = state.engine.new_book(cmd).await?;
    Ok((StatusCode::CREATED, Json(BookCreated { id })))
}

pub async fn get(
    Extension(_user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookView>, ServerError> {
    let book = state.engine.book(id).await?;
    Ok(Json(map_book(book)))
}

pub async fn list(
    Extension(_user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(payload): Query<BookList>,
) -> Result<Json<Vec<BookView>>, ServerError> {
    let books = state
        .engine
        .list_books(payload.only_available.unwrap_or(false))
        .await?;
    Ok(Json(books.into_iter().map(map_book).collect()))
}
