//! Borrow-request API endpoints.

use api_types::RequestStatus as ApiStatus;
use api_types::request::{RequestCreated, RequestProcessed, RequestView};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user};

fn map_status(status: engine::RequestStatus) -> ApiStatus {
    match status {
        engine::RequestStatus::Pending => ApiStatus::Pending,
        engine::RequestStatus::Approved => ApiStatus::Approved,
        engine::RequestStatus::Rejected => ApiStatus::Rejected,
        engine::RequestStatus::Returned => ApiStatus::Returned,
    }
}

fn map_request(request: engine::BookRequest) -> RequestView {
    RequestView {
        id: request.id,
        student_id: request.student_id,
        book_id: request.book_id,
        status: map_status(request.status),
        request_date: request.request_date,
        approval_date: request.approval_date,
        due_date: request.due_date,
        return_date: request.return_date,
        approved_by: request.approved_by,
    }
}

pub async fn request_new(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(book_id): Path<Uuid>,
) -> Result<(StatusCode, Json<RequestCreated>), ServerError> {
    let id = state
        .engine
        .request_book(book_id, &user.username, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(RequestCreated { id })))
}

pub async fn approve(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(request_id): Path<Uuid>,
) -> Result<Json<RequestProcessed>, ServerError> {
    let transaction_id = state
        .engine
        .approve_request(request_id, &user.username, Utc::now())
        .await?;
    Ok(Json(RequestProcessed { transaction_id }))
}

pub async fn reject(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(request_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .reject_request(request_id, &user.username, Utc::now())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn hand_back(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(request_id): Path<Uuid>,
) -> Result<Json<RequestProcessed>, ServerError> {
    let transaction_id = state
        .engine
        .return_book(request_id, &user.username, Utc::now())
        .await?;
    Ok(Json(RequestProcessed { transaction_id }))
}

pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(request_id): Path<Uuid>,
) -> Result<Json<RequestView>, ServerError> {
    let request = state.engine.request(request_id, &user.username).await?;
    Ok(Json(map_request(request)))
}

pub async fn list_pending(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<RequestView>>, ServerError> {
    let requests = state.engine.list_pending_requests(&user.username).await?;
    Ok(Json(requests.into_iter().map(map_request).collect()))
}

pub async fn list_mine(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<RequestView>>, ServerError> {
    let requests = state
        .engine
        .list_requests_for_student(&user.username)
        .await?;
    Ok(Json(requests.into_iter().map(map_request).collect()))
}
