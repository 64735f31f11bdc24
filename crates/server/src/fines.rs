//! Fine API endpoints.

use api_types::fine::{FineCreated, FineNew, FineView};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user};

pub async fn add(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<FineNew>,
) -> Result<(StatusCode, Json<FineCreated>), ServerError> {
    let id = state
        .engine
        .new_fine(engine::NewFineCmd::new(
            payload.transaction_id,
            payload.amount_minor,
            payload.reason,
            user.username.clone(),
            Utc::now(),
        ))
        .await?;
    Ok((StatusCode::CREATED, Json(FineCreated { id })))
}

pub async fn pay(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(fine_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .pay_fine(fine_id, &user.username, Utc::now())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<FineView>>, ServerError> {
    let fines = state.engine.list_fines(&user.username).await?;
    Ok(Json(
        fines
            .into_iter()
            .map(|fine| FineView {
                id: fine.id,
                transaction_id: fine.transaction_id,
                student_id: fine.student_id,
                amount_minor: fine.amount_minor,
                reason: fine.reason,
                is_paid: fine.is_paid,
                created_at: fine.created_at,
                paid_date: fine.paid_date,
            })
            .collect(),
    ))
}
