//! Ledger API endpoints.

use api_types::TransactionKind as ApiKind;
use api_types::ledger::{TransactionList, TransactionView};
use axum::{Extension, Json, extract::State};

use crate::{ServerError, server::ServerState, user};

fn map_kind(kind: engine::TransactionKind) -> ApiKind {
    match kind {
        engine::TransactionKind::Issue => ApiKind::Issue,
        engine::TransactionKind::Return => ApiKind::Return,
    }
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<TransactionList>,
) -> Result<Json<Vec<TransactionView>>, ServerError> {
    let kinds = payload.kinds.map(|kinds| {
        kinds
            .into_iter()
            .map(|kind| match kind {
                ApiKind::Issue => engine::TransactionKind::Issue,
                ApiKind::Return => engine::TransactionKind::Return,
            })
            .collect::<Vec<_>>()
    });

    let filter = engine::LedgerListFilter {
        from: payload.from,
        to: payload.to,
        kinds,
    };

    let transactions = state
        .engine
        .list_transactions(&user.username, &filter)
        .await?;

    Ok(Json(
        transactions
            .into_iter()
            .map(|tx| TransactionView {
                id: tx.id,
                student_id: tx.student_id,
                book_id: tx.book_id,
                kind: map_kind(tx.kind),
                recorded_at: tx.recorded_at,
                due_date: tx.due_date,
                return_date: tx.return_date,
                processed_by: tx.processed_by,
            })
            .collect(),
    ))
}
