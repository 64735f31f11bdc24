use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::{run, run_with_listener, spawn_with_listener};

mod books;
mod categories;
mod fines;
mod requests;
mod server;
mod transactions;
mod user;

pub mod types {
    pub mod book {
        pub use api_types::book::{BookCreated, BookList, BookNew, BookView};
    }

    pub mod category {
        pub use api_types::category::{CategoryCreated, CategoryNew, CategoryView};
    }

    pub mod request {
        pub use api_types::request::{RequestCreated, RequestProcessed, RequestView};
    }

    pub mod ledger {
        pub use api_types::ledger::{TransactionList, TransactionView};
    }

    pub mod fine {
        pub use api_types::fine::{FineCreated, FineNew, FineView};
    }
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

//TODO: Find a better solution
#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Forbidden(_) => StatusCode::FORBIDDEN,
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_) | EngineError::DuplicateRequest(_) => StatusCode::CONFLICT,
        EngineError::InvalidId(_) => StatusCode::BAD_REQUEST,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::Unavailable(_)
        | EngineError::InvalidTransition(_)
        | EngineError::InvalidCopyCount(_)
        | EngineError::InvalidRole(_)
        | EngineError::InvalidAmount(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => {
                (status_for_engine_error(&err), message_for_engine_error(err))
            }
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}
