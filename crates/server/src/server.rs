use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use std::sync::Arc;

use crate::{books, categories, fines, requests, transactions, user};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub db: DatabaseConnection,
}

async fn auth(
    auth_header: Option<TypedHeader<Authorization<Basic>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(auth_header) = auth_header else {
        return Err(StatusCode::UNAUTHORIZED);
    };
    if auth_header.username().is_empty() || auth_header.password().is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let user: Option<user::Model> = user::Entity::find()
        .filter(user::Column::Username.eq(auth_header.username()))
        .filter(user::Column::Password.eq(auth_header.password()))
        .one(&state.db)
        .await
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    let Some(user) = user else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

fn router(state: ServerState) -> Router {
    Router::new()
        .route("/books", get(books::list).post(books::add))
        .route("/books/{id}", get(books::get))
        .route("/books/{id}/request", post(requests::request_new))
        .route("/categories", get(categories::list).post(categories::add))
        .route("/requests", get(requests::list_pending))
        .route("/requests/mine", get(requests::list_mine))
        .route("/requests/{id}", get(requests::get))
        .route("/requests/{id}/approve", post(requests::approve))
        .route("/requests/{id}/reject", post(requests::reject))
        .route("/requests/{id}/return", post(requests::hand_back))
        .route("/transactions", get(transactions::list))
        .route("/fines", get(fines::list).post(fines::add))
        .route("/fines/{id}/pay", post(fines::pay))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .with_state(state)
}

pub async fn run(engine: Engine, db: DatabaseConnection) {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:3000").await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, db, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
        db,
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, db, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::Body;
    use axum::http::{Request as HttpRequest, header};
    use base64::Engine as _;
    use http_body_util::BodyExt;
    use migration::MigratorTrait;
    use sea_orm::{ConnectionTrait, Database, Statement};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    async fn test_router() -> Router {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        let backend = db.get_database_backend();
        for (username, role) in [("bianca", "admin"), ("carlo", "student")] {
            db.execute(Statement::from_sql_and_values(
                backend,
                "INSERT INTO users (username, password, full_name, role, student_id) \
                 VALUES (?, ?, ?, ?, ?)",
                vec![
                    username.into(),
                    "password".into(),
                    username.into(),
                    role.into(),
                    (role == "student").then(|| format!("STU-{username}")).into(),
                ],
            ))
            .await
            .unwrap();
        }
        let engine = Engine::builder().database(db.clone()).build().await.unwrap();
        router(ServerState {
            engine: Arc::new(engine),
            db,
        })
    }

    fn basic_auth(username: &str) -> String {
        let encoded =
            base64::engine::general_purpose::STANDARD.encode(format!("{username}:password"));
        format!("Basic {encoded}")
    }

    fn request(method: &str, uri: &str, username: &str, body: Option<Value>) -> HttpRequest<Body> {
        let builder = HttpRequest::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, basic_auth(username));
        match body {
            Some(value) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(value.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn seed_book(router: &Router, copies: i32) -> String {
        let response = router
            .clone()
            .oneshot(request(
                "POST",
                "/categories",
                "bianca",
                Some(json!({"name": "Novels", "description": null})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let category_id = json_body(response).await["id"].as_str().unwrap().to_string();

        let response = router
            .clone()
            .oneshot(request(
                "POST",
                "/books",
                "bianca",
                Some(json!({
                    "title": "The Leopard",
                    "author": "Giuseppe Tomasi di Lampedusa",
                    "isbn": "9780099512158",
                    "category_id": category_id,
                    "description": null,
                    "publisher": null,
                    "pages": null,
                    "publication_date": null,
                    "total_copies": copies,
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        json_body(response).await["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn missing_credentials_is_unauthorized() {
        let router = test_router().await;
        let response = router
            .oneshot(
                HttpRequest::builder()
                    .method("GET")
                    .uri("/books")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn student_cannot_modify_the_catalog() {
        let router = test_router().await;
        let response = router
            .clone()
            .oneshot(request(
                "POST",
                "/categories",
                "carlo",
                Some(json!({"name": "Novels", "description": null})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn borrow_lifecycle_round_trip() {
        let router = test_router().await;
        let book_id = seed_book(&router, 2).await;

        // Student files a request.
        let response = router
            .clone()
            .oneshot(request(
                "POST",
                &format!("/books/{book_id}/request"),
                "carlo",
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let request_id = json_body(response).await["id"].as_str().unwrap().to_string();

        // A second request for the same book conflicts.
        let response = router
            .clone()
            .oneshot(request(
                "POST",
                &format!("/books/{book_id}/request"),
                "carlo",
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        // Admin approves; a copy is claimed.
        let response = router
            .clone()
            .oneshot(request(
                "POST",
                &format!("/requests/{request_id}/approve"),
                "bianca",
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = router
            .clone()
            .oneshot(request("GET", &format!("/books/{book_id}"), "carlo", None))
            .await
            .unwrap();
        assert_eq!(json_body(response).await["available_copies"], json!(1));

        // Only the owner may return: the admin gets 403.
        let response = router
            .clone()
            .oneshot(request(
                "POST",
                &format!("/requests/{request_id}/return"),
                "bianca",
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        // Owner returns; the copy goes back on the shelf.
        let response = router
            .clone()
            .oneshot(request(
                "POST",
                &format!("/requests/{request_id}/return"),
                "carlo",
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = router
            .clone()
            .oneshot(request("GET", &format!("/books/{book_id}"), "carlo", None))
            .await
            .unwrap();
        assert_eq!(json_body(response).await["available_copies"], json!(2));

        // The ledger holds the issue and the return.
        let response = router
            .clone()
            .oneshot(request(
                "GET",
                "/transactions",
                "carlo",
                Some(json!({"from": null, "to": null, "kinds": null})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body.as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn approving_twice_is_unprocessable() {
        let router = test_router().await;
        let book_id = seed_book(&router, 1).await;

        let response = router
            .clone()
            .oneshot(request(
                "POST",
                &format!("/books/{book_id}/request"),
                "carlo",
                None,
            ))
            .await
            .unwrap();
        let request_id = json_body(response).await["id"].as_str().unwrap().to_string();

        let response = router
            .clone()
            .oneshot(request(
                "POST",
                &format!("/requests/{request_id}/approve"),
                "bianca",
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = router
            .clone()
            .oneshot(request(
                "POST",
                &format!("/requests/{request_id}/approve"),
                "bianca",
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
