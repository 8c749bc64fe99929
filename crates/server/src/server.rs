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

use crate::{expenses, groups, settlements, user};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub db: DatabaseConnection,
}

async fn auth(
    auth_header: TypedHeader<Authorization<Basic>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
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
        .route("/groups", post(groups::group_new).get(groups::list))
        .route("/groups/{group_id}", get(groups::get))
        .route(
            "/groups/{group_id}/members",
            get(groups::list_members).post(groups::upsert_member),
        )
        .route(
            "/groups/{group_id}/members/{user_id}",
            axum::routing::delete(groups::remove_member),
        )
        .route(
            "/groups/{group_id}/expenses",
            get(expenses::list).post(expenses::expense_new),
        )
        .route("/groups/{group_id}/balances", get(settlements::balances))
        .route(
            "/groups/{group_id}/settlements",
            post(settlements::settlement_new),
        )
        .route(
            "/groups/{group_id}/settlements/plan",
            get(settlements::plan),
        )
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
    use axum::http::{Request, StatusCode, header};
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use http_body_util::BodyExt;
    use migration::MigratorTrait;
    use sea_orm::{ActiveModelTrait, ActiveValue, Database};
    use tower::ServiceExt;

    async fn test_router(users: &[(&str, &str)]) -> Router {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();

        for (username, display_name) in users {
            let model = user::ActiveModel {
                id: ActiveValue::NotSet,
                username: ActiveValue::Set((*username).to_string()),
                password: ActiveValue::Set("password".to_string()),
                display_name: ActiveValue::Set((*display_name).to_string()),
            };
            model.insert(&db).await.unwrap();
        }

        let engine = Engine::builder()
            .database(db.clone())
            .build()
            .await
            .unwrap();
        router(ServerState {
            engine: Arc::new(engine),
            db,
        })
    }

    fn basic_auth(username: &str) -> String {
        format!("Basic {}", STANDARD.encode(format!("{username}:password")))
    }

    fn json_request(method: &str, uri: &str, username: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, basic_auth(username))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn wrong_credentials_are_rejected() {
        let app = test_router(&[("alice", "Alice")]).await;

        let request = Request::builder()
            .method("GET")
            .uri("/groups")
            .header(
                header::AUTHORIZATION,
                format!("Basic {}", STANDARD.encode("alice:wrong")),
            )
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn group_creation_round_trips() {
        let app = test_router(&[("alice", "Alice")]).await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/groups",
                "alice",
                r#"{"name":"Casa","currency":"EUR"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let created = json_body(response).await;
        assert_eq!(created["name"], "Casa");
        assert_eq!(created["currency"], "EUR");

        let response = app
            .oneshot(json_request("GET", "/groups", "alice", ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let listed = json_body(response).await;
        assert_eq!(listed["groups"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn settlement_plan_uses_published_field_names() {
        let app = test_router(&[("alice", "Alice"), ("bob", "Bob")]).await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/groups",
                "alice",
                r#"{"name":"Viaggio","currency":"EUR"}"#,
            ))
            .await
            .unwrap();
        let group_id = json_body(response).await["id"]
            .as_str()
            .unwrap()
            .to_string();

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/groups/{group_id}/members"),
                "alice",
                r#"{"user_id":2,"role":"member"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/groups/{group_id}/expenses"),
                "alice",
                r#"{"description":"Hotel","amount":30.0,"paid_by":1,"splits":null,"occurred_at":"2026-05-20T12:00:00+00:00"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(json_request(
                "GET",
                &format!("/groups/{group_id}/settlements/plan"),
                "bob",
                "",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let plan = json_body(response).await;

        let transfers = plan["transfers"].as_array().unwrap();
        assert_eq!(transfers.len(), 1);
        let transfer = &transfers[0];
        assert_eq!(transfer["fromUserId"], 2);
        assert_eq!(transfer["fromUserName"], "Bob");
        assert_eq!(transfer["toUserId"], 1);
        assert_eq!(transfer["toUserName"], "Alice");
        assert_eq!(transfer["amount"], 15.0);
        assert_eq!(transfer["currency"], "EUR");

        let response = app
            .oneshot(json_request(
                "GET",
                &format!("/groups/{group_id}/balances"),
                "alice",
                "",
            ))
            .await
            .unwrap();
        let balances = json_body(response).await;
        let entries = balances["balances"].as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["memberId"], 1);
        assert_eq!(entries[0]["netBalance"], 15.0);
        assert_eq!(entries[1]["memberId"], 2);
        assert_eq!(entries[1]["netBalance"], -15.0);
    }

    #[tokio::test]
    async fn unbalanced_splits_map_to_400() {
        let app = test_router(&[("alice", "Alice"), ("bob", "Bob")]).await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/groups",
                "alice",
                r#"{"name":"Casa","currency":"EUR"}"#,
            ))
            .await
            .unwrap();
        let group_id = json_body(response).await["id"]
            .as_str()
            .unwrap()
            .to_string();

        let response = app
            .oneshot(json_request(
                "POST",
                &format!("/groups/{group_id}/expenses"),
                "alice",
                r#"{"description":"Spesa","amount":10.0,"paid_by":1,"splits":[{"user_id":1,"amount":9.0}],"occurred_at":"2026-05-20T12:00:00+00:00"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
