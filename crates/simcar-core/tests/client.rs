// SPDX-License-Identifier: AGPL-3.0
// SimCar Core - MarketplaceClient against an in-process backend

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use simcar_core::{
    AppError, AppSettings, Credentials, FavoriteReconciler, FavoriteState, FavoritesApi,
    MarketplaceClient, ProfileUpdate, ToggleOutcome,
};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

const SESSION_COOKIE: &str = "SESSION=test-session";

#[derive(Default)]
struct Backend {
    favorites: Mutex<BTreeSet<i64>>,
    profile_updates: Mutex<Vec<Value>>,
}

fn car(id: i64, brand: &str, model: &str) -> Value {
    json!({
        "id": id,
        "type": "Sedan",
        "imageUrl": format!("/images/{}.jpg", id),
        "brand": brand,
        "model": model,
        "year": 2020,
        "mileage": 30000,
        "fuelType": "Gasoline",
        "price": 15000000,
        "carNumber": format!("12가{:04}", id),
        "region": "Seoul"
    })
}

fn logged_in(headers: &HeaderMap) -> bool {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains(SESSION_COOKIE))
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": "Login required" })),
    )
        .into_response()
}

async fn list_cars() -> Json<Value> {
    Json(json!([car(1, "Hyundai", "Avante"), car(2, "Kia", "Morning")]))
}

async fn get_car(Path(id): Path<i64>) -> Response {
    if id == 1 {
        Json(car(1, "Hyundai", "Avante")).into_response()
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "Car not found" })),
        )
            .into_response()
    }
}

async fn diagnosis(Path(id): Path<i64>) -> Json<Value> {
    Json(json!({ "carId": id, "reliabilityScore": 87, "evaluationComment": "Good" }))
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["email"] == "kim@example.com" && body["password"] == "secret" {
        (
            [(header::SET_COOKIE, format!("{}; Path=/", SESSION_COOKIE))],
            StatusCode::OK,
        )
            .into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Invalid credentials" })),
        )
            .into_response()
    }
}

async fn list_favorites(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> Response {
    if !logged_in(&headers) {
        return unauthorized();
    }
    let ids: Vec<i64> = backend.favorites.lock().unwrap().iter().copied().collect();
    let cars: Vec<Value> = ids.into_iter().map(|id| car(id, "Kia", "Ray")).collect();
    Json(cars).into_response()
}

async fn add_favorite(
    State(backend): State<Arc<Backend>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    if !logged_in(&headers) {
        return unauthorized();
    }
    backend.favorites.lock().unwrap().insert(id);
    StatusCode::CREATED.into_response()
}

async fn remove_favorite(
    State(backend): State<Arc<Backend>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    if !logged_in(&headers) {
        return unauthorized();
    }
    backend.favorites.lock().unwrap().remove(&id);
    StatusCode::NO_CONTENT.into_response()
}

async fn update_profile(
    State(backend): State<Arc<Backend>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !logged_in(&headers) {
        return unauthorized();
    }
    backend.profile_updates.lock().unwrap().push(body);
    StatusCode::OK.into_response()
}

async fn spawn_backend(backend: Arc<Backend>) -> String {
    let app = Router::new()
        .route("/api/cars", get(list_cars))
        .route("/api/cars/{id}", get(get_car))
        .route("/api/cars/{id}/diagnosis", get(diagnosis))
        .route("/api/members/login", post(login))
        .route("/api/members/favorites", get(list_favorites))
        .route("/api/members/profile", axum::routing::put(update_profile))
        .route("/api/favorites/{id}", post(add_favorite).delete(remove_favorite))
        .with_state(backend);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}/api", addr)
}

fn client_for(base_url: String, newest_first: bool) -> MarketplaceClient {
    let settings = AppSettings {
        api_base_url: base_url,
        newest_first,
        ..AppSettings::default()
    };
    MarketplaceClient::new(&settings).unwrap()
}

fn credentials(password: &str) -> Credentials {
    Credentials {
        email: "kim@example.com".to_string(),
        password: password.to_string(),
    }
}

#[tokio::test]
async fn test_list_cars_newest_first() {
    let base = spawn_backend(Arc::new(Backend::default())).await;

    let newest_first = client_for(base.clone(), true).list_cars().await.unwrap();
    let ids: Vec<i64> = newest_first.iter().map(|l| l.id).collect();
    assert_eq!(ids, vec![2, 1]);

    let server_order = client_for(base, false).list_cars().await.unwrap();
    let ids: Vec<i64> = server_order.iter().map(|l| l.id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(server_order[0].fuel_type.as_deref(), Some("Gasoline"));
}

#[tokio::test]
async fn test_get_car_and_not_found_message() {
    let base = spawn_backend(Arc::new(Backend::default())).await;
    let client = client_for(base, true);

    let listing = client.get_car(1).await.unwrap();
    assert_eq!(listing.title(), "Hyundai Avante");
    assert_eq!(
        listing.full_image_url(client.base_url()).unwrap(),
        format!("{}/images/1.jpg", client.base_url().trim_end_matches("/api"))
    );

    match client.get_car(42).await {
        Err(AppError::Server { status, message }) => {
            assert_eq!(status, 404);
            assert_eq!(message, "Car not found");
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_diagnosis() {
    let base = spawn_backend(Arc::new(Backend::default())).await;
    let diagnosis = client_for(base, true).diagnose_car(7).await.unwrap();
    assert_eq!(diagnosis.car_id, 7);
    assert_eq!(diagnosis.reliability_score, 87);
}

#[tokio::test]
async fn test_login_failure_carries_server_message() {
    let base = spawn_backend(Arc::new(Backend::default())).await;
    let client = client_for(base, true);

    let err = client.login(&credentials("wrong")).await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert_eq!(err.to_string(), "Server returned 401: Invalid credentials");
}

#[tokio::test]
async fn test_favorites_require_session_cookie() {
    let base = spawn_backend(Arc::new(Backend::default())).await;
    let client = client_for(base, true);

    let err = client.list_favorites().await.unwrap_err();
    assert_eq!(err.status(), Some(401));

    client.login(&credentials("secret")).await.unwrap();
    assert!(client.list_favorites().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_reconciler_over_http() {
    let backend = Arc::new(Backend::default());
    backend.favorites.lock().unwrap().insert(1);
    let base = spawn_backend(backend.clone()).await;

    let client = Arc::new(client_for(base, true));
    client.login(&credentials("secret")).await.unwrap();
    let reconciler = FavoriteReconciler::new(client.clone());

    assert_eq!(reconciler.load(1, true).await.unwrap(), FavoriteState::Favorite);
    assert_eq!(reconciler.load(2, true).await.unwrap(), FavoriteState::NotFavorite);

    let outcome = reconciler.toggle(2, true).await;
    assert_eq!(outcome.state(), Some(FavoriteState::Favorite));
    let outcome = reconciler.toggle(1, true).await;
    assert_eq!(outcome.state(), Some(FavoriteState::NotFavorite));

    let server: Vec<i64> = backend.favorites.lock().unwrap().iter().copied().collect();
    assert_eq!(server, vec![2]);
}

#[tokio::test]
async fn test_toggle_without_session_fails_and_keeps_state() {
    let base = spawn_backend(Arc::new(Backend::default())).await;
    let client = Arc::new(client_for(base, true));
    let reconciler = FavoriteReconciler::new(client);

    // The caller believes it is logged in, but the server has no session.
    match reconciler.toggle(3, true).await {
        ToggleOutcome::Failed { state, error, .. } => {
            assert_eq!(state, FavoriteState::Unknown);
            assert_eq!(error.status(), Some(401));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn test_profile_update_body() {
    let backend = Arc::new(Backend::default());
    let base = spawn_backend(backend.clone()).await;
    let client = client_for(base, true);
    client.login(&credentials("secret")).await.unwrap();

    client
        .update_profile(&ProfileUpdate {
            name: "Kim".to_string(),
            phone: "010-1234-5678".to_string(),
            password: None,
        })
        .await
        .unwrap();

    let updates = backend.profile_updates.lock().unwrap();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0], json!({ "name": "Kim", "phone": "010-1234-5678" }));
}

#[tokio::test]
async fn test_connection_refused() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client_for(format!("http://{}/api", addr), true);
    assert!(matches!(
        client.list_cars().await,
        Err(AppError::ConnectionRefused(_))
    ));
}
