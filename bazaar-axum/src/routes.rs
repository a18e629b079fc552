use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use bazaar::{Bazaar, PurchaseId, RepositoryProvider, UserId, UserListQuery};
use tower_http::trace::TraceLayer;

use crate::{
    error::Result,
    extractors::{ApiJson, ApiQuery},
    types::*,
};

/// Shared handler state.
pub struct AppState<R: RepositoryProvider> {
    pub bazaar: Arc<Bazaar<R>>,
}

// Derived Clone would require `R: Clone`.
impl<R: RepositoryProvider> Clone for AppState<R> {
    fn clone(&self) -> Self {
        Self {
            bazaar: self.bazaar.clone(),
        }
    }
}

pub fn create_router<R>(bazaar: Arc<Bazaar<R>>) -> Router
where
    R: RepositoryProvider + 'static,
{
    let state = AppState { bazaar };

    let user_routes = Router::new()
        .route("/users", get(list_users_handler).post(create_user_handler))
        .route(
            "/users/{id}",
            get(get_user_handler)
                .put(update_user_handler)
                .delete(delete_user_handler),
        )
        .route(
            "/users/{id}/change-password",
            post(change_password_handler),
        );

    let purchase_routes = Router::new()
        .route(
            "/purchases",
            get(list_purchases_handler).post(create_purchase_handler),
        )
        .route(
            "/purchases/{id}",
            get(get_purchase_handler)
                .put(update_purchase_handler)
                .delete(delete_purchase_handler),
        );

    Router::new()
        .route("/health", get(health_handler))
        .route("/auth/login", post(login_handler))
        .merge(user_routes)
        .merge(purchase_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn health_handler<R>(State(state): State<AppState<R>>) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    state.bazaar.health_check().await?;

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

async fn login_handler<R>(
    State(state): State<AppState<R>>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let response = state
        .bazaar
        .login(&request.email, &request.password)
        .await?;

    Ok(Json(response))
}

async fn list_users_handler<R>(
    State(state): State<AppState<R>>,
    ApiQuery(query): ApiQuery<UserListQuery>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let page = state.bazaar.list_users(&query).await?;
    Ok(Json(page))
}

async fn create_user_handler<R>(
    State(state): State<AppState<R>>,
    ApiJson(request): ApiJson<CreateUserRequest>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let user = state
        .bazaar
        .create_user(
            &request.name,
            &request.email,
            &request.password,
            &request.password_confirm,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse { user })))
}

async fn get_user_handler<R>(
    State(state): State<AppState<R>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let user = state.bazaar.get_user(&UserId::new(&id)).await?;
    Ok(Json(UserResponse { user }))
}

async fn update_user_handler<R>(
    State(state): State<AppState<R>>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateUserRequest>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let user = state
        .bazaar
        .update_user(&UserId::new(&id), &request.name, &request.email)
        .await?;

    Ok(Json(UserResponse { user }))
}

async fn delete_user_handler<R>(
    State(state): State<AppState<R>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    state.bazaar.delete_user(&UserId::new(&id)).await?;
    Ok(Json(MessageResponse::new("User deleted")))
}

async fn change_password_handler<R>(
    State(state): State<AppState<R>>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<ChangePasswordRequest>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    state
        .bazaar
        .change_password(
            &UserId::new(&id),
            &request.password_old,
            &request.password_new,
            &request.password_confirm,
        )
        .await?;

    Ok(Json(MessageResponse::new("Password changed")))
}

async fn create_purchase_handler<R>(
    State(state): State<AppState<R>>,
    ApiJson(request): ApiJson<CreatePurchaseRequest>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let purchase = state
        .bazaar
        .create_purchase(
            &request.product,
            &request.description,
            request.price,
            request.quantity,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(PurchaseResponse { purchase })))
}

async fn list_purchases_handler<R>(State(state): State<AppState<R>>) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let purchases = state.bazaar.list_purchases().await?;
    Ok(Json(PurchaseListResponse { purchases }))
}

async fn get_purchase_handler<R>(
    State(state): State<AppState<R>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let purchase = state.bazaar.get_purchase(&PurchaseId::new(&id)).await?;
    Ok(Json(PurchaseResponse { purchase }))
}

async fn update_purchase_handler<R>(
    State(state): State<AppState<R>>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdatePurchaseRequest>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let purchase = state
        .bazaar
        .update_purchase(&PurchaseId::new(&id), request.price, request.quantity)
        .await?;

    Ok(Json(PurchaseResponse { purchase }))
}

async fn delete_purchase_handler<R>(
    State(state): State<AppState<R>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    state.bazaar.delete_purchase(&PurchaseId::new(&id)).await?;
    Ok(Json(MessageResponse::new("Purchase deleted")))
}
