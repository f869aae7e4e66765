// SPDX-License-Identifier: GPL-3.0-only
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{Map, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use crate::api::handlers::{
    ApiHandlers, ApiResponse, BookingQuery, CartView, ConfirmCodeRequest, FieldErrors,
    NewNotificationRequest, NotificationsView, QuantityRequest, SavedToggle, SendCodeRequest,
};
use crate::session::{BackendProfile, Credential};
use crate::stores::{CartItem, Club, ClubCache, NotificationItem};
use crate::validation::{BookingDecision, MissingField};

type Handlers = State<Arc<ApiHandlers>>;
type ApiResult<T> = Result<Json<ApiResponse<T>>, StatusCode>;

pub struct HttpServer {
    handlers: ApiHandlers,
    addr: SocketAddr,
}

impl HttpServer {
    pub fn new(handlers: ApiHandlers, addr: SocketAddr) -> Self {
        Self { handlers, addr }
    }

    pub fn router(handlers: Arc<ApiHandlers>) -> Router {
        Router::new()
            .route("/api/health", get(health_handler))
            .route(
                "/api/session",
                get(get_session_handler).post(sign_in_handler).delete(sign_out_handler),
            )
            .route("/api/session/missing-fields", get(missing_fields_handler))
            .route("/api/session/booking", get(booking_handler))
            .route("/api/profile", put(update_profile_handler))
            .route("/api/verification/send", post(send_code_handler))
            .route("/api/verification/confirm", post(confirm_code_handler))
            .route(
                "/api/cart",
                get(get_cart_handler).post(add_to_cart_handler).delete(clear_cart_handler),
            )
            .route(
                "/api/cart/:id",
                put(update_cart_quantity_handler).delete(remove_from_cart_handler),
            )
            .route("/api/saved", get(list_saved_handler))
            .route("/api/saved/:id", post(toggle_saved_handler))
            .route(
                "/api/notifications",
                get(list_notifications_handler)
                    .post(add_notification_handler)
                    .delete(clear_notifications_handler),
            )
            .route("/api/notifications/read-all", post(mark_all_read_handler))
            .route("/api/notifications/:id/read", post(mark_read_handler))
            .route("/api/clubs", put(set_clubs_handler))
            .route("/api/clubs/:id", get(get_club_handler))
            .with_state(handlers)
    }

    pub async fn serve(self) -> anyhow::Result<()> {
        let app = Self::router(Arc::new(self.handlers));

        info!(addr = %self.addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(&self.addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

async fn health_handler() -> Json<ApiResponse<&'static str>> {
    ApiHandlers::health().await
}

async fn get_session_handler(State(handlers): Handlers) -> ApiResult<BackendProfile> {
    handlers.get_session().await
}

async fn sign_in_handler(
    State(handlers): Handlers,
    Json(credential): Json<Credential>,
) -> Json<ApiResponse<Option<BackendProfile>>> {
    handlers.sign_in(Json(credential)).await
}

async fn sign_out_handler(State(handlers): Handlers) -> ApiResult<()> {
    handlers.sign_out().await
}

async fn missing_fields_handler(State(handlers): Handlers) -> Json<ApiResponse<Vec<MissingField>>> {
    handlers.missing_fields().await
}

async fn booking_handler(
    State(handlers): Handlers,
    Query(query): Query<BookingQuery>,
) -> Json<ApiResponse<BookingDecision>> {
    handlers.booking(Query(query)).await
}

async fn update_profile_handler(
    State(handlers): Handlers,
    Json(edited): Json<Map<String, Value>>,
) -> Result<Json<ApiResponse<BackendProfile>>, FieldErrors> {
    handlers.update_profile(Json(edited)).await
}

async fn send_code_handler(
    State(handlers): Handlers,
    Json(request): Json<SendCodeRequest>,
) -> ApiResult<()> {
    handlers.send_verification_code(Json(request)).await
}

async fn confirm_code_handler(
    State(handlers): Handlers,
    Json(request): Json<ConfirmCodeRequest>,
) -> ApiResult<BackendProfile> {
    handlers.confirm_verification_code(Json(request)).await
}

async fn get_cart_handler(State(handlers): Handlers) -> Json<ApiResponse<CartView>> {
    handlers.get_cart().await
}

async fn add_to_cart_handler(
    State(handlers): Handlers,
    Json(item): Json<CartItem>,
) -> ApiResult<CartView> {
    handlers.add_to_cart(Json(item)).await
}

async fn clear_cart_handler(State(handlers): Handlers) -> ApiResult<()> {
    handlers.clear_cart().await
}

async fn update_cart_quantity_handler(
    State(handlers): Handlers,
    Path(id): Path<String>,
    Json(request): Json<QuantityRequest>,
) -> ApiResult<CartView> {
    handlers.update_cart_quantity(Path(id), Json(request)).await
}

async fn remove_from_cart_handler(
    State(handlers): Handlers,
    Path(id): Path<String>,
) -> ApiResult<CartView> {
    handlers.remove_from_cart(Path(id)).await
}

async fn list_saved_handler(State(handlers): Handlers) -> Json<ApiResponse<Vec<String>>> {
    handlers.list_saved().await
}

async fn toggle_saved_handler(
    State(handlers): Handlers,
    Path(id): Path<String>,
) -> ApiResult<SavedToggle> {
    handlers.toggle_saved(Path(id)).await
}

async fn list_notifications_handler(
    State(handlers): Handlers,
) -> Json<ApiResponse<NotificationsView>> {
    handlers.list_notifications().await
}

async fn add_notification_handler(
    State(handlers): Handlers,
    Json(request): Json<NewNotificationRequest>,
) -> ApiResult<NotificationItem> {
    handlers.add_notification(Json(request)).await
}

async fn clear_notifications_handler(State(handlers): Handlers) -> ApiResult<()> {
    handlers.clear_notifications().await
}

async fn mark_all_read_handler(State(handlers): Handlers) -> ApiResult<()> {
    handlers.mark_all_notifications_read().await
}

async fn mark_read_handler(State(handlers): Handlers, Path(id): Path<String>) -> ApiResult<()> {
    handlers.mark_notification_read(Path(id)).await
}

async fn set_clubs_handler(
    State(handlers): Handlers,
    Json(clubs): Json<Vec<Club>>,
) -> ApiResult<ClubCache> {
    handlers.set_clubs(Json(clubs)).await
}

async fn get_club_handler(State(handlers): Handlers, Path(id): Path<String>) -> ApiResult<Club> {
    handlers.get_club(Path(id)).await
}
