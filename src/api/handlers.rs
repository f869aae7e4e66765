// SPDX-License-Identifier: GPL-3.0-only
use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::backend::BackendError;
use crate::session::{BackendProfile, Credential, ProfileUpdateError, SessionService};
use crate::storage::KeyValueStore;
use crate::stores::cart::summarize;
use crate::stores::{
    CartItem, CartStore, CartSummary, Club, ClubCache, ClubStore, NotificationItem,
    NotificationStore, SavedEventsStore,
};
use crate::validation::{check_booking, compute_missing_fields, BookingDecision, MissingField};

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            success: false,
            data,
            error: Some(message.into()),
        }
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, StatusCode>;

/// Rejection carrying the per-field messages of a refused profile edit
pub type FieldErrors = (StatusCode, Json<ApiResponse<BTreeMap<String, String>>>);

#[derive(Debug, Default, Deserialize)]
pub struct BookingQuery {
    #[serde(default)]
    pub sector: String,
}

#[derive(Debug, Deserialize)]
pub struct SendCodeRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmCodeRequest {
    pub email: String,
    pub code: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QuantityRequest {
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct NewNotificationRequest {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub data: Option<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<CartItem>,
    pub summary: CartSummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedToggle {
    pub id: String,
    pub saved: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationsView {
    pub items: Vec<NotificationItem>,
    pub unread_count: usize,
}

pub struct ApiHandlers {
    session: Arc<SessionService>,
    cart: CartStore,
    saved: SavedEventsStore,
    notifications: NotificationStore,
    clubs: ClubStore,
    platform_fee: u32,
}

impl ApiHandlers {
    pub fn new(session: Arc<SessionService>, store: Arc<dyn KeyValueStore>, platform_fee: u32) -> Self {
        Self {
            session,
            cart: CartStore::new(Arc::clone(&store)),
            saved: SavedEventsStore::new(Arc::clone(&store)),
            notifications: NotificationStore::new(Arc::clone(&store)),
            clubs: ClubStore::new(store),
            platform_fee,
        }
    }
}

fn storage_failure(e: anyhow::Error, action: &str) -> StatusCode {
    error!(error = %e, action = %action, "Local storage failure");
    StatusCode::INTERNAL_SERVER_ERROR
}

/// Backend 4xx answers are the caller's fault; everything else is upstream's
fn backend_status(e: &BackendError) -> StatusCode {
    match e {
        BackendError::Status { status, .. } if (400..500).contains(status) => StatusCode::BAD_REQUEST,
        _ => StatusCode::BAD_GATEWAY,
    }
}

impl ApiHandlers {
    pub async fn health() -> Json<ApiResponse<&'static str>> {
        Json(ApiResponse::success("ok"))
    }

    pub async fn get_session(&self) -> ApiResult<BackendProfile> {
        match self.session.get_user_session().await {
            Some(profile) => Ok(Json(ApiResponse::success(profile))),
            None => Err(StatusCode::NOT_FOUND),
        }
    }

    /// Soft sync failure still answers 200 with `data: null`
    pub async fn sign_in(
        &self,
        Json(credential): Json<Credential>,
    ) -> Json<ApiResponse<Option<BackendProfile>>> {
        info!(email = %credential.email, "Sign-in request received");

        match self.session.sign_in(credential).await {
            Some(profile) => Json(ApiResponse::success(Some(profile))),
            None => Json(ApiResponse {
                success: true,
                data: None,
                error: Some("Signed in, but the profile could not be synced".to_string()),
            }),
        }
    }

    pub async fn sign_out(&self) -> ApiResult<()> {
        self.session
            .sign_out()
            .await
            .map_err(|e| storage_failure(e, "sign out"))?;
        Ok(Json(ApiResponse::success(())))
    }

    /// A guest has every field missing
    pub async fn missing_fields(&self) -> Json<ApiResponse<Vec<MissingField>>> {
        let profile = self.session.get_user_session().await.unwrap_or_default();
        Json(ApiResponse::success(compute_missing_fields(&profile)))
    }

    pub async fn booking(&self, Query(query): Query<BookingQuery>) -> Json<ApiResponse<BookingDecision>> {
        let profile = self.session.get_user_session().await;
        Json(ApiResponse::success(check_booking(profile.as_ref(), &query.sector)))
    }

    pub async fn update_profile(
        &self,
        Json(edited): Json<Map<String, Value>>,
    ) -> Result<Json<ApiResponse<BackendProfile>>, FieldErrors> {
        match self.session.update_profile(&edited).await {
            Ok(profile) => Ok(Json(ApiResponse::success(profile))),
            Err(ProfileUpdateError::Invalid(errors)) => Err((
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ApiResponse::failure("Some fields are invalid", Some(errors))),
            )),
            Err(e) => {
                let status = match &e {
                    ProfileUpdateError::NotSynced => StatusCode::UNAUTHORIZED,
                    ProfileUpdateError::Backend(inner) => backend_status(inner),
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                warn!(error = %e, "Profile update refused");
                Err((status, Json(ApiResponse::failure(e.to_string(), None))))
            }
        }
    }

    pub async fn send_verification_code(&self, Json(request): Json<SendCodeRequest>) -> ApiResult<()> {
        match self.session.send_verification_code(&request.email).await {
            Ok(()) => Ok(Json(ApiResponse::success(()))),
            Err(e) => {
                warn!(error = %e, email = %request.email, "Failed to send verification code");
                Err(backend_status(&e))
            }
        }
    }

    pub async fn confirm_verification_code(
        &self,
        Json(request): Json<ConfirmCodeRequest>,
    ) -> ApiResult<BackendProfile> {
        let result = self
            .session
            .confirm_verification_code(&request.email, &request.code, request.name.as_deref())
            .await;

        match result {
            Ok(profile) => Ok(Json(ApiResponse::success(profile))),
            Err(e) => {
                warn!(error = %e, email = %request.email, "Verification failed");
                Err(e
                    .downcast_ref::<BackendError>()
                    .map(backend_status)
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR))
            }
        }
    }

    /// Totals cover exactly `items`
    fn cart_view(&self, items: Vec<CartItem>) -> CartView {
        let summary = summarize(&items, self.platform_fee);
        CartView { items, summary }
    }

    pub async fn get_cart(&self) -> Json<ApiResponse<CartView>> {
        let items = self.cart.items().await;
        Json(ApiResponse::success(self.cart_view(items)))
    }

    pub async fn add_to_cart(&self, Json(item): Json<CartItem>) -> ApiResult<CartView> {
        let items = self
            .cart
            .add(item)
            .await
            .map_err(|e| storage_failure(e, "add to cart"))?;
        Ok(Json(ApiResponse::success(self.cart_view(items))))
    }

    pub async fn update_cart_quantity(
        &self,
        Path(id): Path<String>,
        Json(request): Json<QuantityRequest>,
    ) -> ApiResult<CartView> {
        let items = self
            .cart
            .update_quantity(&id, request.quantity)
            .await
            .map_err(|e| storage_failure(e, "update cart quantity"))?;
        Ok(Json(ApiResponse::success(self.cart_view(items))))
    }

    pub async fn remove_from_cart(&self, Path(id): Path<String>) -> ApiResult<CartView> {
        let items = self
            .cart
            .remove(&id)
            .await
            .map_err(|e| storage_failure(e, "remove from cart"))?;
        Ok(Json(ApiResponse::success(self.cart_view(items))))
    }

    pub async fn clear_cart(&self) -> ApiResult<()> {
        self.cart
            .clear()
            .await
            .map_err(|e| storage_failure(e, "clear cart"))?;
        Ok(Json(ApiResponse::success(())))
    }

    pub async fn list_saved(&self) -> Json<ApiResponse<Vec<String>>> {
        Json(ApiResponse::success(self.saved.list().await))
    }

    pub async fn toggle_saved(&self, Path(id): Path<String>) -> ApiResult<SavedToggle> {
        let saved = self
            .saved
            .toggle(&id)
            .await
            .map_err(|e| storage_failure(e, "toggle saved event"))?;
        Ok(Json(ApiResponse::success(SavedToggle { id, saved })))
    }

    pub async fn list_notifications(&self) -> Json<ApiResponse<NotificationsView>> {
        let items = self.notifications.list().await;
        let unread_count = items.iter().filter(|item| !item.read).count();
        Json(ApiResponse::success(NotificationsView { items, unread_count }))
    }

    pub async fn add_notification(
        &self,
        Json(request): Json<NewNotificationRequest>,
    ) -> ApiResult<NotificationItem> {
        let item = self
            .notifications
            .add(request.title, request.body, request.data)
            .await
            .map_err(|e| storage_failure(e, "add notification"))?;
        Ok(Json(ApiResponse::success(item)))
    }

    pub async fn mark_notification_read(&self, Path(id): Path<String>) -> ApiResult<()> {
        let found = self
            .notifications
            .mark_as_read(&id)
            .await
            .map_err(|e| storage_failure(e, "mark notification read"))?;

        if found {
            Ok(Json(ApiResponse::success(())))
        } else {
            Err(StatusCode::NOT_FOUND)
        }
    }

    pub async fn mark_all_notifications_read(&self) -> ApiResult<()> {
        self.notifications
            .mark_all_as_read()
            .await
            .map_err(|e| storage_failure(e, "mark all notifications read"))?;
        Ok(Json(ApiResponse::success(())))
    }

    pub async fn clear_notifications(&self) -> ApiResult<()> {
        self.notifications
            .clear_all()
            .await
            .map_err(|e| storage_failure(e, "clear notifications"))?;
        Ok(Json(ApiResponse::success(())))
    }

    pub async fn set_clubs(&self, Json(clubs): Json<Vec<Club>>) -> ApiResult<ClubCache> {
        let cache = self
            .clubs
            .set_clubs(clubs)
            .await
            .map_err(|e| storage_failure(e, "store clubs"))?;
        Ok(Json(ApiResponse::success(cache)))
    }

    pub async fn get_club(&self, Path(id): Path<String>) -> ApiResult<Club> {
        match self.clubs.get(&id).await {
            Some(club) => Ok(Json(ApiResponse::success(club))),
            None => Err(StatusCode::NOT_FOUND),
        }
    }
}
