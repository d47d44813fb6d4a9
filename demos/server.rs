//! Simple REST API server example for the booking engine.
//!
//! Run with: `cargo run --example server`
//!
//! ## Endpoints
//!
//! - `POST /users` - Seed a ledger account
//! - `POST /items` - Seed a catalog item
//! - `POST /bookings` - Create a booking
//! - `POST /bookings/:id/status` - Transition a booking
//! - `GET /bookings/:id` - Get a booking by id
//! - `GET /users/:id/bookings` - Borrowed and lent bookings for a user
//! - `GET /users/:id/pending-count` - Pending bookings against a user's items
//! - `GET /users/:id/stats` - Profile statistics
//!
//! ## Example Usage
//!
//! ```bash
//! # Seed two users and an item
//! curl -X POST http://localhost:3000/users \
//!   -H "Content-Type: application/json" \
//!   -d '{"id": "alice", "name": "Alice", "email": "alice@example.com", "credits": 0}'
//! curl -X POST http://localhost:3000/users \
//!   -H "Content-Type: application/json" \
//!   -d '{"id": "bob", "name": "Bob", "email": "bob@example.com", "credits": 50}'
//! curl -X POST http://localhost:3000/items \
//!   -H "Content-Type: application/json" \
//!   -d '{"id": "drill", "title": "Cordless drill", "owner": "alice", "price": 10}'
//!
//! # Book the drill for two days (20 credits into escrow)
//! curl -X POST http://localhost:3000/bookings \
//!   -H "Content-Type: application/json" \
//!   -d '{"item_id": "drill", "borrower": "bob", "start_date": "2024-06-01T09:00:00Z", "end_date": "2024-06-03T09:00:00Z"}'
//!
//! # Approve, then mark returned (pays the owner)
//! curl -X POST http://localhost:3000/bookings/1/status \
//!   -H "Content-Type: application/json" -d '{"status": "approved"}'
//! curl -X POST http://localhost:3000/bookings/1/status \
//!   -H "Content-Type: application/json" -d '{"status": "returned"}'
//! ```

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use lendledger_rs::{
    Booking, BookingError, BookingId, BookingStatus, CreateBooking, Engine, ItemId, ItemRecord,
    MemoryItemStore, MemoryLedger, ProfileStats, UserBookings, UserId, UserRecord,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;

// === Request/Response DTOs ===

/// Request body for seeding a user.
#[derive(Debug, Deserialize)]
pub struct SeedUserRequest {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub image: Option<String>,
    pub credits: u64,
}

/// Request body for seeding an item.
#[derive(Debug, Deserialize)]
pub struct SeedItemRequest {
    pub id: String,
    pub title: String,
    pub owner: String,
    pub price: u64,
}

/// Request body for creating a booking.
#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub item_id: String,
    pub borrower: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

/// Request body for a status transition.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: BookingStatus,
}

/// Response body for a successful booking creation.
#[derive(Debug, Serialize)]
pub struct BookingCreatedResponse {
    pub success: bool,
    pub booking_id: u64,
}

/// Response body for a successful transition.
#[derive(Debug, Serialize)]
pub struct UpdatedResponse {
    pub success: bool,
}

/// Response body for pending-count queries.
#[derive(Debug, Serialize)]
pub struct PendingCountResponse {
    pub count: usize,
}

/// Response body for errors; `error` is suitable for direct display.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: String,
}

// === Application State ===

/// Shared application state containing the engine and its stores.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub items: Arc<MemoryItemStore>,
    pub ledger: Arc<MemoryLedger>,
}

// === Error Handling ===

/// Wrapper for converting `BookingError` into HTTP responses.
pub struct AppError(BookingError);

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            BookingError::MissingField(_) => (StatusCode::BAD_REQUEST, "MISSING_FIELD"),
            BookingError::InvalidDateRange => (StatusCode::BAD_REQUEST, "INVALID_DATE_RANGE"),
            BookingError::ItemNotFound => (StatusCode::NOT_FOUND, "ITEM_NOT_FOUND"),
            BookingError::ItemUnavailable => (StatusCode::CONFLICT, "ITEM_UNAVAILABLE"),
            BookingError::SelfBooking => (StatusCode::CONFLICT, "SELF_BOOKING"),
            BookingError::BorrowerNotFound => (StatusCode::NOT_FOUND, "BORROWER_NOT_FOUND"),
            BookingError::BookingNotFound => (StatusCode::NOT_FOUND, "BOOKING_NOT_FOUND"),
            BookingError::InsufficientCredits { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "INSUFFICIENT_CREDITS")
            }
            BookingError::InvalidTransition { .. } => (StatusCode::CONFLICT, "INVALID_TRANSITION"),
            BookingError::Persistence(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "PERSISTENCE_FAILURE")
            }
        };

        (
            status,
            Json(ErrorResponse {
                success: false,
                error: self.0.to_string(),
                code: code.to_string(),
            }),
        )
            .into_response()
    }
}

// === Handlers ===

/// POST /users - Seed a ledger account.
async fn seed_user(
    State(state): State<AppState>,
    Json(request): Json<SeedUserRequest>,
) -> StatusCode {
    state.ledger.insert_user(
        UserId(request.id),
        UserRecord {
            name: request.name,
            email: request.email,
            image: request.image,
            credits: request.credits,
        },
    );
    StatusCode::CREATED
}

/// POST /items - Seed a catalog item.
async fn seed_item(
    State(state): State<AppState>,
    Json(request): Json<SeedItemRequest>,
) -> StatusCode {
    state.items.insert_item(
        ItemId(request.id),
        ItemRecord {
            title: request.title,
            owner: UserId(request.owner),
            price: request.price,
            available: true,
        },
    );
    StatusCode::CREATED
}

/// POST /bookings - Create a new booking.
async fn create_booking(
    State(state): State<AppState>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingCreatedResponse>), AppError> {
    let booking_id = state.engine.create_booking(CreateBooking {
        item_id: ItemId(request.item_id),
        borrower: UserId(request.borrower),
        start_date: request.start_date,
        end_date: request.end_date,
    })?;

    Ok((
        StatusCode::CREATED,
        Json(BookingCreatedResponse {
            success: true,
            booking_id: booking_id.0,
        }),
    ))
}

/// POST /bookings/:id/status - Transition a booking.
async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<UpdatedResponse>, AppError> {
    state.engine.update_status(BookingId(id), request.status)?;
    Ok(Json(UpdatedResponse { success: true }))
}

/// GET /bookings/:id - Get a booking by id.
async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Booking>, AppError> {
    state
        .engine
        .get_booking(&BookingId(id))
        .map(Json)
        .ok_or(AppError(BookingError::BookingNotFound))
}

/// GET /users/:id/bookings - Borrowed and lent bookings for a user.
async fn user_bookings(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<UserBookings> {
    Json(state.engine.bookings_by_user(&UserId(id)))
}

/// GET /users/:id/pending-count - Pending bookings against a user's items.
async fn pending_count(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<PendingCountResponse> {
    Json(PendingCountResponse {
        count: state.engine.pending_lender_count(&UserId(id)),
    })
}

/// GET /users/:id/stats - Profile statistics.
async fn profile_stats(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProfileStats>, (StatusCode, Json<ErrorResponse>)> {
    state
        .engine
        .profile_stats(&UserId(id))
        .map(Json)
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    success: false,
                    error: "User not found".to_string(),
                    code: "USER_NOT_FOUND".to_string(),
                }),
            )
        })
}

// === Router ===

fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/users", post(seed_user))
        .route("/items", post(seed_item))
        .route("/bookings", post(create_booking))
        .route("/bookings/{id}", get(get_booking))
        .route("/bookings/{id}/status", post(update_status))
        .route("/users/{id}/bookings", get(user_bookings))
        .route("/users/{id}/pending-count", get(pending_count))
        .route("/users/{id}/stats", get(profile_stats))
        .with_state(state)
}

// === Main ===

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let items = Arc::new(MemoryItemStore::new());
    let ledger = Arc::new(MemoryLedger::new());
    let state = AppState {
        engine: Arc::new(Engine::new(items.clone(), ledger.clone())),
        items,
        ledger,
    };

    let app = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:3000").await.unwrap();
    println!("Lend Ledger API server running on http://127.0.0.1:3000");
    println!();
    println!("Endpoints:");
    println!("  POST /users                    - Seed a ledger account");
    println!("  POST /items                    - Seed a catalog item");
    println!("  POST /bookings                 - Create a booking");
    println!("  POST /bookings/:id/status      - Transition a booking");
    println!("  GET  /bookings/:id             - Get a booking by ID");
    println!("  GET  /users/:id/bookings       - Borrowed and lent bookings");
    println!("  GET  /users/:id/pending-count  - Pending lender count");
    println!("  GET  /users/:id/stats          - Profile statistics");

    axum::serve(listener, app).await.unwrap();
}
