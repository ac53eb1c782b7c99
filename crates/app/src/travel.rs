use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::info;
use workright_core::types::{
    AccommodationBooking, AccommodationBookingPatch, FlightBooking, FlightBookingPatch,
    NewAccommodationBooking, NewFlightBooking, RecordId,
};
use workright_storage::UnitOfWork;

use crate::employees::fetch_employee;
use crate::problem::ApiError;
use crate::router::AppState;
use crate::telemetry::record_write;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/accommodations",
            get(list_accommodations).post(create_accommodation),
        )
        .route(
            "/accommodations/:id",
            get(get_accommodation)
                .put(update_accommodation)
                .delete(delete_accommodation),
        )
        .route("/flights", get(list_flights).post(create_flight))
        .route(
            "/flights/:id",
            get(get_flight).put(update_flight).delete(delete_flight),
        )
}

async fn list_accommodations(
    State(state): State<AppState>,
) -> Result<Json<Vec<AccommodationBooking>>, ApiError> {
    let mut uow = state.storage().begin().await?;
    let bookings = uow.accommodations().list().await?;
    Ok(Json(bookings))
}

async fn create_accommodation(
    State(state): State<AppState>,
    Json(payload): Json<NewAccommodationBooking>,
) -> Result<(StatusCode, Json<AccommodationBooking>), ApiError> {
    let mut uow = state.storage().begin().await?;
    fetch_employee(&mut uow, payload.employee_id).await?;
    payload.validate()?;
    let booking = uow.accommodations().insert(&payload).await?;
    uow.commit().await?;

    record_write("accommodation_booking", "create");
    info!(stage = "travel", booking_id = booking.id, employee_id = booking.employee_id, "accommodation booked");
    Ok((StatusCode::CREATED, Json(booking)))
}

async fn get_accommodation(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> Result<Json<AccommodationBooking>, ApiError> {
    let mut uow = state.storage().begin().await?;
    let booking = fetch_accommodation(&mut uow, id).await?;
    Ok(Json(booking))
}

async fn update_accommodation(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
    Json(patch): Json<AccommodationBookingPatch>,
) -> Result<Json<AccommodationBooking>, ApiError> {
    let mut uow = state.storage().begin().await?;
    let mut booking = fetch_accommodation(&mut uow, id).await?;
    patch.apply(&mut booking)?;
    uow.accommodations().update(&booking).await?;
    uow.commit().await?;

    record_write("accommodation_booking", "update");
    Ok(Json(booking))
}

async fn delete_accommodation(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> Result<StatusCode, ApiError> {
    let mut uow = state.storage().begin().await?;
    if !uow.accommodations().delete(id).await? {
        return Err(ApiError::NotFound("Booking"));
    }
    uow.commit().await?;

    record_write("accommodation_booking", "delete");
    Ok(StatusCode::NO_CONTENT)
}

async fn list_flights(State(state): State<AppState>) -> Result<Json<Vec<FlightBooking>>, ApiError> {
    let mut uow = state.storage().begin().await?;
    let flights = uow.flights().list().await?;
    Ok(Json(flights))
}

async fn create_flight(
    State(state): State<AppState>,
    Json(payload): Json<NewFlightBooking>,
) -> Result<(StatusCode, Json<FlightBooking>), ApiError> {
    let mut uow = state.storage().begin().await?;
    fetch_employee(&mut uow, payload.employee_id).await?;
    payload.validate()?;
    let flight = uow.flights().insert(&payload).await?;
    uow.commit().await?;

    record_write("flight_booking", "create");
    info!(
        stage = "travel",
        flight_id = flight.id,
        employee_id = flight.employee_id,
        route = %format_args!("{}-{}", flight.departure_airport, flight.arrival_airport),
        "flight booked"
    );
    Ok((StatusCode::CREATED, Json(flight)))
}

async fn get_flight(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> Result<Json<FlightBooking>, ApiError> {
    let mut uow = state.storage().begin().await?;
    let flight = fetch_flight(&mut uow, id).await?;
    Ok(Json(flight))
}

async fn update_flight(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
    Json(patch): Json<FlightBookingPatch>,
) -> Result<Json<FlightBooking>, ApiError> {
    let mut uow = state.storage().begin().await?;
    let mut flight = fetch_flight(&mut uow, id).await?;
    patch.apply(&mut flight)?;
    uow.flights().update(&flight).await?;
    uow.commit().await?;

    record_write("flight_booking", "update");
    Ok(Json(flight))
}

async fn delete_flight(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> Result<StatusCode, ApiError> {
    let mut uow = state.storage().begin().await?;
    if !uow.flights().delete(id).await? {
        return Err(ApiError::NotFound("Flight"));
    }
    uow.commit().await?;

    record_write("flight_booking", "delete");
    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_accommodation(
    uow: &mut UnitOfWork,
    id: RecordId,
) -> Result<AccommodationBooking, ApiError> {
    uow.accommodations()
        .fetch(id)
        .await?
        .ok_or(ApiError::NotFound("Booking"))
}

async fn fetch_flight(uow: &mut UnitOfWork, id: RecordId) -> Result<FlightBooking, ApiError> {
    uow.flights()
        .fetch(id)
        .await?
        .ok_or(ApiError::NotFound("Flight"))
}
