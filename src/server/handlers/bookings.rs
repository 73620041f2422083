use axum::extract::{Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::{BookingAPI, DynAPI};
use crate::auth::User;
use crate::entities::{Booking, BookingResponse, BookingStatus};
use crate::error::Error;
use crate::server::extract::{ValidJson, ValidPath, ValidQuery};

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateParams {
    ride_id: Uuid,
}

#[derive(Serialize, Deserialize)]
pub struct RespondParams {
    action: BookingResponse,
}

#[derive(Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Mine,
    Owner,
}

#[derive(Serialize, Deserialize)]
pub struct ListParams {
    view: Option<View>,
    status: Option<BookingStatus>,
}

#[derive(Serialize, Deserialize)]
pub struct Created {
    success: bool,
    booking: Booking,
}

#[derive(Serialize, Deserialize)]
pub struct Responded {
    success: bool,
    status: BookingStatus,
}

pub async fn create(
    Extension(api): Extension<DynAPI>,
    user: User,
    ValidJson(params): ValidJson<CreateParams>,
) -> Result<Json<Created>, Error> {
    let booking = api.create_booking(user, params.ride_id).await?;

    Ok(Created {
        success: true,
        booking,
    }
    .into())
}

pub async fn list(
    Extension(api): Extension<DynAPI>,
    user: User,
    ValidQuery(params): ValidQuery<ListParams>,
) -> Result<Json<Value>, Error> {
    let list = match params.view.unwrap_or(View::Mine) {
        View::Mine => serde_json::to_value(api.list_my_bookings(user).await?),
        View::Owner => {
            let status = params.status.unwrap_or(BookingStatus::Pending);
            serde_json::to_value(api.list_booking_requests(user, Some(status)).await?)
        }
    }
    .map_err(|_| Error::unexpected_error())?;

    Ok(list.into())
}

pub async fn respond(
    Extension(api): Extension<DynAPI>,
    user: User,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(params): ValidJson<RespondParams>,
) -> Result<Json<Responded>, Error> {
    let booking = api.respond_to_booking(user, id, params.action).await?;

    Ok(Responded {
        success: true,
        status: booking.status,
    }
    .into())
}

pub async fn cancel(
    Extension(api): Extension<DynAPI>,
    user: User,
    ValidPath(id): ValidPath<Uuid>,
) -> Result<Json<Value>, Error> {
    api.cancel_booking(user, id).await?;

    Ok(json!({ "success": true }).into())
}
