use axum::extract::{Extension, Json};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::{DynAPI, RideAPI};
use crate::auth::User;
use crate::entities::{Ride, RideDraft, RideFilter};
use crate::error::Error;
use crate::server::extract::{ValidJson, ValidPath, ValidQuery};

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    origin: Option<String>,
    destination: Option<String>,
    date: Option<NaiveDate>,
    min_seats: Option<i32>,
    max_price: Option<f64>,
    /// Comma separated option tags.
    options: Option<String>,
    #[serde(default)]
    include_full: bool,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceCeilingParams {
    distance_km: f64,
}

#[derive(Serialize, Deserialize)]
pub struct RateParams {
    rating: f64,
}

impl From<SearchParams> for RideFilter {
    fn from(params: SearchParams) -> Self {
        let non_blank = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        Self {
            origin: non_blank(params.origin),
            destination: non_blank(params.destination),
            date: params.date,
            min_seats: params.min_seats,
            max_price: params.max_price,
            options: params
                .options
                .unwrap_or_default()
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect(),
            include_full: params.include_full,
        }
    }
}

pub async fn create(
    Extension(api): Extension<DynAPI>,
    user: User,
    ValidJson(draft): ValidJson<RideDraft>,
) -> Result<Json<Ride>, Error> {
    let ride = api.create_ride(user, draft).await?;

    Ok(ride.into())
}

pub async fn search(
    Extension(api): Extension<DynAPI>,
    user: User,
    ValidQuery(params): ValidQuery<SearchParams>,
) -> Result<Json<Vec<Ride>>, Error> {
    let rides = api.search_rides(user, params.into()).await?;

    Ok(rides.into())
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    user: User,
    ValidPath(id): ValidPath<Uuid>,
) -> Result<Json<Ride>, Error> {
    let ride = api.find_ride(user, id).await?;

    Ok(ride.into())
}

pub async fn update(
    Extension(api): Extension<DynAPI>,
    user: User,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(draft): ValidJson<RideDraft>,
) -> Result<Json<Ride>, Error> {
    let ride = api.update_ride(user, id, draft).await?;

    Ok(ride.into())
}

pub async fn delete(
    Extension(api): Extension<DynAPI>,
    user: User,
    ValidPath(id): ValidPath<Uuid>,
) -> Result<Json<Value>, Error> {
    api.delete_ride(user, id).await?;

    Ok(json!({ "success": true }).into())
}

pub async fn rate(
    Extension(api): Extension<DynAPI>,
    user: User,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(params): ValidJson<RateParams>,
) -> Result<Json<Ride>, Error> {
    let ride = api.rate_ride(user, id, params.rating).await?;

    Ok(ride.into())
}

pub async fn price_ceiling(
    Extension(api): Extension<DynAPI>,
    _user: User,
    ValidQuery(params): ValidQuery<PriceCeilingParams>,
) -> Result<Json<Value>, Error> {
    let ceiling = api.price_ceiling(params.distance_km)?;

    Ok(json!({ "distanceKm": params.distance_km, "ceiling": ceiling }).into())
}
