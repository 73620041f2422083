use chrono::{DateTime, Utc};
use oso::PolarClass;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::PricingPolicy;
use crate::error::Error;

pub const MAX_SEATS: i32 = 8;

#[derive(Clone, Debug, Serialize, Deserialize, PolarClass)]
#[serde(rename_all = "camelCase")]
pub struct Ride {
    #[polar(attribute)]
    pub id: Uuid,
    pub origin: String,
    pub destination: String,
    pub departure: DateTime<Utc>,
    pub price: f64,
    pub seats: i32,
    #[polar(attribute)]
    pub owner_id: String,
    pub car: Option<Car>,
    pub options: Vec<String>,
    pub route: Option<RouteInfo>,
    pub rating: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Car {
    pub make: Option<String>,
    pub model: Option<String>,
    pub color: Option<String>,
    pub plate: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteInfo {
    pub distance_km: f64,
    pub duration_minutes: Option<f64>,
    pub polyline: Option<String>,
}

/// Owner-editable fields of a ride.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RideDraft {
    pub origin: String,
    pub destination: String,
    pub departure: DateTime<Utc>,
    pub price: f64,
    pub seats: i32,
    #[serde(default)]
    pub car: Option<Car>,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub route: Option<RouteInfo>,
}

/// The subset of a ride shown next to bookings and conversations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RideSummary {
    pub id: Uuid,
    pub origin: String,
    pub destination: String,
    pub departure: DateTime<Utc>,
    pub price: f64,
    pub seats: i32,
    pub owner_id: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RideFilter {
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub date: Option<chrono::NaiveDate>,
    pub min_seats: Option<i32>,
    pub max_price: Option<f64>,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub include_full: bool,
}

impl RideDraft {
    /// Validation for a new ride, which must offer at least one seat.
    pub fn validate(&self, now: DateTime<Utc>, pricing: &PricingPolicy) -> Result<(), Error> {
        self.validate_with_min_seats(now, pricing, 1)
    }

    /// Validation for an edit. The owner may mark a ride as full.
    pub fn validate_update(
        &self,
        now: DateTime<Utc>,
        pricing: &PricingPolicy,
    ) -> Result<(), Error> {
        self.validate_with_min_seats(now, pricing, 0)
    }

    fn validate_with_min_seats(
        &self,
        now: DateTime<Utc>,
        pricing: &PricingPolicy,
        min_seats: i32,
    ) -> Result<(), Error> {
        let origin = self.origin.trim();
        let destination = self.destination.trim();

        if origin.is_empty() || destination.is_empty() {
            return Err(Error::validation_error("origin and destination are required"));
        }

        if origin.eq_ignore_ascii_case(destination) {
            return Err(Error::validation_error(
                "origin and destination must differ",
            ));
        }

        if self.departure <= now {
            return Err(Error::validation_error("departure must be in the future"));
        }

        if self.seats < min_seats || self.seats > MAX_SEATS {
            return Err(Error::validation_error(format!(
                "seats must be between {} and {}",
                min_seats, MAX_SEATS
            )));
        }

        if !self.price.is_finite() || self.price < 0.0 {
            return Err(Error::validation_error("price must be zero or positive"));
        }

        if let Some(route) = &self.route {
            if !route.distance_km.is_finite() || route.distance_km <= 0.0 {
                return Err(Error::validation_error("route distance must be positive"));
            }

            let ceiling = pricing.ceiling(route.distance_km);

            if self.price > ceiling {
                return Err(Error::validation_error(format!(
                    "price exceeds the maximum of {} for this route",
                    ceiling
                )));
            }
        }

        Ok(())
    }
}

impl Ride {
    pub fn new(owner_id: String, draft: RideDraft) -> Self {
        let mut ride = Self {
            id: Uuid::new_v4(),
            origin: String::new(),
            destination: String::new(),
            departure: draft.departure,
            price: 0.0,
            seats: 0,
            owner_id,
            car: None,
            options: vec![],
            route: None,
            rating: None,
            created_at: Utc::now(),
        };

        ride.apply(draft);
        ride
    }

    pub fn apply(&mut self, draft: RideDraft) {
        self.origin = draft.origin.trim().into();
        self.destination = draft.destination.trim().into();
        self.departure = draft.departure;
        self.price = draft.price;
        self.seats = draft.seats;
        self.car = draft.car;
        self.options = normalize_options(draft.options);
        self.route = draft.route;
    }

    pub fn is_full(&self) -> bool {
        self.seats <= 0
    }

    pub fn has_departed(&self, now: DateTime<Utc>) -> bool {
        self.departure <= now
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_id == user_id
    }

    pub fn summary(&self) -> RideSummary {
        RideSummary {
            id: self.id,
            origin: self.origin.clone(),
            destination: self.destination.clone(),
            departure: self.departure,
            price: self.price,
            seats: self.seats,
            owner_id: self.owner_id.clone(),
        }
    }

    pub fn matches(&self, filter: &RideFilter, now: DateTime<Utc>) -> bool {
        if self.has_departed(now) {
            return false;
        }

        if let Some(origin) = &filter.origin {
            if !contains_ignore_case(&self.origin, origin) {
                return false;
            }
        }

        if let Some(destination) = &filter.destination {
            if !contains_ignore_case(&self.destination, destination) {
                return false;
            }
        }

        if let Some(date) = filter.date {
            if self.departure.date_naive() != date {
                return false;
            }
        }

        if !filter.include_full && self.seats < filter.min_seats.unwrap_or(1).max(1) {
            return false;
        }

        if let Some(max_price) = filter.max_price {
            if self.price > max_price {
                return false;
            }
        }

        filter
            .options
            .iter()
            .all(|wanted| self.options.iter().any(|o| o.eq_ignore_ascii_case(wanted)))
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack
        .to_lowercase()
        .contains(needle.trim().to_lowercase().as_str())
}

fn normalize_options(options: Vec<String>) -> Vec<String> {
    let mut normalized: Vec<String> = vec![];

    for option in options {
        let option = option.trim();

        if !option.is_empty() && !normalized.iter().any(|o| o.eq_ignore_ascii_case(option)) {
            normalized.push(option.into());
        }
    }

    normalized
}
