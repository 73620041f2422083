use super::helpers::fetch_ride;
use super::Engine;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    api::RideAPI,
    auth::User,
    entities::{Ride, RideDraft, RideFilter},
    error::Error,
};

const MIN_RATING: f64 = 1.0;
const MAX_RATING: f64 = 5.0;

impl Engine {
    /// Fills in the route from the directions provider when the client did
    /// not send one. The ride is still created if the lookup fails, only
    /// without a price ceiling.
    async fn complete_route(&self, draft: &mut RideDraft) {
        if draft.route.is_some() {
            return;
        }

        let directions = match &self.directions {
            Some(directions) => directions,
            None => return,
        };

        match directions
            .find_route(draft.origin.trim(), draft.destination.trim())
            .await
        {
            Ok(route) => draft.route = Some(route),
            Err(err) => tracing::warn!("route lookup failed, continuing without route: {}", err),
        }
    }
}

#[async_trait]
impl RideAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn create_ride(&self, user: User, mut draft: RideDraft) -> Result<Ride, Error> {
        self.complete_route(&mut draft).await;

        draft.validate(Utc::now(), &self.pricing)?;

        let ride = Ride::new(user.id.clone(), draft);

        self.store.insert_ride(&ride).await?;

        tracing::info!(ride_id = %ride.id, "ride created");

        Ok(ride)
    }

    #[tracing::instrument(skip(self))]
    async fn search_rides(&self, _user: User, filter: RideFilter) -> Result<Vec<Ride>, Error> {
        if let Some(max_price) = filter.max_price {
            if !max_price.is_finite() || max_price < 0.0 {
                return Err(Error::validation_error("maxPrice must be zero or positive"));
            }
        }

        self.store.search_rides(&filter, Utc::now()).await
    }

    #[tracing::instrument(skip(self))]
    async fn find_ride(&self, _user: User, id: Uuid) -> Result<Ride, Error> {
        fetch_ride(self.store.as_ref(), id).await
    }

    #[tracing::instrument(skip(self))]
    async fn update_ride(&self, user: User, id: Uuid, mut draft: RideDraft) -> Result<Ride, Error> {
        let mut ride = fetch_ride(self.store.as_ref(), id).await?;

        self.authorize(user.clone(), "update", ride.clone())?;

        let same_route = ride.origin.eq_ignore_ascii_case(draft.origin.trim())
            && ride.destination.eq_ignore_ascii_case(draft.destination.trim());

        if draft.route.is_none() && same_route {
            draft.route = ride.route.clone();
        }

        self.complete_route(&mut draft).await;

        draft.validate_update(Utc::now(), &self.pricing)?;

        ride.apply(draft);

        self.store.update_ride(&ride).await?;

        Ok(ride)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_ride(&self, user: User, id: Uuid) -> Result<(), Error> {
        let ride = fetch_ride(self.store.as_ref(), id).await?;

        self.authorize(user.clone(), "delete", ride.clone())?;

        self.store.delete_ride(ride.id).await?;

        tracing::info!(ride_id = %ride.id, "ride deleted");

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn rate_ride(&self, user: User, id: Uuid, rating: f64) -> Result<Ride, Error> {
        if !rating.is_finite() || rating < MIN_RATING || rating > MAX_RATING {
            return Err(Error::validation_error(format!(
                "rating must be between {} and {}",
                MIN_RATING, MAX_RATING
            )));
        }

        let mut ride = fetch_ride(self.store.as_ref(), id).await?;

        let booking = self
            .store
            .find_booking(ride.id, &user.identities())
            .await?
            .ok_or_else(Error::forbidden_error)?;

        self.authorize(user.clone(), "rate_ride", booking.clone())?;

        if !ride.has_departed(Utc::now()) {
            return Err(Error::validation_error("ride has not taken place yet"));
        }

        self.store.set_ride_rating(ride.id, rating).await?;

        ride.rating = Some(rating);

        Ok(ride)
    }

    fn price_ceiling(&self, distance_km: f64) -> Result<f64, Error> {
        if !distance_km.is_finite() || distance_km <= 0.0 {
            return Err(Error::validation_error("distance must be positive"));
        }

        Ok(self.pricing.ceiling(distance_km))
    }
}
