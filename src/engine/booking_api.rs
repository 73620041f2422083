use super::helpers::{fetch_booking, fetch_profiles_with_ratings, fetch_ride, fetch_rides_by_id};
use super::Engine;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    api::BookingAPI,
    auth::User,
    entities::{
        Booking, BookingRequest, BookingResponse, BookingStatus, BookingWithRide, SeatChange,
    },
    error::Error,
};

impl Engine {
    /// Second phase of a booking: takes the seat the booking stands for. The
    /// booking row is already written at this point, so when the seat cannot
    /// be taken the row is deleted again.
    ///
    /// The two writes are not atomic. If the process dies between them, a
    /// pending booking is left behind without a seat held for it.
    async fn reserve_seat_for(&self, booking: &Booking) -> Result<(), Error> {
        let err = match self.store.reserve_seat(booking.ride_id).await {
            Ok(true) => return Ok(()),
            Ok(false) => Error::conflict_error("ride is full"),
            Err(err) => err,
        };

        tracing::warn!(booking_id = %booking.id, "seat reservation failed, rolling back booking");

        if let Err(rollback_err) = self.store.delete_booking(booking.id).await {
            tracing::error!(
                booking_id = %booking.id,
                "failed to roll back booking: {}",
                rollback_err
            );
        }

        Err(err)
    }

    async fn apply_seat_change(&self, ride_id: Uuid, change: SeatChange) -> Result<(), Error> {
        match change {
            SeatChange::Keep => Ok(()),
            SeatChange::Restore => self.store.release_seat(ride_id).await,
        }
    }
}

#[async_trait]
impl BookingAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn create_booking(&self, user: User, ride_id: Uuid) -> Result<Booking, Error> {
        let ride = fetch_ride(self.store.as_ref(), ride_id).await?;

        if ride.is_full() {
            return Err(Error::conflict_error("ride is full"));
        }

        if user.identities().iter().any(|id| ride.is_owned_by(id)) {
            return Err(Error::validation_error("cannot book your own ride"));
        }

        if ride.has_departed(Utc::now()) {
            return Err(Error::validation_error("ride has already departed"));
        }

        // not guarded against a concurrent request from the same user
        let existing = self
            .store
            .find_booking(ride.id, &user.identities())
            .await?;

        if existing.is_some() {
            return Err(Error::conflict_error("you have already booked this ride"));
        }

        let booking = Booking::new(ride.id, user.id.clone());

        self.store.insert_booking(&booking).await?;
        self.reserve_seat_for(&booking).await?;

        tracing::info!(booking_id = %booking.id, ride_id = %ride.id, "booking created");

        Ok(booking)
    }

    #[tracing::instrument(skip(self))]
    async fn respond_to_booking(
        &self,
        user: User,
        id: Uuid,
        response: BookingResponse,
    ) -> Result<Booking, Error> {
        let mut booking = fetch_booking(self.store.as_ref(), id).await?;
        let ride = fetch_ride(self.store.as_ref(), booking.ride_id).await?;

        self.authorize(user.clone(), "respond_booking", ride.clone())?;

        let seat_change = booking.respond(response)?;

        self.store.update_booking_status(&booking).await?;
        self.apply_seat_change(ride.id, seat_change).await?;

        tracing::info!(booking_id = %booking.id, status = booking.status.name(), "booking answered");

        Ok(booking)
    }

    #[tracing::instrument(skip(self))]
    async fn cancel_booking(&self, user: User, id: Uuid) -> Result<(), Error> {
        let booking = fetch_booking(self.store.as_ref(), id).await?;

        self.authorize(user.clone(), "cancel", booking.clone())?;

        let seat_change = booking.ensure_cancellable()?;

        let ride = fetch_ride(self.store.as_ref(), booking.ride_id).await?;

        if ride.has_departed(Utc::now()) {
            return Err(Error::validation_error(
                "bookings cannot be cancelled after departure",
            ));
        }

        self.store.delete_booking(booking.id).await?;
        self.apply_seat_change(ride.id, seat_change).await?;

        tracing::info!(booking_id = %booking.id, "booking cancelled");

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn list_my_bookings(&self, user: User) -> Result<Vec<BookingWithRide>, Error> {
        let bookings = self
            .store
            .fetch_bookings_by_users(&user.identities())
            .await?;

        let ride_ids: Vec<Uuid> = bookings.iter().map(|b| b.ride_id).collect();
        let rides = fetch_rides_by_id(self.store.as_ref(), &ride_ids).await?;

        Ok(bookings
            .into_iter()
            .map(|booking| BookingWithRide {
                ride: rides.get(&booking.ride_id).map(|r| r.summary()),
                booking,
            })
            .collect())
    }

    #[tracing::instrument(skip(self))]
    async fn list_booking_requests(
        &self,
        user: User,
        status: Option<BookingStatus>,
    ) -> Result<Vec<BookingRequest>, Error> {
        let rides = self
            .store
            .fetch_rides_by_owners(&user.identities())
            .await?;

        let ride_ids: Vec<Uuid> = rides.iter().map(|r| r.id).collect();

        if ride_ids.is_empty() {
            return Ok(vec![]);
        }

        let bookings = self
            .store
            .fetch_bookings_for_rides(&ride_ids, status)
            .await?;

        let rider_ids: Vec<String> = bookings.iter().map(|b| b.user_id.clone()).collect();
        let riders = fetch_profiles_with_ratings(self.store.as_ref(), &rider_ids).await?;

        let mut requests = vec![];

        for booking in bookings {
            let ride = match rides.iter().find(|r| r.id == booking.ride_id) {
                Some(ride) => ride.summary(),
                None => continue,
            };

            requests.push(BookingRequest {
                rider: riders.get(&booking.user_id).cloned(),
                ride,
                booking,
            });
        }

        Ok(requests)
    }
}
