use chrono::{DateTime, Utc};
use oso::PolarClass;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{Profile, RideSummary};
use crate::error::Error;

#[derive(Clone, Debug, Serialize, Deserialize, PolarClass)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    #[polar(attribute)]
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    #[polar(attribute)]
    pub ride_id: Uuid,
    #[polar(attribute)]
    pub user_id: String,
    pub status: Status,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pending,
    Accepted,
    Rejected,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Response {
    Accept,
    Reject,
}

/// What the ride's seat count has to do after a booking transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeatChange {
    Keep,
    Restore,
}

impl Status {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(name: &str) -> Result<Self, Error> {
        match name {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            _ => Err(Error::validation_error(format!(
                "unknown booking status: {}",
                name
            ))),
        }
    }
}

impl Booking {
    pub fn new(ride_id: Uuid, user_id: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            ride_id,
            user_id,
            status: Status::Pending,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == Status::Pending
    }

    pub fn respond(&mut self, response: Response) -> Result<SeatChange, Error> {
        if !self.is_pending() {
            return Err(Error::validation_error(format!(
                "booking is already {}",
                self.status.name()
            )));
        }

        match response {
            Response::Accept => {
                self.status = Status::Accepted;
                Ok(SeatChange::Keep)
            }
            Response::Reject => {
                self.status = Status::Rejected;
                Ok(SeatChange::Restore)
            }
        }
    }

    /// Checks that the booking can still be withdrawn. A rejected booking has
    /// already given its seat back.
    pub fn ensure_cancellable(&self) -> Result<SeatChange, Error> {
        match self.status {
            Status::Pending | Status::Accepted => Ok(SeatChange::Restore),
            Status::Rejected => Err(Error::validation_error(
                "a rejected booking cannot be cancelled",
            )),
        }
    }
}

/// A booking made by the caller, shown with the ride it is for.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingWithRide {
    #[serde(flatten)]
    pub booking: Booking,
    pub ride: Option<RideSummary>,
}

/// A booking on one of the caller's rides, shown with the rider asking for it.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    #[serde(flatten)]
    pub booking: Booking,
    pub ride: RideSummary,
    pub rider: Option<Profile>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accept_keeps_seat_and_reject_restores_it() {
        let mut booking = Booking::new(Uuid::new_v4(), "u2".into());
        assert_eq!(booking.respond(Response::Accept).unwrap(), SeatChange::Keep);
        assert_eq!(booking.status, Status::Accepted);

        let mut booking = Booking::new(Uuid::new_v4(), "u2".into());
        assert_eq!(
            booking.respond(Response::Reject).unwrap(),
            SeatChange::Restore
        );
        assert_eq!(booking.status, Status::Rejected);
    }

    #[test]
    fn responding_twice_fails() {
        let mut booking = Booking::new(Uuid::new_v4(), "u2".into());
        booking.respond(Response::Reject).unwrap();

        let err = booking.respond(Response::Accept).unwrap_err();
        assert!(err.is_validation_error());
        assert_eq!(booking.status, Status::Rejected);
    }

    #[test]
    fn rejected_bookings_are_not_cancellable() {
        let mut booking = Booking::new(Uuid::new_v4(), "u2".into());
        assert_eq!(booking.ensure_cancellable().unwrap(), SeatChange::Restore);

        booking.respond(Response::Accept).unwrap();
        assert_eq!(booking.ensure_cancellable().unwrap(), SeatChange::Restore);

        let mut booking = Booking::new(Uuid::new_v4(), "u2".into());
        booking.respond(Response::Reject).unwrap();
        assert!(booking.ensure_cancellable().is_err());
    }

    #[test]
    fn status_names_round_trip() {
        for status in [Status::Pending, Status::Accepted, Status::Rejected] {
            assert_eq!(Status::parse(status.name()).unwrap(), status);
        }

        assert!(Status::parse("cancelled").is_err());
    }
}
