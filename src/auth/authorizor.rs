use oso::{Oso, PolarClass};

use crate::auth::User;
use crate::entities::{Booking, Conversation, Ride};

pub fn new() -> Oso {
    let mut o = Oso::new();

    o.register_class(User::get_polar_class()).unwrap();
    o.register_class(Ride::get_polar_class()).unwrap();
    o.register_class(
        Booking::get_polar_class_builder()
            .add_attribute_getter("status", |recv: &Booking| recv.status.name().to_string())
            .build(),
    )
    .unwrap();
    o.register_class(Conversation::get_polar_class()).unwrap();

    o.load_str(include_str!("rules.polar")).unwrap();

    o
}

#[cfg(test)]
fn ride(owner_id: &str) -> Ride {
    use crate::entities::RideDraft;
    use chrono::{Duration, Utc};

    Ride::new(
        owner_id.into(),
        RideDraft {
            origin: "Oslo".into(),
            destination: "Trondheim".into(),
            departure: Utc::now() + Duration::days(1),
            price: 400.0,
            seats: 2,
            car: None,
            options: vec![],
            route: None,
        },
    )
}

#[test]
fn ride_owner_test() {
    let authorizor = new();

    let owner = User::new("u1", Some("owner@example.no".into()));
    let rider = User::new("u2", None);
    let ride = ride("u1");

    for action in ["update", "delete", "respond_booking"] {
        let result = authorizor.is_allowed(owner.clone(), action, ride.clone());
        assert_eq!(result.unwrap(), true);

        let result = authorizor.is_allowed(rider.clone(), action, ride.clone());
        assert_eq!(result.unwrap(), false);
    }
}

#[test]
fn ride_owner_by_email_test() {
    let authorizor = new();

    let owner = User::new("u1", Some("owner@example.no".into()));
    let ride = ride("owner@example.no");

    let result = authorizor.is_allowed(owner.clone(), "update", ride.clone());
    assert_eq!(result.unwrap(), true);
}

#[test]
fn booking_rider_test() {
    use crate::entities::BookingResponse;

    let authorizor = new();

    let rider = User::new("u2", None);
    let other = User::new("u3", None);
    let mut booking = Booking::new(ride("u1").id, "u2".into());

    let result = authorizor.is_allowed(rider.clone(), "cancel", booking.clone());
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(other.clone(), "cancel", booking.clone());
    assert_eq!(result.unwrap(), false);

    // only accepted bookings entitle the rider to rate the ride

    let result = authorizor.is_allowed(rider.clone(), "rate_ride", booking.clone());
    assert_eq!(result.unwrap(), false);

    booking.respond(BookingResponse::Accept).unwrap();

    let result = authorizor.is_allowed(rider.clone(), "rate_ride", booking.clone());
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(other.clone(), "rate_ride", booking.clone());
    assert_eq!(result.unwrap(), false);
}

#[test]
fn conversation_participant_test() {
    use crate::entities::ParticipantPair;

    let authorizor = new();

    let alice = User::new("alice", None);
    let bob = User::new("bob", None);
    let mallory = User::new("mallory", None);

    let pair = ParticipantPair::new("bob", "alice").unwrap();
    let conversation = Conversation::new(pair, None);

    for action in ["read", "post"] {
        for participant in [&alice, &bob] {
            let result = authorizor.is_allowed(participant.clone(), action, conversation.clone());
            assert_eq!(result.unwrap(), true);
        }

        let result = authorizor.is_allowed(mallory.clone(), action, conversation.clone());
        assert_eq!(result.unwrap(), false);
    }

    let result = authorizor.is_allowed(alice.clone(), "delete", conversation.clone());
    assert_eq!(result.unwrap(), false);
}
