mod common;

use chrono::Duration;
use uuid::Uuid;

use lyvo::api::{BookingAPI, RideAPI};
use lyvo::db::Store;
use lyvo::entities::{BookingResponse, RideFilter, RouteInfo};

use common::{draft, engine, insert_ride, user};

fn route(distance_km: f64) -> Option<RouteInfo> {
    Some(RouteInfo {
        distance_km,
        duration_minutes: None,
        polyline: None,
    })
}

#[tokio::test]
async fn create_ride_respects_the_price_ceiling() {
    let (engine, _store) = engine();

    let mut too_expensive = draft(3);
    too_expensive.route = route(100.0);

    let err = engine
        .create_ride(user("u1"), too_expensive)
        .await
        .unwrap_err();
    assert!(err.is_validation_error());

    let mut fair = draft(3);
    fair.route = route(200.0);
    fair.options = vec![" Pets ".into(), "pets".into(), "Ski rack".into()];

    let ride = engine.create_ride(user("u1"), fair).await.unwrap();
    assert_eq!(ride.owner_id, "u1");
    assert_eq!(ride.options, vec!["Pets", "Ski rack"]);

    let found = engine.find_ride(user("u2"), ride.id).await.unwrap();
    assert_eq!(found.id, ride.id);

    assert_eq!(engine.price_ceiling(100.0).unwrap(), 250.0);
    assert_eq!(engine.price_ceiling(3.0).unwrap(), 50.0);
    assert!(engine.price_ceiling(0.0).unwrap_err().is_validation_error());
}

#[tokio::test]
async fn create_ride_rejects_bad_drafts() {
    let (engine, _store) = engine();

    let mut same_city = draft(2);
    same_city.destination = "oslo".into();

    let mut no_seats = draft(0);
    no_seats.destination = "Trondheim".into();

    let mut past = draft(2);
    past.departure = chrono::Utc::now() - Duration::hours(1);

    for bad in [same_city, no_seats, past, draft(9)] {
        let err = engine.create_ride(user("u1"), bad).await.unwrap_err();
        assert!(err.is_validation_error());
    }
}

#[tokio::test]
async fn search_only_returns_upcoming_rides_with_seats() {
    let (engine, store) = engine();

    let later = insert_ride(store.as_ref(), "u1", 2, Duration::days(2)).await;
    let sooner = insert_ride(store.as_ref(), "u1", 1, Duration::days(1)).await;
    let full = insert_ride(store.as_ref(), "u1", 0, Duration::days(1)).await;
    insert_ride(store.as_ref(), "u1", 3, -Duration::days(1)).await;

    let rides = engine
        .search_rides(user("u2"), RideFilter::default())
        .await
        .unwrap();
    let ids: Vec<Uuid> = rides.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![sooner.id, later.id]);

    let filter = RideFilter {
        origin: Some("osl".into()),
        destination: Some("BERG".into()),
        min_seats: Some(2),
        ..Default::default()
    };
    let rides = engine.search_rides(user("u2"), filter).await.unwrap();
    assert_eq!(rides.len(), 1);
    assert_eq!(rides[0].id, later.id);

    let filter = RideFilter {
        include_full: true,
        ..Default::default()
    };
    let rides = engine.search_rides(user("u2"), filter).await.unwrap();
    assert_eq!(rides.len(), 3);
    assert!(rides.iter().any(|r| r.id == full.id));

    let filter = RideFilter {
        destination: Some("Stavanger".into()),
        ..Default::default()
    };
    assert!(engine
        .search_rides(user("u2"), filter)
        .await
        .unwrap()
        .is_empty());

    let filter = RideFilter {
        max_price: Some(-1.0),
        ..Default::default()
    };
    let err = engine.search_rides(user("u2"), filter).await.unwrap_err();
    assert!(err.is_validation_error());
}

#[tokio::test]
async fn search_terms_are_matched_literally() {
    let (engine, store) = engine();

    insert_ride(store.as_ref(), "u1", 2, Duration::days(1)).await;

    for term in ["_", "%", "O%o", "B_rgen"] {
        let filter = RideFilter {
            origin: Some(term.into()),
            ..Default::default()
        };
        assert!(engine
            .search_rides(user("u2"), filter)
            .await
            .unwrap()
            .is_empty());

        let filter = RideFilter {
            destination: Some(term.into()),
            ..Default::default()
        };
        assert!(engine
            .search_rides(user("u2"), filter)
            .await
            .unwrap()
            .is_empty());
    }
}

#[tokio::test]
async fn only_the_owner_can_change_a_ride() {
    let (engine, store) = engine();

    let ride = engine.create_ride(user("u1"), draft(3)).await.unwrap();

    let mut changed = draft(2);
    changed.price = 300.0;

    let err = engine
        .update_ride(user("u2"), ride.id, changed.clone())
        .await
        .unwrap_err();
    assert!(err.is_forbidden_error());

    let err = engine.delete_ride(user("u2"), ride.id).await.unwrap_err();
    assert!(err.is_forbidden_error());

    let updated = engine
        .update_ride(user("u1"), ride.id, changed)
        .await
        .unwrap();
    assert_eq!(updated.seats, 2);
    assert_eq!(updated.price, 300.0);

    // the owner may mark the ride as full
    let updated = engine
        .update_ride(user("u1"), ride.id, draft(0))
        .await
        .unwrap();
    assert!(updated.is_full());

    let err = engine
        .update_ride(user("u1"), ride.id, draft(-1))
        .await
        .unwrap_err();
    assert!(err.is_validation_error());

    let stored = store.fetch_ride(ride.id).await.unwrap().unwrap();
    assert_eq!(stored.seats, 0);
}

#[tokio::test]
async fn deleting_a_ride_removes_its_bookings() {
    let (engine, store) = engine();

    let ride = engine.create_ride(user("u1"), draft(3)).await.unwrap();
    let booking = engine.create_booking(user("u2"), ride.id).await.unwrap();

    engine.delete_ride(user("u1"), ride.id).await.unwrap();

    assert!(store.fetch_ride(ride.id).await.unwrap().is_none());
    assert!(store.fetch_booking(booking.id).await.unwrap().is_none());

    let err = engine.find_ride(user("u1"), ride.id).await.unwrap_err();
    assert!(err.is_not_found_error());
}

#[tokio::test]
async fn passengers_rate_past_rides() {
    let (engine, store) = engine();

    let ride = engine.create_ride(user("u1"), draft(3)).await.unwrap();
    let booking = engine.create_booking(user("u2"), ride.id).await.unwrap();
    engine.create_booking(user("u3"), ride.id).await.unwrap();

    // pending bookings do not count
    let err = engine.rate_ride(user("u2"), ride.id, 5.0).await.unwrap_err();
    assert!(err.is_forbidden_error());

    engine
        .respond_to_booking(user("u1"), booking.id, BookingResponse::Accept)
        .await
        .unwrap();

    // the ride has not happened yet
    let err = engine.rate_ride(user("u2"), ride.id, 5.0).await.unwrap_err();
    assert!(err.is_validation_error());

    let mut past = store.fetch_ride(ride.id).await.unwrap().unwrap();
    past.departure = chrono::Utc::now() - Duration::hours(3);
    store.update_ride(&past).await.unwrap();

    for someone in ["u1", "u3", "u4"] {
        let err = engine
            .rate_ride(user(someone), ride.id, 4.0)
            .await
            .unwrap_err();
        assert!(err.is_forbidden_error());
    }

    let err = engine.rate_ride(user("u2"), ride.id, 6.0).await.unwrap_err();
    assert!(err.is_validation_error());

    let rated = engine.rate_ride(user("u2"), ride.id, 4.0).await.unwrap();
    assert_eq!(rated.rating, Some(4.0));

    let stored = store.fetch_ride(ride.id).await.unwrap().unwrap();
    assert_eq!(stored.rating, Some(4.0));
}
