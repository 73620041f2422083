#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, Utc};

use lyvo::auth::User;
use lyvo::config::PricingPolicy;
use lyvo::db::{MemoryStore, Store};
use lyvo::engine::Engine;
use lyvo::entities::{Profile, Ride, RideDraft};

pub fn engine() -> (Engine, Arc<MemoryStore>) {
    engine_with_store(Arc::new(MemoryStore::new()))
}

pub fn engine_with_store<S: Store + 'static>(store: Arc<S>) -> (Engine, Arc<S>) {
    let engine = Engine::new(store.clone(), PricingPolicy::default(), None);
    (engine, store)
}

pub fn user(id: &str) -> User {
    User::new(id, None)
}

pub fn draft(seats: i32) -> RideDraft {
    RideDraft {
        origin: "Oslo".into(),
        destination: "Bergen".into(),
        departure: Utc::now() + Duration::days(3),
        price: 350.0,
        seats,
        car: None,
        options: vec![],
        route: None,
    }
}

/// Writes a ride straight to the store, bypassing validation, so tests can
/// set up rides in the past.
pub async fn insert_ride(store: &dyn Store, owner_id: &str, seats: i32, departure_in: Duration) -> Ride {
    let mut ride = Ride::new(owner_id.into(), draft(seats));
    ride.departure = Utc::now() + departure_in;

    store.insert_ride(&ride).await.unwrap();

    ride
}

pub async fn insert_profile(store: &dyn Store, id: &str, name: &str) -> Profile {
    let mut profile = Profile::new(id.into(), Some(format!("{}@example.no", id)));
    profile.name = name.into();

    store.upsert_profile(&profile).await.unwrap();

    profile
}

pub async fn seats(store: &dyn Store, ride: &Ride) -> i32 {
    store.fetch_ride(ride.id).await.unwrap().unwrap().seats
}
