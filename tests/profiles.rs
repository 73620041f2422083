mod common;

use chrono::Duration;

use lyvo::api::ProfileAPI;
use lyvo::auth::User;
use lyvo::db::Store;
use lyvo::entities::ProfileUpdate;

use common::{engine, insert_profile, insert_ride, user};

fn update(name: &str, bio: Option<&str>) -> ProfileUpdate {
    ProfileUpdate {
        name: name.into(),
        bio: bio.map(|b| b.into()),
        picture: None,
    }
}

#[tokio::test]
async fn own_profile_is_created_on_first_access() {
    let (engine, store) = engine();

    let kari = User::new("u1", Some("kari.nordmann@example.no".into()));

    let profile = engine.find_own_profile(kari.clone()).await.unwrap();
    assert_eq!(profile.id, "u1");
    assert_eq!(profile.name, "kari.nordmann");
    assert_eq!(profile.email.as_deref(), Some("kari.nordmann@example.no"));
    assert!(profile.driver_rating.is_none());

    let stored = store.fetch_profiles(&["u1".to_string()]).await.unwrap();
    assert_eq!(stored.len(), 1);

    // a second visit reads the same profile back
    let again = engine.find_own_profile(kari).await.unwrap();
    assert_eq!(again.created_at, profile.created_at);
}

#[tokio::test]
async fn profile_updates_are_validated() {
    let (engine, _store) = engine();

    let updated = engine
        .update_profile(user("u1"), update("  Kari  ", Some("  Kjører ofte til Bergen ")))
        .await
        .unwrap();
    assert_eq!(updated.name, "Kari");
    assert_eq!(updated.bio.as_deref(), Some("Kjører ofte til Bergen"));

    let err = engine
        .update_profile(user("u1"), update(" ", None))
        .await
        .unwrap_err();
    assert!(err.is_validation_error());

    let long_bio = "x".repeat(501);
    let err = engine
        .update_profile(user("u1"), update("Kari", Some(&long_bio)))
        .await
        .unwrap_err();
    assert!(err.is_validation_error());

    let profile = engine.find_own_profile(user("u1")).await.unwrap();
    assert_eq!(profile.name, "Kari");
}

#[tokio::test]
async fn public_profiles_carry_the_driver_rating() {
    let (engine, store) = engine();

    insert_profile(store.as_ref(), "u1", "Kari").await;

    // rides owned under the id and under the email both count
    let by_id = insert_ride(store.as_ref(), "u1", 2, -Duration::days(3)).await;
    let by_email = insert_ride(store.as_ref(), "u1@example.no", 2, -Duration::days(2)).await;
    insert_ride(store.as_ref(), "u1", 2, -Duration::days(1)).await;

    store.set_ride_rating(by_id.id, 5.0).await.unwrap();
    store.set_ride_rating(by_email.id, 3.0).await.unwrap();

    let profile = engine.find_profile(user("u2"), "u1".into()).await.unwrap();
    assert_eq!(profile.name, "Kari");

    let rating = profile.driver_rating.unwrap();
    assert_eq!(rating.count, 2);
    assert!((rating.average - 4.0).abs() < 1e-9);

    let err = engine
        .find_profile(user("u2"), "nobody".into())
        .await
        .unwrap_err();
    assert!(err.is_not_found_error());
}
