use std::collections::HashMap;

use uuid::Uuid;

use crate::{
    db::Store,
    entities::{driver_rating, Booking, Conversation, Profile, Ride},
    error::Error,
};

#[tracing::instrument(skip(store))]
pub async fn fetch_ride(store: &dyn Store, id: Uuid) -> Result<Ride, Error> {
    store
        .fetch_ride(id)
        .await?
        .ok_or_else(|| Error::not_found_error("ride"))
}

#[tracing::instrument(skip(store))]
pub async fn fetch_booking(store: &dyn Store, id: Uuid) -> Result<Booking, Error> {
    store
        .fetch_booking(id)
        .await?
        .ok_or_else(|| Error::not_found_error("booking"))
}

#[tracing::instrument(skip(store))]
pub async fn fetch_conversation(store: &dyn Store, id: Uuid) -> Result<Conversation, Error> {
    store
        .fetch_conversation(id)
        .await?
        .ok_or_else(|| Error::not_found_error("conversation"))
}

/// Loads the profiles behind `user_ids` together with their driver ratings,
/// keyed by the identifier they were asked for. Identifiers without a
/// profile are left out.
#[tracing::instrument(skip(store))]
pub async fn fetch_profiles_with_ratings(
    store: &dyn Store,
    user_ids: &[String],
) -> Result<HashMap<String, Profile>, Error> {
    let mut user_ids = user_ids.to_vec();
    user_ids.sort();
    user_ids.dedup();

    if user_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let profiles = store.fetch_profiles(&user_ids).await?;

    // rides may be owned under the internal id or the email address
    let mut owner_ids = user_ids.clone();
    for profile in profiles.iter() {
        owner_ids.push(profile.id.clone());
        owner_ids.extend(profile.email.clone());
    }
    owner_ids.sort();
    owner_ids.dedup();

    let rides = store.fetch_rides_by_owners(&owner_ids).await?;

    let mut by_id = HashMap::new();

    for user_id in user_ids {
        let maybe_profile = profiles.iter().find(|p| p.is_identified_by(&user_id));

        if let Some(profile) = maybe_profile {
            let mut profile = profile.clone();
            profile.driver_rating = driver_rating(
                rides
                    .iter()
                    .filter(|r| profile.is_identified_by(&r.owner_id))
                    .map(|r| r.rating),
            );

            by_id.insert(user_id, profile);
        }
    }

    Ok(by_id)
}

#[tracing::instrument(skip(store))]
pub async fn fetch_profile_with_rating(
    store: &dyn Store,
    user_id: &str,
) -> Result<Option<Profile>, Error> {
    let mut profiles = fetch_profiles_with_ratings(store, &[user_id.to_string()]).await?;

    Ok(profiles.remove(user_id))
}

/// Loads rides keyed by id.
#[tracing::instrument(skip(store))]
pub async fn fetch_rides_by_id(
    store: &dyn Store,
    ride_ids: &[Uuid],
) -> Result<HashMap<Uuid, Ride>, Error> {
    let mut ride_ids = ride_ids.to_vec();
    ride_ids.sort();
    ride_ids.dedup();

    if ride_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rides = store.fetch_rides(&ride_ids).await?;

    Ok(rides.into_iter().map(|r| (r.id, r)).collect())
}
