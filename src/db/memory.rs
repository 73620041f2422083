use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::Store;
use crate::entities::{
    Booking, BookingStatus, Conversation, Message, ParticipantPair, Profile, Ride, RideFilter,
    Session,
};
use crate::error::Error;

/// Process-local store for running without a database and for tests.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

#[derive(Default)]
struct State {
    sessions: HashMap<String, Session>,
    profiles: HashMap<String, Profile>,
    rides: HashMap<Uuid, Ride>,
    bookings: HashMap<Uuid, Booking>,
    conversations: HashMap<Uuid, Conversation>,
    messages: Vec<Message>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a session the way the authentication provider would.
    pub async fn insert_session(&self, session: Session) {
        let mut state = self.state.write().await;
        state.sessions.insert(session.token.clone(), session);
    }
}

fn contains(ids: &[String], id: &str) -> bool {
    ids.iter().any(|x| x == id)
}

#[async_trait]
impl Store for MemoryStore {
    async fn fetch_session(&self, token: &str) -> Result<Option<Session>, Error> {
        let state = self.state.read().await;
        Ok(state.sessions.get(token).cloned())
    }

    async fn fetch_profiles(&self, user_ids: &[String]) -> Result<Vec<Profile>, Error> {
        let state = self.state.read().await;

        Ok(state
            .profiles
            .values()
            .filter(|p| user_ids.iter().any(|id| p.is_identified_by(id)))
            .cloned()
            .collect())
    }

    async fn upsert_profile(&self, profile: &Profile) -> Result<(), Error> {
        let mut state = self.state.write().await;
        state.profiles.insert(profile.id.clone(), profile.clone());
        Ok(())
    }

    async fn insert_ride(&self, ride: &Ride) -> Result<(), Error> {
        let mut state = self.state.write().await;
        state.rides.insert(ride.id, ride.clone());
        Ok(())
    }

    async fn fetch_ride(&self, id: Uuid) -> Result<Option<Ride>, Error> {
        let state = self.state.read().await;
        Ok(state.rides.get(&id).cloned())
    }

    async fn fetch_rides(&self, ids: &[Uuid]) -> Result<Vec<Ride>, Error> {
        let state = self.state.read().await;
        Ok(ids.iter().filter_map(|id| state.rides.get(id).cloned()).collect())
    }

    async fn fetch_rides_by_owners(&self, owner_ids: &[String]) -> Result<Vec<Ride>, Error> {
        let state = self.state.read().await;

        let mut rides: Vec<Ride> = state
            .rides
            .values()
            .filter(|r| contains(owner_ids, &r.owner_id))
            .cloned()
            .collect();
        rides.sort_by_key(|r| r.departure);

        Ok(rides)
    }

    async fn search_rides(
        &self,
        filter: &RideFilter,
        now: DateTime<Utc>,
    ) -> Result<Vec<Ride>, Error> {
        let state = self.state.read().await;

        let mut rides: Vec<Ride> = state
            .rides
            .values()
            .filter(|r| r.matches(filter, now))
            .cloned()
            .collect();
        rides.sort_by_key(|r| r.departure);

        Ok(rides)
    }

    async fn update_ride(&self, ride: &Ride) -> Result<(), Error> {
        let mut state = self.state.write().await;

        if let Some(existing) = state.rides.get_mut(&ride.id) {
            *existing = ride.clone();
        }

        Ok(())
    }

    async fn delete_ride(&self, id: Uuid) -> Result<(), Error> {
        let mut state = self.state.write().await;

        state.rides.remove(&id);
        state.bookings.retain(|_, b| b.ride_id != id);

        for conversation in state.conversations.values_mut() {
            if conversation.ride_id == Some(id) {
                conversation.ride_id = None;
            }
        }

        Ok(())
    }

    async fn reserve_seat(&self, ride_id: Uuid) -> Result<bool, Error> {
        let mut state = self.state.write().await;

        match state.rides.get_mut(&ride_id) {
            Some(ride) if ride.seats > 0 => {
                ride.seats -= 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release_seat(&self, ride_id: Uuid) -> Result<(), Error> {
        let mut state = self.state.write().await;

        if let Some(ride) = state.rides.get_mut(&ride_id) {
            ride.seats += 1;
        }

        Ok(())
    }

    async fn set_ride_rating(&self, ride_id: Uuid, rating: f64) -> Result<(), Error> {
        let mut state = self.state.write().await;

        if let Some(ride) = state.rides.get_mut(&ride_id) {
            ride.rating = Some(rating);
        }

        Ok(())
    }

    async fn insert_booking(&self, booking: &Booking) -> Result<(), Error> {
        let mut state = self.state.write().await;
        state.bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn fetch_booking(&self, id: Uuid) -> Result<Option<Booking>, Error> {
        let state = self.state.read().await;
        Ok(state.bookings.get(&id).cloned())
    }

    async fn find_booking(
        &self,
        ride_id: Uuid,
        user_ids: &[String],
    ) -> Result<Option<Booking>, Error> {
        let state = self.state.read().await;

        Ok(state
            .bookings
            .values()
            .find(|b| b.ride_id == ride_id && contains(user_ids, &b.user_id))
            .cloned())
    }

    async fn fetch_bookings_by_users(&self, user_ids: &[String]) -> Result<Vec<Booking>, Error> {
        let state = self.state.read().await;

        let mut bookings: Vec<Booking> = state
            .bookings
            .values()
            .filter(|b| contains(user_ids, &b.user_id))
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(bookings)
    }

    async fn fetch_bookings_for_rides(
        &self,
        ride_ids: &[Uuid],
        status: Option<BookingStatus>,
    ) -> Result<Vec<Booking>, Error> {
        let state = self.state.read().await;

        let mut bookings: Vec<Booking> = state
            .bookings
            .values()
            .filter(|b| ride_ids.contains(&b.ride_id))
            .filter(|b| status.map_or(true, |s| b.status == s))
            .cloned()
            .collect();
        bookings.sort_by_key(|b| b.created_at);

        Ok(bookings)
    }

    async fn update_booking_status(&self, booking: &Booking) -> Result<(), Error> {
        let mut state = self.state.write().await;

        if let Some(existing) = state.bookings.get_mut(&booking.id) {
            existing.status = booking.status;
        }

        Ok(())
    }

    async fn delete_booking(&self, id: Uuid) -> Result<(), Error> {
        let mut state = self.state.write().await;
        state.bookings.remove(&id);
        Ok(())
    }

    async fn find_conversation(
        &self,
        pair: &ParticipantPair,
    ) -> Result<Option<Conversation>, Error> {
        let state = self.state.read().await;

        Ok(state
            .conversations
            .values()
            .find(|c| c.user1_id == pair.first() && c.user2_id == pair.second())
            .cloned())
    }

    async fn fetch_conversation(&self, id: Uuid) -> Result<Option<Conversation>, Error> {
        let state = self.state.read().await;
        Ok(state.conversations.get(&id).cloned())
    }

    async fn fetch_conversations_for(
        &self,
        user_ids: &[String],
    ) -> Result<Vec<Conversation>, Error> {
        let state = self.state.read().await;

        let mut conversations: Vec<Conversation> = state
            .conversations
            .values()
            .filter(|c| contains(user_ids, &c.user1_id) || contains(user_ids, &c.user2_id))
            .cloned()
            .collect();
        conversations.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        Ok(conversations)
    }

    async fn insert_conversation(&self, conversation: &Conversation) -> Result<(), Error> {
        let mut state = self.state.write().await;
        state
            .conversations
            .insert(conversation.id, conversation.clone());
        Ok(())
    }

    async fn set_conversation_ride(&self, id: Uuid, ride_id: Uuid) -> Result<(), Error> {
        let mut state = self.state.write().await;

        if let Some(conversation) = state.conversations.get_mut(&id) {
            conversation.ride_id = Some(ride_id);
        }

        Ok(())
    }

    async fn touch_conversation(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), Error> {
        let mut state = self.state.write().await;

        if let Some(conversation) = state.conversations.get_mut(&id) {
            conversation.updated_at = at;
        }

        Ok(())
    }

    async fn insert_message(&self, message: &Message) -> Result<(), Error> {
        let mut state = self.state.write().await;
        state.messages.push(message.clone());
        Ok(())
    }

    async fn fetch_messages(&self, conversation_id: Uuid) -> Result<Vec<Message>, Error> {
        let state = self.state.read().await;

        let mut messages: Vec<Message> = state
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect();
        messages.sort_by_key(|m| m.created_at);

        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::RideDraft;
    use chrono::Duration;

    fn ride(seats: i32) -> Ride {
        Ride::new(
            "u1".into(),
            RideDraft {
                origin: "Stockholm".into(),
                destination: "Uppsala".into(),
                departure: Utc::now() + Duration::days(1),
                price: 120.0,
                seats,
                car: None,
                options: vec![],
                route: None,
            },
        )
    }

    #[test]
    fn reserve_seat_stops_at_zero() {
        tokio_test::block_on(async {
            let store = MemoryStore::new();
            let ride = ride(1);
            store.insert_ride(&ride).await.unwrap();

            assert!(store.reserve_seat(ride.id).await.unwrap());
            assert!(!store.reserve_seat(ride.id).await.unwrap());
            assert_eq!(store.fetch_ride(ride.id).await.unwrap().unwrap().seats, 0);

            assert!(!store.reserve_seat(Uuid::new_v4()).await.unwrap());
        });
    }

    #[test]
    fn delete_ride_removes_its_bookings() {
        tokio_test::block_on(async {
            let store = MemoryStore::new();
            let ride = ride(2);
            let booking = Booking::new(ride.id, "u2".into());

            store.insert_ride(&ride).await.unwrap();
            store.insert_booking(&booking).await.unwrap();
            store.delete_ride(ride.id).await.unwrap();

            assert!(store.fetch_ride(ride.id).await.unwrap().is_none());
            assert!(store.fetch_booking(booking.id).await.unwrap().is_none());
        });
    }
}
