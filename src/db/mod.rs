mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::entities::{
    Booking, BookingStatus, Conversation, Message, ParticipantPair, Profile, Ride, RideFilter,
    Session,
};
use crate::error::Error;

/// Row-level access to the relational store.
///
/// Every method is a single statement against the store. Workflows that need
/// several writes issue them one after the other; no method spans a
/// multi-step workflow.
///
/// User identifiers are passed as slices because a user may be referenced by
/// internal id or, on older rows, by email address.
#[async_trait]
pub trait Store: Send + Sync {
    async fn fetch_session(&self, token: &str) -> Result<Option<Session>, Error>;

    async fn fetch_profiles(&self, user_ids: &[String]) -> Result<Vec<Profile>, Error>;
    async fn upsert_profile(&self, profile: &Profile) -> Result<(), Error>;

    async fn insert_ride(&self, ride: &Ride) -> Result<(), Error>;
    async fn fetch_ride(&self, id: Uuid) -> Result<Option<Ride>, Error>;
    async fn fetch_rides(&self, ids: &[Uuid]) -> Result<Vec<Ride>, Error>;
    async fn fetch_rides_by_owners(&self, owner_ids: &[String]) -> Result<Vec<Ride>, Error>;
    async fn search_rides(&self, filter: &RideFilter, now: DateTime<Utc>)
        -> Result<Vec<Ride>, Error>;
    async fn update_ride(&self, ride: &Ride) -> Result<(), Error>;
    /// Deletes the ride together with its bookings.
    async fn delete_ride(&self, id: Uuid) -> Result<(), Error>;
    /// Takes one seat if any is left. Returns false when the ride is full or
    /// gone.
    async fn reserve_seat(&self, ride_id: Uuid) -> Result<bool, Error>;
    async fn release_seat(&self, ride_id: Uuid) -> Result<(), Error>;
    async fn set_ride_rating(&self, ride_id: Uuid, rating: f64) -> Result<(), Error>;

    async fn insert_booking(&self, booking: &Booking) -> Result<(), Error>;
    async fn fetch_booking(&self, id: Uuid) -> Result<Option<Booking>, Error>;
    async fn find_booking(
        &self,
        ride_id: Uuid,
        user_ids: &[String],
    ) -> Result<Option<Booking>, Error>;
    /// Newest first.
    async fn fetch_bookings_by_users(&self, user_ids: &[String]) -> Result<Vec<Booking>, Error>;
    /// Oldest first.
    async fn fetch_bookings_for_rides(
        &self,
        ride_ids: &[Uuid],
        status: Option<BookingStatus>,
    ) -> Result<Vec<Booking>, Error>;
    async fn update_booking_status(&self, booking: &Booking) -> Result<(), Error>;
    async fn delete_booking(&self, id: Uuid) -> Result<(), Error>;

    async fn find_conversation(
        &self,
        pair: &ParticipantPair,
    ) -> Result<Option<Conversation>, Error>;
    async fn fetch_conversation(&self, id: Uuid) -> Result<Option<Conversation>, Error>;
    /// Most recently active first.
    async fn fetch_conversations_for(
        &self,
        user_ids: &[String],
    ) -> Result<Vec<Conversation>, Error>;
    async fn insert_conversation(&self, conversation: &Conversation) -> Result<(), Error>;
    async fn set_conversation_ride(&self, id: Uuid, ride_id: Uuid) -> Result<(), Error>;
    async fn touch_conversation(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), Error>;

    async fn insert_message(&self, message: &Message) -> Result<(), Error>;
    /// Oldest first.
    async fn fetch_messages(&self, conversation_id: Uuid) -> Result<Vec<Message>, Error>;
}
