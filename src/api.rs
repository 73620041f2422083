use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::User;
use crate::entities::{
    Booking, BookingRequest, BookingResponse, BookingStatus, BookingWithRide,
    ConversationSummary, Message, Profile, ProfileUpdate, PublicProfile, Ride, RideDraft,
    RideFilter,
};
use crate::error::Error;

#[async_trait]
pub trait SessionAPI {
    /// Resolves the caller behind a session token.
    async fn authenticate(&self, token: &str) -> Result<User, Error>;
}

#[async_trait]
pub trait RideAPI {
    async fn create_ride(&self, user: User, draft: RideDraft) -> Result<Ride, Error>;
    async fn search_rides(&self, user: User, filter: RideFilter) -> Result<Vec<Ride>, Error>;
    async fn find_ride(&self, user: User, id: Uuid) -> Result<Ride, Error>;
    async fn update_ride(&self, user: User, id: Uuid, draft: RideDraft) -> Result<Ride, Error>;
    async fn delete_ride(&self, user: User, id: Uuid) -> Result<(), Error>;
    async fn rate_ride(&self, user: User, id: Uuid, rating: f64) -> Result<Ride, Error>;
    fn price_ceiling(&self, distance_km: f64) -> Result<f64, Error>;
}

#[async_trait]
pub trait BookingAPI {
    async fn create_booking(&self, user: User, ride_id: Uuid) -> Result<Booking, Error>;
    async fn respond_to_booking(
        &self,
        user: User,
        id: Uuid,
        response: BookingResponse,
    ) -> Result<Booking, Error>;
    async fn cancel_booking(&self, user: User, id: Uuid) -> Result<(), Error>;
    async fn list_my_bookings(&self, user: User) -> Result<Vec<BookingWithRide>, Error>;
    async fn list_booking_requests(
        &self,
        user: User,
        status: Option<BookingStatus>,
    ) -> Result<Vec<BookingRequest>, Error>;
}

#[async_trait]
pub trait ChatAPI {
    async fn open_conversation(
        &self,
        user: User,
        target_user_id: String,
        ride_id: Option<Uuid>,
    ) -> Result<ConversationSummary, Error>;
    async fn list_conversations(&self, user: User) -> Result<Vec<ConversationSummary>, Error>;
    async fn send_message(
        &self,
        user: User,
        conversation_id: Uuid,
        content: String,
    ) -> Result<Message, Error>;
    async fn list_messages(&self, user: User, conversation_id: Uuid) -> Result<Vec<Message>, Error>;
}

#[async_trait]
pub trait ProfileAPI {
    async fn find_profile(&self, user: User, id: String) -> Result<PublicProfile, Error>;
    async fn find_own_profile(&self, user: User) -> Result<Profile, Error>;
    async fn update_profile(&self, user: User, update: ProfileUpdate) -> Result<Profile, Error>;
}

pub trait API: SessionAPI + RideAPI + BookingAPI + ChatAPI + ProfileAPI {}

pub type DynAPI = Arc<dyn API + Send + Sync>;
