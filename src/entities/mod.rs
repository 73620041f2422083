mod booking;
mod conversation;
mod message;
mod profile;
mod ride;
mod session;

pub use booking::{
    Booking, BookingRequest, BookingWithRide, Response as BookingResponse,
    SeatChange, Status as BookingStatus,
};
pub use conversation::{Conversation, ConversationSummary, ParticipantPair};
pub use message::{Message, MAX_MESSAGE_LENGTH};
pub use profile::{driver_rating, DriverRating, Profile, ProfileUpdate, PublicProfile};
pub use ride::{Car, Ride, RideDraft, RideFilter, RideSummary, RouteInfo, MAX_SEATS};
pub use session::Session;
