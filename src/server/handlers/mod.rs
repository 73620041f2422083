pub mod bookings;
pub mod chat;
pub mod profiles;
pub mod rides;
