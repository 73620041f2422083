use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{types::Json, Acquire, Executor, Pool, Postgres, Row};
use uuid::Uuid;

use super::Store;
use crate::entities::{
    Booking, BookingStatus, Car, Conversation, Message, ParticipantPair, Profile, Ride,
    RideFilter, RouteInfo, Session,
};
use crate::error::Error;

type Database = Postgres;

const RIDE_COLUMNS: &str = "id, owner_id, origin, destination, departure, price, seats, car, options, route, rating, created_at";
const BOOKING_COLUMNS: &str = "id, ride_id, user_id, status, created_at";
const CONVERSATION_COLUMNS: &str = "id, user1_id, user2_id, ride_id, created_at, updated_at";
const MESSAGE_COLUMNS: &str = "id, conversation_id, sender_id, content, created_at";
const PROFILE_COLUMNS: &str = "id, name, email, bio, picture, created_at";

pub struct PgStore {
    pool: Pool<Database>,
}

impl PgStore {
    #[tracing::instrument(name = "PgStore::new", skip(db_uri))]
    pub async fn new(db_uri: &str, max_connections: u32) -> Result<Self, Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(db_uri)
            .await?;

        // sessions are written by the authentication provider
        pool.execute("CREATE TABLE IF NOT EXISTS sessions (token TEXT PRIMARY KEY, user_id TEXT, email TEXT, expires_at TIMESTAMPTZ NOT NULL)")
            .await?;

        pool.execute("CREATE TABLE IF NOT EXISTS profiles (id TEXT PRIMARY KEY, name TEXT NOT NULL, email TEXT, bio TEXT, picture TEXT, created_at TIMESTAMPTZ NOT NULL)")
            .await?;
        pool.execute("CREATE INDEX IF NOT EXISTS profiles_email_idx ON profiles (email)")
            .await?;

        pool.execute("CREATE TABLE IF NOT EXISTS rides (id UUID PRIMARY KEY, owner_id TEXT NOT NULL, origin TEXT NOT NULL, destination TEXT NOT NULL, departure TIMESTAMPTZ NOT NULL, price FLOAT8 NOT NULL, seats INT4 NOT NULL CHECK (seats >= 0), car JSONB, options TEXT[] NOT NULL DEFAULT '{}', route JSONB, rating FLOAT8, created_at TIMESTAMPTZ NOT NULL)")
            .await?;
        pool.execute("CREATE INDEX IF NOT EXISTS rides_owner_id_idx ON rides (owner_id)")
            .await?;
        pool.execute("CREATE INDEX IF NOT EXISTS rides_departure_idx ON rides (departure)")
            .await?;

        // (ride_id, user_id) is deliberately not unique, duplicates are
        // checked before insert
        pool.execute("CREATE TABLE IF NOT EXISTS bookings (id UUID PRIMARY KEY, ride_id UUID NOT NULL REFERENCES rides(id) ON DELETE CASCADE, user_id TEXT NOT NULL, status VARCHAR NOT NULL, created_at TIMESTAMPTZ NOT NULL)")
            .await?;
        pool.execute("CREATE INDEX IF NOT EXISTS bookings_ride_id_idx ON bookings (ride_id, user_id)")
            .await?;

        pool.execute("CREATE TABLE IF NOT EXISTS conversations (id UUID PRIMARY KEY, user1_id TEXT NOT NULL, user2_id TEXT NOT NULL, ride_id UUID REFERENCES rides(id) ON DELETE SET NULL, created_at TIMESTAMPTZ NOT NULL, updated_at TIMESTAMPTZ NOT NULL, CHECK (user1_id < user2_id))")
            .await?;
        pool.execute("CREATE INDEX IF NOT EXISTS conversations_pair_idx ON conversations (user1_id, user2_id)")
            .await?;

        pool.execute("CREATE TABLE IF NOT EXISTS messages (id UUID PRIMARY KEY, conversation_id UUID NOT NULL REFERENCES conversations(id) ON DELETE CASCADE, sender_id TEXT NOT NULL, content TEXT NOT NULL, created_at TIMESTAMPTZ NOT NULL)")
            .await?;
        pool.execute("CREATE INDEX IF NOT EXISTS messages_conversation_id_idx ON messages (conversation_id, created_at)")
            .await?;

        Ok(Self { pool })
    }
}

/// Origin and destination are matched as literal substrings, so `%` and `_`
/// in a search carry no pattern meaning.
fn search_rides_query() -> String {
    format!(
        "
        SELECT
            {}
        FROM
            rides r
        WHERE
            r.departure > $1
            AND ($2::TEXT IS NULL OR strpos(lower(r.origin), lower($2)) > 0)
            AND ($3::TEXT IS NULL OR strpos(lower(r.destination), lower($3)) > 0)
            AND ($4::DATE IS NULL OR (r.departure AT TIME ZONE 'UTC')::DATE = $4)
            AND ($5 OR r.seats >= $6)
            AND ($7::FLOAT8 IS NULL OR r.price <= $7)
            AND NOT EXISTS (
                SELECT 1 FROM unnest($8::TEXT[]) AS wanted
                WHERE NOT EXISTS (
                    SELECT 1 FROM unnest(r.options) AS o WHERE lower(o) = lower(wanted)
                )
            )
        ORDER BY
            r.departure ASC
        ",
        RIDE_COLUMNS
    )
}

fn ride_from_row(row: &PgRow) -> Result<Ride, Error> {
    let car: Option<Json<Car>> = row.try_get("car")?;
    let route: Option<Json<RouteInfo>> = row.try_get("route")?;

    Ok(Ride {
        id: row.try_get("id")?,
        owner_id: row.try_get("owner_id")?,
        origin: row.try_get("origin")?,
        destination: row.try_get("destination")?,
        departure: row.try_get("departure")?,
        price: row.try_get("price")?,
        seats: row.try_get("seats")?,
        car: car.map(|Json(car)| car),
        options: row.try_get("options")?,
        route: route.map(|Json(route)| route),
        rating: row.try_get("rating")?,
        created_at: row.try_get("created_at")?,
    })
}

fn booking_from_row(row: &PgRow) -> Result<Booking, Error> {
    let status: String = row.try_get("status")?;

    Ok(Booking {
        id: row.try_get("id")?,
        ride_id: row.try_get("ride_id")?,
        user_id: row.try_get("user_id")?,
        status: BookingStatus::parse(&status)?,
        created_at: row.try_get("created_at")?,
    })
}

fn conversation_from_row(row: &PgRow) -> Result<Conversation, Error> {
    Ok(Conversation {
        id: row.try_get("id")?,
        user1_id: row.try_get("user1_id")?,
        user2_id: row.try_get("user2_id")?,
        ride_id: row.try_get("ride_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn message_from_row(row: &PgRow) -> Result<Message, Error> {
    Ok(Message {
        id: row.try_get("id")?,
        conversation_id: row.try_get("conversation_id")?,
        sender_id: row.try_get("sender_id")?,
        content: row.try_get("content")?,
        created_at: row.try_get("created_at")?,
    })
}

fn profile_from_row(row: &PgRow) -> Result<Profile, Error> {
    Ok(Profile {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        bio: row.try_get("bio")?,
        picture: row.try_get("picture")?,
        created_at: row.try_get("created_at")?,
        driver_rating: None,
    })
}

#[async_trait]
impl Store for PgStore {
    #[tracing::instrument(skip(self, token))]
    async fn fetch_session(&self, token: &str) -> Result<Option<Session>, Error> {
        let mut conn = self.pool.acquire().await?;

        let maybe_row = conn
            .fetch_optional(
                sqlx::query(
                    "SELECT token, user_id, email, expires_at FROM sessions WHERE token = $1",
                )
                .bind(token),
            )
            .await?;

        match maybe_row {
            Some(row) => Ok(Some(Session {
                token: row.try_get("token")?,
                user_id: row.try_get("user_id")?,
                email: row.try_get("email")?,
                expires_at: row.try_get("expires_at")?,
            })),
            None => Ok(None),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_profiles(&self, user_ids: &[String]) -> Result<Vec<Profile>, Error> {
        let mut conn = self.pool.acquire().await?;

        let query = format!(
            "SELECT {} FROM profiles WHERE id = ANY($1) OR email = ANY($1)",
            PROFILE_COLUMNS
        );

        let rows = conn
            .fetch_all(sqlx::query(&query).bind(user_ids))
            .await?;

        rows.iter().map(profile_from_row).collect()
    }

    #[tracing::instrument(skip(self, profile), fields(id = %profile.id))]
    async fn upsert_profile(&self, profile: &Profile) -> Result<(), Error> {
        let mut conn = self.pool.acquire().await?;

        conn.execute(
            sqlx::query(
                "INSERT INTO profiles (id, name, email, bio, picture, created_at) VALUES ($1, $2, $3, $4, $5, $6)
                 ON CONFLICT (id) DO UPDATE SET name = $2, email = $3, bio = $4, picture = $5",
            )
            .bind(&profile.id)
            .bind(&profile.name)
            .bind(&profile.email)
            .bind(&profile.bio)
            .bind(&profile.picture)
            .bind(profile.created_at),
        )
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self, ride), fields(id = %ride.id))]
    async fn insert_ride(&self, ride: &Ride) -> Result<(), Error> {
        let mut conn = self.pool.acquire().await?;

        let query = format!(
            "INSERT INTO rides ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
            RIDE_COLUMNS
        );

        conn.execute(
            sqlx::query(&query)
                .bind(&ride.id)
                .bind(&ride.owner_id)
                .bind(&ride.origin)
                .bind(&ride.destination)
                .bind(ride.departure)
                .bind(ride.price)
                .bind(ride.seats)
                .bind(ride.car.as_ref().map(Json))
                .bind(&ride.options)
                .bind(ride.route.as_ref().map(Json))
                .bind(ride.rating)
                .bind(ride.created_at),
        )
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_ride(&self, id: Uuid) -> Result<Option<Ride>, Error> {
        let mut conn = self.pool.acquire().await?;

        let query = format!("SELECT {} FROM rides WHERE id = $1", RIDE_COLUMNS);

        let maybe_row = conn.fetch_optional(sqlx::query(&query).bind(&id)).await?;

        maybe_row.as_ref().map(ride_from_row).transpose()
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_rides(&self, ids: &[Uuid]) -> Result<Vec<Ride>, Error> {
        let mut conn = self.pool.acquire().await?;

        let query = format!("SELECT {} FROM rides WHERE id = ANY($1)", RIDE_COLUMNS);

        let rows = conn.fetch_all(sqlx::query(&query).bind(ids)).await?;

        rows.iter().map(ride_from_row).collect()
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_rides_by_owners(&self, owner_ids: &[String]) -> Result<Vec<Ride>, Error> {
        let mut conn = self.pool.acquire().await?;

        let query = format!(
            "SELECT {} FROM rides WHERE owner_id = ANY($1) ORDER BY departure ASC",
            RIDE_COLUMNS
        );

        let rows = conn.fetch_all(sqlx::query(&query).bind(owner_ids)).await?;

        rows.iter().map(ride_from_row).collect()
    }

    #[tracing::instrument(skip(self))]
    async fn search_rides(
        &self,
        filter: &RideFilter,
        now: DateTime<Utc>,
    ) -> Result<Vec<Ride>, Error> {
        let mut conn = self.pool.acquire().await?;

        let query = search_rides_query();

        let origin = filter.origin.as_deref().map(str::trim);
        let destination = filter.destination.as_deref().map(str::trim);
        let min_seats = filter.min_seats.unwrap_or(1).max(1);

        let mut results = conn.fetch(
            sqlx::query(&query)
                .bind(now)
                .bind(origin)
                .bind(destination)
                .bind(filter.date)
                .bind(filter.include_full)
                .bind(min_seats)
                .bind(filter.max_price)
                .bind(&filter.options),
        );

        let mut rides = vec![];

        while let Some(row) = results.try_next().await? {
            rides.push(ride_from_row(&row)?);
        }

        Ok(rides)
    }

    #[tracing::instrument(skip(self, ride), fields(id = %ride.id))]
    async fn update_ride(&self, ride: &Ride) -> Result<(), Error> {
        let mut conn = self.pool.acquire().await?;

        conn.execute(
            sqlx::query(
                "UPDATE rides SET origin = $2, destination = $3, departure = $4, price = $5, seats = $6, car = $7, options = $8, route = $9 WHERE id = $1",
            )
            .bind(&ride.id)
            .bind(&ride.origin)
            .bind(&ride.destination)
            .bind(ride.departure)
            .bind(ride.price)
            .bind(ride.seats)
            .bind(ride.car.as_ref().map(Json))
            .bind(&ride.options)
            .bind(ride.route.as_ref().map(Json)),
        )
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete_ride(&self, id: Uuid) -> Result<(), Error> {
        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        tx.execute(sqlx::query("DELETE FROM bookings WHERE ride_id = $1").bind(&id))
            .await?;
        tx.execute(sqlx::query("DELETE FROM rides WHERE id = $1").bind(&id))
            .await?;

        tx.commit().await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn reserve_seat(&self, ride_id: Uuid) -> Result<bool, Error> {
        let mut conn = self.pool.acquire().await?;

        let result = conn
            .execute(
                sqlx::query("UPDATE rides SET seats = seats - 1 WHERE id = $1 AND seats > 0")
                    .bind(&ride_id),
            )
            .await?;

        Ok(result.rows_affected() == 1)
    }

    #[tracing::instrument(skip(self))]
    async fn release_seat(&self, ride_id: Uuid) -> Result<(), Error> {
        let mut conn = self.pool.acquire().await?;

        conn.execute(sqlx::query("UPDATE rides SET seats = seats + 1 WHERE id = $1").bind(&ride_id))
            .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn set_ride_rating(&self, ride_id: Uuid, rating: f64) -> Result<(), Error> {
        let mut conn = self.pool.acquire().await?;

        conn.execute(
            sqlx::query("UPDATE rides SET rating = $2 WHERE id = $1")
                .bind(&ride_id)
                .bind(rating),
        )
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self, booking), fields(id = %booking.id))]
    async fn insert_booking(&self, booking: &Booking) -> Result<(), Error> {
        let mut conn = self.pool.acquire().await?;

        conn.execute(
            sqlx::query(
                "INSERT INTO bookings (id, ride_id, user_id, status, created_at) VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(&booking.id)
            .bind(&booking.ride_id)
            .bind(&booking.user_id)
            .bind(booking.status.name())
            .bind(booking.created_at),
        )
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_booking(&self, id: Uuid) -> Result<Option<Booking>, Error> {
        let mut conn = self.pool.acquire().await?;

        let query = format!("SELECT {} FROM bookings WHERE id = $1", BOOKING_COLUMNS);

        let maybe_row = conn.fetch_optional(sqlx::query(&query).bind(&id)).await?;

        maybe_row.as_ref().map(booking_from_row).transpose()
    }

    #[tracing::instrument(skip(self))]
    async fn find_booking(
        &self,
        ride_id: Uuid,
        user_ids: &[String],
    ) -> Result<Option<Booking>, Error> {
        let mut conn = self.pool.acquire().await?;

        let query = format!(
            "SELECT {} FROM bookings WHERE ride_id = $1 AND user_id = ANY($2) LIMIT 1",
            BOOKING_COLUMNS
        );

        let maybe_row = conn
            .fetch_optional(sqlx::query(&query).bind(&ride_id).bind(user_ids))
            .await?;

        maybe_row.as_ref().map(booking_from_row).transpose()
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_bookings_by_users(&self, user_ids: &[String]) -> Result<Vec<Booking>, Error> {
        let mut conn = self.pool.acquire().await?;

        let query = format!(
            "SELECT {} FROM bookings WHERE user_id = ANY($1) ORDER BY created_at DESC",
            BOOKING_COLUMNS
        );

        let rows = conn.fetch_all(sqlx::query(&query).bind(user_ids)).await?;

        rows.iter().map(booking_from_row).collect()
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_bookings_for_rides(
        &self,
        ride_ids: &[Uuid],
        status: Option<BookingStatus>,
    ) -> Result<Vec<Booking>, Error> {
        let mut conn = self.pool.acquire().await?;

        let query = format!(
            "SELECT {} FROM bookings WHERE ride_id = ANY($1) AND ($2::VARCHAR IS NULL OR status = $2) ORDER BY created_at ASC",
            BOOKING_COLUMNS
        );

        let rows = conn
            .fetch_all(
                sqlx::query(&query)
                    .bind(ride_ids)
                    .bind(status.map(|s| s.name())),
            )
            .await?;

        rows.iter().map(booking_from_row).collect()
    }

    #[tracing::instrument(skip(self, booking), fields(id = %booking.id))]
    async fn update_booking_status(&self, booking: &Booking) -> Result<(), Error> {
        let mut conn = self.pool.acquire().await?;

        conn.execute(
            sqlx::query("UPDATE bookings SET status = $2 WHERE id = $1")
                .bind(&booking.id)
                .bind(booking.status.name()),
        )
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete_booking(&self, id: Uuid) -> Result<(), Error> {
        let mut conn = self.pool.acquire().await?;

        conn.execute(sqlx::query("DELETE FROM bookings WHERE id = $1").bind(&id))
            .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn find_conversation(
        &self,
        pair: &ParticipantPair,
    ) -> Result<Option<Conversation>, Error> {
        let mut conn = self.pool.acquire().await?;

        let query = format!(
            "SELECT {} FROM conversations WHERE user1_id = $1 AND user2_id = $2 ORDER BY created_at ASC LIMIT 1",
            CONVERSATION_COLUMNS
        );

        let maybe_row = conn
            .fetch_optional(sqlx::query(&query).bind(pair.first()).bind(pair.second()))
            .await?;

        maybe_row.as_ref().map(conversation_from_row).transpose()
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_conversation(&self, id: Uuid) -> Result<Option<Conversation>, Error> {
        let mut conn = self.pool.acquire().await?;

        let query = format!(
            "SELECT {} FROM conversations WHERE id = $1",
            CONVERSATION_COLUMNS
        );

        let maybe_row = conn.fetch_optional(sqlx::query(&query).bind(&id)).await?;

        maybe_row.as_ref().map(conversation_from_row).transpose()
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_conversations_for(
        &self,
        user_ids: &[String],
    ) -> Result<Vec<Conversation>, Error> {
        let mut conn = self.pool.acquire().await?;

        let query = format!(
            "SELECT {} FROM conversations WHERE user1_id = ANY($1) OR user2_id = ANY($1) ORDER BY updated_at DESC",
            CONVERSATION_COLUMNS
        );

        let rows = conn.fetch_all(sqlx::query(&query).bind(user_ids)).await?;

        rows.iter().map(conversation_from_row).collect()
    }

    #[tracing::instrument(skip(self, conversation), fields(id = %conversation.id))]
    async fn insert_conversation(&self, conversation: &Conversation) -> Result<(), Error> {
        let mut conn = self.pool.acquire().await?;

        let query = format!(
            "INSERT INTO conversations ({}) VALUES ($1, $2, $3, $4, $5, $6)",
            CONVERSATION_COLUMNS
        );

        conn.execute(
            sqlx::query(&query)
                .bind(&conversation.id)
                .bind(&conversation.user1_id)
                .bind(&conversation.user2_id)
                .bind(conversation.ride_id)
                .bind(conversation.created_at)
                .bind(conversation.updated_at),
        )
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn set_conversation_ride(&self, id: Uuid, ride_id: Uuid) -> Result<(), Error> {
        let mut conn = self.pool.acquire().await?;

        conn.execute(
            sqlx::query("UPDATE conversations SET ride_id = $2 WHERE id = $1 AND ride_id IS NULL")
                .bind(&id)
                .bind(&ride_id),
        )
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn touch_conversation(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), Error> {
        let mut conn = self.pool.acquire().await?;

        conn.execute(
            sqlx::query("UPDATE conversations SET updated_at = $2 WHERE id = $1")
                .bind(&id)
                .bind(at),
        )
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self, message), fields(id = %message.id))]
    async fn insert_message(&self, message: &Message) -> Result<(), Error> {
        let mut conn = self.pool.acquire().await?;

        let query = format!(
            "INSERT INTO messages ({}) VALUES ($1, $2, $3, $4, $5)",
            MESSAGE_COLUMNS
        );

        conn.execute(
            sqlx::query(&query)
                .bind(&message.id)
                .bind(&message.conversation_id)
                .bind(&message.sender_id)
                .bind(&message.content)
                .bind(message.created_at),
        )
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_messages(&self, conversation_id: Uuid) -> Result<Vec<Message>, Error> {
        let mut conn = self.pool.acquire().await?;

        let query = format!(
            "SELECT {} FROM messages WHERE conversation_id = $1 ORDER BY created_at ASC",
            MESSAGE_COLUMNS
        );

        let rows = conn
            .fetch_all(sqlx::query(&query).bind(&conversation_id))
            .await?;

        rows.iter().map(message_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ride_search_does_not_pattern_match() {
        let query = search_rides_query().to_lowercase();

        assert!(!query.contains("like"));
        assert!(query.contains("strpos(lower(r.origin), lower($2))"));
        assert!(query.contains("strpos(lower(r.destination), lower($3))"));
    }
}
