use chrono::{DateTime, Utc};
use oso::PolarClass;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{PublicProfile, RideSummary};
use crate::error::Error;

/// Two distinct participant ids held in lexicographic order, so that a pair
/// built from (a, b) equals the pair built from (b, a).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticipantPair {
    first: String,
    second: String,
}

impl ParticipantPair {
    pub fn new(a: &str, b: &str) -> Result<Self, Error> {
        let (a, b) = (a.trim(), b.trim());

        if a.is_empty() || b.is_empty() {
            return Err(Error::validation_error("participant id is required"));
        }

        if a == b {
            return Err(Error::validation_error("cannot start a conversation with yourself"));
        }

        let (first, second) = if a < b { (a, b) } else { (b, a) };

        Ok(Self {
            first: first.into(),
            second: second.into(),
        })
    }

    pub fn first(&self) -> &str {
        &self.first
    }

    pub fn second(&self) -> &str {
        &self.second
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.first == user_id || self.second == user_id
    }

    /// The participant that is not `user_id`, if `user_id` participates.
    pub fn partner_of(&self, user_id: &str) -> Option<&str> {
        if self.first == user_id {
            Some(&self.second)
        } else if self.second == user_id {
            Some(&self.first)
        } else {
            None
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PolarClass)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    #[polar(attribute)]
    pub id: Uuid,
    #[polar(attribute)]
    pub user1_id: String,
    #[polar(attribute)]
    pub user2_id: String,
    pub ride_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(pair: ParticipantPair, ride_id: Option<Uuid>) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4(),
            user1_id: pair.first,
            user2_id: pair.second,
            ride_id,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn pair(&self) -> ParticipantPair {
        ParticipantPair {
            first: self.user1_id.clone(),
            second: self.user2_id.clone(),
        }
    }

    /// Attaches a ride when the conversation has none yet. Returns whether the
    /// conversation changed; an existing ride is never replaced or cleared.
    pub fn backfill_ride(&mut self, ride_id: Option<Uuid>) -> bool {
        match (self.ride_id, ride_id) {
            (None, Some(ride_id)) => {
                self.ride_id = Some(ride_id);
                true
            }
            _ => false,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    #[serde(flatten)]
    pub conversation: Conversation,
    pub partner_id: String,
    pub partner: Option<PublicProfile>,
    pub ride: Option<RideSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_is_order_independent() {
        let ab = ParticipantPair::new("alice@example.com", "bob").unwrap();
        let ba = ParticipantPair::new("bob", "alice@example.com").unwrap();

        assert_eq!(ab, ba);
        assert_eq!(ab.first(), "alice@example.com");
        assert_eq!(ab.second(), "bob");
    }

    #[test]
    fn pair_rejects_self_and_blank() {
        assert!(ParticipantPair::new("u1", "u1").unwrap_err().is_validation_error());
        assert!(ParticipantPair::new("u1", " u1 ").is_err());
        assert!(ParticipantPair::new("", "u1").is_err());
    }

    #[test]
    fn partner_lookup() {
        let pair = ParticipantPair::new("u2", "u1").unwrap();

        assert_eq!(pair.partner_of("u1"), Some("u2"));
        assert_eq!(pair.partner_of("u2"), Some("u1"));
        assert_eq!(pair.partner_of("u3"), None);
        assert!(!pair.contains("u3"));
    }

    #[test]
    fn backfill_never_replaces_an_existing_ride() {
        let pair = ParticipantPair::new("u1", "u2").unwrap();
        let ride = Uuid::new_v4();

        let mut conversation = Conversation::new(pair.clone(), None);
        assert!(!conversation.backfill_ride(None));
        assert!(conversation.backfill_ride(Some(ride)));
        assert_eq!(conversation.ride_id, Some(ride));

        assert!(!conversation.backfill_ride(Some(Uuid::new_v4())));
        assert!(!conversation.backfill_ride(None));
        assert_eq!(conversation.ride_id, Some(ride));
        assert_eq!(conversation.pair(), pair);
    }
}
