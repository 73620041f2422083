use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

pub const MAX_MESSAGE_LENGTH: usize = 1000;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(conversation_id: Uuid, sender_id: String, content: &str) -> Result<Self, Error> {
        let content = content.trim();

        if content.is_empty() {
            return Err(Error::validation_error("message cannot be empty"));
        }

        if content.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(Error::validation_error(format!(
                "message cannot be longer than {} characters",
                MAX_MESSAGE_LENGTH
            )));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            conversation_id,
            sender_id,
            content: content.into(),
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_is_trimmed() {
        let message = Message::new(Uuid::new_v4(), "u1".into(), "  hei!\n").unwrap();
        assert_eq!(message.content, "hei!");
    }

    #[test]
    fn blank_content_is_rejected() {
        let err = Message::new(Uuid::new_v4(), "u1".into(), " \t\n ").unwrap_err();
        assert!(err.is_validation_error());
    }

    #[test]
    fn length_ceiling_counts_characters() {
        let at_limit = "ø".repeat(MAX_MESSAGE_LENGTH);
        assert!(Message::new(Uuid::new_v4(), "u1".into(), &at_limit).is_ok());

        let over_limit = "a".repeat(MAX_MESSAGE_LENGTH + 1);
        assert!(Message::new(Uuid::new_v4(), "u1".into(), &over_limit).is_err());
    }
}
