use super::helpers::{
    fetch_conversation, fetch_profiles_with_ratings, fetch_ride, fetch_rides_by_id,
};
use super::Engine;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    api::ChatAPI,
    auth::User,
    entities::{Conversation, ConversationSummary, Message, ParticipantPair},
    error::Error,
};

fn partner_id(conversation: &Conversation, user: &User) -> String {
    if user.identified_by(conversation.user1_id.clone()) {
        conversation.user2_id.clone()
    } else {
        conversation.user1_id.clone()
    }
}

impl Engine {
    /// Finds the thread between the caller and `target_user_id` under any
    /// identifier the caller is known by.
    async fn find_conversation(
        &self,
        user: &User,
        target_user_id: &str,
    ) -> Result<Option<Conversation>, Error> {
        for id in user.identities() {
            let pair = ParticipantPair::new(&id, target_user_id)?;

            if let Some(conversation) = self.store.find_conversation(&pair).await? {
                return Ok(Some(conversation));
            }
        }

        Ok(None)
    }

    async fn summarize(
        &self,
        user: &User,
        conversations: Vec<Conversation>,
    ) -> Result<Vec<ConversationSummary>, Error> {
        let partner_ids: Vec<String> = conversations
            .iter()
            .map(|c| partner_id(c, user))
            .collect();
        let ride_ids: Vec<Uuid> = conversations.iter().filter_map(|c| c.ride_id).collect();

        let (partners, rides) = futures::try_join!(
            fetch_profiles_with_ratings(self.store.as_ref(), &partner_ids),
            fetch_rides_by_id(self.store.as_ref(), &ride_ids),
        )?;

        Ok(conversations
            .into_iter()
            .map(|conversation| {
                let partner_id = partner_id(&conversation, user);

                ConversationSummary {
                    partner: partners.get(&partner_id).map(|p| p.public()),
                    ride: conversation
                        .ride_id
                        .and_then(|id| rides.get(&id))
                        .map(|r| r.summary()),
                    partner_id,
                    conversation,
                }
            })
            .collect())
    }
}

#[async_trait]
impl ChatAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn open_conversation(
        &self,
        user: User,
        target_user_id: String,
        ride_id: Option<Uuid>,
    ) -> Result<ConversationSummary, Error> {
        if user.identified_by(target_user_id.trim().to_string()) {
            return Err(Error::validation_error(
                "cannot start a conversation with yourself",
            ));
        }

        let pair = ParticipantPair::new(&user.id, &target_user_id)?;

        if let Some(ride_id) = ride_id {
            fetch_ride(self.store.as_ref(), ride_id).await?;
        }

        // lookup-before-insert, two concurrent first messages may both insert
        let conversation = match self.find_conversation(&user, &target_user_id).await? {
            Some(mut conversation) => {
                if conversation.backfill_ride(ride_id) {
                    if let Some(ride_id) = conversation.ride_id {
                        self.store
                            .set_conversation_ride(conversation.id, ride_id)
                            .await?;
                    }
                }

                conversation
            }
            None => {
                let conversation = Conversation::new(pair, ride_id);

                self.store.insert_conversation(&conversation).await?;

                tracing::info!(conversation_id = %conversation.id, "conversation created");

                conversation
            }
        };

        let mut summaries = self.summarize(&user, vec![conversation]).await?;

        summaries.pop().ok_or_else(Error::unexpected_error)
    }

    #[tracing::instrument(skip(self))]
    async fn list_conversations(&self, user: User) -> Result<Vec<ConversationSummary>, Error> {
        let conversations = self
            .store
            .fetch_conversations_for(&user.identities())
            .await?;

        self.summarize(&user, conversations).await
    }

    #[tracing::instrument(skip(self, content))]
    async fn send_message(
        &self,
        user: User,
        conversation_id: Uuid,
        content: String,
    ) -> Result<Message, Error> {
        let conversation = fetch_conversation(self.store.as_ref(), conversation_id).await?;

        self.authorize(user.clone(), "post", conversation.clone())?;

        let message = Message::new(conversation.id, user.id.clone(), &content)?;

        self.store.insert_message(&message).await?;
        self.store
            .touch_conversation(conversation.id, message.created_at)
            .await?;

        Ok(message)
    }

    #[tracing::instrument(skip(self))]
    async fn list_messages(&self, user: User, conversation_id: Uuid) -> Result<Vec<Message>, Error> {
        let conversation = fetch_conversation(self.store.as_ref(), conversation_id).await?;

        self.authorize(user.clone(), "read", conversation.clone())?;

        self.store.fetch_messages(conversation.id).await
    }
}
