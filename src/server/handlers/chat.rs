use axum::extract::{Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::{ChatAPI, DynAPI};
use crate::auth::User;
use crate::entities::{ConversationSummary, Message};
use crate::error::Error;
use crate::server::extract::{ValidJson, ValidQuery};

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenConversationParams {
    target_user_id: String,
    ride_id: Option<Uuid>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMessagesParams {
    conversation_id: Uuid,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageParams {
    conversation_id: Uuid,
    content: String,
}

pub async fn open_conversation(
    Extension(api): Extension<DynAPI>,
    user: User,
    ValidJson(params): ValidJson<OpenConversationParams>,
) -> Result<Json<ConversationSummary>, Error> {
    let conversation = api
        .open_conversation(user, params.target_user_id, params.ride_id)
        .await?;

    Ok(conversation.into())
}

pub async fn list_conversations(
    Extension(api): Extension<DynAPI>,
    user: User,
) -> Result<Json<Vec<ConversationSummary>>, Error> {
    let conversations = api.list_conversations(user).await?;

    Ok(conversations.into())
}

pub async fn list_messages(
    Extension(api): Extension<DynAPI>,
    user: User,
    ValidQuery(params): ValidQuery<ListMessagesParams>,
) -> Result<Json<Vec<Message>>, Error> {
    let messages = api.list_messages(user, params.conversation_id).await?;

    Ok(messages.into())
}

pub async fn send_message(
    Extension(api): Extension<DynAPI>,
    user: User,
    ValidJson(params): ValidJson<SendMessageParams>,
) -> Result<Json<Message>, Error> {
    let message = api
        .send_message(user, params.conversation_id, params.content)
        .await?;

    Ok(message.into())
}
