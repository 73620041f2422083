use async_trait::async_trait;
use chrono::Utc;

use super::Engine;

use crate::{
    api::SessionAPI,
    auth::{identity, User},
    error::Error,
};

#[async_trait]
impl SessionAPI for Engine {
    #[tracing::instrument(skip(self, token))]
    async fn authenticate(&self, token: &str) -> Result<User, Error> {
        let token = token.trim();

        if token.is_empty() {
            return Err(Error::unauthorized_error());
        }

        let session = self.store.fetch_session(token).await?;

        identity::resolve(session.as_ref(), Utc::now()).ok_or_else(|| {
            tracing::info!("no valid session for token");
            Error::unauthorized_error()
        })
    }
}
