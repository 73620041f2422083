use super::helpers::fetch_profile_with_rating;
use super::Engine;

use async_trait::async_trait;

use crate::{
    api::ProfileAPI,
    auth::User,
    entities::{Profile, ProfileUpdate, PublicProfile},
    error::Error,
};

#[async_trait]
impl ProfileAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn find_profile(&self, _user: User, id: String) -> Result<PublicProfile, Error> {
        let profile = fetch_profile_with_rating(self.store.as_ref(), id.trim())
            .await?
            .ok_or_else(|| Error::not_found_error("profile"))?;

        Ok(profile.public())
    }

    #[tracing::instrument(skip(self))]
    async fn find_own_profile(&self, user: User) -> Result<Profile, Error> {
        if let Some(profile) = fetch_profile_with_rating(self.store.as_ref(), &user.id).await? {
            return Ok(profile);
        }

        let profile = Profile::new(user.id.clone(), user.email.clone());

        self.store.upsert_profile(&profile).await?;

        tracing::info!(user_id = %user.id, "profile created on first access");

        Ok(profile)
    }

    #[tracing::instrument(skip(self, update))]
    async fn update_profile(&self, user: User, update: ProfileUpdate) -> Result<Profile, Error> {
        update.validate()?;

        let mut profile = self.find_own_profile(user.clone()).await?;

        profile.apply(update);

        self.store.upsert_profile(&profile).await?;

        Ok(profile)
    }
}
