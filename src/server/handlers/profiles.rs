use axum::extract::{Extension, Json};

use crate::api::{DynAPI, ProfileAPI};
use crate::auth::User;
use crate::entities::{Profile, ProfileUpdate, PublicProfile};
use crate::error::Error;
use crate::server::extract::{ValidJson, ValidPath};

pub async fn me(Extension(api): Extension<DynAPI>, user: User) -> Result<Json<Profile>, Error> {
    let profile = api.find_own_profile(user).await?;

    Ok(profile.into())
}

pub async fn update(
    Extension(api): Extension<DynAPI>,
    user: User,
    ValidJson(update): ValidJson<ProfileUpdate>,
) -> Result<Json<Profile>, Error> {
    let profile = api.update_profile(user, update).await?;

    Ok(profile.into())
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    user: User,
    ValidPath(id): ValidPath<String>,
) -> Result<Json<PublicProfile>, Error> {
    let profile = api.find_profile(user, id).await?;

    Ok(profile.into())
}
