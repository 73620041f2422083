use async_trait::async_trait;
use axum::body::HttpBody;
use axum::extract::{Extension, FromRequest, Path, Query, RequestParts};
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::HeaderMap;
use axum::{BoxError, Json};
use serde::de::DeserializeOwned;

use crate::api::{DynAPI, SessionAPI};
use crate::auth::User;
use crate::error::Error;

pub const SESSION_COOKIE: &str = "lyvo_session";

/// Pulls the session token from the bearer header, falling back to the
/// session cookie.
fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    if let Some(token) = bearer {
        return Some(token.into());
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, token)| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

#[async_trait]
impl<B> FromRequest<B> for User
where
    B: Send,
{
    type Rejection = Error;

    async fn from_request(req: &mut RequestParts<B>) -> Result<Self, Self::Rejection> {
        let token = session_token(req.headers()).ok_or_else(Error::unauthorized_error)?;

        let Extension(api) = Extension::<DynAPI>::from_request(req)
            .await
            .map_err(|_| Error::unexpected_error())?;

        api.authenticate(&token).await
    }
}

/// A JSON request body. Malformed or incomplete bodies are answered as
/// validation errors.
pub struct ValidJson<T>(pub T);

/// Query string parameters, rejected as validation errors when they do not
/// deserialize.
pub struct ValidQuery<T>(pub T);

/// Path parameters, rejected as validation errors when they do not parse.
pub struct ValidPath<T>(pub T);

#[async_trait]
impl<T, B> FromRequest<B> for ValidJson<T>
where
    T: DeserializeOwned,
    B: HttpBody + Send,
    B::Data: Send,
    B::Error: Into<BoxError>,
{
    type Rejection = Error;

    async fn from_request(req: &mut RequestParts<B>) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req)
            .await
            .map_err(|rejection| Error::validation_error(rejection.to_string()))?;

        Ok(Self(value))
    }
}

#[async_trait]
impl<T, B> FromRequest<B> for ValidQuery<T>
where
    T: DeserializeOwned,
    B: Send,
{
    type Rejection = Error;

    async fn from_request(req: &mut RequestParts<B>) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request(req)
            .await
            .map_err(|rejection| Error::validation_error(rejection.to_string()))?;

        Ok(Self(value))
    }
}

#[async_trait]
impl<T, B> FromRequest<B> for ValidPath<T>
where
    T: DeserializeOwned + Send,
    B: Send,
{
    type Rejection = Error;

    async fn from_request(req: &mut RequestParts<B>) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request(req)
            .await
            .map_err(|rejection| Error::validation_error(rejection.to_string()))?;

        Ok(Self(value))
    }
}
