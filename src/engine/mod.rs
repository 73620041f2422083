mod booking_api;
mod chat_api;
mod helpers;
mod profile_api;
mod ride_api;
mod session_api;

use std::sync::Arc;

use oso::Oso;

use crate::{
    api::API,
    auth::authorizor,
    config::PricingPolicy,
    db::Store,
    error::Error,
    external::directions::Directions,
};

pub struct Engine {
    store: Arc<dyn Store>,
    authorizor: Oso,
    pricing: PricingPolicy,
    directions: Option<Directions>,
}

impl Engine {
    pub fn new(store: Arc<dyn Store>, pricing: PricingPolicy, directions: Option<Directions>) -> Self {
        Self {
            store,
            authorizor: authorizor::new(),
            pricing,
            directions,
        }
    }
}

impl Engine {
    pub fn authorize<Actor, Action, Resource>(
        &self,
        actor: Actor,
        action: Action,
        resource: Resource,
    ) -> Result<(), Error>
    where
        Actor: oso::ToPolar,
        Action: oso::ToPolar,
        Resource: oso::ToPolar,
    {
        if self.authorizor.is_allowed(actor, action, resource)? {
            return Ok(());
        }

        Err(Error::forbidden_error())
    }
}

impl API for Engine {}
