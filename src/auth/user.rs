use oso::PolarClass;
use serde::{Deserialize, Serialize};

/// The caller of a request, identified by a canonical user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
}

impl User {
    pub fn new(id: impl Into<String>, email: Option<String>) -> Self {
        Self {
            id: id.into(),
            email,
        }
    }

    /// Every identifier rows may reference this user by.
    pub fn identities(&self) -> Vec<String> {
        let mut ids = vec![self.id.clone()];

        if let Some(email) = &self.email {
            if email != &self.id {
                ids.push(email.clone());
            }
        }

        ids
    }

    /// Rows written before internal ids existed carry the email address as
    /// the user identifier, so both are accepted.
    pub fn identified_by(&self, user_id: String) -> bool {
        self.id == user_id || self.email.as_deref() == Some(user_id.as_str())
    }
}

impl PolarClass for User {
    fn get_polar_class_builder() -> oso::ClassBuilder<User> {
        oso::Class::builder()
            .name("User")
            .add_attribute_getter("id", |recv: &User| recv.id.clone())
            .add_attribute_getter("email", |recv: &User| recv.email.clone())
            .add_method("identified_by", User::identified_by)
    }

    fn get_polar_class() -> oso::Class {
        let builder = User::get_polar_class_builder();
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identified_by_id_or_email() {
        let user = User::new("u1", Some("kari@example.no".into()));

        assert!(user.identified_by("u1".into()));
        assert!(user.identified_by("kari@example.no".into()));
        assert!(!user.identified_by("u2".into()));

        let user = User::new("u1", None);
        assert!(!user.identified_by("".into()));
    }
}
