use chrono::{DateTime, Utc};

use crate::auth::User;
use crate::entities::Session;

/// Derives the caller from a session: the internal id when the session has
/// one, otherwise the email address. Expired sessions and sessions carrying
/// neither resolve to no one.
pub fn resolve(session: Option<&Session>, now: DateTime<Utc>) -> Option<User> {
    let session = session?;

    if session.is_expired(now) {
        return None;
    }

    let email = non_blank(session.email.as_deref());

    match non_blank(session.user_id.as_deref()) {
        Some(id) => Some(User::new(id, email)),
        None => email.map(|email| User::new(email.clone(), Some(email))),
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session(user_id: Option<&str>, email: Option<&str>) -> Session {
        Session {
            token: "token".into(),
            user_id: user_id.map(String::from),
            email: email.map(String::from),
            expires_at: Utc::now() + Duration::hours(1),
        }
    }

    #[test]
    fn prefers_internal_id() {
        let user = resolve(Some(&session(Some("u1"), Some("kari@example.no"))), Utc::now()).unwrap();

        assert_eq!(user.id, "u1");
        assert_eq!(user.email.as_deref(), Some("kari@example.no"));
    }

    #[test]
    fn falls_back_to_email() {
        let user = resolve(Some(&session(Some("  "), Some("kari@example.no"))), Utc::now()).unwrap();

        assert_eq!(user.id, "kari@example.no");
    }

    #[test]
    fn nothing_to_resolve() {
        assert_eq!(resolve(None, Utc::now()), None);
        assert_eq!(resolve(Some(&session(None, None)), Utc::now()), None);
        assert_eq!(resolve(Some(&session(Some(""), Some(" "))), Utc::now()), None);
    }

    #[test]
    fn expired_session_is_ignored() {
        let mut expired = session(Some("u1"), None);
        expired.expires_at = Utc::now() - Duration::seconds(1);

        assert_eq!(resolve(Some(&expired), Utc::now()), None);
    }
}
