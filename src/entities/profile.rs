use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

const MAX_NAME_LENGTH: usize = 100;
const MAX_BIO_LENGTH: usize = 500;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub picture: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Derived on read from the ratings of the rides this user drives.
    #[serde(default)]
    pub driver_rating: Option<DriverRating>,
}

/// The fields of a profile other users get to see.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    pub id: String,
    pub name: String,
    pub picture: Option<String>,
    pub driver_rating: Option<DriverRating>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverRating {
    pub average: f64,
    pub count: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

impl Profile {
    /// A fresh profile for a user seen for the first time. The display name
    /// defaults to the local part of the email when there is one.
    pub fn new(id: String, email: Option<String>) -> Self {
        let name = email
            .as_deref()
            .and_then(|email| email.split('@').next())
            .filter(|local| !local.is_empty())
            .unwrap_or(id.as_str())
            .to_string();

        Self {
            id,
            name,
            email,
            bio: None,
            picture: None,
            created_at: Utc::now(),
            driver_rating: None,
        }
    }

    /// Whether `user_id` refers to this profile, by id or by email.
    pub fn is_identified_by(&self, user_id: &str) -> bool {
        self.id == user_id || self.email.as_deref() == Some(user_id)
    }

    pub fn apply(&mut self, update: ProfileUpdate) {
        self.name = update.name.trim().into();
        self.bio = update
            .bio
            .map(|bio| bio.trim().to_string())
            .filter(|bio| !bio.is_empty());
        self.picture = update.picture.filter(|picture| !picture.is_empty());
    }

    pub fn public(&self) -> PublicProfile {
        PublicProfile {
            id: self.id.clone(),
            name: self.name.clone(),
            picture: self.picture.clone(),
            driver_rating: self.driver_rating,
        }
    }
}

impl ProfileUpdate {
    pub fn validate(&self) -> Result<(), Error> {
        let name = self.name.trim();

        if name.is_empty() {
            return Err(Error::validation_error("name is required"));
        }

        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(Error::validation_error(format!(
                "name cannot be longer than {} characters",
                MAX_NAME_LENGTH
            )));
        }

        if let Some(bio) = &self.bio {
            if bio.trim().chars().count() > MAX_BIO_LENGTH {
                return Err(Error::validation_error(format!(
                    "bio cannot be longer than {} characters",
                    MAX_BIO_LENGTH
                )));
            }
        }

        Ok(())
    }
}

/// Averages the positive ratings among `ratings`, ignoring missing ones.
pub fn driver_rating<I>(ratings: I) -> Option<DriverRating>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let (sum, count) = ratings
        .into_iter()
        .flatten()
        .filter(|rating| rating.is_finite() && *rating > 0.0)
        .fold((0.0, 0usize), |(sum, count), rating| (sum + rating, count + 1));

    if count == 0 {
        return None;
    }

    Some(DriverRating {
        average: sum / count as f64,
        count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_ignores_missing_and_non_positive_values() {
        let rating = driver_rating(vec![Some(4.0), None, Some(0.0), Some(-1.0), Some(5.0)]).unwrap();

        assert_eq!(rating.count, 2);
        assert!((rating.average - 4.5).abs() < f64::EPSILON);
    }

    #[test]
    fn rating_is_absent_without_values() {
        assert_eq!(driver_rating(vec![]), None);
        assert_eq!(driver_rating(vec![None, Some(0.0)]), None);
    }

    #[test]
    fn new_profile_name_defaults_to_email_local_part() {
        let profile = Profile::new("u1".into(), Some("kari@example.no".into()));
        assert_eq!(profile.name, "kari");
        assert!(profile.is_identified_by("u1"));
        assert!(profile.is_identified_by("kari@example.no"));

        let profile = Profile::new("u2".into(), None);
        assert_eq!(profile.name, "u2");
    }

    #[test]
    fn update_validation_and_apply() {
        let mut profile = Profile::new("u1".into(), None);

        let update = ProfileUpdate {
            name: "  ".into(),
            bio: None,
            picture: None,
        };
        assert!(update.validate().unwrap_err().is_validation_error());

        let update = ProfileUpdate {
            name: "Kari".into(),
            bio: Some("x".repeat(MAX_BIO_LENGTH + 1)),
            picture: None,
        };
        assert!(update.validate().is_err());

        let update = ProfileUpdate {
            name: " Kari Nordmann ".into(),
            bio: Some("   ".into()),
            picture: Some("data:image/png;base64,AAAA".into()),
        };
        assert!(update.validate().is_ok());

        profile.apply(update);
        assert_eq!(profile.name, "Kari Nordmann");
        assert_eq!(profile.bio, None);
        assert!(profile.picture.is_some());
    }
}
