use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Optional profile fields a user fills in after signing up.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct Profile {
    pub bio: Option<String>,
    /// Public URL of the uploaded profile photo.
    pub photo_ref: Option<String>,
    pub education: Option<String>,
    pub work: Option<String>,
}

/// Represents a user in the system.
///
/// Deliberately not `Serialize`: anything sent to a client goes through
/// [`PublicUser`], which has no password hash.
#[derive(Clone)]
pub struct User {
    /// The unique identifier for the user.
    pub id: Uuid,
    /// The user's display name, unique across users.
    pub name: String,
    /// The user's email address, unique across users.
    pub email: String,
    /// The user's bcrypt password hash.
    pub password_hash: String,
    /// The user's profile.
    pub profile: Profile,
    /// The timestamp when the user was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the user was last updated.
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("profile", &self.profile)
            .finish()
    }
}

/// The client-facing view of a user.
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub profile: Profile,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            profile: user.profile.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// The fields needed to insert a user.
#[derive(Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// A partial profile update. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub education: Option<String>,
    pub work: Option<String>,
    pub photo_ref: Option<String>,
}

impl ProfileUpdate {
    /// Applies the update to a user in place.
    pub fn apply(self, user: &mut User) {
        if let Some(name) = self.name {
            user.name = name;
        }
        if let Some(bio) = self.bio {
            user.profile.bio = Some(bio);
        }
        if let Some(education) = self.education {
            user.profile.education = Some(education);
        }
        if let Some(work) = self.work {
            user.profile.work = Some(work);
        }
        if let Some(photo_ref) = self.photo_ref {
            user.profile.photo_ref = Some(photo_ref);
        }
        user.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> User {
        User {
            id: Uuid::new_v4(),
            name: "ada".into(),
            email: "ada@example.com".into(),
            password_hash: "$2b$10$abcdefghijklmnopqrstuv".into(),
            profile: Profile::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn public_user_never_carries_the_hash() {
        let user = sample();
        let json = serde_json::to_string(&PublicUser::from(&user)).unwrap();
        assert!(!json.contains("password"));
        assert!(!json.contains(&user.password_hash));
        assert!(!format!("{:?}", user).contains(&user.password_hash));
    }

    #[test]
    fn profile_update_keeps_unset_fields() {
        let mut user = sample();
        user.profile.work = Some("Analytical Engines Ltd".into());

        ProfileUpdate {
            bio: Some("mathematician".into()),
            ..Default::default()
        }
        .apply(&mut user);

        assert_eq!(user.name, "ada");
        assert_eq!(user.profile.bio.as_deref(), Some("mathematician"));
        assert_eq!(user.profile.work.as_deref(), Some("Analytical Engines Ltd"));
    }
}
