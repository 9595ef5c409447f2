//! User profile and identity account models.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Minimum password length accepted anywhere a password is set.
pub const MIN_PASSWORD_LEN: u64 = 6;

/// User profile stored in Firestore (`users` collection, keyed by uid).
///
/// `first_name` is the only display name in the system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserProfile {
    /// Same value as the identity's uid
    pub id: String,
    pub first_name: String,
    #[serde(default)]
    pub created_at: String,
}

/// Credentials held by the identity provider (`accounts` collection).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub uid: String,
    /// Lowercased, trimmed
    pub email: String,
    /// PBKDF2-HMAC-SHA256 output (base64)
    pub password_hash: String,
    /// Per-account salt (base64)
    pub password_salt: String,
    pub created_at: String,
}

/// Reservation of an email address for one account (`account_emails`
/// collection). Created before the account so duplicate sign-ups fail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailClaim {
    /// Lowercased, trimmed
    pub email: String,
    pub uid: String,
}

/// Profile changes requested by the user. Either field may be omitted.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[validate(length(min = 1, max = 100, message = "Please enter a name"))]
    pub first_name: Option<String>,
    #[validate(length(
        min = 6,
        message = "Password must be at least 6 characters"
    ))]
    pub password: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.password.is_none()
    }
}

/// Sign-up request.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignUp {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
}

/// Sign-in request.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_update_validation() {
        let short = ProfileUpdate {
            first_name: None,
            password: Some("12345".to_string()),
        };
        assert!(short.validate().is_err());

        let blank_name = ProfileUpdate {
            first_name: Some(String::new()),
            password: None,
        };
        assert!(blank_name.validate().is_err());

        let ok = ProfileUpdate {
            first_name: Some("Ada".to_string()),
            password: Some("123456".to_string()),
        };
        assert!(ok.validate().is_ok());
        assert!(ProfileUpdate::default().is_empty());
    }

    #[test]
    fn test_profile_field_names() {
        let profile: UserProfile =
            serde_json::from_value(serde_json::json!({ "id": "u1", "firstName": "Ada" })).unwrap();
        assert_eq!(profile.first_name, "Ada");
        assert_eq!(profile.created_at, "");
    }
}
