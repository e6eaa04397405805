//! Data models for the users API

use rideshare_service::Error;
use serde::{Deserialize, Serialize};

/// Body of a 400 response to an invalid create request
pub const NAME_AND_EMAIL_REQUIRED: &str = "Name and email required";

/// Body of a 404 response for an unknown id
pub const USER_NOT_FOUND: &str = "User not found";

/// Body of every delete response
pub const USER_DELETED: &str = "User deleted successfully";

/// User record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// Create user request
///
/// Both fields are optional at the wire level so a missing field surfaces
/// as a validation error rather than a deserialization error.
#[derive(Debug, Default, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl CreateUserRequest {
    /// Validate into a [`NewUser`]; both fields must be present and non-empty
    pub fn validate(self) -> Result<NewUser, Error> {
        match (non_empty(self.name), non_empty(self.email)) {
            (Some(name), Some(email)) => Ok(NewUser { name, email }),
            _ => Err(Error::BadRequest(NAME_AND_EMAIL_REQUIRED.to_string())),
        }
    }
}

/// Validated fields for a new user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

/// Update user request
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl UpdateUserRequest {
    /// Convert into a patch; empty strings count as not supplied
    pub fn into_patch(self) -> UserPatch {
        UserPatch {
            name: non_empty(self.name),
            email: non_empty(self.email),
        }
    }
}

/// Partial update applied to an existing user
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl UserPatch {
    /// Overwrite only the supplied fields
    pub fn apply(self, user: &mut User) {
        if let Some(name) = self.name {
            user.name = name;
        }
        if let Some(email) = self.email {
            user.email = email;
        }
    }

    /// Whether the patch changes nothing
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
