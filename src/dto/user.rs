use crate::domain;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// DTO for a user returned by the API. The stored password is deliberately left out.
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, PartialEq, Eq, Debug))]
pub struct User {
    #[schema(example = 4)]
    pub id: i32,
    #[schema(example = "alice")]
    pub username: String,
}

impl From<domain::user::User> for User {
    fn from(value: domain::user::User) -> Self {
        User {
            id: value.id,
            username: value.username,
        }
    }
}

/// DTO for registering a user via the API.
///
/// The password is stored as submitted; it is not hashed anywhere in this service.
#[derive(Deserialize, Display, ToSchema)]
#[display("{username}")]
#[cfg_attr(test, derive(Serialize))]
pub struct NewUser {
    #[schema(example = "alice")]
    pub username: String,
    #[schema(example = "correct horse battery staple")]
    pub password: String,
}

impl From<NewUser> for domain::user::NewUser {
    fn from(value: NewUser) -> Self {
        domain::user::NewUser {
            username: value.username,
            password: value.password,
        }
    }
}

/// DTO for changing a user via the API. Omitted fields are left alone.
#[derive(Deserialize, ToSchema)]
#[cfg_attr(test, derive(Serialize))]
pub struct UpdateUser {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl From<UpdateUser> for domain::user::UserUpdate {
    fn from(value: UpdateUser) -> Self {
        domain::user::UserUpdate {
            username: value.username,
            password: value.password,
        }
    }
}
