use crate::domain::Error;
use crate::domain::user::driven_ports::{UserReader, UserWriter};
use crate::external_connections::ExternalConnectivity;

/// A registered user.
///
/// The password is kept exactly as it was submitted. Nothing in this service hashes it, so the
/// database must be treated as holding credentials in plain text.
#[derive(PartialEq, Eq, Debug)]
#[cfg_attr(test, derive(Clone))]
pub struct User {
    pub id: i32,
    pub username: String,
    pub password: String,
}

#[derive(Debug)]
#[cfg_attr(test, derive(Clone, PartialEq))]
pub struct NewUser {
    pub username: String,
    pub password: String,
}

/// Partial update for a user. Fields left as [None] keep their stored value.
#[derive(Debug, Default)]
#[cfg_attr(test, derive(Clone, PartialEq))]
pub struct UserUpdate {
    pub username: Option<String>,
    pub password: Option<String>,
}

pub mod driven_ports {
    use super::*;
    use crate::domain::DrivenPortError;
    use crate::external_connections::ExternalConnectivity;

    pub trait UserReader: Sync {
        async fn user_by_id(
            &self,
            user_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<User>, DrivenPortError>;
    }

    pub trait UserWriter: Sync {
        /// Inserts the user, failing with [DrivenPortError::ConstraintViolation] if the username
        /// is taken
        async fn create_user(
            &self,
            new_user: &NewUser,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<User, DrivenPortError>;

        async fn update_user(
            &self,
            user_id: i32,
            update: &UserUpdate,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<User, DrivenPortError>;

        /// Removes the user and hands back what was removed. Users who still own tasks cannot
        /// be removed.
        async fn delete_user(
            &self,
            user_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<User, DrivenPortError>;
    }
}

pub mod driving_ports {
    use super::*;
    use crate::external_connections::ExternalConnectivity;

    pub trait UserPort {
        async fn user_by_id(
            &self,
            user_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
            u_reader: &impl driven_ports::UserReader,
        ) -> Result<Option<User>, Error>;
        async fn create_user(
            &self,
            new_user: &NewUser,
            ext_cxn: &mut impl ExternalConnectivity,
            u_writer: &impl driven_ports::UserWriter,
        ) -> Result<User, Error>;
        async fn update_user(
            &self,
            user_id: i32,
            update: &UserUpdate,
            ext_cxn: &mut impl ExternalConnectivity,
            u_writer: &impl driven_ports::UserWriter,
        ) -> Result<User, Error>;
        async fn delete_user(
            &self,
            user_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
            u_writer: &impl driven_ports::UserWriter,
        ) -> Result<User, Error>;
    }
}

pub struct UserService {}

impl driving_ports::UserPort for UserService {
    async fn user_by_id(
        &self,
        user_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
        u_reader: &impl UserReader,
    ) -> Result<Option<User>, Error> {
        u_reader
            .user_by_id(user_id, &mut *ext_cxn)
            .await
            .map_err(|err| err.into_error_trying_to("fetch a user"))
    }

    async fn create_user(
        &self,
        new_user: &NewUser,
        ext_cxn: &mut impl ExternalConnectivity,
        u_writer: &impl UserWriter,
    ) -> Result<User, Error> {
        u_writer
            .create_user(new_user, &mut *ext_cxn)
            .await
            .map_err(|err| err.into_error_trying_to("create a user"))
    }

    async fn update_user(
        &self,
        user_id: i32,
        update: &UserUpdate,
        ext_cxn: &mut impl ExternalConnectivity,
        u_writer: &impl UserWriter,
    ) -> Result<User, Error> {
        u_writer
            .update_user(user_id, update, &mut *ext_cxn)
            .await
            .map_err(|err| err.into_error_trying_to("update a user"))
    }

    async fn delete_user(
        &self,
        user_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
        u_writer: &impl UserWriter,
    ) -> Result<User, Error> {
        u_writer
            .delete_user(user_id, &mut *ext_cxn)
            .await
            .map_err(|err| err.into_error_trying_to("delete a user"))
    }
}
