use crate::domain;
use crate::domain::DrivenPortError;
use crate::domain::user::{NewUser, User, UserUpdate};
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use sqlx::{FromRow, query_as};

pub struct DbReadUsers;

#[derive(FromRow)]
struct UserRow {
    id: i32,
    username: String,
    password: String,
}

impl From<UserRow> for User {
    fn from(value: UserRow) -> Self {
        User {
            id: value.id,
            username: value.username,
            password: value.password,
        }
    }
}

impl domain::user::driven_ports::UserReader for DbReadUsers {
    async fn user_by_id(
        &self,
        user_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<User>, DrivenPortError> {
        let mut cxn_handle = ext_cxn.database_cxn().await?;

        let user = query_as::<_, UserRow>("SELECT * FROM app_user au WHERE au.id = $1")
            .bind(user_id)
            .fetch_optional(cxn_handle.borrow_connection())
            .await
            .map_err(|err| super::port_error(err, "fetch a user by id"))?;

        Ok(user.map(User::from))
    }
}

pub struct DbWriteUsers;

impl domain::user::driven_ports::UserWriter for DbWriteUsers {
    async fn create_user(
        &self,
        new_user: &NewUser,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<User, DrivenPortError> {
        let mut cxn_handle = ext_cxn.database_cxn().await?;

        let user = query_as::<_, UserRow>(
            "INSERT INTO app_user(username, password) VALUES ($1, $2) RETURNING *",
        )
        .bind(&new_user.username)
        .bind(&new_user.password)
        .fetch_one(cxn_handle.borrow_connection())
        .await
        .map_err(|err| super::port_error(err, "insert a new user"))?;

        Ok(user.into())
    }

    async fn update_user(
        &self,
        user_id: i32,
        update: &UserUpdate,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<User, DrivenPortError> {
        let mut cxn_handle = ext_cxn.database_cxn().await?;

        let user = query_as::<_, UserRow>(
            "UPDATE app_user SET \
             username = COALESCE($1, username), \
             password = COALESCE($2, password) \
             WHERE id = $3 RETURNING *",
        )
        .bind(&update.username)
        .bind(&update.password)
        .bind(user_id)
        .fetch_optional(cxn_handle.borrow_connection())
        .await
        .map_err(|err| super::port_error(err, "update a user"))?;

        user.map(User::from).ok_or(DrivenPortError::DoesNotExist)
    }

    async fn delete_user(
        &self,
        user_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<User, DrivenPortError> {
        let mut cxn_handle = ext_cxn.database_cxn().await?;

        let user = query_as::<_, UserRow>("DELETE FROM app_user WHERE id = $1 RETURNING *")
            .bind(user_id)
            .fetch_optional(cxn_handle.borrow_connection())
            .await
            .map_err(|err| super::port_error(err, "remove a user"))?;

        user.map(User::from).ok_or(DrivenPortError::DoesNotExist)
    }
}
