pub mod db_task_driven_ports;
pub mod db_user_driven_ports;

use crate::domain::DrivenPortError;
use crate::external_connections;
use crate::external_connections::ConnectionHandle;
use anyhow::anyhow;
use sqlx::pool::PoolConnection;
use sqlx::{PgConnection, PgPool, Postgres};

/// Data structure which owns clients for connecting to external systems.
/// Allows business logic to be agnostic of the external systems it communicates with
/// so driven adapters can easily be swapped out for other implementations.
///
/// One instance is built at startup and shared by every request; clones share the same pool.
#[derive(Clone)]
pub struct ExternalConnectivity {
    db: PgPool,
}

impl ExternalConnectivity {
    /// Accepts the set of clients used to connect to external systems and constructs
    /// an instance of ExternalConnectivity owning those clients
    pub fn new(db: PgPool) -> Self {
        ExternalConnectivity { db }
    }

    /// Closes the database pool, waiting for checked-out connections to be returned
    pub async fn shutdown(&self) {
        self.db.close().await;
    }
}

/// A handle from ExternalConnectivity which can connect to a database
pub struct PoolConnectionHandle {
    active_connection: PoolConnection<Postgres>,
}

impl ConnectionHandle for PoolConnectionHandle {
    fn borrow_connection(&mut self) -> &mut PgConnection {
        &mut self.active_connection
    }
}

impl external_connections::ExternalConnectivity for ExternalConnectivity {
    type DbHandle<'cxn_borrow> = PoolConnectionHandle;

    async fn database_cxn(&mut self) -> Result<Self::DbHandle<'_>, anyhow::Error> {
        let handle = PoolConnectionHandle {
            active_connection: self.db.acquire().await?,
        };

        Ok(handle)
    }
}

/// SQLSTATE class 22 ("data exception"): values Postgres refused to read, such as text with a NUL
/// byte or a number out of range
fn is_data_exception(sqlstate: &str) -> bool {
    sqlstate.starts_with("22")
}

/// Sorts a [sqlx::Error] into the driven port error taxonomy. Unique and foreign key violations are
/// constraint violations, data exceptions are invalid input, and the rest are outages.
fn port_error(err: sqlx::Error, action: &str) -> DrivenPortError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() || db_err.is_foreign_key_violation() {
            return DrivenPortError::ConstraintViolation(db_err.message().to_owned());
        }
        if db_err.code().is_some_and(|code| is_data_exception(&code)) {
            return DrivenPortError::InvalidInput(db_err.message().to_owned());
        }
    }

    DrivenPortError::CommsFailure(anyhow!(err).context(format!("trying to {action}")))
}
