use thiserror::Error;

pub mod task;
pub mod user;

#[cfg(test)]
pub(crate) mod test_util;

/// Errors surfaced by the driving ports to whatever adapter invoked them
#[derive(Error, Debug)]
pub enum Error {
    #[error("requested data does not exist")]
    DoesNotExist,
    #[error("the change conflicts with existing data: {0}")]
    ConstraintViolation(String),
    #[error("the datastore rejected a value as malformed: {0}")]
    InvalidInput(String),
    #[error("failed to {action} due to a communication failure: {cause}")]
    RetrieveFailure {
        action: String,
        #[source]
        cause: anyhow::Error,
    },
}

#[derive(Error, Debug)]
pub enum DrivenPortError {
    #[error("a communication failure occurred: {0}")]
    CommsFailure(#[from] anyhow::Error),
    #[error("the requested data does not exist")]
    DoesNotExist,
    #[error("a data constraint was violated: {0}")]
    ConstraintViolation(String),
    #[error("a value could not be stored or compared: {0}")]
    InvalidInput(String),
}

impl DrivenPortError {
    /// Converts this DrivenPortError to a domain error with some extra info on the [action]
    /// being taken when communicating over the port
    pub fn into_error_trying_to(self, action: &str) -> Error {
        match self {
            Self::DoesNotExist => Error::DoesNotExist,
            Self::ConstraintViolation(detail) => Error::ConstraintViolation(detail),
            Self::InvalidInput(detail) => Error::InvalidInput(detail),
            Self::CommsFailure(err) => Error::RetrieveFailure {
                action: action.into(),
                cause: err,
            },
        }
    }
}
