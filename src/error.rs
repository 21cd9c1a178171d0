use std::error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DBError {
    #[error(transparent)]
    SQLError(#[from] sqlx::Error),
    #[error("Did not find department: {0}")]
    DepartmentNotFound(i32),
    #[error("Did not find room: {0}")]
    RoomNotFound(i32),
    #[error("Did not find tank: {0}")]
    TankNotFound(i32),
    #[error("Did not find attribute: {0}")]
    AttributeNotFound(i32),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Arguments are not used as specified")]
    ArgumentError(),
}

#[derive(Debug, Error)]
#[error(transparent)]
pub enum ServiceError {
    User(Box<dyn error::Error + Send + Sync>),
    Internal(Box<dyn error::Error + Send + Sync>),
}

impl From<DBError> for ServiceError {
    fn from(err: DBError) -> Self {
        match err {
            DBError::SQLError(_) => ServiceError::Internal(Box::from(err)),
            _ => ServiceError::User(Box::from(err)),
        }
    }
}

impl From<ApiError> for ServiceError {
    fn from(err: ApiError) -> Self {
        ServiceError::User(Box::from(err))
    }
}
