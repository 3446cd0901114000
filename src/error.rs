use rocket::http::Status;
use rocket::response::{self, Responder, Response};
use rocket::serde::json::Json;
use rocket::Request;

/// Crate-wide error type. Variant names match the error table in `spec.md` §7.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("you are not allowed to modify this")]
    Ownership,

    #[error("{0} is not reachable")]
    Unreachable(String),

    #[error("timed out waiting for {0}")]
    Timeout(String),

    #[error("{0} did not respond")]
    EmptyResponse(String),

    #[error("{0} encountered an error")]
    AdapterFault(String),

    #[error("chain depth exceeded")]
    DepthExceeded,

    #[error("database error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> Status {
        match self {
            AppError::Validation(_) => Status::BadRequest,
            AppError::NotFound(_) => Status::NotFound,
            AppError::Ownership => Status::Forbidden,
            AppError::Unreachable(_) => Status::ServiceUnavailable,
            AppError::Timeout(_) => Status::GatewayTimeout,
            AppError::EmptyResponse(_) => Status::UnprocessableEntity,
            AppError::AdapterFault(_) => Status::BadGateway,
            AppError::DepthExceeded => Status::BadRequest,
            AppError::Store(_) | AppError::Internal(_) => Status::InternalServerError,
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for AppError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'o> {
        let status = self.status();
        let body = Json(serde_json::json!({"error": self.to_string()}));
        Response::build_from(body.respond_to(req)?)
            .status(status)
            .ok()
    }
}

pub type AppResult<T> = Result<T, AppError>;
