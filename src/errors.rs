use anyhow::Error;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error as ThisError;

#[derive(Debug)]
pub struct ServerError(Error);

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        tracing::error!(error = ?self.0, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong")
            .into_response()
    }
}

// This enables using `?` on functions that return `Result<_, anyhow::Error>`
// to turn them into `Result<_, ServerError>`. That way you don't need to do
// that manually.
impl<E> From<E> for ServerError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

/// The one error a user is ever shown while editing.
#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Lütfen en az bir başlık veya içerik girin.")]
    EmptyNote,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_error_is_opaque() {
        let res = ServerError::from(anyhow::anyhow!("db exploded")).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_validation_message() {
        assert_eq!(
            ValidationError::EmptyNote.to_string(),
            "Lütfen en az bir başlık veya içerik girin."
        );
    }
}
