use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{error, warn};

use crate::pages;

#[derive(Error, Debug)]
pub enum WebError {
    #[error(transparent)]
    Content(#[from] st_core::Error),
}

impl WebError {
    pub fn status(&self) -> StatusCode {
        match self {
            WebError::Content(st_core::Error::InvalidCursor(_)) => StatusCode::BAD_REQUEST,
            WebError::Content(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// What the visitor reads. Upstream detail only goes to the logs.
    pub fn public_message(&self) -> &'static str {
        match self.status() {
            StatusCode::BAD_REQUEST => "Endereço inválido.",
            _ => "Não foi possível carregar o conteúdo agora. Tente novamente mais tarde.",
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("❌ {}", self);
        } else {
            warn!("{}", self);
        }
        (status, pages::error_page(status, self.public_message())).into_response()
    }
}
