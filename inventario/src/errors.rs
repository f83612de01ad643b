use crate::sheets::SheetError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error as ThisError;

/// Message shown to clients when the spreadsheet cannot be found.
pub const SHEET_NOT_FOUND_MESSAGE: &str = "Planilha não encontrada";

#[derive(ThisError, Debug)]
pub enum Error {
    /// Missing or invalid request field
    #[error("{message}")]
    BadRequest { message: String },

    /// Failure reported by the spreadsheet gateway
    #[error(transparent)]
    Sheet(#[from] SheetError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// JSON body of every error returned by the `/api` routes.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

impl Error {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Error::BadRequest { message: message.into() }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::Sheet(SheetError::SheetNotFound { .. }) => StatusCode::NOT_FOUND,
            Error::Sheet(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message sent to the client.
    ///
    /// Gateway failures are forwarded as-is so staff can see what the spreadsheet service
    /// reported; unexpected internal errors are not.
    pub fn user_message(&self) -> String {
        match self {
            Error::BadRequest { message } => message.clone(),
            Error::Sheet(SheetError::SheetNotFound { .. }) => SHEET_NOT_FOUND_MESSAGE.to_string(),
            Error::Sheet(err) => err.to_string(),
            Error::Other(_) => "Erro interno do servidor".to_string(),
        }
    }

    fn log(&self) {
        match self {
            Error::Sheet(SheetError::SheetNotFound { .. }) => {
                tracing::warn!("Spreadsheet unavailable: {}", self);
            }
            Error::Sheet(_) | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::BadRequest { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        self.log();
        let body = ErrorBody {
            error: self.user_message(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

/// Which form the plain-text error belongs to; the wording differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction {
    Submit,
    Update,
}

/// Error rendered as a plain-text body, for the HTML form endpoints.
#[derive(Debug)]
pub struct FormError {
    pub action: FormAction,
    pub error: Error,
}

impl FormError {
    pub fn submit(error: impl Into<Error>) -> Self {
        Self {
            action: FormAction::Submit,
            error: error.into(),
        }
    }

    pub fn update(error: impl Into<Error>) -> Self {
        Self {
            action: FormAction::Update,
            error: error.into(),
        }
    }

    pub fn message(&self) -> String {
        match (&self.error, self.action) {
            (Error::BadRequest { message }, _) => format!("Dados inválidos: {message}"),
            (Error::Sheet(SheetError::SheetNotFound { .. }), _) => {
                "Erro: A planilha não foi encontrada. Verifique o nome configurado e o compartilhamento.".to_string()
            }
            (err, FormAction::Submit) => format!("Ocorreu um erro inesperado: {}", err.user_message()),
            (err, FormAction::Update) => format!("Ocorreu um erro ao atualizar: {}", err.user_message()),
        }
    }
}

impl IntoResponse for FormError {
    fn into_response(self) -> Response {
        self.error.log();
        (self.error.status_code(), self.message()).into_response()
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
