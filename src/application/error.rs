use std::error::Error as StdError;

use thiserror::Error;

use crate::{
    application::{
        editor::EditorError, metadata::MetadataError, render::RenderError,
        verification::VerificationError,
    },
    domain::error::DomainError,
    infra::error::InfraError,
};

/// Exit status used when input was rejected rather than processing failing.
pub const EXIT_INVALID_INPUT: i32 = 2;
pub const EXIT_FAILURE: i32 = 1;

/// An error flattened into its message chain for reporting.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub exit_code: i32,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, exit_code: i32, error: &dyn StdError) -> Self {
        let mut messages = vec![error.to_string()];
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            exit_code,
            messages,
        }
    }

    /// Messages joined outermost first, e.g. `loading failed: file missing`.
    pub fn summary(&self) -> String {
        self.messages.join(": ")
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Editor(#[from] EditorError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    #[error(transparent)]
    Verification(#[from] VerificationError),
    #[error("validation failed: {0}")]
    Validation(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Domain(DomainError::Validation { .. })
            | AppError::Editor(_)
            | AppError::Verification(_)
            | AppError::Validation(_) => EXIT_INVALID_INPUT,
            AppError::Infra(_) | AppError::Render(_) | AppError::Metadata(_) => EXIT_FAILURE,
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport::from_error("application::error::AppError", self.exit_code(), self)
    }
}
