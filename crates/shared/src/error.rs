use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Validation,
    AlreadyExists,
    InvalidCredentials,
    NotFound,
    Import,
    EmptyStore,
    Storage,
}

/// Recoverable outcomes of inventory operations. None of them leaves a
/// partial mutation behind.
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("{0}")]
    Validation(String),
    #[error("User already exists")]
    AlreadyExists { email: String },
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Product not found")]
    NotFound { id: String },
    #[error("Invalid JSON file")]
    Import { reason: String },
    #[error("No products to export")]
    EmptyStore,
    #[error("storage failure: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl InventoryError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation(_) => ErrorCode::Validation,
            Self::AlreadyExists { .. } => ErrorCode::AlreadyExists,
            Self::InvalidCredentials => ErrorCode::InvalidCredentials,
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::Import { .. } => ErrorCode::Import,
            Self::EmptyStore => ErrorCode::EmptyStore,
            Self::Storage(_) => ErrorCode::Storage,
        }
    }
}

pub type InventoryResult<T> = Result<T, InventoryError>;

/// A message for the operator. Failures carry the code they stem from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.code.is_some()
    }
}

impl From<&InventoryError> for Notice {
    fn from(value: &InventoryError) -> Self {
        Self::error(value.code(), value.to_string())
    }
}

impl From<InventoryError> for Notice {
    fn from(value: InventoryError) -> Self {
        Self::from(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notices_keep_operator_facing_messages() {
        let notice = Notice::from(InventoryError::AlreadyExists {
            email: "a@b.c".into(),
        });
        assert_eq!(notice.code, Some(ErrorCode::AlreadyExists));
        assert_eq!(notice.message, "User already exists");

        let notice = Notice::from(InventoryError::Import {
            reason: "expected an array".into(),
        });
        assert_eq!(notice.message, "Invalid JSON file");
        assert!(notice.is_error());
    }

    #[test]
    fn storage_errors_map_to_storage_code() {
        let err = InventoryError::from(anyhow::anyhow!("disk full"));
        assert_eq!(err.code(), ErrorCode::Storage);
        assert!(err.to_string().contains("disk full"));
    }
}
