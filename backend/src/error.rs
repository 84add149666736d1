//! Error handling for Cozinha ao Lucro
//!
//! Provides consistent error responses in Portuguese and English

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::DomainError;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unauthorized: {message}")]
    Unauthorized {
        message: String,
        message_pt: String,
    },

    // Validation errors
    #[error("Validation error: {message}")]
    Validation {
        field: String,
        message: String,
        message_pt: String,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Business logic errors
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Plan limit reached: {0}")]
    PlanLimitReached(String),

    #[error("Import error: {0}")]
    Import(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    /// Field-level validation failure with an English message and its Portuguese translation
    pub fn validation(field: &str, message: &str, message_pt: &str) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.to_string(),
            message_pt: message_pt.to_string(),
        }
    }

    /// Wrap a `shared::validation` result for `field`
    pub fn check(field: &str, result: Result<(), &'static str>) -> AppResult<()> {
        result.map_err(|message| AppError::Validation {
            field: field.to_string(),
            message: message.to_string(),
            message_pt: translate(message).to_string(),
        })
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidTransition { .. } => AppError::InvalidStateTransition(err.to_string()),
            DomainError::PlanLimitReached { .. } => AppError::PlanLimitReached(err.to_string()),
            DomainError::UnknownUnit(_) => AppError::validation("unit", &err.to_string(), "Unidade de medida inválida"),
            DomainError::UnknownMovementType(_) => {
                AppError::validation("movement_type", &err.to_string(), "Tipo de movimentação inválido")
            }
            DomainError::UnknownOrderStatus(_) => {
                AppError::validation("status", &err.to_string(), "Status de pedido inválido")
            }
            DomainError::UnknownPlan(_) => AppError::Internal(err.to_string()),
            DomainError::Overflow(_) => AppError::validation(
                "quantity",
                &err.to_string(),
                "Valor fora do intervalo suportado",
            ),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let field_errors = errors.field_errors();
        let first = field_errors
            .iter()
            .next()
            .and_then(|(field, errs)| errs.first().map(|e| (field.to_string(), e)));

        match first {
            Some((field, error)) => {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value for {}", field));
                AppError::Validation {
                    message_pt: format!("Valor inválido para {}", field),
                    field,
                    message,
                }
            }
            None => AppError::ValidationError(errors.to_string()),
        }
    }
}

/// Portuguese text for the messages returned by `shared::validation`
fn translate(message: &str) -> &'static str {
    match message {
        "Name is required" => "Nome é obrigatório",
        "Name must be at most 120 characters" => "Nome deve ter no máximo 120 caracteres",
        "Selling price must be greater than zero" => "Preço de venda deve ser maior que zero",
        "Cost per unit cannot be negative" => "Custo por unidade não pode ser negativo",
        "Quantity must be greater than zero" => "Quantidade deve ser maior que zero",
        "Minimum stock cannot be negative" => "Estoque mínimo não pode ser negativo",
        "Invalid Brazilian phone number" => "Número de telefone inválido",
        _ => "Dados inválidos",
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message_en: String,
    pub message_pt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail {
                    code: "INVALID_CREDENTIALS".to_string(),
                    message_en: "Invalid email or password".to_string(),
                    message_pt: "E-mail ou senha inválidos".to_string(),
                    field: None,
                },
            ),
            AppError::Unauthorized { message, message_pt } => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail {
                    code: "UNAUTHORIZED".to_string(),
                    message_en: message.clone(),
                    message_pt: message_pt.clone(),
                    field: None,
                },
            ),
            AppError::Validation { field, message, message_pt } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message_en: message.clone(),
                    message_pt: message_pt.clone(),
                    field: Some(field.clone()),
                },
            ),
            AppError::ValidationError(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message_en: msg.clone(),
                    message_pt: format!("Dados inválidos: {}", msg),
                    field: None,
                },
            ),
            AppError::DuplicateEntry(field) => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "DUPLICATE_ENTRY".to_string(),
                    message_en: format!("A record with this {} already exists", field),
                    message_pt: format!("Já existe um registro com este {}", field),
                    field: Some(field.clone()),
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "NOT_FOUND".to_string(),
                    message_en: format!("{} not found", resource),
                    message_pt: format!("{} não encontrado", resource),
                    field: None,
                },
            ),
            AppError::InvalidStateTransition(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "INVALID_STATE_TRANSITION".to_string(),
                    message_en: msg.clone(),
                    message_pt: format!("Não é possível alterar o status: {}", msg),
                    field: Some("status".to_string()),
                },
            ),
            AppError::PlanLimitReached(msg) => (
                StatusCode::PAYMENT_REQUIRED,
                ErrorDetail {
                    code: "PLAN_LIMIT_REACHED".to_string(),
                    message_en: msg.clone(),
                    message_pt: "Limite do seu plano atingido. Faça upgrade para continuar."
                        .to_string(),
                    field: None,
                },
            ),
            AppError::Import(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "IMPORT_ERROR".to_string(),
                    message_en: format!("Import failed: {}", msg),
                    message_pt: format!("Falha na importação: {}", msg),
                    field: None,
                },
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "DATABASE_ERROR".to_string(),
                    message_en: "A database error occurred".to_string(),
                    message_pt: "Ocorreu um erro no banco de dados".to_string(),
                    field: None,
                },
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message_en: msg.clone(),
                    message_pt: "Erro interno do servidor".to_string(),
                    field: None,
                },
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message_en: "An internal server error occurred".to_string(),
                    message_pt: "Erro interno do servidor".to_string(),
                    field: None,
                },
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
