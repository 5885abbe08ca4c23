// src/errors.rs
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConceptShotError {
    /// Upstream AI gateway answered HTTP 429. Transient; never retried
    /// automatically, the user decides when to resubmit.
    #[error("AI gateway rate limited the request")]
    RateLimited,

    /// Upstream AI gateway answered HTTP 402. Non-transient until credits
    /// are replenished; kept distinct from `RateLimited` on purpose.
    #[error("AI gateway credits exhausted")]
    QuotaExceeded,

    /// Shared-secret mismatch on the proxy boundary.
    #[error("unauthorized: app secret mismatch")]
    Unauthorized,

    /// Any other non-2xx from the AI gateway or the proxy.
    #[error("gateway error (status {status}): {body}")]
    Gateway { status: u16, body: String },

    /// The remote model was asked for pure JSON and returned something else.
    #[error("analysis parse error: {0}")]
    AnalysisParse(String),

    /// The main-shot branch produced no usable image. The only failure that
    /// aborts a generation run.
    #[error("generation failed: {0}")]
    Generation(String),

    #[error("image processing error: {0}")]
    ImageProcessing(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("validation error: {0}")]
    Validation(String),

    /// Network-level failure talking to the upstream gateway or the proxy.
    #[error("upstream request error: {0}")]
    Upstream(String),
}

impl ConceptShotError {
    /// Korean copy shown to the user as a toast; matches the web client.
    pub fn user_message(&self) -> String {
        match self {
            ConceptShotError::RateLimited => {
                "요청이 너무 많습니다. 잠시 후 다시 시도해주세요.".to_string()
            }
            ConceptShotError::QuotaExceeded => {
                "크레딧이 부족합니다. 설정에서 크레딧을 추가해주세요.".to_string()
            }
            ConceptShotError::AnalysisParse(_) => {
                "제품 분석에 실패했습니다. 다시 시도해주세요.".to_string()
            }
            ConceptShotError::Generation(_) => {
                "이미지 생성에 실패했습니다. 다시 시도해주세요.".to_string()
            }
            ConceptShotError::Unauthorized => "Unauthorized".to_string(),
            ConceptShotError::Validation(msg) => msg.clone(),
            other => other.to_string(),
        }
    }

    /// Whether resubmitting the same request later can reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ConceptShotError::RateLimited)
    }
}

impl ResponseError for ConceptShotError {
    fn status_code(&self) -> StatusCode {
        match self {
            ConceptShotError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ConceptShotError::QuotaExceeded => StatusCode::PAYMENT_REQUIRED,
            ConceptShotError::Unauthorized => StatusCode::UNAUTHORIZED,
            ConceptShotError::Validation(_) | ConceptShotError::ImageProcessing(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.user_message()
        }))
    }
}
