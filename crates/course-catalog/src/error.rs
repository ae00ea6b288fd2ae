use catalog_common::error::CommonError;
use catalog_common::gemini::GeminiClientError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Common(#[from] CommonError),
}

/// Why an import did not replace the catalog. Every variant leaves the current list untouched.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("extraction credentials are not configured")]
    MissingCredentials,

    #[error("rejected upload: {0}")]
    InvalidFileType(String),

    #[error("extraction returned no data")]
    EmptyResponse,

    #[error("extraction payload is malformed: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("extraction request failed: {0}")]
    Upstream(GeminiClientError),

    #[error("import task aborted: {0}")]
    Aborted(String),
}

impl From<GeminiClientError> for ExtractionError {
    fn from(err: GeminiClientError) -> Self {
        match err {
            GeminiClientError::MissingApiKey => ExtractionError::MissingCredentials,
            GeminiClientError::InvalidJson(e) => ExtractionError::Malformed(e),
            other => ExtractionError::Upstream(other),
        }
    }
}

impl ExtractionError {
    /// The single message shown to the user.
    pub fn user_message(&self) -> &'static str {
        match self {
            ExtractionError::MissingCredentials => {
                "Chave de API ausente. Verifique a configuração do ambiente."
            }
            ExtractionError::InvalidFileType(_) => "Por favor, envie apenas arquivos PDF.",
            ExtractionError::EmptyResponse
            | ExtractionError::Malformed(_)
            | ExtractionError::Upstream(_)
            | ExtractionError::Aborted(_) => {
                "Falha ao processar o PDF com IA. Verifique se o arquivo é válido."
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Credenciais inválidas.")]
    InvalidCredentials,

    #[error("Acesso restrito ao administrador.")]
    Unauthorized,
}
