/// Document extraction: turning an uploaded course schedule into raw course records.
///
/// The catalog only depends on `DocumentExtractor`. `GeminiExtractor` is the production
/// implementation; it sends the PDF inline together with an instruction and a response schema,
/// and expects a JSON array back.
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{info, warn};

use catalog_common::gemini::{
    Content, GeminiClient, GenerateContentRequest, GenerationConfig, Part,
};

use crate::error::ExtractionError;
use crate::model::RawCourse;

pub const PDF_MIME: &str = "application/pdf";
const PDF_SIGNATURE: &[u8] = b"%PDF-";

/// An uploaded file as received from a client.
#[derive(Debug, Clone)]
pub struct PdfDocument {
    pub file_name: String,
    /// Declared media type, if the transport carried one.
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl PdfDocument {
    pub fn new(file_name: impl Into<String>, content_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type,
            bytes,
        }
    }

    /// Reject anything that is not a PDF before a request is made.
    pub fn validate(&self) -> Result<(), ExtractionError> {
        if let Some(declared) = &self.content_type {
            let essence = declared.split(';').next().unwrap_or_default().trim();
            if !essence.eq_ignore_ascii_case(PDF_MIME) {
                return Err(ExtractionError::InvalidFileType(format!(
                    "{}: declared type {essence}",
                    self.file_name
                )));
            }
        }
        if self.bytes.is_empty() {
            return Err(ExtractionError::InvalidFileType(format!(
                "{}: empty file",
                self.file_name
            )));
        }
        if !self.bytes.starts_with(PDF_SIGNATURE) {
            return Err(ExtractionError::InvalidFileType(format!(
                "{}: missing PDF signature",
                self.file_name
            )));
        }
        Ok(())
    }
}

#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    /// Extract every course listed in `document`, in document order.
    async fn extract(&self, document: &PdfDocument) -> Result<Vec<RawCourse>, ExtractionError>;
}

const EXTRACTION_PROMPT: &str = "\
You extract course offerings from a vocational school's course schedule.
The attached PDF lists the courses on offer. Return every course in it as JSON,
following the response schema exactly.

Cleaning rules:
1. Monetary fields are plain numbers: drop the currency symbol (R$) and separators.
2. Courses marked 'Gratuito' have every monetary field set to 0.
3. 'turno' is exactly one of: 'Manhã', 'Tarde', 'Noite', 'Integral', 'EAD'.
4. 'datas' is a short range such as \"DD/MM a DD/MM\".";

/// Structural constraint sent with the request: an array of course objects.
pub fn response_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "nome_curso": {"type": "STRING"},
                "categoria": {"type": "STRING"},
                "carga_horaria": {"type": "STRING"},
                "numero_de_parcelas": {"type": "NUMBER"},
                "valor_parcela": {"type": "NUMBER"},
                "valor_total": {"type": "NUMBER"},
                "datas": {"type": "STRING"},
                "turno": {"type": "STRING"},
                "unidade": {"type": "STRING"}
            },
            "required": ["nome_curso", "valor_total", "categoria"]
        }
    })
}

/// Decode the response text into raw records. Absent, blank or empty-array payloads are
/// `EmptyResponse`; anything that is not an array of course objects is `Malformed`.
pub fn parse_extraction_payload(text: Option<&str>) -> Result<Vec<RawCourse>, ExtractionError> {
    let text = text.map(strip_code_fence).unwrap_or_default();
    if text.is_empty() {
        return Err(ExtractionError::EmptyResponse);
    }
    let records: Vec<RawCourse> = serde_json::from_str(text)?;
    if records.is_empty() {
        return Err(ExtractionError::EmptyResponse);
    }
    Ok(records)
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

pub struct GeminiExtractor {
    client: GeminiClient,
}

impl GeminiExtractor {
    pub fn new(client: GeminiClient) -> Self {
        Self { client }
    }

    pub fn build_request(document: &PdfDocument) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![
                    Part::inline(PDF_MIME, &document.bytes),
                    Part::text(EXTRACTION_PROMPT),
                ],
            }],
            generation_config: Some(GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(response_schema()),
                temperature: None,
            }),
        }
    }
}

#[async_trait]
impl DocumentExtractor for GeminiExtractor {
    async fn extract(&self, document: &PdfDocument) -> Result<Vec<RawCourse>, ExtractionError> {
        if !self.client.has_api_key() {
            return Err(ExtractionError::MissingCredentials);
        }

        let request = Self::build_request(document);
        let response = self.client.generate_content(&request).await?;

        if let Some(usage) = &response.usage_metadata {
            info!(
                model = %self.client.config().model,
                total_tokens = usage.total_token_count,
                "extraction response received"
            );
        }

        let text = response.text();
        if text.is_none() {
            let finish_reason = response
                .candidates
                .first()
                .and_then(|c| c.finish_reason.as_deref())
                .unwrap_or("none");
            warn!(finish_reason, "extraction response carried no text");
        }
        parse_extraction_payload(text.as_deref())
    }
}
