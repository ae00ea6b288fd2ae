use std::path::Path;
use std::sync::Arc;

use rmcp::{
    Json, ServerHandler,
    handler::server::router::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::*,
    tool, tool_handler, tool_router,
};
use tracing::warn;

use crate::api::{
    CategoryListResponse, CourseListResponse, ImportPdfParams, ImportResponse, LoginParams,
    LoginResponse, OkResponse, SessionParams, StatusResponse,
};
use crate::auth::AdminAuth;
use crate::card::CardBuilder;
use crate::catalog::CatalogService;
use crate::extract::PdfDocument;
use crate::model::FilterCriteria;

#[derive(Clone)]
pub struct CourseCatalogServer {
    catalog: CatalogService,
    auth: Arc<AdminAuth>,
    cards: CardBuilder,
    tool_router: ToolRouter<CourseCatalogServer>,
}

impl CourseCatalogServer {
    pub fn new(catalog: CatalogService, auth: Arc<AdminAuth>, cards: CardBuilder) -> Self {
        Self {
            catalog,
            auth,
            cards,
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router]
impl CourseCatalogServer {
    #[tool(description = "List course cards matching the given filters. All filters are optional: search (text in name, unit or category), category, shift (Manhã/Tarde/Noite/Integral/EAD), modality (online/presencial), priceRange (free/up_to_500/500_1000/over_1000).")]
    async fn list_courses(
        &self,
        Parameters(criteria): Parameters<FilterCriteria>,
    ) -> Result<Json<CourseListResponse>, String> {
        let total = self.catalog.courses().await.len();
        let matched = self.catalog.filtered(&criteria).await;
        Ok(Json(CourseListResponse::new(
            self.cards.build_all(&matched),
            total,
            &criteria,
        )))
    }

    #[tool(description = "List the distinct course categories (sorted) together with the accepted shift, modality and priceRange values.")]
    async fn list_categories(&self) -> Result<Json<CategoryListResponse>, String> {
        Ok(Json(CategoryListResponse::new(self.catalog.categories().await)))
    }

    #[tool(description = "Show the status of the most recent PDF import (loading flag, progress message, error).")]
    async fn extraction_status(&self) -> Result<Json<StatusResponse>, String> {
        Ok(Json(StatusResponse {
            status: self.catalog.status().await,
        }))
    }

    #[tool(description = "Log in as administrator. Returns a session_token required by import_pdf.")]
    async fn login(
        &self,
        Parameters(params): Parameters<LoginParams>,
    ) -> Result<Json<LoginResponse>, String> {
        let token = self
            .auth
            .login(&params.username, &params.password)
            .await
            .map_err(|e| e.to_string())?;
        Ok(Json(LoginResponse { token }))
    }

    #[tool(description = "End an administrator session.")]
    async fn logout(
        &self,
        Parameters(params): Parameters<SessionParams>,
    ) -> Result<Json<OkResponse>, String> {
        let ok = self.auth.logout(params.session_token.trim()).await;
        Ok(Json(OkResponse { ok }))
    }

    #[tool(description = "Replace the whole catalog with the courses extracted from a PDF course schedule at a local path. Requires an administrator session_token. On failure the current catalog is kept.")]
    async fn import_pdf(
        &self,
        Parameters(params): Parameters<ImportPdfParams>,
    ) -> Result<Json<ImportResponse>, String> {
        self.auth
            .require_admin(Some(params.session_token.trim()))
            .await
            .map_err(|e| e.to_string())?;

        let path = params.path.trim();
        if path.is_empty() {
            return Err("path must not be empty".to_string());
        }
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            warn!(error = %e, path, "failed to read PDF");
            format!("failed to read {path}: {e}")
        })?;
        let file_name = Path::new(path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string());

        let outcome = self
            .catalog
            .import_document(PdfDocument::new(file_name, None, bytes))
            .await
            .map_err(|e| e.user_message().to_string())?;
        Ok(Json(outcome.into()))
    }
}

#[tool_handler]
impl ServerHandler for CourseCatalogServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_06_18,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "course-catalog".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Vocational course catalog. Use list_categories and list_courses to browse and \
filter courses; each card carries its price display and an enrollment link. Administrators call \
login, then import_pdf with the session_token to replace the catalog from a PDF schedule, and \
extraction_status to inspect the last import."
                    .to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CourseCatalogServer;

    #[test]
    fn tools_publish_output_schemas() {
        let tools = CourseCatalogServer::tool_router().list_all();
        for name in [
            "list_courses",
            "list_categories",
            "extraction_status",
            "login",
            "logout",
            "import_pdf",
        ] {
            let tool = tools
                .iter()
                .find(|t| t.name == name)
                .unwrap_or_else(|| panic!("missing tool: {name}"));
            assert!(
                tool.output_schema.is_some(),
                "tool {name} should publish output_schema"
            );
        }
    }
}
