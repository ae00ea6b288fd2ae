use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::ExtractionError;
use crate::extract::{DocumentExtractor, PdfDocument};
use crate::filter::{apply_filters, categories};
use crate::model::{Course, ExtractionStatus, FilterCriteria};
use crate::seed::seed_courses;
use crate::store::CourseStore;

const MSG_SENDING: &str = "Enviando PDF para extração...";
const MSG_SUCCESS: &str = "Sucesso!";

#[derive(Debug, Default)]
struct CatalogState {
    courses: Vec<Course>,
    status: ExtractionStatus,
}

/// Result of a successful import. `filters` is the reset criteria a client should adopt.
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub imported: usize,
    pub message: String,
    pub filters: FilterCriteria,
}

/// The shared course list plus the upload panel status.
#[derive(Clone)]
pub struct CatalogService {
    state: Arc<RwLock<CatalogState>>,
    store: Arc<CourseStore>,
    extractor: Arc<dyn DocumentExtractor>,
}

impl CatalogService {
    /// Read the persisted snapshot once. Absent or unreadable snapshots fall back to the seed list.
    pub async fn load(store: CourseStore, extractor: Arc<dyn DocumentExtractor>) -> Self {
        let courses = match store.load().await {
            Ok(Some(mut courses)) => {
                let repaired = reassign_duplicate_ids(&mut courses);
                if repaired > 0 {
                    warn!(repaired, "snapshot contained duplicate course ids");
                }
                info!(courses = courses.len(), backend = store.kind(), "loaded course snapshot");
                courses
            }
            Ok(None) => {
                info!(backend = store.kind(), "no course snapshot, using seed list");
                seed_courses()
            }
            Err(e) => {
                warn!(error = %e, backend = store.kind(), "unreadable course snapshot, using seed list");
                seed_courses()
            }
        };

        Self {
            state: Arc::new(RwLock::new(CatalogState {
                courses,
                status: ExtractionStatus::default(),
            })),
            store: Arc::new(store),
            extractor,
        }
    }

    pub async fn courses(&self) -> Vec<Course> {
        self.state.read().await.courses.clone()
    }

    pub async fn filtered(&self, criteria: &FilterCriteria) -> Vec<Course> {
        apply_filters(&self.state.read().await.courses, criteria)
    }

    pub async fn categories(&self) -> Vec<String> {
        categories(&self.state.read().await.courses)
    }

    pub async fn status(&self) -> ExtractionStatus {
        self.state.read().await.status.clone()
    }

    /// Replace the whole catalog with the courses found in `document`.
    ///
    /// On failure the status carries exactly one user-facing message and the list is untouched.
    /// Concurrent imports are not sequenced; the last one to finish wins, both in memory and in
    /// the snapshot. The import runs in its own task, so dropping the returned future does not
    /// leave the status stuck at `loading`.
    pub async fn import_document(
        &self,
        document: PdfDocument,
    ) -> Result<ImportOutcome, ExtractionError> {
        let this = self.clone();
        match tokio::spawn(async move { this.run_import(document).await }).await {
            Ok(result) => result,
            Err(join_err) => {
                let e = ExtractionError::Aborted(join_err.to_string());
                error!(error = %e, "import task ended abnormally");
                self.fail(&e).await;
                Err(e)
            }
        }
    }

    async fn run_import(&self, document: PdfDocument) -> Result<ImportOutcome, ExtractionError> {
        if let Err(e) = document.validate() {
            warn!(error = %e, "upload rejected");
            self.fail(&e).await;
            return Err(e);
        }

        {
            let mut state = self.state.write().await;
            state.status = ExtractionStatus {
                loading: true,
                message: MSG_SENDING.to_string(),
                error: None,
            };
        }
        info!(file = %document.file_name, bytes = document.bytes.len(), "extraction started");

        let raw = match self.extractor.extract(&document).await {
            Ok(raw) => raw,
            Err(e) => {
                error!(error = %e, file = %document.file_name, "extraction failed");
                self.fail(&e).await;
                return Err(e);
            }
        };

        let courses: Vec<Course> = raw.into_iter().map(Course::from_extracted).collect();
        let imported = courses.len();

        {
            // Persist and swap under one lock so the snapshot always holds the served list.
            let mut state = self.state.write().await;
            self.store.save(&courses).await;
            state.courses = courses;
            state.status = ExtractionStatus {
                loading: false,
                message: MSG_SUCCESS.to_string(),
                error: None,
            };
        }
        info!(courses = imported, "catalog replaced from import");

        Ok(ImportOutcome {
            imported,
            message: MSG_SUCCESS.to_string(),
            filters: FilterCriteria::default(),
        })
    }

    async fn fail(&self, err: &ExtractionError) {
        let mut state = self.state.write().await;
        state.status = ExtractionStatus {
            loading: false,
            message: String::new(),
            error: Some(err.user_message().to_string()),
        };
    }
}

fn reassign_duplicate_ids(courses: &mut [Course]) -> usize {
    let mut seen = HashSet::new();
    let mut repaired = 0;
    for course in courses.iter_mut() {
        if !seen.insert(course.id.clone()) {
            course.id = Uuid::new_v4().to_string();
            seen.insert(course.id.clone());
            repaired += 1;
        }
    }
    repaired
}
