use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    NotInitialized,
    NoActiveProject,
    ProjectNotFound,
    TaskNotFound,
    TradeNotFound,
    AmbiguousRef,
    ProjectNameConflict,
    AnalysisInProgress,
    ValidationError,
    DatabaseError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::NoActiveProject => "NO_ACTIVE_PROJECT",
            Self::ProjectNotFound => "PROJECT_NOT_FOUND",
            Self::TaskNotFound => "TASK_NOT_FOUND",
            Self::TradeNotFound => "TRADE_NOT_FOUND",
            Self::AmbiguousRef => "AMBIGUOUS_REF",
            Self::ProjectNameConflict => "PROJECT_NAME_CONFLICT",
            Self::AnalysisInProgress => "ANALYSIS_IN_PROGRESS",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::DatabaseError => "DATABASE_ERROR",
        }
    }
}

#[derive(Debug, Error)]
#[error("{message}")]
pub struct CoordError {
    pub code: ErrorCode,
    pub message: String,
}

impl CoordError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn not_initialized() -> Self {
        Self::new(
            ErrorCode::NotInitialized,
            "coordai is not initialized. Run `coordai init` first.",
        )
    }

    pub fn no_active_project() -> Self {
        Self::new(
            ErrorCode::NoActiveProject,
            "No active project. Use `coordai project activate <name>` or `--project <name>`.",
        )
    }

    pub fn project_not_found(reference: &str) -> Self {
        Self::new(
            ErrorCode::ProjectNotFound,
            format!("Project not found: {reference}"),
        )
    }

    pub fn task_not_found(reference: &str) -> Self {
        Self::new(ErrorCode::TaskNotFound, format!("Task not found: {reference}"))
    }

    pub fn trade_not_found(reference: &str) -> Self {
        Self::new(
            ErrorCode::TradeNotFound,
            format!("Trade not found: {reference}"),
        )
    }

    pub fn ambiguous_ref(reference: &str, candidates: &[String]) -> Self {
        Self::new(
            ErrorCode::AmbiguousRef,
            format!(
                "Ambiguous reference '{}'. Candidates: {}",
                reference,
                candidates.join(", ")
            ),
        )
    }

    pub fn project_name_conflict(name: &str) -> Self {
        Self::new(
            ErrorCode::ProjectNameConflict,
            format!("Project with name '{name}' already exists"),
        )
    }

    pub fn analysis_in_progress(project_id: &str) -> Self {
        Self::new(
            ErrorCode::AnalysisInProgress,
            format!("Another analysis run is in progress for project {project_id}"),
        )
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }
}

impl From<rusqlite::Error> for CoordError {
    fn from(e: rusqlite::Error) -> Self {
        Self::database(e.to_string())
    }
}

impl From<serde_json::Error> for CoordError {
    fn from(e: serde_json::Error) -> Self {
        Self::validation(format!("Invalid JSON: {e}"))
    }
}
