//! Admin pages: table overview, student roster and audit log.

use axum::{extract::State, routing::get, Router};
use hd_core::db::{create_audit_repository, create_student_repository, Table};

use crate::auth::RequireAdmin;
use crate::error::ApiError;
use crate::state::AppState;
use crate::web::{
    AdminLandingTemplate, AuditRow, AuditTemplate, HtmlTemplate, StaffNav, StudentsTemplate,
    TableCount,
};

/// Entries shown on the audit page.
const AUDIT_PAGE_SIZE: u32 = 100;

/// Creates the admin routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(landing))
        .route("/students", get(students))
        .route("/audit", get(audit_log))
}

/// Admin landing page with the row count of every table.
async fn landing(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
) -> Result<HtmlTemplate<AdminLandingTemplate>, ApiError> {
    let mut counts = Vec::with_capacity(Table::ALL.len());
    for table in Table::ALL {
        counts.push(TableCount {
            table: table.to_string(),
            rows: state.db.count_rows(table).await?,
        });
    }

    Ok(HtmlTemplate(AdminLandingTemplate {
        staff: Some(StaffNav::from(&user)),
        counts,
    }))
}

async fn students(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
) -> Result<HtmlTemplate<StudentsTemplate>, ApiError> {
    let students = create_student_repository(&state.db).list().await?;

    Ok(HtmlTemplate(StudentsTemplate {
        staff: Some(StaffNav::from(&user)),
        students,
    }))
}

async fn audit_log(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
) -> Result<HtmlTemplate<AuditTemplate>, ApiError> {
    let entries = create_audit_repository(&state.db)
        .recent(AUDIT_PAGE_SIZE)
        .await?
        .into_iter()
        .map(AuditRow::from)
        .collect();

    Ok(HtmlTemplate(AuditTemplate {
        staff: Some(StaffNav::from(&user)),
        entries,
    }))
}
