//! Askama template definitions for the portal.

use askama::Template;
use hd_core::{AuditEntry, SessionData, Student, Ticket};

// ============================================
// Navigation
// ============================================

/// Signed-in staff member shown in the header.
#[derive(Clone)]
pub struct StaffNav {
    pub username: String,
    pub role: String,
    pub landing: String,
}

impl From<&SessionData> for StaffNav {
    fn from(data: &SessionData) -> Self {
        Self {
            username: data.username.clone(),
            role: data.role.to_string(),
            landing: data.role.landing_path().to_string(),
        }
    }
}

// ============================================
// Public pages
// ============================================

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub staff: Option<StaffNav>,
    pub login_csrf: String,
    pub login_error: Option<String>,
    pub ticket_message: Option<String>,
    pub ticket_error: Option<String>,
}

#[derive(Template)]
#[template(path = "search.html")]
pub struct SearchTemplate {
    pub staff: Option<StaffNav>,
    pub query: String,
    pub results: Vec<TicketRow>,
    pub error: Option<String>,
}

// ============================================
// Staff pages
// ============================================

/// Row count of one table on the admin landing page.
pub struct TableCount {
    pub table: String,
    pub rows: i64,
}

#[derive(Template)]
#[template(path = "admin/landing.html")]
pub struct AdminLandingTemplate {
    pub staff: Option<StaffNav>,
    pub counts: Vec<TableCount>,
}

#[derive(Template)]
#[template(path = "admin/students.html")]
pub struct StudentsTemplate {
    pub staff: Option<StaffNav>,
    pub students: Vec<Student>,
}

#[derive(Template)]
#[template(path = "admin/audit.html")]
pub struct AuditTemplate {
    pub staff: Option<StaffNav>,
    pub entries: Vec<AuditRow>,
}

#[derive(Template)]
#[template(path = "support/landing.html")]
pub struct SupportLandingTemplate {
    pub staff: Option<StaffNav>,
    pub tickets: Vec<TicketRow>,
}

#[derive(Template)]
#[template(path = "tickets/list.html")]
pub struct TicketsTemplate {
    pub staff: Option<StaffNav>,
    pub csrf_token: String,
    pub filter: String,
    pub tickets: Vec<TicketRow>,
}

// ============================================
// Row view models
// ============================================

pub struct TicketRow {
    pub id: i64,
    pub student_id: i64,
    pub issue: String,
    pub status: String,
    pub toggle_to: String,
    pub created_at: String,
}

impl From<Ticket> for TicketRow {
    fn from(ticket: Ticket) -> Self {
        Self {
            id: ticket.id,
            student_id: ticket.student_id,
            issue: ticket.issue,
            status: ticket.status.to_string(),
            toggle_to: ticket.status.toggled().to_string(),
            created_at: ticket.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

pub struct AuditRow {
    pub actor: String,
    pub event: String,
    pub detail: String,
    pub created_at: String,
}

impl From<AuditEntry> for AuditRow {
    fn from(entry: AuditEntry) -> Self {
        Self {
            actor: entry.actor,
            event: entry.event.to_string(),
            detail: entry.detail.unwrap_or_default(),
            created_at: entry.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}
