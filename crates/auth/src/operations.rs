//! Operation table: logical operation id -> canonical resource url-path.
//!
//! The routing layer names every request with a stable operation id
//! (`courses.index`, `courses.update`, ...). Many ids share one resource; the
//! grant flags, not the table, discriminate between them.
//!
//! The table is declared as a flat list of `(url path, operation ids)` routes
//! and validated once at startup. It is a plain map: there is no ordering and
//! no fallthrough, and declaring the same operation id twice is an error even
//! when both declarations agree.

use std::collections::{BTreeMap, HashMap};

use thiserror::Error;

use crate::UrlPath;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OperationTableError {
    #[error("operation '{operation}' is declared for both '{first}' and '{second}'")]
    DuplicateOperation {
        operation: String,
        first: String,
        second: String,
    },

    #[error("empty operation id declared for '{url_path}'")]
    EmptyOperation { url_path: String },

    #[error("invalid url path '{url_path}': {reason}")]
    InvalidPath { url_path: String, reason: String },
}

/// Validated, immutable operation table.
#[derive(Debug, Clone, Default)]
pub struct OperationTable {
    by_operation: HashMap<String, UrlPath>,
}

impl OperationTable {
    pub fn builder() -> OperationTableBuilder {
        OperationTableBuilder::default()
    }

    /// The platform's own table (see [`PLATFORM_ROUTES`]).
    pub fn platform() -> Result<Self, OperationTableError> {
        PLATFORM_ROUTES
            .iter()
            .fold(Self::builder(), |b, (path, ops)| b.route(*path, ops.iter().copied()))
            .build()
    }

    pub fn path_for(&self, operation: &str) -> Option<&UrlPath> {
        self.by_operation.get(operation)
    }

    /// Every operation id mapped to `path`, sorted.
    pub fn operations_for(&self, path: &UrlPath) -> Vec<&str> {
        let mut ops: Vec<&str> = self
            .by_operation
            .iter()
            .filter(|(_, p)| *p == path)
            .map(|(op, _)| op.as_str())
            .collect();
        ops.sort_unstable();
        ops
    }

    /// Distinct target paths with their operations, in path order.
    pub fn routes(&self) -> BTreeMap<&UrlPath, Vec<&str>> {
        let mut out: BTreeMap<&UrlPath, Vec<&str>> = BTreeMap::new();
        for (op, path) in &self.by_operation {
            out.entry(path).or_default().push(op.as_str());
        }
        for ops in out.values_mut() {
            ops.sort_unstable();
        }
        out
    }

    pub fn len(&self) -> usize {
        self.by_operation.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_operation.is_empty()
    }
}

/// Collects routes; all validation happens in [`OperationTableBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct OperationTableBuilder {
    routes: Vec<(String, Vec<String>)>,
}

impl OperationTableBuilder {
    pub fn route<P, I, S>(mut self, url_path: P, operations: I) -> Self
    where
        P: Into<String>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.routes.push((
            url_path.into(),
            operations.into_iter().map(Into::into).collect(),
        ));
        self
    }

    pub fn build(self) -> Result<OperationTable, OperationTableError> {
        let mut by_operation: HashMap<String, UrlPath> = HashMap::new();

        for (raw_path, operations) in self.routes {
            let path = UrlPath::new(&raw_path).map_err(|e| OperationTableError::InvalidPath {
                url_path: raw_path.clone(),
                reason: e.to_string(),
            })?;

            for operation in operations {
                let operation = operation.trim().to_string();
                if operation.is_empty() {
                    return Err(OperationTableError::EmptyOperation {
                        url_path: path.to_string(),
                    });
                }
                if let Some(existing) = by_operation.get(&operation) {
                    return Err(OperationTableError::DuplicateOperation {
                        operation,
                        first: existing.to_string(),
                        second: path.to_string(),
                    });
                }
                by_operation.insert(operation, path.clone());
            }
        }

        Ok(OperationTable { by_operation })
    }
}

/// Hand-authored mapping for the platform's features.
///
/// Grouping nodes of the menu (`academic`, `crm`, ...) have no operations.
pub const PLATFORM_ROUTES: &[(&str, &[&str])] = &[
    ("dashboard", &["dashboard.index", "dashboard.widgets"]),
    (
        "academic/courses",
        &[
            "courses.index",
            "courses.show",
            "courses.create",
            "courses.store",
            "courses.edit",
            "courses.update",
            "courses.destroy",
            "courses.restore",
            "courses.export",
            "courses.syllabus.upload",
        ],
    ),
    (
        "academic/classes",
        &[
            "classes.index",
            "classes.show",
            "classes.store",
            "classes.update",
            "classes.destroy",
            "classes.restore",
            "classes.schedule",
            "classes.attendance.index",
            "classes.attendance.store",
        ],
    ),
    (
        "academic/enrollments",
        &[
            "enrollments.index",
            "enrollments.show",
            "enrollments.store",
            "enrollments.update",
            "enrollments.destroy",
            "enrollments.restore",
            "enrollments.cancel",
            "enrollments.transfer",
            "enrollments.export",
        ],
    ),
    (
        "academic/students",
        &[
            "students.index",
            "students.show",
            "students.store",
            "students.update",
            "students.destroy",
            "students.restore",
            "students.documents.index",
            "students.documents.upload",
            "students.documents.destroy",
        ],
    ),
    (
        "crm/leads",
        &[
            "leads.index",
            "leads.show",
            "leads.store",
            "leads.update",
            "leads.destroy",
            "leads.restore",
            "leads.convert",
            "leads.import",
        ],
    ),
    (
        "crm/clients",
        &[
            "clients.index",
            "clients.show",
            "clients.store",
            "clients.update",
            "clients.destroy",
            "clients.restore",
            "clients.notes.store",
            "clients.export",
        ],
    ),
    (
        "crm/contracts",
        &[
            "contracts.index",
            "contracts.show",
            "contracts.store",
            "contracts.update",
            "contracts.destroy",
            "contracts.restore",
            "contracts.sign",
            "contracts.pdf",
            "contracts.attachments.upload",
        ],
    ),
    (
        "financial/ledger",
        &[
            "ledger.index",
            "ledger.show",
            "ledger.entries.store",
            "ledger.entries.update",
            "ledger.entries.destroy",
            "ledger.entries.restore",
            "ledger.close_period",
            "ledger.export",
        ],
    ),
    (
        "financial/accounts",
        &[
            "accounts.index",
            "accounts.show",
            "accounts.store",
            "accounts.update",
            "accounts.destroy",
            "accounts.restore",
        ],
    ),
    (
        "financial/receivables",
        &[
            "receivables.index",
            "receivables.show",
            "receivables.store",
            "receivables.update",
            "receivables.destroy",
            "receivables.settle",
            "receivables.statements.upload",
        ],
    ),
    (
        "financial/payables",
        &[
            "payables.index",
            "payables.show",
            "payables.store",
            "payables.update",
            "payables.destroy",
            "payables.settle",
        ],
    ),
    (
        "integrations/insurance",
        &[
            "insurance.authorizations.index",
            "insurance.authorizations.show",
            "insurance.authorizations.request",
            "insurance.authorizations.cancel",
            "insurance.eligibility.check",
        ],
    ),
    (
        "integrations/clinical",
        &[
            "clinical.records.index",
            "clinical.records.show",
            "clinical.records.sync",
            "clinical.records.attachments.upload",
        ],
    ),
    (
        "reports/financial",
        &["reports.financial.index", "reports.financial.export"],
    ),
    (
        "reports/academic",
        &["reports.academic.index", "reports.academic.export"],
    ),
    (
        "admin/imports",
        &[
            "imports.index",
            "imports.show",
            "imports.upload",
            "imports.run",
            "imports.destroy",
        ],
    ),
    (
        "admin/email-templates",
        &[
            "email_templates.index",
            "email_templates.show",
            "email_templates.store",
            "email_templates.update",
            "email_templates.destroy",
            "email_templates.preview",
        ],
    ),
    (
        "admin/users",
        &[
            "users.index",
            "users.show",
            "users.store",
            "users.update",
            "users.destroy",
            "users.restore",
        ],
    ),
    (
        "admin/groups",
        &[
            "groups.index",
            "groups.show",
            "groups.store",
            "groups.update",
            "groups.destroy",
        ],
    ),
    (
        "admin/permissions",
        &["permissions.index", "permissions.update"],
    ),
    (
        "admin/menus",
        &[
            "menus.index",
            "menus.store",
            "menus.update",
            "menus.destroy",
            "menus.reorder",
        ],
    ),
];
