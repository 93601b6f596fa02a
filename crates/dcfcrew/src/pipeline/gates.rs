//! Halt decisions read from free-form agent text.

use std::sync::LazyLock;

use regex::Regex;

static RE_COMPANY_STATUS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Company Status\s*[:\-]\s*\[?(?P<status>[A-Za-z \-/]+)\]?")
        .expect("company status regex is valid")
});

/// Status tokens that stop the pipeline after the existence check.
const NEGATIVE_STATUSES: [&str; 4] = ["does not exist", "nonexistent", "does-not-exist", "uncertain"];

/// Outcome of reading the existence-validation output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExistenceCheck {
    /// A status line was found and it is one of the halting values.
    Negative(String),
    /// A status line was found with any other value.
    Passed(String),
    /// No status line could be found. The pipeline continues.
    Unparsed,
}

impl ExistenceCheck {
    pub fn halts(&self) -> bool {
        matches!(self, ExistenceCheck::Negative(_))
    }
}

/// Reads the `Company Status: ...` line from the existence-validation output.
pub fn assess_existence(text: &str) -> ExistenceCheck {
    let Some(status) = RE_COMPANY_STATUS
        .captures(text)
        .and_then(|caps| caps.name("status"))
        .map(|m| m.as_str().trim().to_lowercase())
    else {
        return ExistenceCheck::Unparsed;
    };

    if NEGATIVE_STATUSES.contains(&status.as_str()) {
        ExistenceCheck::Negative(status)
    } else {
        ExistenceCheck::Passed(status)
    }
}

/// Outcome of reading the realism-audit output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditVerdict {
    Rejected,
    Accepted,
}

/// Any case-insensitive occurrence of `rejected` counts as a rejection,
/// including mentions such as "not rejected".
pub fn assess_audit(text: &str) -> AuditVerdict {
    if text.to_lowercase().contains("rejected") {
        AuditVerdict::Rejected
    } else {
        AuditVerdict::Accepted
    }
}
