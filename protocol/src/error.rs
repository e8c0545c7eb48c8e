//! Validation failures for inbound rows and caller-supplied inputs.

use thiserror::Error;

/// A record or input failed schema validation.
///
/// Collects every failing constraint so the caller can surface one message
/// assembled from all of them, newline-joined.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .issues.join("\n"))]
pub struct ValidationError {
    issues: Vec<String>,
}

impl ValidationError {
    pub fn new(issue: impl Into<String>) -> Self {
        Self {
            issues: vec![issue.into()],
        }
    }

    pub fn empty() -> Self {
        Self { issues: Vec::new() }
    }

    pub fn push(&mut self, issue: impl Into<String>) {
        self.issues.push(issue.into());
    }

    pub fn issues(&self) -> &[String] {
        &self.issues
    }

    /// `Ok(())` when no issue was recorded, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), Self> {
        if self.issues.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}
