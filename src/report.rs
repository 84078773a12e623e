//! Batch report types for import and export runs.
//!
//! Per-item failures in a batch never abort the batch. They are collected
//! here and shown to the user afterwards, the same way the status line
//! reports single-edit rejections.

use serde::Serialize;
use std::fmt;

/// A report generated by one batch operation (export, crop export, import).
#[derive(Clone, Debug, Default, Serialize)]
pub struct Report {
    /// Operation name, e.g. `"export"` or `"import"`.
    pub operation: String,
    /// Number of output files produced, or input files applied.
    pub processed: usize,
    /// Issues discovered while running.
    pub issues: Vec<Issue>,
}

impl Report {
    /// Create a new empty report for an operation.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            ..Default::default()
        }
    }

    /// Add an issue to the report and forward it to the log.
    pub fn add(&mut self, issue: Issue) {
        match issue.severity {
            Severity::Warning => log::warn!("{}: {}", self.operation, issue.message),
            Severity::Info => log::info!("{}: {}", self.operation, issue.message),
        }
        self.issues.push(issue);
    }

    /// Shorthand for adding a warning.
    pub fn warn(&mut self, code: IssueCode, message: impl Into<String>) {
        self.add(Issue::warning(code, message));
    }

    /// Shorthand for adding an info note.
    pub fn note(&mut self, code: IssueCode, message: impl Into<String>) {
        self.add(Issue::info(code, message));
    }

    /// Count of warning-level issues (skipped items).
    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }

    /// Count of info-level issues.
    pub fn info_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Info)
            .count()
    }

    /// Number of issues carrying the given code.
    pub fn count_of(&self, code: IssueCode) -> usize {
        self.issues.iter().filter(|i| i.code == code).count()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  {}: {} item(s) processed", self.operation, self.processed)?;

        let warnings = self.warning_count();
        if warnings > 0 {
            writeln!(f)?;
            writeln!(f, "Warnings ({}):", warnings)?;
            for issue in self
                .issues
                .iter()
                .filter(|i| i.severity == Severity::Warning)
            {
                writeln!(f, "  - {}", issue.message)?;
            }
        }

        let infos = self.info_count();
        if infos > 0 {
            writeln!(f)?;
            writeln!(f, "Notes ({}):", infos)?;
            for issue in self.issues.iter().filter(|i| i.severity == Severity::Info) {
                writeln!(f, "  - {}", issue.message)?;
            }
        }

        Ok(())
    }
}

/// A single issue discovered during a batch operation.
#[derive(Clone, Debug, Serialize)]
pub struct Issue {
    pub severity: Severity,
    pub code: IssueCode,
    pub message: String,
}

impl Issue {
    /// Create a warning-level issue (an item was skipped).
    pub fn warning(code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }

    /// Create an info-level issue (a note that does not indicate loss).
    pub fn info(code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            code,
            message: message.into(),
        }
    }
}

/// Severity level for batch issues.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Info,
}

/// Stable issue codes for programmatic consumption.
///
/// These codes are part of the JSON output and should remain stable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    // Export
    /// A box label is missing from the ordered class list.
    UnknownClass,
    /// Image dimensions are zero or were never recorded.
    InvalidDimensions,
    /// Every YOLO line of an image was rejected; no label file written.
    NoYoloLines,
    /// A box collapsed after integer rounding and was left out of the VOC file.
    DegenerateVocBox,
    /// A crop had zero rounded width or height.
    DegenerateCrop,
    /// A crop could not be encoded in the requested format.
    CropEncodeFailure,

    // Import
    /// The file is not an `.xml` file.
    NotXml,
    /// The file could not be read or parsed.
    DecodeFailure,
    /// An `<object>` lacked a name or numeric bounds.
    MalformedObject,
    /// No loaded image matched the XML file.
    UnmatchedImage,
    /// The label already exists on the target image.
    DuplicateLabelExisting,
    /// The label appeared earlier in the same file.
    DuplicateLabelInFile,
    /// New class names were registered.
    ClassesDiscovered,
}
