use std::fmt;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AbError {
    #[error("unknown current column {0:?}")]
    UnknownColumn(String),

    #[error("already in {edge} column {column:?}")]
    BoundaryReached { column: String, edge: Edge },

    #[error("unrecognized query JSON shape; cannot find work item ids")]
    UnrecognizedShape,

    #[error("cancelled")]
    Cancelled,

    #[error("{command} failed: {cause}{}", stderr_suffix(.stderr))]
    Execution {
        command: String,
        cause: String,
        stderr: String,
    },

    #[error("kanban column field not found on work item {0}")]
    MissingKanbanColumn(u64),

    #[error("unable to inspect work item {0}")]
    Uninspectable(u64),

    #[error("parent {0} is not a User Story")]
    InvalidParent(u64),

    #[error("created {kind} {id} but failed to add parent relation to {parent}")]
    RelationFailed {
        kind: String,
        id: u64,
        parent: u64,
        source: Box<AbError>,
    },

    #[error("invalid severity {0:?} (use 1,2,3,4)")]
    InvalidSeverity(String),

    #[error(
        "az devops default project not set; run 'az devops configure --defaults project=<name> organization=<url>'"
    )]
    NoDefaultProject,

    #[error("unable to resolve default team for project {0:?}")]
    NoDefaultTeam(String),

    #[error("no board columns found for type {0:?}; ensure the default team board includes this type")]
    NoBoardColumns(String),

    #[error("invalid confirm mode: {0:?} (valid: always|mutations|never)")]
    InvalidConfirmMode(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AbError {
    /// A declined or interrupted confirmation. Callers treat it as an
    /// intentional abort rather than a failure to report.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AbError::Cancelled)
    }
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {trimmed}")
    }
}

/// Which end of a column sequence a move ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    First,
    Last,
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edge::First => write!(f, "first"),
            Edge::Last => write!(f, "last"),
        }
    }
}
