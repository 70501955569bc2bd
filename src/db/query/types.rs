#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    /// Ended by a line-final `;`, which is stripped before submission.
    Simple,
    /// Ended by a standalone `/`; submitted verbatim.
    Block,
    /// Whatever was left in the buffer at end of input.
    Remainder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionUnit {
    pub sql: String,
    pub kind: UnitKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segmentation {
    pub units: Vec<ExecutionUnit>,
    /// Lines of a `BEGIN`/`DECLARE` block that never saw its `/`.
    /// They are not submitted.
    pub dropped_block: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub message: String,
    pub success: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScriptSummary {
    pub submitted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub read_error: bool,
}

impl ExecutionUnit {
    pub fn new(sql: impl Into<String>, kind: UnitKind) -> Self {
        Self {
            sql: sql.into(),
            kind,
        }
    }

    pub fn is_block(&self) -> bool {
        self.kind == UnitKind::Block
    }
}

impl LogEntry {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: true,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: false,
        }
    }
}

impl ScriptSummary {
    pub fn all_succeeded(&self) -> bool {
        !self.read_error && self.failed == 0
    }
}
