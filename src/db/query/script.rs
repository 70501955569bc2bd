use super::{ExecutionUnit, QueryExecutor, Segmentation, UnitKind};

const LINE_COMMENT: &str = "--";
const BLOCK_TERMINATOR: &str = "/";
const STATEMENT_TERMINATOR: char = ';';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum AssemblerState {
    #[default]
    Idle,
    BufferingSimple,
    BufferingBlock,
}

#[derive(Default)]
struct StatementBuilder {
    state: AssemblerState,
    buffer: Vec<String>,
    units: Vec<ExecutionUnit>,
}

impl StatementBuilder {
    fn new() -> Self {
        Self::default()
    }

    fn in_block(&self) -> bool {
        self.state == AssemblerState::BufferingBlock
    }

    fn process_line(&mut self, line: &str) {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with(LINE_COMMENT) {
            return;
        }

        // Only the first line of a fresh buffer can open a block.
        if self.buffer.is_empty() && QueryExecutor::starts_procedural_block(trimmed) {
            self.state = AssemblerState::BufferingBlock;
        }

        if trimmed == BLOCK_TERMINATOR {
            if !self.buffer.is_empty() {
                let sql = self.buffer.join("\n");
                self.units.push(ExecutionUnit::new(sql, UnitKind::Block));
                self.reset();
            }
            return;
        }

        self.buffer.push(line.trim_end().to_string());
        if self.state == AssemblerState::Idle {
            self.state = AssemblerState::BufferingSimple;
        }

        if !self.in_block() && trimmed.ends_with(STATEMENT_TERMINATOR) {
            self.flush_simple(UnitKind::Simple);
        }
    }

    fn flush_simple(&mut self, kind: UnitKind) {
        let joined = self.buffer.join("\n");
        let sql = QueryExecutor::strip_statement_terminator(joined.trim());
        self.units.push(ExecutionUnit::new(sql, kind));
        self.reset();
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.state = AssemblerState::Idle;
    }

    fn finalize(mut self) -> Segmentation {
        let mut dropped_block = None;
        if !self.buffer.is_empty() {
            if self.in_block() {
                dropped_block = Some(self.buffer.join("\n"));
                self.reset();
            } else {
                self.flush_simple(UnitKind::Remainder);
            }
        }
        Segmentation {
            units: self.units,
            dropped_block,
        }
    }
}

impl QueryExecutor {
    /// Split script lines into execution units in file order.
    ///
    /// Statements end on a line whose trimmed text ends with `;`. A first
    /// buffered line starting with `BEGIN` or `DECLARE` switches to block
    /// mode, which only a standalone `/` ends. A block still open at end of
    /// input is reported in [`Segmentation::dropped_block`] and not returned
    /// as a unit.
    pub fn segment<I, S>(lines: I) -> Segmentation
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = StatementBuilder::new();
        for line in lines {
            builder.process_line(line.as_ref());
        }
        builder.finalize()
    }

    pub fn segment_script(text: &str) -> Segmentation {
        Self::segment(text.lines())
    }

    pub fn starts_procedural_block(trimmed_line: &str) -> bool {
        let upper = trimmed_line.to_uppercase();
        upper.starts_with("BEGIN") || upper.starts_with("DECLARE")
    }

    /// Remove one trailing `;`. Oracle rejects it on plain SQL (ORA-00911).
    pub fn strip_statement_terminator(sql: &str) -> String {
        sql.strip_suffix(STATEMENT_TERMINATOR)
            .unwrap_or(sql)
            .to_string()
    }
}
