//! Positioned cursors: ordinal-addressed parameter sinks and result rows.
//!
//! The compiler never talks to a driver. Execution layers adapt their
//! prepared statements and result sets to these two traits; the in-memory
//! [`ParameterBuffer`] and [`ResultRow`] are used by tests and by callers
//! that want to inspect what a statement would bind.

use crate::ast::Value;
use crate::error::{RelqError, RelqResult};

/// A parameter sink addressed by ordinal position. Every call binds the
/// next position.
pub trait PositionedParameters {
    /// Number of parameters bound so far.
    fn position(&self) -> usize;

    fn set_next(&mut self, value: Value);

    /// Bind SQL NULL, typed by a JDBC-style type code.
    fn set_null(&mut self, sql_type: i32);
}

/// A result row read (and optionally updated) column by column.
pub trait PositionedResult {
    /// Index of the next column to be read.
    fn position(&self) -> usize;

    /// Number of columns in the row.
    fn width(&self) -> usize;

    /// Read the column at `position()` and advance. SQL NULL reads as
    /// [`Value::Null`].
    fn next_cell(&mut self) -> RelqResult<Value>;

    /// Overwrite the column at `position()` and advance.
    fn update_cell(&mut self, value: Value) -> RelqResult<()>;

    /// Move back to the first column.
    fn rewind(&mut self);
}

impl<T: PositionedResult + ?Sized> PositionedResult for &mut T {
    fn position(&self) -> usize {
        (**self).position()
    }

    fn width(&self) -> usize {
        (**self).width()
    }

    fn next_cell(&mut self) -> RelqResult<Value> {
        (**self).next_cell()
    }

    fn update_cell(&mut self, value: Value) -> RelqResult<()> {
        (**self).update_cell(value)
    }

    fn rewind(&mut self) {
        (**self).rewind()
    }
}

/// One bound parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundParameter {
    Value(Value),
    Null(i32),
}

impl BoundParameter {
    pub fn is_null(&self) -> bool {
        match self {
            BoundParameter::Value(v) => v.is_null(),
            BoundParameter::Null(_) => true,
        }
    }
}

/// In-memory parameter sink.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterBuffer {
    params: Vec<BoundParameter>,
}

impl ParameterBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn params(&self) -> &[BoundParameter] {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn null_count(&self) -> usize {
        self.params.iter().filter(|p| p.is_null()).count()
    }

    /// Turn the bound parameters into a readable row, NULLs as [`Value::Null`].
    pub fn into_row(self) -> ResultRow {
        let cells = self
            .params
            .into_iter()
            .map(|p| match p {
                BoundParameter::Value(v) => v,
                BoundParameter::Null(_) => Value::Null,
            })
            .collect();
        ResultRow::new(cells)
    }
}

impl PositionedParameters for ParameterBuffer {
    fn position(&self) -> usize {
        self.params.len()
    }

    fn set_next(&mut self, value: Value) {
        self.params.push(BoundParameter::Value(value));
    }

    fn set_null(&mut self, sql_type: i32) {
        self.params.push(BoundParameter::Null(sql_type));
    }
}

/// In-memory updatable result row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultRow {
    cells: Vec<Value>,
    pos: usize,
}

impl ResultRow {
    pub fn new(cells: Vec<Value>) -> Self {
        Self { cells, pos: 0 }
    }

    pub fn cells(&self) -> &[Value] {
        &self.cells
    }

    pub fn into_cells(self) -> Vec<Value> {
        self.cells
    }

    fn overrun(&self) -> RelqError {
        RelqError::LinearizationArityMismatch {
            expected: self.pos + 1,
            got: self.cells.len(),
        }
    }
}

impl PositionedResult for ResultRow {
    fn position(&self) -> usize {
        self.pos
    }

    fn width(&self) -> usize {
        self.cells.len()
    }

    fn next_cell(&mut self) -> RelqResult<Value> {
        let cell = self.cells.get(self.pos).cloned().ok_or_else(|| self.overrun())?;
        self.pos += 1;
        Ok(cell)
    }

    fn update_cell(&mut self, value: Value) -> RelqResult<()> {
        if self.pos >= self.cells.len() {
            return Err(self.overrun());
        }
        self.cells[self.pos] = value;
        self.pos += 1;
        Ok(())
    }

    fn rewind(&mut self) {
        self.pos = 0;
    }
}
