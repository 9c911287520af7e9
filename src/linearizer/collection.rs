use super::{check_width, Datum, RecordLinearizer};
use crate::ast::Node;
use crate::cursor::PositionedResult;
use crate::error::RelqResult;
use crate::transpiler::Dialect;
use std::sync::Arc;

/// How repeated rows are collected into one value.
pub trait CollectionBuilder: Send + Sync + std::fmt::Debug {
    fn begin(&self) -> Vec<Datum> {
        Vec::new()
    }

    fn accumulate(&self, acc: &mut Vec<Datum>, element: Datum);

    fn finish(&self, acc: Vec<Datum>) -> Datum {
        Datum::Collection(acc)
    }
}

/// Keeps every row in arrival order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListBuilder;

impl CollectionBuilder for ListBuilder {
    fn accumulate(&self, acc: &mut Vec<Datum>, element: Datum) {
        acc.push(element);
    }
}

/// Keeps the first occurrence of each distinct element.
#[derive(Debug, Clone, Copy, Default)]
pub struct DistinctBuilder;

impl CollectionBuilder for DistinctBuilder {
    fn accumulate(&self, acc: &mut Vec<Datum>, element: Datum) {
        if !acc.contains(&element) {
            acc.push(element);
        }
    }
}

/// An element linearizer plus a collection strategy.
///
/// The statement is built for the element's columns only; the collection
/// exists purely on the reading side.
#[derive(Debug, Clone)]
pub struct CollectionLinearizer {
    element: Arc<dyn RecordLinearizer>,
    builder: Arc<dyn CollectionBuilder>,
}

impl CollectionLinearizer {
    pub fn new(element: Arc<dyn RecordLinearizer>, builder: Arc<dyn CollectionBuilder>) -> Self {
        Self { element, builder }
    }

    pub fn list(element: Arc<dyn RecordLinearizer>) -> Self {
        Self::new(element, Arc::new(ListBuilder))
    }

    pub fn distinct(element: Arc<dyn RecordLinearizer>) -> Self {
        Self::new(element, Arc::new(DistinctBuilder))
    }

    pub fn element(&self) -> &dyn RecordLinearizer {
        self.element.as_ref()
    }

    pub fn linearized_nodes(&self) -> Vec<Node> {
        self.element.linearized_nodes()
    }

    /// Read every row through the element linearizer and collect.
    pub fn materialize<R, I>(&self, dialect: &dyn Dialect, rows: I) -> RelqResult<Datum>
    where
        R: PositionedResult,
        I: IntoIterator<Item = R>,
    {
        let mut acc = self.builder.begin();
        for mut row in rows {
            check_width(self.element.as_ref(), row.width())?;
            let element = self.element.get_result(dialect, &mut row)?;
            self.builder.accumulate(&mut acc, element);
        }
        Ok(self.builder.finish(acc))
    }
}
