//! Multi-key stable sorting.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::types::Row;

/// Sort direction for one [`OrderSpec`].
///
/// `asc` / `desc` are also accepted upper- or title-cased. Anything else deserializes to
/// [`SortDirection::Unknown`], which sorts ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    #[serde(alias = "ASC", alias = "Asc")]
    Asc,
    #[serde(alias = "DESC", alias = "Desc")]
    Desc,
    #[serde(other)]
    Unknown,
}

/// One sort key: a column and a direction.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderSpec {
    pub column: String,
    pub direction: SortDirection,
}

impl OrderSpec {
    /// Ascending sort on `column`.
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Asc,
        }
    }

    /// Descending sort on `column`.
    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Desc,
        }
    }

    fn compare(&self, a: &Row, b: &Row) -> Ordering {
        let ord = a.value(&self.column).sort_cmp(b.value(&self.column));
        match self.direction {
            SortDirection::Asc | SortDirection::Unknown => ord,
            SortDirection::Desc => ord.reverse(),
        }
    }
}

/// Sort `rows` in place by `order_by`, evaluated as a lexicographic key in array order.
///
/// The sort is stable: rows that tie on every key keep their input order. Values are compared
/// with [`crate::types::Value::sort_cmp`].
pub fn sort_rows(rows: &mut [Row], order_by: &[OrderSpec]) {
    if order_by.is_empty() {
        return;
    }
    rows.sort_by(|a, b| {
        order_by
            .iter()
            .map(|spec| spec.compare(a, b))
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal)
    });
}
