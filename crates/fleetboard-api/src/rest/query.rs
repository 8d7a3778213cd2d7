// Query-string builder for PostgREST reads.
//
// Filters use the `column=op.value` form, ordering the
// `order=col.asc.nullsfirst,col2.desc` form.

use std::fmt;

/// One `order=` term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub descending: bool,
    pub nulls_first: bool,
}

impl Order {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: false,
            nulls_first: false,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            descending: true,
            ..Self::asc(column)
        }
    }

    pub fn nulls_first(mut self) -> Self {
        self.nulls_first = true;
        self
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = if self.descending { "desc" } else { "asc" };
        write!(f, "{}.{dir}", self.column)?;
        if self.nulls_first {
            f.write_str(".nullsfirst")?;
        }
        Ok(())
    }
}

/// A `SELECT` against one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectQuery {
    columns: String,
    filters: Vec<(String, String)>,
    order: Vec<Order>,
    limit: Option<usize>,
}

impl Default for SelectQuery {
    fn default() -> Self {
        Self {
            columns: "*".into(),
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
        }
    }
}

impl SelectQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn columns(mut self, columns: impl Into<String>) -> Self {
        self.columns = columns.into();
        self
    }

    /// `column=eq.value`
    pub fn eq(mut self, column: impl Into<String>, value: impl fmt::Display) -> Self {
        self.filters.push((column.into(), format!("eq.{value}")));
        self
    }

    pub fn order(mut self, order: Order) -> Self {
        self.order.push(order);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Render as query parameters, in a stable order.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_owned(), self.columns.clone())];
        params.extend(self.filters.iter().cloned());
        if !self.order.is_empty() {
            let order = self
                .order
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(",");
            params.push(("order".to_owned(), order));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_owned(), limit.to_string()));
        }
        params
    }
}
