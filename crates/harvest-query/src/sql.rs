//! SQL generation for the in-memory engine
//!
//! Produces parameterized SQL with `%s` placeholders; values never appear
//! in the SQL text.

use crate::engine::CompiledQuery;
use crate::planner::{Comparison, Condition, Filter};
use serde_json::Value;

/// Compiles bound filters against one table
pub struct SqlCompiler<'a> {
    table: &'a str,
    params: Vec<Value>,
}

impl<'a> SqlCompiler<'a> {
    pub fn new(table: &'a str) -> Self {
        Self {
            table,
            params: Vec::new(),
        }
    }

    /// Compile `SELECT <column> FROM <table> WHERE <filter>`
    pub fn compile(mut self, column: &str, filter: &Filter) -> CompiledQuery {
        let condition = self.filter(filter);
        let sql = format!(
            "SELECT {} FROM {} WHERE {}",
            self.column(column),
            quote(self.table),
            condition
        );

        CompiledQuery {
            sql,
            params: self.params,
        }
    }

    fn column(&self, column: &str) -> String {
        format!("{}.{}", quote(self.table), quote(column))
    }

    fn filter(&mut self, filter: &Filter) -> String {
        match filter {
            Filter::And(children) => self.join(children, " AND ", "1=1"),
            Filter::Or(children) => self.join(children, " OR ", "1=0"),
            Filter::Condition(condition) => self.condition(condition),
        }
    }

    fn join(&mut self, children: &[Filter], separator: &str, empty: &str) -> String {
        match children {
            [] => empty.to_string(),
            [only] => self.filter(only),
            _ => {
                let parts: Vec<String> = children.iter().map(|c| self.filter(c)).collect();
                format!("({})", parts.join(separator))
            }
        }
    }

    fn condition(&mut self, condition: &Condition) -> String {
        let column = self.column(&condition.column);

        let sql = match &condition.comparison {
            Comparison::Exact(v) => format!("{} = {}", column, self.bind(v)),
            Comparison::Gt(v) => format!("{} > {}", column, self.bind(v)),
            Comparison::Gte(v) => format!("{} >= {}", column, self.bind(v)),
            Comparison::Lt(v) => format!("{} < {}", column, self.bind(v)),
            Comparison::Lte(v) => format!("{} <= {}", column, self.bind(v)),
            Comparison::Range(lower, upper) => {
                let lower = self.bind(lower);
                let upper = self.bind(upper);
                format!("{} BETWEEN {} AND {}", column, lower, upper)
            }
            Comparison::In(items) => {
                let placeholders: Vec<&str> = items.iter().map(|v| self.bind(v)).collect();
                format!("{} IN ({})", column, placeholders.join(", "))
            }
        };

        if condition.negated {
            format!("NOT ({})", sql)
        } else {
            sql
        }
    }

    fn bind(&mut self, value: &Value) -> &'static str {
        self.params.push(value.clone());
        "%s"
    }
}

fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}
