//! Typed filter expressions.
//!
//! Filters are built as a small tree and rendered to the store's textual filter
//! syntax (`field = "value" && (id = "a" || id = "b")`) only at the edge.

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, String),
    Gte(String, String),
    Lte(String, String),
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(field: &str, value: impl Into<String>) -> Self {
        Filter::Eq(field.to_string(), value.into())
    }

    pub fn gte(field: &str, value: impl Into<String>) -> Self {
        Filter::Gte(field.to_string(), value.into())
    }

    pub fn lte(field: &str, value: impl Into<String>) -> Self {
        Filter::Lte(field.to_string(), value.into())
    }

    /// `field = id1 || field = id2 || ...`, skipping blank ids.
    /// Returns `None` when nothing is left to match.
    pub fn any_of(field: &str, values: &[String]) -> Option<Self> {
        let mut conds: Vec<Filter> = values
            .iter()
            .filter(|v| !v.trim().is_empty())
            .map(|v| Filter::eq(field, v.as_str()))
            .collect();

        match conds.len() {
            0 => None,
            1 => conds.pop(),
            _ => Some(Filter::Or(conds)),
        }
    }

    /// Render to the store's filter syntax.
    pub fn to_expression(&self) -> String {
        match self {
            Filter::Eq(field, value) => format!(r#"{} = "{}""#, field, escape_filter_value(value)),
            Filter::Gte(field, value) => {
                format!(r#"{} >= "{}""#, field, escape_filter_value(value))
            }
            Filter::Lte(field, value) => {
                format!(r#"{} <= "{}""#, field, escape_filter_value(value))
            }
            Filter::And(parts) => parts
                .iter()
                .map(|part| match part {
                    Filter::And(_) => format!("({})", part.to_expression()),
                    _ => part.to_expression(),
                })
                .collect::<Vec<_>>()
                .join(" && "),
            Filter::Or(parts) => match parts.len() {
                0 => String::new(),
                1 => parts[0].to_expression(),
                _ => format!(
                    "({})",
                    parts
                        .iter()
                        .map(Filter::to_expression)
                        .collect::<Vec<_>>()
                        .join(" || ")
                ),
            },
        }
    }
}

/// Escape double quotes so a value cannot terminate its string literal.
pub fn escape_filter_value(value: &str) -> String {
    value.replace('"', r#"\""#)
}
