use crate::models::{AttachmentKind, Role};

/// Fields a filter can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Role,
    Attachment,
    Serial,
}

impl FilterField {
    pub fn name(self) -> &'static str {
        match self {
            FilterField::Role => "role",
            FilterField::Attachment => "attachment",
            FilterField::Serial => "serial",
        }
    }
}

/// Logical operators for combining filters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    /// Both conditions must match (default between different fields)
    And,
    /// Either condition matches (default within same field)
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentMatch {
    Kind(AttachmentKind),
    /// Any attachment other than none.
    Any,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialMatch {
    Exact(u32),
    /// Inclusive on both ends.
    Range(u32, u32),
}

impl SerialMatch {
    pub fn contains(self, serial: u32) -> bool {
        match self {
            SerialMatch::Exact(n) => serial == n,
            SerialMatch::Range(lo, hi) => (lo..=hi).contains(&serial),
        }
    }
}

/// Single field:value filter, already validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldFilter {
    Role(Role),
    Attachment(AttachmentMatch),
    Serial(SerialMatch),
}

impl FieldFilter {
    pub fn field(&self) -> FilterField {
        match self {
            FieldFilter::Role(_) => FilterField::Role,
            FieldFilter::Attachment(_) => FilterField::Attachment,
            FieldFilter::Serial(_) => FilterField::Serial,
        }
    }
}

/// Filter expression combining multiple field filters with operators
///
/// No parentheses: operators apply left to right.
/// - Same-field filters are OR'd together: role:user role:assistant → (user OR assistant)
/// - Cross-field filters are AND'd together: role:user attachment:pdf → (user AND pdf)
/// - Explicit operators override defaults
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterExpr {
    pub filters: Vec<FieldFilter>,
    pub operators: Vec<FilterOperator>,
}

impl FilterExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_filter(&mut self, filter: FieldFilter) {
        self.filters.push(filter);
    }

    pub fn add_operator(&mut self, operator: FilterOperator) {
        self.operators.push(operator);
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}
