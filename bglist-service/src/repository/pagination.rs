//! Query descriptors handed to catalog repositories

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::catalog::{NameMatch, SortColumn};

/// Sort direction for ORDER BY clauses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OrderDirection {
    #[default]
    Ascending,
    Descending,
}

impl OrderDirection {
    /// Parse a validated `sortOrder` token (`ASC` / `DESC`, case-sensitive)
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "ASC" => Some(Self::Ascending),
            "DESC" => Some(Self::Descending),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Name filter with the resource's match policy baked in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameFilter {
    pub text: String,
    pub policy: NameMatch,
}

impl NameFilter {
    pub fn new(text: impl Into<String>, policy: NameMatch) -> Self {
        Self {
            text: text.into(),
            policy,
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        self.policy.matches(name, &self.text)
    }

    pub fn like_pattern(&self) -> String {
        self.policy.like_pattern(&self.text)
    }
}

/// One filtered, ordered page request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery<C: SortColumn> {
    pub filter: Option<NameFilter>,
    pub column: C,
    pub direction: OrderDirection,
    /// Records to skip (`pageIndex * pageSize`)
    pub offset: u64,
    /// Records to take (`pageSize`)
    pub limit: u64,
}

/// A materialized page plus the pre-paging match count
#[derive(Debug, Clone, PartialEq)]
pub struct Page<R> {
    pub items: Vec<R>,
    pub record_count: u64,
}
