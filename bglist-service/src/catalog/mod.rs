//! Catalog resources and the schemas that govern how they may be queried
//!
//! Each resource ([`BoardGame`], [`Domain`], [`Mechanic`]) is paired with a
//! field-descriptor type (its DTO) implementing [`FieldSchema`]. The schema
//! owns a closed enum of sortable columns: a `sortColumn` query value is only
//! ever turned into one of those variants, and the store derives ORDER BY
//! identifiers from the variant, never from the raw string.

mod board_game;
mod domain;
mod mechanic;

pub use board_game::{BoardGame, BoardGameColumn, BoardGameDto};
pub use domain::{Domain, DomainColumn, DomainDto, DOMAIN_NOT_ALLOWED_MESSAGE};
pub use mechanic::{Mechanic, MechanicColumn, MechanicDto};

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use std::cmp::Ordering;
use std::fmt::Debug;

use crate::validation::ValidationErrors;

/// How a `filterQuery` is matched against a record's name
///
/// Matching is case-insensitive for both policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameMatch {
    /// Name starts with the filter text
    Prefix,
    /// Name contains the filter text anywhere
    Substring,
}

impl NameMatch {
    /// Check a record name against the filter text
    pub fn matches(self, name: &str, filter: &str) -> bool {
        let name = name.to_lowercase();
        let filter = filter.to_lowercase();
        match self {
            Self::Prefix => name.starts_with(&filter),
            Self::Substring => name.contains(&filter),
        }
    }

    /// SQL `LIKE` pattern for the filter text, with `%`, `_` and `\` escaped
    pub fn like_pattern(self, filter: &str) -> String {
        let mut escaped = String::with_capacity(filter.len() + 2);
        for ch in filter.chars() {
            if matches!(ch, '%' | '_' | '\\') {
                escaped.push('\\');
            }
            escaped.push(ch);
        }
        match self {
            Self::Prefix => format!("{}%", escaped),
            Self::Substring => format!("%{}%", escaped),
        }
    }
}

/// Closed set of sortable columns of a resource
pub trait SortColumn: Copy + Eq + Debug + Send + Sync + 'static {
    /// Every sortable column, in declaration order
    const ALL: &'static [Self];

    /// Declared field name, matched case-sensitively against `sortColumn`
    fn field_name(self) -> &'static str;

    /// Resolve an already-validated field name to its column
    fn from_field_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.field_name() == name)
    }
}

/// Field-descriptor type: a schema token naming the legal sort columns
pub trait FieldSchema: Send + Sync + 'static {
    /// Typed sort key for this schema
    type Column: SortColumn;

    /// Type tag used to namespace cache keys, e.g. `BoardGameDto`
    const DESCRIPTOR: &'static str;

    /// Declared field names, in declaration order
    fn field_names() -> Vec<&'static str> {
        Self::Column::ALL.iter().map(|c| c.field_name()).collect()
    }
}

/// A catalog record type
pub trait Resource: Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Field descriptor that validates sort columns for this resource
    type Schema: FieldSchema;

    /// Store table, also the resource tag in routes and logs
    const TABLE: &'static str;

    /// How `filterQuery` matches names of this resource
    const NAME_MATCH: NameMatch;

    fn id(&self) -> i32;

    fn name(&self) -> &str;

    /// Compare two records by a sortable column (ascending)
    fn compare_by(&self, other: &Self, column: ColumnOf<Self>) -> Ordering;
}

/// Sort column enum of a resource
pub type ColumnOf<R> = <<R as Resource>::Schema as FieldSchema>::Column;

/// Body of a write request that partially updates one record
pub trait UpdateDto<R: Resource>: FieldSchema + Serialize + DeserializeOwned {
    /// Id of the record to update
    fn target_id(&self) -> i32;

    /// Copy the provided fields onto `record` and stamp the modification time
    fn apply_to(&self, record: &mut R, now: DateTime<Utc>);

    /// Body-level validation run after decoding
    fn validate(&self) -> Result<(), ValidationErrors> {
        Ok(())
    }
}

/// Non-empty replacement name, if any
pub(crate) fn replacement_name(name: &Option<String>) -> Option<&str> {
    name.as_deref().filter(|n| !n.is_empty())
}

/// Case-insensitive name ordering
///
/// Ties are left to the caller, which keeps them in id order.
pub(crate) fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

/// Strictly positive replacement value, if any
pub(crate) fn positive(value: Option<i32>) -> Option<i32> {
    value.filter(|v| *v > 0)
}
