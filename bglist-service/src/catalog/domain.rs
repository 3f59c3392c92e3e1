//! Domains (board game categories)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::{compare_names, replacement_name, FieldSchema, NameMatch, Resource, SortColumn, UpdateDto};
use crate::validation::{LettersOnly, ValidationErrors};

/// Domain id that write requests are allowed to target by id alone
const ALLOWED_DOMAIN_ID: i32 = 3;

/// Domain name that write requests are allowed to target by name alone
const ALLOWED_DOMAIN_NAME: &str = "Wargames";

/// Message for a write that targets neither the allowed id nor the allowed name
pub const DOMAIN_NOT_ALLOWED_MESSAGE: &str = "Id and/or Name values must match an allowed Domain.";

/// A domain record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
#[cfg_attr(feature = "database", sqlx(rename_all = "PascalCase"))]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    pub id: i32,
    pub name: String,
    pub created_date: DateTime<Utc>,
    pub last_modified_date: DateTime<Utc>,
}

impl Domain {
    pub fn new(id: i32, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            created_date: now,
            last_modified_date: now,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomainColumn {
    Id,
    Name,
}

impl SortColumn for DomainColumn {
    const ALL: &'static [Self] = &[Self::Id, Self::Name];

    fn field_name(self) -> &'static str {
        match self {
            Self::Id => "Id",
            Self::Name => "Name",
        }
    }
}

/// Domain field descriptor, also the body of `POST /Domains`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainDto {
    #[serde(default)]
    pub id: i32,
    #[serde(default)]
    pub name: Option<String>,
}

impl FieldSchema for DomainDto {
    type Column = DomainColumn;
    const DESCRIPTOR: &'static str = "DomainDto";
}

impl Resource for Domain {
    type Schema = DomainDto;
    const TABLE: &'static str = "Domains";
    const NAME_MATCH: NameMatch = NameMatch::Prefix;

    fn id(&self) -> i32 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn compare_by(&self, other: &Self, column: DomainColumn) -> Ordering {
        match column {
            DomainColumn::Id => self.id.cmp(&other.id),
            DomainColumn::Name => compare_names(&self.name, &other.name),
        }
    }
}

impl UpdateDto<Domain> for DomainDto {
    fn target_id(&self) -> i32 {
        self.id
    }

    fn apply_to(&self, record: &mut Domain, now: DateTime<Utc>) {
        if let Some(name) = replacement_name(&self.name) {
            record.name = name.to_string();
        }
        record.last_modified_date = now;
    }

    /// A present name must be letters only; the object-level allow check only
    /// runs once every field check has passed.
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();

        if let Some(name) = &self.name {
            if let Err(message) = LettersOnly::with_regex().validate(Some(name)) {
                errors.add("name", message);
            }
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        if self.id != ALLOWED_DOMAIN_ID && self.name.as_deref() != Some(ALLOWED_DOMAIN_NAME) {
            errors.add("domain", DOMAIN_NOT_ALLOWED_MESSAGE);
            return Err(errors);
        }
        Ok(())
    }
}
