//! Game mechanics

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::{compare_names, replacement_name, FieldSchema, NameMatch, Resource, SortColumn, UpdateDto};

/// A mechanic record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
#[cfg_attr(feature = "database", sqlx(rename_all = "PascalCase"))]
#[serde(rename_all = "camelCase")]
pub struct Mechanic {
    pub id: i32,
    pub name: String,
    pub created_date: DateTime<Utc>,
    pub last_modified_date: DateTime<Utc>,
}

impl Mechanic {
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
pub enum MechanicColumn {
    Id,
    Name,
}

impl SortColumn for MechanicColumn {
    const ALL: &'static [Self] = &[Self::Id, Self::Name];

    fn field_name(self) -> &'static str {
        match self {
            Self::Id => "Id",
            Self::Name => "Name",
        }
    }
}

/// Mechanic field descriptor, also the body of `POST /Mechanics`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MechanicDto {
    #[serde(default)]
    pub id: i32,
    #[serde(default)]
    pub name: Option<String>,
}

impl FieldSchema for MechanicDto {
    type Column = MechanicColumn;
    const DESCRIPTOR: &'static str = "MechanicDto";
}

impl Resource for Mechanic {
    type Schema = MechanicDto;
    const TABLE: &'static str = "Mechanics";
    const NAME_MATCH: NameMatch = NameMatch::Substring;

    fn id(&self) -> i32 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn compare_by(&self, other: &Self, column: MechanicColumn) -> Ordering {
        match column {
            MechanicColumn::Id => self.id.cmp(&other.id),
            MechanicColumn::Name => compare_names(&self.name, &other.name),
        }
    }
}

impl UpdateDto<Mechanic> for MechanicDto {
    fn target_id(&self) -> i32 {
        self.id
    }

    fn apply_to(&self, record: &mut Mechanic, now: DateTime<Utc>) {
        if let Some(name) = replacement_name(&self.name) {
            record.name = name.to_string();
        }
        record.last_modified_date = now;
    }
}
