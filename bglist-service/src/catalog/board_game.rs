//! Board games

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::{compare_names, positive, replacement_name, FieldSchema, NameMatch, Resource, SortColumn, UpdateDto};

/// A board game record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
#[cfg_attr(feature = "database", sqlx(rename_all = "PascalCase"))]
#[serde(rename_all = "camelCase")]
pub struct BoardGame {
    pub id: i32,
    pub name: String,
    pub year: i32,
    pub min_players: i32,
    pub max_players: i32,
    pub play_time: i32,
    pub min_age: i32,
    pub users_rated: i32,
    pub rating_average: f64,
    #[cfg_attr(feature = "database", sqlx(rename = "BGGRank"))]
    pub bgg_rank: i32,
    pub complexity_average: f64,
    pub owned_users: i32,
    pub created_date: DateTime<Utc>,
    pub last_modified_date: DateTime<Utc>,
}

impl BoardGame {
    /// Minimal record with the given id and name; the remaining stats start at zero
    pub fn new(id: i32, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            year: 0,
            min_players: 0,
            max_players: 0,
            play_time: 0,
            min_age: 0,
            users_rated: 0,
            rating_average: 0.0,
            bgg_rank: 0,
            complexity_average: 0.0,
            owned_users: 0,
            created_date: now,
            last_modified_date: now,
        }
    }
}

/// Sortable board game fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoardGameColumn {
    Id,
    Name,
    Year,
    MinPlayers,
    MaxPlayers,
    PlayTime,
    MinAge,
}

impl SortColumn for BoardGameColumn {
    const ALL: &'static [Self] = &[
        Self::Id,
        Self::Name,
        Self::Year,
        Self::MinPlayers,
        Self::MaxPlayers,
        Self::PlayTime,
        Self::MinAge,
    ];

    fn field_name(self) -> &'static str {
        match self {
            Self::Id => "Id",
            Self::Name => "Name",
            Self::Year => "Year",
            Self::MinPlayers => "MinPlayers",
            Self::MaxPlayers => "MaxPlayers",
            Self::PlayTime => "PlayTime",
            Self::MinAge => "MinAge",
        }
    }
}

/// Board game field descriptor, also the body of `POST /BoardGames`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardGameDto {
    #[serde(default)]
    pub id: i32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub min_players: Option<i32>,
    #[serde(default)]
    pub max_players: Option<i32>,
    #[serde(default)]
    pub play_time: Option<i32>,
    #[serde(default)]
    pub min_age: Option<i32>,
}

impl FieldSchema for BoardGameDto {
    type Column = BoardGameColumn;
    const DESCRIPTOR: &'static str = "BoardGameDto";
}

impl Resource for BoardGame {
    type Schema = BoardGameDto;
    const TABLE: &'static str = "BoardGames";
    const NAME_MATCH: NameMatch = NameMatch::Prefix;

    fn id(&self) -> i32 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn compare_by(&self, other: &Self, column: BoardGameColumn) -> Ordering {
        match column {
            BoardGameColumn::Id => self.id.cmp(&other.id),
            BoardGameColumn::Name => compare_names(&self.name, &other.name),
            BoardGameColumn::Year => self.year.cmp(&other.year),
            BoardGameColumn::MinPlayers => self.min_players.cmp(&other.min_players),
            BoardGameColumn::MaxPlayers => self.max_players.cmp(&other.max_players),
            BoardGameColumn::PlayTime => self.play_time.cmp(&other.play_time),
            BoardGameColumn::MinAge => self.min_age.cmp(&other.min_age),
        }
    }
}

impl UpdateDto<BoardGame> for BoardGameDto {
    fn target_id(&self) -> i32 {
        self.id
    }

    fn apply_to(&self, record: &mut BoardGame, now: DateTime<Utc>) {
        if let Some(name) = replacement_name(&self.name) {
            record.name = name.to_string();
        }
        if let Some(year) = positive(self.year) {
            record.year = year;
        }
        if let Some(min_players) = positive(self.min_players) {
            record.min_players = min_players;
        }
        if let Some(max_players) = positive(self.max_players) {
            record.max_players = max_players;
        }
        if let Some(play_time) = positive(self.play_time) {
            record.play_time = play_time;
        }
        if let Some(min_age) = positive(self.min_age) {
            record.min_age = min_age;
        }
        record.last_modified_date = now;
    }
}
