//! Request binding for list, write and delete endpoints
//!
//! Query strings arrive as [`RequestParams`] (every value still a string)
//! and are bound into a typed [`RequestDto`]. Binding collects every field
//! failure into one [`ValidationErrors`] map instead of stopping at the
//! first, then runs the sort-column check against the resource's schema.

use axum::extract::rejection::QueryRejection;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

use crate::catalog::{FieldSchema, NameMatch, SortColumn};
use crate::repository::{NameFilter, OrderDirection};
use crate::validation::{validate_range, validate_sort_order, SortColumnValidator, ValidationErrors};

/// Default `pageIndex`
pub const DEFAULT_PAGE_INDEX: u32 = 0;

/// Default `pageSize`
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Largest accepted `pageSize`
pub const MAX_PAGE_SIZE: u32 = 100;

/// Default `sortColumn`
pub const DEFAULT_SORT_COLUMN: &str = "Name";

/// Default `sortOrder`
pub const DEFAULT_SORT_ORDER: &str = "ASC";

/// Error key for failures that belong to no single field
pub const BODY_ERROR_KEY: &str = "$";

/// Raw list query parameters
///
/// Keys are accepted in camelCase and PascalCase. Empty values count as
/// absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestParams {
    #[serde(default, alias = "PageIndex")]
    pub page_index: Option<String>,
    #[serde(default, alias = "PageSize")]
    pub page_size: Option<String>,
    #[serde(default, alias = "SortColumn")]
    pub sort_column: Option<String>,
    #[serde(default, alias = "SortOrder")]
    pub sort_order: Option<String>,
    #[serde(default, alias = "FilterQuery")]
    pub filter_query: Option<String>,
}

/// Validated paging, sorting and filtering request for schema `T`
///
/// Serializes (for cache keys) to its five wire fields only; the typed
/// column and direction are derived from them.
#[derive(Serialize)]
#[serde(rename_all = "camelCase", bound = "")]
pub struct RequestDto<T: FieldSchema> {
    pub page_index: u32,
    pub page_size: u32,
    pub sort_column: String,
    pub sort_order: String,
    pub filter_query: Option<String>,
    #[serde(skip)]
    column: T::Column,
    #[serde(skip)]
    direction: OrderDirection,
    #[serde(skip)]
    _schema: PhantomData<fn() -> T>,
}

impl<T: FieldSchema> RequestDto<T> {
    /// Bind and validate raw parameters
    ///
    /// Field checks (`pageIndex`, `pageSize`, `sortOrder`) run first; the
    /// `sortColumn` schema check only runs when they all pass.
    pub fn bind(params: RequestParams) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let page_index = bind_int(&mut errors, "pageIndex", params.page_index, DEFAULT_PAGE_INDEX);
        if page_index.is_some_and(|v| v < 0) {
            errors.add("pageIndex", "pageIndex must be greater than or equal to 0");
        }

        let page_size = bind_int(&mut errors, "pageSize", params.page_size, DEFAULT_PAGE_SIZE);
        if let Some(value) = page_size {
            if let Err(msg) = validate_range("pageSize", value, 1, i64::from(MAX_PAGE_SIZE)) {
                errors.add("pageSize", msg);
            }
        }

        let sort_column = present(params.sort_column).unwrap_or_else(|| DEFAULT_SORT_COLUMN.to_string());
        let sort_order = present(params.sort_order).unwrap_or_else(|| DEFAULT_SORT_ORDER.to_string());
        if let Err(msg) = validate_sort_order(&sort_order) {
            errors.add("sortOrder", msg);
        }

        let (Some(page_index), Some(page_size)) = (page_index, page_size) else {
            return Err(errors);
        };
        if !errors.is_empty() {
            return Err(errors);
        }

        let validator = SortColumnValidator::for_schema::<T>();
        let column = validator
            .validate(&sort_column)
            .and_then(|()| {
                T::Column::from_field_name(&sort_column).ok_or_else(|| {
                    format!("sortColumn must be one of: {}", validator.allowed().join(", "))
                })
            })
            .map_err(|msg| ValidationErrors::single("sortColumn", msg))?;

        Ok(Self {
            page_index: u32::try_from(page_index).unwrap_or_default(),
            page_size: u32::try_from(page_size).unwrap_or(DEFAULT_PAGE_SIZE),
            direction: OrderDirection::from_token(&sort_order).unwrap_or_default(),
            sort_column,
            sort_order,
            filter_query: present(params.filter_query),
            column,
            _schema: PhantomData,
        })
    }

    /// Bind straight from the query extractor result
    pub fn from_query(
        params: Result<axum::extract::Query<RequestParams>, QueryRejection>,
    ) -> Result<Self, ValidationErrors> {
        match params {
            Ok(axum::extract::Query(params)) => Self::bind(params),
            Err(rejection) => Err(ValidationErrors::single(BODY_ERROR_KEY, rejection.body_text())),
        }
    }

    pub fn column(&self) -> T::Column {
        self.column
    }

    pub fn direction(&self) -> OrderDirection {
        self.direction
    }

    /// Records to skip
    pub fn offset(&self) -> u64 {
        u64::from(self.page_index) * u64::from(self.page_size)
    }

    /// Records to take
    pub fn limit(&self) -> u64 {
        u64::from(self.page_size)
    }

    pub fn name_filter(&self, policy: NameMatch) -> Option<NameFilter> {
        self.filter_query
            .as_ref()
            .map(|text| NameFilter::new(text.clone(), policy))
    }

    /// Cache key: schema tag plus the serialized request
    pub fn cache_key(&self) -> Result<String, serde_json::Error> {
        Ok(format!(
            "RequestDto<{}>-{}",
            T::DESCRIPTOR,
            serde_json::to_string(self)?
        ))
    }

    /// Query pairs for the self link
    pub fn link_pairs(&self) -> Vec<(String, String)> {
        vec![
            ("pageIndex".to_string(), self.page_index.to_string()),
            ("pageSize".to_string(), self.page_size.to_string()),
        ]
    }
}

impl<T: FieldSchema> fmt::Debug for RequestDto<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestDto")
            .field("schema", &T::DESCRIPTOR)
            .field("page_index", &self.page_index)
            .field("page_size", &self.page_size)
            .field("sort_column", &self.sort_column)
            .field("sort_order", &self.sort_order)
            .field("filter_query", &self.filter_query)
            .finish()
    }
}

/// Query of `DELETE` endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DeleteParams {
    #[serde(default, alias = "Ids")]
    pub ids: Option<String>,
}

impl DeleteParams {
    /// Parse the comma-separated `ids` list, preserving order
    pub fn parse_ids(&self) -> Result<Vec<i32>, ValidationErrors> {
        let Some(raw) = self.ids.as_deref().filter(|s| !s.trim().is_empty()) else {
            return Err(ValidationErrors::single("ids", "The ids field is required."));
        };

        let mut errors = ValidationErrors::default();
        let mut ids = Vec::new();
        for token in raw.split(',').map(str::trim) {
            match token.parse::<i32>() {
                Ok(id) => ids.push(id),
                Err(_) => errors.add("ids", format!("The value '{}' is not valid for ids.", token)),
            }
        }

        if errors.is_empty() {
            Ok(ids)
        } else {
            Err(errors)
        }
    }

    /// Bind straight from the query extractor result
    pub fn from_query(
        params: Result<axum::extract::Query<DeleteParams>, QueryRejection>,
    ) -> Result<Vec<i32>, ValidationErrors> {
        match params {
            Ok(axum::extract::Query(params)) => params.parse_ids(),
            Err(rejection) => Err(ValidationErrors::single(BODY_ERROR_KEY, rejection.body_text())),
        }
    }
}

/// Decode a JSON request body; failures are keyed `$`
pub fn decode_body<D: DeserializeOwned>(body: &[u8]) -> Result<D, ValidationErrors> {
    if body.is_empty() {
        return Err(ValidationErrors::single(
            BODY_ERROR_KEY,
            "A non-empty request body is required.",
        ));
    }
    serde_json::from_slice(body).map_err(|e| ValidationErrors::single(BODY_ERROR_KEY, e.to_string()))
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Parse an optional integer parameter, recording a binding failure
///
/// Returns `None` only when a present value failed to parse.
fn bind_int(
    errors: &mut ValidationErrors,
    field: &str,
    raw: Option<String>,
    default: u32,
) -> Option<i64> {
    match present(raw) {
        None => Some(i64::from(default)),
        Some(raw) => match raw.trim().parse::<i32>() {
            Ok(value) => Some(i64::from(value)),
            Err(_) => {
                errors.add(field, format!("The value '{}' is not valid for {}.", raw, field));
                None
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{BoardGameColumn, BoardGameDto, DomainDto};
    use axum::extract::Query;
    use axum::http::Uri;

    fn params(uri: &'static str) -> RequestParams {
        Query::<RequestParams>::try_from_uri(&Uri::from_static(uri))
            .unwrap()
            .0
    }

    #[test]
    fn test_defaults() {
        let dto = RequestDto::<BoardGameDto>::bind(RequestParams::default()).unwrap();
        assert_eq!(dto.page_index, 0);
        assert_eq!(dto.page_size, 10);
        assert_eq!(dto.sort_column, "Name");
        assert_eq!(dto.sort_order, "ASC");
        assert_eq!(dto.column(), BoardGameColumn::Name);
        assert_eq!(dto.direction(), OrderDirection::Ascending);
        assert!(dto.filter_query.is_none());
    }

    #[test]
    fn test_accepts_camel_and_pascal_case_keys() {
        let dto = RequestDto::<BoardGameDto>::bind(params(
            "/BoardGames?PageIndex=2&pageSize=5&SortColumn=Year&sortOrder=DESC&FilterQuery=War",
        ))
        .unwrap();
        assert_eq!(dto.offset(), 10);
        assert_eq!(dto.limit(), 5);
        assert_eq!(dto.column(), BoardGameColumn::Year);
        assert_eq!(dto.direction(), OrderDirection::Descending);
        assert_eq!(dto.filter_query.as_deref(), Some("War"));
    }

    #[test]
    fn test_empty_values_fall_back_to_defaults() {
        let dto = RequestDto::<DomainDto>::bind(params("/Domains?pageSize=&filterQuery=")).unwrap();
        assert_eq!(dto.page_size, 10);
        assert!(dto.filter_query.is_none());
    }

    #[test]
    fn test_collects_field_failures() {
        let errors = RequestDto::<BoardGameDto>::bind(params(
            "/BoardGames?pageIndex=-1&pageSize=500&sortOrder=asc&sortColumn=Nope",
        ))
        .unwrap_err();

        assert_eq!(
            errors.messages("pageIndex").unwrap(),
            ["pageIndex must be greater than or equal to 0"]
        );
        assert_eq!(
            errors.messages("pageSize").unwrap(),
            ["pageSize must be between 1 and 100"]
        );
        assert_eq!(
            errors.messages("sortOrder").unwrap(),
            ["sortOrder must be one of: ASC, DESC"]
        );
        // schema check waits until the field checks pass
        assert!(!errors.contains("sortColumn"));
    }

    #[test]
    fn test_unparsable_integer() {
        let errors = RequestDto::<BoardGameDto>::bind(params("/BoardGames?pageSize=ten")).unwrap_err();
        assert_eq!(
            errors.messages("pageSize").unwrap(),
            ["The value 'ten' is not valid for pageSize."]
        );
    }

    #[test]
    fn test_sort_column_checked_against_schema() {
        let errors =
            RequestDto::<DomainDto>::bind(params("/Domains?sortColumn=Year")).unwrap_err();
        assert_eq!(
            errors.messages("sortColumn").unwrap(),
            ["sortColumn must be one of: Id, Name"]
        );

        let errors =
            RequestDto::<BoardGameDto>::bind(params("/BoardGames?sortColumn=name")).unwrap_err();
        assert!(errors.contains("sortColumn"));
    }

    #[test]
    fn test_sort_column_rejects_injection() {
        let errors = RequestDto::<BoardGameDto>::bind(params(
            "/BoardGames?sortColumn=Name%3B%20DROP%20TABLE%20BoardGames",
        ))
        .unwrap_err();
        assert!(errors.contains("sortColumn"));
    }

    #[test]
    fn test_cache_key_covers_every_parameter() {
        let a = RequestDto::<BoardGameDto>::bind(params("/BoardGames?pageIndex=0")).unwrap();
        let b = RequestDto::<BoardGameDto>::bind(params("/BoardGames?pageIndex=1")).unwrap();
        let c = RequestDto::<BoardGameDto>::bind(params("/BoardGames?PageIndex=0")).unwrap();

        let key = a.cache_key().unwrap();
        assert_eq!(
            key,
            "RequestDto<BoardGameDto>-{\"pageIndex\":0,\"pageSize\":10,\"sortColumn\":\"Name\",\"sortOrder\":\"ASC\",\"filterQuery\":null}"
        );
        assert_ne!(key, b.cache_key().unwrap());
        assert_eq!(key, c.cache_key().unwrap());

        let domain = RequestDto::<DomainDto>::bind(params("/Domains?pageIndex=0")).unwrap();
        assert_ne!(key, domain.cache_key().unwrap());
    }

    #[test]
    fn test_parse_ids() {
        let params = DeleteParams {
            ids: Some("1, 2,999".into()),
        };
        assert_eq!(params.parse_ids().unwrap(), vec![1, 2, 999]);

        let errors = DeleteParams { ids: None }.parse_ids().unwrap_err();
        assert!(errors.contains("ids"));

        let errors = DeleteParams {
            ids: Some("1,x".into()),
        }
        .parse_ids()
        .unwrap_err();
        assert_eq!(
            errors.messages("ids").unwrap(),
            ["The value 'x' is not valid for ids."]
        );
    }

    #[test]
    fn test_decode_body_errors_are_keyed_root() {
        let errors = decode_body::<DomainDto>(b"{not json").unwrap_err();
        assert!(errors.contains(BODY_ERROR_KEY));
        assert!(decode_body::<DomainDto>(b"").unwrap_err().contains(BODY_ERROR_KEY));

        let dto: DomainDto = decode_body(br#"{"id":3,"name":"Wargames"}"#).unwrap();
        assert_eq!(dto.id, 3);
    }
}
