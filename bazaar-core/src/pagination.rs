//! Paging, sorting and filtering for user listings
//!
//! Listing requests carry raw query-string values such as `sort=name:desc` and
//! `search=email:example`. [`UserListQuery::parse`] turns them into a typed
//! [`UserListParams`] that repositories can execute without further checks.
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Columns a user listing can be sorted or searched by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserField {
    Name,
    Email,
}

impl UserField {
    pub fn column(&self) -> &'static str {
        match self {
            UserField::Name => "name",
            UserField::Email => "email",
        }
    }
}

impl std::str::FromStr for UserField {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(UserField::Name),
            "email" => Ok(UserField::Email),
            other => Err(ValidationError::InvalidField(format!(
                "Unknown user field: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserSort {
    pub field: UserField,
    pub order: SortOrder,
}

impl Default for UserSort {
    fn default() -> Self {
        Self {
            field: UserField::Email,
            order: SortOrder::Asc,
        }
    }
}

/// Case-insensitive substring match on one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSearch {
    pub field: UserField,
    pub key: String,
}

impl UserSearch {
    pub fn matches(&self, name: &str, email: &str) -> bool {
        let haystack = match self.field {
            UserField::Name => name,
            UserField::Email => email,
        };
        haystack.to_lowercase().contains(&self.key.to_lowercase())
    }
}

/// Raw listing options as received from a client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserListQuery {
    pub page_number: Option<u32>,
    pub page_size: Option<u32>,
    pub sort: Option<String>,
    pub search: Option<String>,
}

/// Validated listing options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserListParams {
    pub page_number: u32,
    pub page_size: u32,
    pub sort: UserSort,
    pub search: Option<UserSearch>,
}

impl UserListParams {
    pub fn offset(&self) -> u64 {
        u64::from(self.page_number - 1) * u64::from(self.page_size)
    }

    pub fn limit(&self) -> u32 {
        self.page_size
    }
}

impl Default for UserListParams {
    fn default() -> Self {
        Self {
            page_number: 1,
            page_size: DEFAULT_PAGE_SIZE,
            sort: UserSort::default(),
            search: None,
        }
    }
}

impl UserListQuery {
    pub fn parse(&self) -> Result<UserListParams, ValidationError> {
        let page_number = self.page_number.unwrap_or(1);
        if page_number == 0 {
            return Err(ValidationError::InvalidField(
                "page_number must be at least 1".to_string(),
            ));
        }

        let page_size = self.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(ValidationError::InvalidField(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }

        let sort = match self.sort.as_deref().filter(|s| !s.is_empty()) {
            None => UserSort::default(),
            Some(raw) => {
                let (field, order) = raw.split_once(':').unwrap_or((raw, "asc"));
                let order = match order {
                    "" | "asc" => SortOrder::Asc,
                    "desc" => SortOrder::Desc,
                    other => {
                        return Err(ValidationError::InvalidField(format!(
                            "Unknown sort order: {other}"
                        )));
                    }
                };
                UserSort {
                    field: field.parse()?,
                    order,
                }
            }
        };

        let search = match self.search.as_deref().filter(|s| !s.is_empty()) {
            None => None,
            Some(raw) => {
                let (field, key) = raw.split_once(':').ok_or_else(|| {
                    ValidationError::InvalidField("search must look like field:key".to_string())
                })?;
                // An empty key filters nothing.
                if key.is_empty() {
                    None
                } else {
                    Some(UserSearch {
                        field: field.parse()?,
                        key: key.to_string(),
                    })
                }
            }
        };

        Ok(UserListParams {
            page_number,
            page_size,
            sort,
            search,
        })
    }
}

/// One page of results plus navigation metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub page_number: u32,
    pub page_size: u32,
    pub count: usize,
    pub total_pages: u64,
    pub has_previous_page: bool,
    pub has_next_page: bool,
    pub data: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(params: &UserListParams, total: u64, data: Vec<T>) -> Self {
        let total_pages = total.div_ceil(u64::from(params.page_size));
        Self {
            page_number: params.page_number,
            page_size: params.page_size,
            count: data.len(),
            total_pages,
            has_previous_page: params.page_number > 1,
            has_next_page: u64::from(params.page_number) < total_pages,
            data,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            page_number: self.page_number,
            page_size: self.page_size,
            count: self.count,
            total_pages: self.total_pages,
            has_previous_page: self.has_previous_page,
            has_next_page: self.has_next_page,
            data: self.data.into_iter().map(f).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = UserListQuery::default().parse().unwrap();
        assert_eq!(params, UserListParams::default());
        assert_eq!(params.offset(), 0);
        assert_eq!(params.limit(), 10);
    }

    #[test]
    fn test_parse_sort_and_search() {
        let query = UserListQuery {
            page_number: Some(3),
            page_size: Some(5),
            sort: Some("name:desc".to_string()),
            search: Some("email:Example".to_string()),
        };
        let params = query.parse().unwrap();
        assert_eq!(params.offset(), 10);
        assert_eq!(
            params.sort,
            UserSort {
                field: UserField::Name,
                order: SortOrder::Desc
            }
        );
        let search = params.search.unwrap();
        assert_eq!(search.field, UserField::Email);
        assert!(search.matches("Ann", "ann@example.com"));
        assert!(!search.matches("Ann", "ann@other.org"));
    }

    #[test]
    fn test_sort_without_order_is_ascending() {
        let query = UserListQuery {
            sort: Some("name".to_string()),
            ..Default::default()
        };
        assert_eq!(query.parse().unwrap().sort.order, SortOrder::Asc);
    }

    #[test]
    fn test_rejects_unknown_fields_and_bad_pages() {
        let bad = [
            UserListQuery {
                sort: Some("password:asc".to_string()),
                ..Default::default()
            },
            UserListQuery {
                sort: Some("name:sideways".to_string()),
                ..Default::default()
            },
            UserListQuery {
                search: Some("password:x".to_string()),
                ..Default::default()
            },
            UserListQuery {
                search: Some("nocolon".to_string()),
                ..Default::default()
            },
            UserListQuery {
                page_number: Some(0),
                ..Default::default()
            },
            UserListQuery {
                page_size: Some(101),
                ..Default::default()
            },
        ];
        for query in bad {
            assert!(query.parse().is_err(), "{query:?} should be rejected");
        }
    }

    #[test]
    fn test_empty_search_key_is_ignored() {
        let query = UserListQuery {
            search: Some("name:".to_string()),
            ..Default::default()
        };
        assert!(query.parse().unwrap().search.is_none());
    }

    #[test]
    fn test_page_metadata() {
        let params = UserListParams {
            page_number: 2,
            page_size: 10,
            ..Default::default()
        };
        let page = Page::new(&params, 25, vec![1, 2, 3]);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.count, 3);
        assert!(page.has_previous_page);
        assert!(page.has_next_page);

        let last = Page::new(
            &UserListParams {
                page_number: 3,
                ..params
            },
            25,
            vec![1; 5],
        );
        assert!(!last.has_next_page);

        let empty: Page<u8> = Page::new(&UserListParams::default(), 0, vec![]);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next_page);
    }
}
