use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

/// Raw `?page=&limit=&sort_by=` parameters as they arrive on the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort_by: Option<String>,
}

/// `field:asc` or `field:desc`; a bare field name sorts ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub descending: bool,
}

impl SortSpec {
    pub fn parse(raw: &str) -> Result<Self, ServiceError> {
        let (field, direction) = match raw.split_once(':') {
            Some((field, direction)) => (field.trim(), direction.trim()),
            None => (raw.trim(), "asc"),
        };

        if field.is_empty() {
            return Err(ServiceError::validation("sort_by requires a field name"));
        }

        let descending = match direction.to_ascii_lowercase().as_str() {
            "asc" => false,
            "desc" => true,
            other => {
                return Err(ServiceError::validation(format!(
                    "sort direction must be asc or desc, got '{other}'"
                )))
            }
        };

        Ok(Self {
            field: field.to_string(),
            descending,
        })
    }

    /// Sort `items` by the requested field, which must be one of `sortable`.
    pub fn apply<T, F>(
        &self,
        items: &mut [T],
        sortable: &[&str],
        compare: F,
    ) -> Result<(), ServiceError>
    where
        F: Fn(&str, &T, &T) -> Option<Ordering>,
    {
        if !sortable.contains(&self.field.as_str()) {
            return Err(self.unsupported());
        }

        items.sort_by(|left, right| {
            let ordering = compare(&self.field, left, right).unwrap_or(Ordering::Equal);
            if self.descending {
                ordering.reverse()
            } else {
                ordering
            }
        });
        Ok(())
    }

    fn unsupported(&self) -> ServiceError {
        ServiceError::validation(format!("cannot sort by '{}'", self.field))
    }
}

/// Validated paging window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
    pub sort: Option<SortSpec>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_LIMIT,
            sort: None,
        }
    }
}

impl PageRequest {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page,
            limit,
            sort: None,
        }
    }

    pub fn from_query(query: &PageQuery) -> Result<Self, ServiceError> {
        let page = query.page.unwrap_or(1);
        if page == 0 {
            return Err(ServiceError::validation("page must be at least 1"));
        }

        let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
        if limit == 0 || limit > MAX_LIMIT {
            return Err(ServiceError::validation(format!(
                "limit must be between 1 and {MAX_LIMIT}"
            )));
        }

        let sort = query
            .sort_by
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .map(SortSpec::parse)
            .transpose()?;

        Ok(Self { page, limit, sort })
    }

    pub fn with_default_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize).saturating_mul(self.limit as usize)
    }
}

impl TryFrom<PageQuery> for PageRequest {
    type Error = ServiceError;

    fn try_from(query: PageQuery) -> Result<Self, Self::Error> {
        Self::from_query(&query)
    }
}

/// One page of results plus the totals clients use to render pagers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub results: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
    pub total_results: u64,
}

impl<T> Page<T> {
    /// Slice an already filtered and ordered result set.
    pub fn paginate(items: Vec<T>, request: &PageRequest) -> Self {
        let total_results = items.len() as u64;
        let limit = request.limit.max(1);
        let total_pages = total_results.div_ceil(limit as u64) as u32;
        let results = items
            .into_iter()
            .skip(request.offset())
            .take(limit as usize)
            .collect();

        Self {
            results,
            page: request.page,
            limit,
            total_pages,
            total_results,
        }
    }

    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            results: self.results.into_iter().map(f).collect(),
            page: self.page,
            limit: self.limit,
            total_pages: self.total_pages,
            total_results: self.total_results,
        }
    }
}
