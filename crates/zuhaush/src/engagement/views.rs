use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{PropertyView, PropertyViewId};
use super::likes::existing_property;
use super::repository::PropertyViewRepository;
use crate::accounts::users::UserId;
use crate::catalog::{Property, PropertyId, PropertyRepository};
use crate::error::ServiceError;
use crate::pagination::{Page, PageRequest};

const VIEW_SORT_FIELDS: &[&str] = &["viewed_at"];

const DEFAULT_MOST_VIEWED: usize = 10;
const MAX_MOST_VIEWED: usize = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct TrackView {
    pub property_id: PropertyId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ViewStats {
    pub total_views: u64,
    pub unique_property_count: u64,
    pub first_viewed_at: Option<DateTime<Utc>>,
    pub last_viewed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MostViewed {
    pub property: Property,
    pub view_count: u64,
    pub first_viewed_at: DateTime<Utc>,
    pub last_viewed_at: DateTime<Utc>,
}

/// Per-user browsing history.
pub struct PropertyViewService {
    views: Arc<dyn PropertyViewRepository>,
    properties: Arc<dyn PropertyRepository>,
}

impl PropertyViewService {
    pub fn new(
        views: Arc<dyn PropertyViewRepository>,
        properties: Arc<dyn PropertyRepository>,
    ) -> Self {
        Self { views, properties }
    }

    pub fn track(&self, user: &UserId, property: &PropertyId) -> Result<PropertyView, ServiceError> {
        existing_property(self.properties.as_ref(), property)?;
        Ok(self.views.insert(PropertyView {
            id: PropertyViewId::generate(),
            user_id: user.clone(),
            property_id: property.clone(),
            viewed_at: Utc::now(),
        })?)
    }

    pub fn for_user(
        &self,
        user: &UserId,
        page: &PageRequest,
    ) -> Result<Page<PropertyView>, ServiceError> {
        let mut views = self.views.for_user(user)?;
        match &page.sort {
            Some(sort) => sort.apply(&mut views, VIEW_SORT_FIELDS, |field, a: &PropertyView, b: &PropertyView| {
                match field {
                    "viewed_at" => Some(a.viewed_at.cmp(&b.viewed_at)),
                    _ => None,
                }
            })?,
            None => views.sort_by(|a, b| b.viewed_at.cmp(&a.viewed_at)),
        }
        Ok(Page::paginate(views, page))
    }

    pub fn stats(&self, user: &UserId) -> Result<ViewStats, ServiceError> {
        let views = self.views.for_user(user)?;
        let unique = views
            .iter()
            .map(|view| &view.property_id)
            .collect::<std::collections::HashSet<_>>()
            .len();
        Ok(ViewStats {
            total_views: views.len() as u64,
            unique_property_count: unique as u64,
            first_viewed_at: views.iter().map(|view| view.viewed_at).min(),
            last_viewed_at: views.iter().map(|view| view.viewed_at).max(),
        })
    }

    /// The user's most revisited listings: view count descending, then most recent view.
    /// Listings that no longer exist are left out.
    pub fn most_viewed(
        &self,
        user: &UserId,
        limit: Option<usize>,
    ) -> Result<Vec<MostViewed>, ServiceError> {
        let limit = match limit {
            None => DEFAULT_MOST_VIEWED,
            Some(0) => return Err(ServiceError::validation("limit must be at least 1")),
            Some(limit) => limit.min(MAX_MOST_VIEWED),
        };

        let mut grouped: HashMap<PropertyId, (u64, DateTime<Utc>, DateTime<Utc>)> = HashMap::new();
        for view in self.views.for_user(user)? {
            grouped
                .entry(view.property_id)
                .and_modify(|(count, first, last)| {
                    *count += 1;
                    *first = (*first).min(view.viewed_at);
                    *last = (*last).max(view.viewed_at);
                })
                .or_insert((1, view.viewed_at, view.viewed_at));
        }

        let mut ranked: Vec<_> = grouped.into_iter().collect();
        ranked.sort_by(|(_, a), (_, b)| b.0.cmp(&a.0).then(b.2.cmp(&a.2)));

        let mut result = Vec::with_capacity(limit);
        for (property_id, (view_count, first_viewed_at, last_viewed_at)) in ranked {
            if result.len() == limit {
                break;
            }
            if let Some(property) = self.properties.fetch(&property_id)? {
                result.push(MostViewed {
                    property,
                    view_count,
                    first_viewed_at,
                    last_viewed_at,
                });
            }
        }
        Ok(result)
    }
}
