use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::domain::{
    normalize_bhk, slugify, validate_amount, validate_geo, Amenity, Area, Counter, GeoLocation,
    Media, MediaId, MediaKind, Price, Property, PropertyFlag, PropertyId, PropertyStatus,
    PropertyType,
};
use super::repository::{PropertyFilter, PropertyRepository};
use crate::accounts::admins::AdminId;
use crate::accounts::builders::{BuilderId, BuilderRepository};
use crate::error::ServiceError;
use crate::notifications::{NewNotification, NotificationService, NotificationType, Recipient};
use crate::pagination::{Page, PageRequest};
use crate::store::RepositoryError;
use crate::validation::{optional_text, required_text};

/// Who is changing a listing. Builders may only touch their own.
#[derive(Debug, Clone, Copy)]
pub enum Editor<'a> {
    Builder(&'a BuilderId),
    Admin(&'a AdminId),
}

#[derive(Debug, Clone, Deserialize)]
pub struct PropertyInput {
    pub name: String,
    pub property_type: PropertyType,
    #[serde(default)]
    pub bhk: Option<String>,
    #[serde(default)]
    pub area: Option<Area>,
    pub price: Price,
    pub city: String,
    pub locality: String,
    #[serde(default)]
    pub geo: Option<GeoLocation>,
    #[serde(default)]
    pub amenities: Vec<Amenity>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub availability: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub status: Option<PropertyStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PropertyUpdate {
    pub name: Option<String>,
    pub property_type: Option<PropertyType>,
    pub bhk: Option<String>,
    pub area: Option<Area>,
    pub price: Option<Price>,
    pub city: Option<String>,
    pub locality: Option<String>,
    pub geo: Option<GeoLocation>,
    pub amenities: Option<Vec<Amenity>>,
    pub description: Option<String>,
    pub availability: Option<String>,
    pub slug: Option<String>,
    pub status: Option<PropertyStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaInput {
    pub kind: MediaKind,
    pub url: String,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaUpdate {
    pub caption: Option<String>,
    pub is_primary: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PropertyStats {
    pub total: u64,
    pub approved: u64,
    pub pending_approval: u64,
    pub by_status: BTreeMap<PropertyStatus, u64>,
    pub views: u64,
    pub inquiries: u64,
    pub likes: u64,
}

fn property_not_found() -> ServiceError {
    ServiceError::not_found("Property not found")
}

const PROPERTY_SORT_FIELDS: &[&str] = &[
    "name",
    "created_at",
    "updated_at",
    "price",
    "views",
    "likes",
    "inquiries",
];

fn compare_properties(field: &str, a: &Property, b: &Property) -> Option<std::cmp::Ordering> {
    match field {
        "name" => Some(a.name.cmp(&b.name)),
        "created_at" => Some(a.created_at.cmp(&b.created_at)),
        "updated_at" => Some(a.updated_at.cmp(&b.updated_at)),
        "price" => a.price.in_rupees().partial_cmp(&b.price.in_rupees()),
        "views" => Some(a.views.cmp(&b.views)),
        "likes" => Some(a.likes.cmp(&b.likes)),
        "inquiries" => Some(a.inquiries.cmp(&b.inquiries)),
        _ => None,
    }
}

/// Property catalog: listings, media, flags, approval and counters.
pub struct PropertyService {
    properties: Arc<dyn PropertyRepository>,
    builders: Arc<dyn BuilderRepository>,
    notifications: Arc<NotificationService>,
}

impl PropertyService {
    pub fn new(
        properties: Arc<dyn PropertyRepository>,
        builders: Arc<dyn BuilderRepository>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self {
            properties,
            builders,
            notifications,
        }
    }

    /// Create a listing owned by `builder`. New listings await admin approval.
    pub fn create(
        &self,
        builder: &BuilderId,
        input: PropertyInput,
    ) -> Result<Property, ServiceError> {
        self.builders
            .fetch(builder)?
            .ok_or_else(|| ServiceError::not_found("Builder not found"))?;

        let name = required_text("Name", &input.name, 200)?;
        validate_amount("Price", input.price.value)?;
        if let Some(area) = &input.area {
            validate_amount("Area", area.value)?;
        }
        if let Some(geo) = &input.geo {
            validate_geo(geo)?;
        }

        let slug = match input.slug.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(requested) => {
                let slug = slugify(requested);
                if self.properties.find_by_slug(&slug)?.is_some() {
                    return Err(ServiceError::conflict("Slug already in use"));
                }
                slug
            }
            None => self.unique_slug(&slugify(&name))?,
        };

        let now = Utc::now();
        let property = Property {
            id: PropertyId::generate(),
            builder_id: builder.clone(),
            name,
            property_type: input.property_type,
            bhk: input.bhk.as_deref().map(normalize_bhk).transpose()?,
            area: input.area,
            price: input.price,
            city: required_text("City", &input.city, 100)?,
            locality: required_text("Locality", &input.locality, 200)?,
            geo: input.geo,
            media: Vec::new(),
            amenities: input.amenities,
            status: input.status.unwrap_or_default(),
            admin_approved: false,
            approved_by: None,
            approved_at: None,
            rejection_reason: None,
            slug,
            flags: BTreeSet::new(),
            description: optional_text("Description", input.description.as_deref(), 5000)?,
            availability: optional_text("Availability", input.availability.as_deref(), 200)?,
            views: 0,
            inquiries: 0,
            likes: 0,
            created_at: now,
            updated_at: now,
        };

        let stored = self.properties.insert(property).map_err(|err| match err {
            RepositoryError::Conflict(_) => ServiceError::conflict("Slug already in use"),
            other => other.into(),
        })?;
        info!(property = %stored.id, builder = %stored.builder_id, "property created");
        Ok(stored)
    }

    fn unique_slug(&self, base: &str) -> Result<String, ServiceError> {
        if self.properties.find_by_slug(base)?.is_none() {
            return Ok(base.to_string());
        }
        let mut suffix = 2;
        loop {
            let candidate = format!("{base}-{suffix}");
            if self.properties.find_by_slug(&candidate)?.is_none() {
                return Ok(candidate);
            }
            suffix += 1;
        }
    }

    pub fn get(&self, id: &PropertyId) -> Result<Property, ServiceError> {
        self.properties.fetch(id)?.ok_or_else(property_not_found)
    }

    pub fn get_by_slug(&self, slug: &str) -> Result<Property, ServiceError> {
        self.properties
            .find_by_slug(slug)?
            .ok_or_else(property_not_found)
    }

    /// Listing without visibility rules, for admins and builder dashboards.
    pub fn list(
        &self,
        filter: &PropertyFilter,
        page: &PageRequest,
    ) -> Result<Page<Property>, ServiceError> {
        let mut items = self.properties.list(filter)?;
        match &page.sort {
            Some(sort) => sort.apply(&mut items, PROPERTY_SORT_FIELDS, compare_properties)?,
            None => items.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        }
        Ok(Page::paginate(items, page))
    }

    /// Public search: only approved, active listings.
    pub fn search(
        &self,
        filter: &PropertyFilter,
        page: &PageRequest,
    ) -> Result<Page<Property>, ServiceError> {
        let filter = PropertyFilter {
            admin_approved: Some(true),
            status: Some(PropertyStatus::Active),
            ..filter.clone()
        };
        self.list(&filter, page)
    }

    pub fn flagged(
        &self,
        flag: PropertyFlag,
        page: &PageRequest,
    ) -> Result<Page<Property>, ServiceError> {
        let filter = PropertyFilter {
            flag: Some(flag),
            ..PropertyFilter::default()
        };
        self.search(&filter, page)
    }

    pub fn for_builder(
        &self,
        builder: &BuilderId,
        filter: &PropertyFilter,
        page: &PageRequest,
    ) -> Result<Page<Property>, ServiceError> {
        let filter = PropertyFilter {
            builder_id: Some(builder.clone()),
            ..filter.clone()
        };
        self.list(&filter, page)
    }

    fn editable(&self, editor: Editor<'_>, id: &PropertyId) -> Result<Property, ServiceError> {
        let property = self.get(id)?;
        match editor {
            Editor::Admin(_) => Ok(property),
            Editor::Builder(builder) if &property.builder_id == builder => Ok(property),
            Editor::Builder(_) => Err(ServiceError::forbidden(
                "You can only manage your own properties",
            )),
        }
    }

    pub fn update(
        &self,
        editor: Editor<'_>,
        id: &PropertyId,
        update: PropertyUpdate,
    ) -> Result<Property, ServiceError> {
        let mut property = self.editable(editor, id)?;

        if let Some(name) = update.name {
            property.name = required_text("Name", &name, 200)?;
        }
        if let Some(kind) = update.property_type {
            property.property_type = kind;
        }
        if let Some(bhk) = update.bhk {
            property.bhk = Some(normalize_bhk(&bhk)?);
        }
        if let Some(area) = update.area {
            validate_amount("Area", area.value)?;
            property.area = Some(area);
        }
        if let Some(price) = update.price {
            validate_amount("Price", price.value)?;
            property.price = price;
        }
        if let Some(city) = update.city {
            property.city = required_text("City", &city, 100)?;
        }
        if let Some(locality) = update.locality {
            property.locality = required_text("Locality", &locality, 200)?;
        }
        if let Some(geo) = update.geo {
            validate_geo(&geo)?;
            property.geo = Some(geo);
        }
        if let Some(amenities) = update.amenities {
            property.amenities = amenities;
        }
        if let Some(description) = update.description {
            property.description = optional_text("Description", Some(&description), 5000)?;
        }
        if let Some(availability) = update.availability {
            property.availability = optional_text("Availability", Some(&availability), 200)?;
        }
        if let Some(slug) = update.slug {
            let slug = slugify(&slug);
            if slug != property.slug {
                if self.properties.find_by_slug(&slug)?.is_some() {
                    return Err(ServiceError::conflict("Slug already in use"));
                }
                property.slug = slug;
            }
        }
        if let Some(status) = update.status {
            property.status = status;
        }
        property.updated_at = Utc::now();

        self.properties.update(property).map_err(|err| match err {
            RepositoryError::Conflict(_) => ServiceError::conflict("Slug already in use"),
            other => other.into(),
        })
    }

    pub fn delete(&self, editor: Editor<'_>, id: &PropertyId) -> Result<(), ServiceError> {
        let property = self.editable(editor, id)?;
        self.properties.delete(&property.id)?;
        info!(property = %property.id, "property deleted");
        Ok(())
    }

    pub fn add_media(
        &self,
        editor: Editor<'_>,
        id: &PropertyId,
        input: MediaInput,
    ) -> Result<Property, ServiceError> {
        let mut property = self.editable(editor, id)?;
        let url = required_text("Media URL", &input.url, 2048)?;

        let is_primary = input.is_primary || property.media.is_empty();
        if is_primary {
            property.media.iter_mut().for_each(|media| media.is_primary = false);
        }
        property.media.push(Media {
            id: MediaId::generate(),
            kind: input.kind,
            url,
            key: input.key,
            caption: optional_text("Caption", input.caption.as_deref(), 300)?,
            is_primary,
            uploaded_at: Utc::now(),
        });
        property.updated_at = Utc::now();
        Ok(self.properties.update(property)?)
    }

    pub fn update_media(
        &self,
        editor: Editor<'_>,
        id: &PropertyId,
        media_id: &MediaId,
        update: MediaUpdate,
    ) -> Result<Property, ServiceError> {
        let mut property = self.editable(editor, id)?;
        let index = property
            .media
            .iter()
            .position(|media| &media.id == media_id)
            .ok_or_else(|| ServiceError::not_found("Media not found"))?;

        if let Some(caption) = update.caption {
            property.media[index].caption = optional_text("Caption", Some(&caption), 300)?;
        }
        if update.is_primary == Some(true) {
            for (position, media) in property.media.iter_mut().enumerate() {
                media.is_primary = position == index;
            }
        } else if update.is_primary == Some(false) {
            property.media[index].is_primary = false;
        }
        property.updated_at = Utc::now();
        Ok(self.properties.update(property)?)
    }

    pub fn remove_media(
        &self,
        editor: Editor<'_>,
        id: &PropertyId,
        media_id: &MediaId,
    ) -> Result<Property, ServiceError> {
        let mut property = self.editable(editor, id)?;
        let index = property
            .media
            .iter()
            .position(|media| &media.id == media_id)
            .ok_or_else(|| ServiceError::not_found("Media not found"))?;

        let removed = property.media.remove(index);
        if removed.is_primary {
            if let Some(first) = property.media.first_mut() {
                first.is_primary = true;
            }
        }
        property.updated_at = Utc::now();
        Ok(self.properties.update(property)?)
    }

    pub fn set_flag(
        &self,
        id: &PropertyId,
        flag: PropertyFlag,
        enabled: bool,
    ) -> Result<Property, ServiceError> {
        let mut property = self.get(id)?;
        let changed = if enabled {
            property.flags.insert(flag)
        } else {
            property.flags.remove(&flag)
        };
        if !changed {
            return Ok(property);
        }
        property.updated_at = Utc::now();
        Ok(self.properties.update(property)?)
    }

    pub fn record_view(&self, id: &PropertyId) -> Result<u64, ServiceError> {
        self.bump(id, Counter::Views)
    }

    pub fn record_inquiry(&self, id: &PropertyId) -> Result<u64, ServiceError> {
        self.bump(id, Counter::Inquiries)
    }

    fn bump(&self, id: &PropertyId, counter: Counter) -> Result<u64, ServiceError> {
        match self.properties.adjust_counter(id, counter, 1) {
            Ok(property) => Ok(property.counter(counter)),
            Err(RepositoryError::NotFound) => Err(property_not_found()),
            Err(other) => Err(other.into()),
        }
    }

    pub fn approve(&self, admin: &AdminId, id: &PropertyId) -> Result<Property, ServiceError> {
        let mut property = self.get(id)?;
        let now = Utc::now();
        property.admin_approved = true;
        property.approved_by = Some(admin.clone());
        property.approved_at = Some(now);
        property.rejection_reason = None;
        property.updated_at = now;
        let property = self.properties.update(property)?;

        self.notifications.notify_quietly(
            NewNotification::system(
                Recipient::builder(&property.builder_id),
                NotificationType::PropertyApproved,
                "Property approved",
                format!("{} is now live on Zuhaush.", property.name),
            )
            .with_action(format!("/properties/{}", property.slug)),
        );
        info!(property = %property.id, admin = %admin, "property approved");
        Ok(property)
    }

    pub fn reject(
        &self,
        admin: &AdminId,
        id: &PropertyId,
        reason: &str,
    ) -> Result<Property, ServiceError> {
        let reason = required_text("Rejection reason", reason, 1000)?;
        let mut property = self.get(id)?;
        property.admin_approved = false;
        property.approved_by = None;
        property.approved_at = None;
        property.rejection_reason = Some(reason.clone());
        property.updated_at = Utc::now();
        let property = self.properties.update(property)?;

        self.notifications.notify_quietly(NewNotification::system(
            Recipient::builder(&property.builder_id),
            NotificationType::PropertyRejected,
            "Property rejected",
            format!("{} was not approved: {reason}", property.name),
        ));
        info!(property = %property.id, admin = %admin, "property rejected");
        Ok(property)
    }

    pub fn builder_stats(&self, builder: &BuilderId) -> Result<PropertyStats, ServiceError> {
        let filter = PropertyFilter {
            builder_id: Some(builder.clone()),
            ..PropertyFilter::default()
        };
        let mut stats = PropertyStats::default();
        for property in self.properties.list(&filter)? {
            stats.total += 1;
            if property.admin_approved {
                stats.approved += 1;
            } else {
                stats.pending_approval += 1;
            }
            *stats.by_status.entry(property.status).or_default() += 1;
            stats.views += property.views;
            stats.inquiries += property.inquiries;
            stats.likes += property.likes;
        }
        Ok(stats)
    }
}
