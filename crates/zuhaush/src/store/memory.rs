//! In-process repositories. Every table sits behind its own mutex and every uniqueness rule
//! is checked while that lock is held.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, NaiveDate, Utc};

use super::{lock, RepositoryError};
use crate::accounts::admins::{Admin, AdminId, AdminRepository};
use crate::accounts::builders::{Builder, BuilderFilter, BuilderId, BuilderRepository};
use crate::accounts::users::{User, UserFilter, UserId, UserRepository};
use crate::auth::{Audience, OtpThrottle, StoredToken, TokenKind, TokenRepository};
use crate::catalog::{Counter, Property, PropertyFilter, PropertyId, PropertyRepository};
use crate::chat::{Message, MessageRepository};
use crate::cities::{City, CityId, CityRepository};
use crate::engagement::{
    Comment, CommentFilter, CommentId, CommentRepository, Like, LikeId, LikeRepository,
    PropertyView, PropertyViewRepository,
};
use crate::notifications::{Notification, NotificationId, NotificationRepository, Recipient};
use crate::visits::{TimeSlot, Visit, VisitFilter, VisitId, VisitRepository};

fn conflict(message: &str) -> RepositoryError {
    RepositoryError::Conflict(message.to_string())
}

#[derive(Default, Clone)]
pub struct MemoryUserRepository {
    records: Arc<Mutex<HashMap<UserId, User>>>,
}

impl MemoryUserRepository {
    fn email_in_use(records: &HashMap<UserId, User>, user: &User) -> bool {
        records
            .values()
            .any(|other| other.id != user.id && other.email == user.email)
    }
}

impl UserRepository for MemoryUserRepository {
    fn insert(&self, user: User) -> Result<User, RepositoryError> {
        let mut guard = lock(&self.records)?;
        if guard.contains_key(&user.id) || Self::email_in_use(&guard, &user) {
            return Err(conflict("email already registered"));
        }
        guard.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    fn update(&self, user: User) -> Result<User, RepositoryError> {
        let mut guard = lock(&self.records)?;
        if !guard.contains_key(&user.id) {
            return Err(RepositoryError::NotFound);
        }
        if Self::email_in_use(&guard, &user) {
            return Err(conflict("email already registered"));
        }
        guard.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    fn fetch(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        Ok(lock(&self.records)?.get(id).cloned())
    }

    fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        Ok(lock(&self.records)?
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    fn list(&self, filter: &UserFilter) -> Result<Vec<User>, RepositoryError> {
        let mut users: Vec<User> = lock(&self.records)?
            .values()
            .filter(|user| filter.matches(user))
            .cloned()
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    fn delete(&self, id: &UserId) -> Result<bool, RepositoryError> {
        Ok(lock(&self.records)?.remove(id).is_some())
    }
}

#[derive(Default, Clone)]
pub struct MemoryBuilderRepository {
    records: Arc<Mutex<HashMap<BuilderId, Builder>>>,
}

impl MemoryBuilderRepository {
    /// Account e-mails and team member e-mails share one namespace across all builders.
    fn check_unique(records: &HashMap<BuilderId, Builder>, builder: &Builder) -> Result<(), RepositoryError> {
        let mut own = Vec::with_capacity(builder.team_members.len() + 1);
        own.push(builder.email.as_str());
        for member in &builder.team_members {
            if own.contains(&member.email.as_str()) {
                return Err(conflict("team member email already in use"));
            }
            own.push(member.email.as_str());
        }

        for other in records.values().filter(|other| other.id != builder.id) {
            if own.contains(&other.email.as_str()) {
                return Err(conflict("email already registered"));
            }
            if other
                .team_members
                .iter()
                .any(|member| own.contains(&member.email.as_str()))
            {
                return Err(conflict("team member email already in use"));
            }
        }
        Ok(())
    }
}

impl BuilderRepository for MemoryBuilderRepository {
    fn insert(&self, builder: Builder) -> Result<Builder, RepositoryError> {
        let mut guard = lock(&self.records)?;
        if guard.contains_key(&builder.id) {
            return Err(conflict("builder already exists"));
        }
        Self::check_unique(&guard, &builder)?;
        guard.insert(builder.id.clone(), builder.clone());
        Ok(builder)
    }

    fn update(&self, builder: Builder) -> Result<Builder, RepositoryError> {
        let mut guard = lock(&self.records)?;
        if !guard.contains_key(&builder.id) {
            return Err(RepositoryError::NotFound);
        }
        Self::check_unique(&guard, &builder)?;
        guard.insert(builder.id.clone(), builder.clone());
        Ok(builder)
    }

    fn fetch(&self, id: &BuilderId) -> Result<Option<Builder>, RepositoryError> {
        Ok(lock(&self.records)?.get(id).cloned())
    }

    fn find_by_email(&self, email: &str) -> Result<Option<Builder>, RepositoryError> {
        Ok(lock(&self.records)?
            .values()
            .find(|builder| builder.email == email)
            .cloned())
    }

    fn find_by_member_email(&self, email: &str) -> Result<Option<Builder>, RepositoryError> {
        Ok(lock(&self.records)?
            .values()
            .find(|builder| builder.team_members.iter().any(|member| member.email == email))
            .cloned())
    }

    fn list(&self, filter: &BuilderFilter) -> Result<Vec<Builder>, RepositoryError> {
        let mut builders: Vec<Builder> = lock(&self.records)?
            .values()
            .filter(|builder| filter.matches(builder))
            .cloned()
            .collect();
        builders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(builders)
    }

    fn delete(&self, id: &BuilderId) -> Result<bool, RepositoryError> {
        Ok(lock(&self.records)?.remove(id).is_some())
    }
}

#[derive(Default, Clone)]
pub struct MemoryAdminRepository {
    records: Arc<Mutex<HashMap<AdminId, Admin>>>,
}

impl AdminRepository for MemoryAdminRepository {
    fn insert(&self, admin: Admin) -> Result<Admin, RepositoryError> {
        let mut guard = lock(&self.records)?;
        if guard.contains_key(&admin.id) || guard.values().any(|other| other.email == admin.email) {
            return Err(conflict("email already registered"));
        }
        guard.insert(admin.id.clone(), admin.clone());
        Ok(admin)
    }

    fn update(&self, admin: Admin) -> Result<Admin, RepositoryError> {
        let mut guard = lock(&self.records)?;
        if !guard.contains_key(&admin.id) {
            return Err(RepositoryError::NotFound);
        }
        if guard
            .values()
            .any(|other| other.id != admin.id && other.email == admin.email)
        {
            return Err(conflict("email already registered"));
        }
        guard.insert(admin.id.clone(), admin.clone());
        Ok(admin)
    }

    fn fetch(&self, id: &AdminId) -> Result<Option<Admin>, RepositoryError> {
        Ok(lock(&self.records)?.get(id).cloned())
    }

    fn find_by_email(&self, email: &str) -> Result<Option<Admin>, RepositoryError> {
        Ok(lock(&self.records)?
            .values()
            .find(|admin| admin.email == email)
            .cloned())
    }

    fn list(&self) -> Result<Vec<Admin>, RepositoryError> {
        let mut admins: Vec<Admin> = lock(&self.records)?.values().cloned().collect();
        admins.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(admins)
    }

    fn delete(&self, id: &AdminId) -> Result<bool, RepositoryError> {
        Ok(lock(&self.records)?.remove(id).is_some())
    }
}

#[derive(Default, Clone)]
pub struct MemoryPropertyRepository {
    records: Arc<Mutex<HashMap<PropertyId, Property>>>,
}

impl PropertyRepository for MemoryPropertyRepository {
    fn insert(&self, property: Property) -> Result<Property, RepositoryError> {
        let mut guard = lock(&self.records)?;
        if guard.contains_key(&property.id) || guard.values().any(|other| other.slug == property.slug) {
            return Err(conflict("slug already in use"));
        }
        guard.insert(property.id.clone(), property.clone());
        Ok(property)
    }

    fn update(&self, mut property: Property) -> Result<Property, RepositoryError> {
        let mut guard = lock(&self.records)?;
        let stored = guard.get(&property.id).ok_or(RepositoryError::NotFound)?;
        // Counters only move through `adjust_counter`.
        property.views = stored.views;
        property.inquiries = stored.inquiries;
        property.likes = stored.likes;
        if guard
            .values()
            .any(|other| other.id != property.id && other.slug == property.slug)
        {
            return Err(conflict("slug already in use"));
        }
        guard.insert(property.id.clone(), property.clone());
        Ok(property)
    }

    fn fetch(&self, id: &PropertyId) -> Result<Option<Property>, RepositoryError> {
        Ok(lock(&self.records)?.get(id).cloned())
    }

    fn find_by_slug(&self, slug: &str) -> Result<Option<Property>, RepositoryError> {
        Ok(lock(&self.records)?
            .values()
            .find(|property| property.slug == slug)
            .cloned())
    }

    fn list(&self, filter: &PropertyFilter) -> Result<Vec<Property>, RepositoryError> {
        let mut properties: Vec<Property> = lock(&self.records)?
            .values()
            .filter(|property| filter.matches(property))
            .cloned()
            .collect();
        properties.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(properties)
    }

    fn delete(&self, id: &PropertyId) -> Result<bool, RepositoryError> {
        Ok(lock(&self.records)?.remove(id).is_some())
    }

    fn adjust_counter(
        &self,
        id: &PropertyId,
        counter: Counter,
        delta: i64,
    ) -> Result<Property, RepositoryError> {
        let mut guard = lock(&self.records)?;
        let property = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        property.adjust(counter, delta);
        Ok(property.clone())
    }
}

#[derive(Default, Clone)]
pub struct MemoryVisitRepository {
    records: Arc<Mutex<HashMap<VisitId, Visit>>>,
}

impl MemoryVisitRepository {
    fn holder<'a>(
        records: &'a HashMap<VisitId, Visit>,
        property: &PropertyId,
        date: NaiveDate,
        time: TimeSlot,
        exclude: Option<&VisitId>,
    ) -> Option<&'a Visit> {
        records.values().find(|visit| {
            Some(&visit.id) != exclude
                && visit.status.is_active()
                && visit.same_slot(property, date, time)
        })
    }

    fn check_slot(records: &HashMap<VisitId, Visit>, visit: &Visit) -> Result<(), RepositoryError> {
        if visit.status.is_active()
            && Self::holder(records, &visit.property_id, visit.date, visit.time, Some(&visit.id))
                .is_some()
        {
            return Err(conflict("time slot already booked"));
        }
        Ok(())
    }
}

impl VisitRepository for MemoryVisitRepository {
    fn insert(&self, visit: Visit) -> Result<Visit, RepositoryError> {
        let mut guard = lock(&self.records)?;
        if guard.contains_key(&visit.id) {
            return Err(conflict("visit already exists"));
        }
        Self::check_slot(&guard, &visit)?;
        guard.insert(visit.id.clone(), visit.clone());
        Ok(visit)
    }

    fn update(&self, visit: Visit) -> Result<Visit, RepositoryError> {
        let mut guard = lock(&self.records)?;
        if !guard.contains_key(&visit.id) {
            return Err(RepositoryError::NotFound);
        }
        Self::check_slot(&guard, &visit)?;
        guard.insert(visit.id.clone(), visit.clone());
        Ok(visit)
    }

    fn fetch(&self, id: &VisitId) -> Result<Option<Visit>, RepositoryError> {
        Ok(lock(&self.records)?.get(id).cloned())
    }

    fn list(&self, filter: &VisitFilter) -> Result<Vec<Visit>, RepositoryError> {
        let mut visits: Vec<Visit> = lock(&self.records)?
            .values()
            .filter(|visit| filter.matches(visit))
            .cloned()
            .collect();
        visits.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(visits)
    }

    fn delete(&self, id: &VisitId) -> Result<bool, RepositoryError> {
        Ok(lock(&self.records)?.remove(id).is_some())
    }

    fn slot_holder(
        &self,
        property: &PropertyId,
        date: NaiveDate,
        time: TimeSlot,
        exclude: Option<&VisitId>,
    ) -> Result<Option<Visit>, RepositoryError> {
        let guard = lock(&self.records)?;
        Ok(Self::holder(&guard, property, date, time, exclude).cloned())
    }
}

#[derive(Default, Clone)]
pub struct MemoryLikeRepository {
    records: Arc<Mutex<HashMap<LikeId, Like>>>,
}

impl LikeRepository for MemoryLikeRepository {
    fn insert(&self, like: Like) -> Result<Like, RepositoryError> {
        let mut guard = lock(&self.records)?;
        if guard.values().any(|other| {
            other.user_id == like.user_id && other.property_id == like.property_id
        }) {
            return Err(conflict("property already liked"));
        }
        guard.insert(like.id.clone(), like.clone());
        Ok(like)
    }

    fn find(&self, user: &UserId, property: &PropertyId) -> Result<Option<Like>, RepositoryError> {
        Ok(lock(&self.records)?
            .values()
            .find(|like| &like.user_id == user && &like.property_id == property)
            .cloned())
    }

    fn delete(&self, id: &LikeId) -> Result<bool, RepositoryError> {
        Ok(lock(&self.records)?.remove(id).is_some())
    }

    fn for_property(&self, property: &PropertyId) -> Result<Vec<Like>, RepositoryError> {
        Ok(lock(&self.records)?
            .values()
            .filter(|like| &like.property_id == property)
            .cloned()
            .collect())
    }

    fn for_user(&self, user: &UserId) -> Result<Vec<Like>, RepositoryError> {
        Ok(lock(&self.records)?
            .values()
            .filter(|like| &like.user_id == user)
            .cloned()
            .collect())
    }
}

#[derive(Default, Clone)]
pub struct MemoryCommentRepository {
    records: Arc<Mutex<HashMap<CommentId, Comment>>>,
}

impl CommentRepository for MemoryCommentRepository {
    fn insert(&self, comment: Comment) -> Result<Comment, RepositoryError> {
        let mut guard = lock(&self.records)?;
        if guard.contains_key(&comment.id) {
            return Err(conflict("comment already exists"));
        }
        guard.insert(comment.id.clone(), comment.clone());
        Ok(comment)
    }

    fn update(&self, comment: Comment) -> Result<Comment, RepositoryError> {
        let mut guard = lock(&self.records)?;
        match guard.get_mut(&comment.id) {
            Some(slot) => {
                *slot = comment.clone();
                Ok(comment)
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: &CommentId) -> Result<Option<Comment>, RepositoryError> {
        Ok(lock(&self.records)?.get(id).cloned())
    }

    fn list(&self, filter: &CommentFilter) -> Result<Vec<Comment>, RepositoryError> {
        Ok(lock(&self.records)?
            .values()
            .filter(|comment| filter.matches(comment))
            .cloned()
            .collect())
    }
}

#[derive(Default, Clone)]
pub struct MemoryPropertyViewRepository {
    records: Arc<Mutex<Vec<PropertyView>>>,
}

impl PropertyViewRepository for MemoryPropertyViewRepository {
    fn insert(&self, view: PropertyView) -> Result<PropertyView, RepositoryError> {
        lock(&self.records)?.push(view.clone());
        Ok(view)
    }

    fn for_user(&self, user: &UserId) -> Result<Vec<PropertyView>, RepositoryError> {
        Ok(lock(&self.records)?
            .iter()
            .filter(|view| &view.user_id == user)
            .cloned()
            .collect())
    }
}

#[derive(Default, Clone)]
pub struct MemoryMessageRepository {
    records: Arc<Mutex<Vec<Message>>>,
}

impl MemoryMessageRepository {
    fn select(&self, keep: impl Fn(&Message) -> bool) -> Result<Vec<Message>, RepositoryError> {
        Ok(lock(&self.records)?
            .iter()
            .filter(|message| keep(message))
            .cloned()
            .collect())
    }
}

impl MessageRepository for MemoryMessageRepository {
    fn insert(&self, message: Message) -> Result<Message, RepositoryError> {
        lock(&self.records)?.push(message.clone());
        Ok(message)
    }

    fn between(&self, user: &UserId, builder: &BuilderId) -> Result<Vec<Message>, RepositoryError> {
        self.select(|message| &message.user_id == user && &message.builder_id == builder)
    }

    fn for_user(&self, user: &UserId) -> Result<Vec<Message>, RepositoryError> {
        self.select(|message| &message.user_id == user)
    }

    fn for_builder(&self, builder: &BuilderId) -> Result<Vec<Message>, RepositoryError> {
        self.select(|message| &message.builder_id == builder)
    }
}

#[derive(Default, Clone)]
pub struct MemoryNotificationRepository {
    records: Arc<Mutex<HashMap<NotificationId, Notification>>>,
}

impl NotificationRepository for MemoryNotificationRepository {
    fn insert(&self, notification: Notification) -> Result<Notification, RepositoryError> {
        let mut guard = lock(&self.records)?;
        if guard.contains_key(&notification.id) {
            return Err(conflict("notification already exists"));
        }
        guard.insert(notification.id.clone(), notification.clone());
        Ok(notification)
    }

    fn update(&self, notification: Notification) -> Result<Notification, RepositoryError> {
        let mut guard = lock(&self.records)?;
        match guard.get_mut(&notification.id) {
            Some(slot) => {
                *slot = notification.clone();
                Ok(notification)
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: &NotificationId) -> Result<Option<Notification>, RepositoryError> {
        Ok(lock(&self.records)?.get(id).cloned())
    }

    fn for_recipient(&self, recipient: &Recipient) -> Result<Vec<Notification>, RepositoryError> {
        let mut notifications: Vec<Notification> = lock(&self.records)?
            .values()
            .filter(|notification| &notification.recipient == recipient)
            .cloned()
            .collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notifications)
    }

    fn mark_all_read(
        &self,
        recipient: &Recipient,
        now: DateTime<Utc>,
    ) -> Result<usize, RepositoryError> {
        let mut guard = lock(&self.records)?;
        let mut changed = 0;
        for notification in guard
            .values_mut()
            .filter(|notification| &notification.recipient == recipient && !notification.is_read)
        {
            notification.is_read = true;
            notification.read_at = Some(now);
            changed += 1;
        }
        Ok(changed)
    }

    fn delete(&self, id: &NotificationId) -> Result<bool, RepositoryError> {
        Ok(lock(&self.records)?.remove(id).is_some())
    }

    fn delete_for_recipient(&self, recipient: &Recipient) -> Result<usize, RepositoryError> {
        let mut guard = lock(&self.records)?;
        let before = guard.len();
        guard.retain(|_, notification| &notification.recipient != recipient);
        Ok(before - guard.len())
    }

    fn all(&self) -> Result<Vec<Notification>, RepositoryError> {
        Ok(lock(&self.records)?.values().cloned().collect())
    }
}

#[derive(Default, Clone)]
pub struct MemoryCityRepository {
    records: Arc<Mutex<HashMap<CityId, City>>>,
}

impl MemoryCityRepository {
    fn name_in_use(records: &HashMap<CityId, City>, city: &City) -> bool {
        let key = City::name_key(&city.name);
        records
            .values()
            .any(|other| other.id != city.id && City::name_key(&other.name) == key)
    }
}

impl CityRepository for MemoryCityRepository {
    fn insert(&self, city: City) -> Result<City, RepositoryError> {
        let mut guard = lock(&self.records)?;
        if guard.contains_key(&city.id) || Self::name_in_use(&guard, &city) {
            return Err(conflict("city name already taken"));
        }
        guard.insert(city.id.clone(), city.clone());
        Ok(city)
    }

    fn update(&self, city: City) -> Result<City, RepositoryError> {
        let mut guard = lock(&self.records)?;
        if !guard.contains_key(&city.id) {
            return Err(RepositoryError::NotFound);
        }
        if Self::name_in_use(&guard, &city) {
            return Err(conflict("city name already taken"));
        }
        guard.insert(city.id.clone(), city.clone());
        Ok(city)
    }

    fn fetch(&self, id: &CityId) -> Result<Option<City>, RepositoryError> {
        Ok(lock(&self.records)?.get(id).cloned())
    }

    fn list(&self) -> Result<Vec<City>, RepositoryError> {
        Ok(lock(&self.records)?.values().cloned().collect())
    }

    fn delete(&self, id: &CityId) -> Result<bool, RepositoryError> {
        Ok(lock(&self.records)?.remove(id).is_some())
    }
}

/// Refresh and one-time-code tokens in insertion order.
#[derive(Default, Clone)]
pub struct MemoryTokenRepository {
    records: Arc<Mutex<Vec<StoredToken>>>,
}

impl TokenRepository for MemoryTokenRepository {
    fn save(&self, token: StoredToken) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.records)?;
        // Expired or consumed rows can never be presented again.
        guard.retain(|existing| existing.is_usable(token.created_at));
        if guard.iter().any(|existing| existing.token == token.token) {
            return Err(conflict("token already stored"));
        }
        guard.push(token);
        Ok(())
    }

    fn find(&self, token: &str) -> Result<Option<StoredToken>, RepositoryError> {
        Ok(lock(&self.records)?
            .iter()
            .find(|stored| stored.token == token)
            .cloned())
    }

    fn latest_usable(
        &self,
        audience: Audience,
        subject: &str,
        kind: TokenKind,
        now: DateTime<Utc>,
    ) -> Result<Option<StoredToken>, RepositoryError> {
        Ok(lock(&self.records)?
            .iter()
            .rev()
            .find(|stored| {
                stored.audience == audience
                    && stored.subject == subject
                    && stored.kind == kind
                    && stored.is_usable(now)
            })
            .cloned())
    }

    fn blacklist(&self, token: &str) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.records)?;
        let stored = guard
            .iter_mut()
            .find(|stored| stored.token == token)
            .ok_or(RepositoryError::NotFound)?;
        stored.blacklisted = true;
        Ok(())
    }

    fn remove(&self, token: &str) -> Result<bool, RepositoryError> {
        let mut guard = lock(&self.records)?;
        let before = guard.len();
        guard.retain(|stored| stored.token != token);
        Ok(guard.len() != before)
    }

    fn revoke_all(
        &self,
        audience: Audience,
        subject: &str,
        kind: TokenKind,
    ) -> Result<usize, RepositoryError> {
        let mut guard = lock(&self.records)?;
        let mut changed = 0;
        for stored in guard.iter_mut().filter(|stored| {
            stored.audience == audience
                && stored.subject == subject
                && stored.kind == kind
                && !stored.blacklisted
        }) {
            stored.blacklisted = true;
            changed += 1;
        }
        Ok(changed)
    }
}

/// Sliding-window counters for OTP sends and failed verifications.
#[derive(Default, Clone)]
pub struct MemoryOtpThrottle {
    requests: Arc<Mutex<HashMap<String, Vec<DateTime<Utc>>>>>,
    failures: Arc<Mutex<HashMap<String, Vec<DateTime<Utc>>>>>,
}

fn within(events: &mut Vec<DateTime<Utc>>, now: DateTime<Utc>, window: Duration) {
    let cutoff = now - window;
    events.retain(|at| *at > cutoff);
}

/// Drop every key whose events all fell out of the window.
fn sweep(counters: &mut HashMap<String, Vec<DateTime<Utc>>>, now: DateTime<Utc>, window: Duration) {
    counters.retain(|_, events| {
        within(events, now, window);
        !events.is_empty()
    });
}

impl OtpThrottle for MemoryOtpThrottle {
    fn register_request(
        &self,
        key: &str,
        now: DateTime<Utc>,
        window: Duration,
        limit: u32,
    ) -> Result<bool, RepositoryError> {
        let mut guard = lock(&self.requests)?;
        sweep(&mut guard, now, window);
        let events = guard.entry(key.to_string()).or_default();
        if events.len() >= limit as usize {
            return Ok(false);
        }
        events.push(now);
        Ok(true)
    }

    fn failures(
        &self,
        key: &str,
        now: DateTime<Utc>,
        window: Duration,
    ) -> Result<u32, RepositoryError> {
        let mut guard = lock(&self.failures)?;
        sweep(&mut guard, now, window);
        Ok(guard.get(key).map_or(0, |events| events.len() as u32))
    }

    fn record_failure(
        &self,
        key: &str,
        now: DateTime<Utc>,
        window: Duration,
    ) -> Result<u32, RepositoryError> {
        let mut guard = lock(&self.failures)?;
        sweep(&mut guard, now, window);
        let events = guard.entry(key.to_string()).or_default();
        events.push(now);
        Ok(events.len() as u32)
    }

    fn clear_failures(&self, key: &str) -> Result<(), RepositoryError> {
        lock(&self.failures)?.remove(key);
        Ok(())
    }
}

/// One instance of every in-memory table, cloned cheaply into the services.
#[derive(Default, Clone)]
pub struct MemoryStore {
    pub users: MemoryUserRepository,
    pub builders: MemoryBuilderRepository,
    pub admins: MemoryAdminRepository,
    pub properties: MemoryPropertyRepository,
    pub visits: MemoryVisitRepository,
    pub likes: MemoryLikeRepository,
    pub comments: MemoryCommentRepository,
    pub views: MemoryPropertyViewRepository,
    pub messages: MemoryMessageRepository,
    pub notifications: MemoryNotificationRepository,
    pub cities: MemoryCityRepository,
    pub tokens: MemoryTokenRepository,
    pub otp_throttle: MemoryOtpThrottle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throttle_allows_limit_requests_per_window() {
        let throttle = MemoryOtpThrottle::default();
        let now = Utc::now();
        let window = Duration::hours(1);

        for _ in 0..5 {
            assert!(throttle
                .register_request("user:a@example.com", now, window, 5)
                .expect("store"));
        }
        assert!(!throttle
            .register_request("user:a@example.com", now, window, 5)
            .expect("store"));
        assert!(throttle
            .register_request("user:a@example.com", now + Duration::minutes(61), window, 5)
            .expect("store"));
    }

    #[test]
    fn failures_expire_with_the_window() {
        let throttle = MemoryOtpThrottle::default();
        let now = Utc::now();
        let window = Duration::hours(1);

        throttle.record_failure("k", now, window).expect("store");
        throttle.record_failure("k", now, window).expect("store");
        assert_eq!(throttle.failures("k", now, window).expect("store"), 2);
        assert_eq!(
            throttle
                .failures("k", now + Duration::minutes(90), window)
                .expect("store"),
            0
        );

        throttle.record_failure("k", now, window).expect("store");
        throttle.clear_failures("k").expect("store");
        assert_eq!(throttle.failures("k", now, window).expect("store"), 0);
    }

    #[test]
    fn likes_are_unique_per_user_and_property() {
        let likes = MemoryLikeRepository::default();
        let user = UserId::from("u1");
        let property = PropertyId::from("p1");

        likes
            .insert(Like::new(user.clone(), property.clone()))
            .expect("first like");
        let second = likes.insert(Like::new(user.clone(), property.clone()));
        assert!(matches!(second, Err(RepositoryError::Conflict(_))));
        assert_eq!(likes.for_property(&property).expect("list").len(), 1);
    }

    #[test]
    fn saving_drops_expired_and_consumed_tokens() {
        let tokens = MemoryTokenRepository::default();
        let start = Utc::now();
        for index in 0..1000 {
            tokens
                .save(StoredToken {
                    token: format!("old-{index}"),
                    audience: Audience::User,
                    subject: "u1".to_string(),
                    kind: TokenKind::LoginOtp,
                    expires_at: start + Duration::minutes(10),
                    blacklisted: false,
                    created_at: start,
                })
                .expect("save");
            if index % 2 == 0 {
                tokens.blacklist(&format!("old-{index}")).expect("blacklist");
            }
        }

        let later = start + Duration::minutes(11);
        tokens
            .save(StoredToken {
                token: "fresh".to_string(),
                audience: Audience::User,
                subject: "u1".to_string(),
                kind: TokenKind::Refresh,
                expires_at: later + Duration::days(1),
                blacklisted: false,
                created_at: later,
            })
            .expect("save");

        assert_eq!(lock(&tokens.records).expect("lock").len(), 1);
        assert!(tokens.find("old-1").expect("find").is_none());
        assert!(tokens.find("fresh").expect("find").is_some());
    }

    #[test]
    fn throttle_forgets_idle_keys() {
        let throttle = MemoryOtpThrottle::default();
        let now = Utc::now();
        let window = Duration::hours(1);

        for index in 0..50 {
            let key = format!("user:{index}@example.com");
            throttle.register_request(&key, now, window, 5).expect("store");
            throttle.record_failure(&key, now, window).expect("store");
        }

        let later = now + Duration::minutes(61);
        throttle
            .register_request("user:new@example.com", later, window, 5)
            .expect("store");
        assert_eq!(
            throttle.failures("user:0@example.com", later, window).expect("store"),
            0
        );
        assert_eq!(lock(&throttle.requests).expect("lock").len(), 1);
        assert!(lock(&throttle.failures).expect("lock").is_empty());
    }

    #[test]
    fn revoke_all_only_touches_matching_tokens() {
        let tokens = MemoryTokenRepository::default();
        let now = Utc::now();
        let stored = |token: &str, subject: &str| StoredToken {
            token: token.to_string(),
            audience: Audience::User,
            subject: subject.to_string(),
            kind: TokenKind::Refresh,
            expires_at: now + Duration::days(1),
            blacklisted: false,
            created_at: now,
        };
        tokens.save(stored("t1", "u1")).expect("save");
        tokens.save(stored("t2", "u1")).expect("save");
        tokens.save(stored("t3", "u2")).expect("save");

        assert_eq!(
            tokens
                .revoke_all(Audience::User, "u1", TokenKind::Refresh)
                .expect("revoke"),
            2
        );
        let survivor = tokens
            .latest_usable(Audience::User, "u2", TokenKind::Refresh, now)
            .expect("lookup");
        assert_eq!(survivor.map(|token| token.token).as_deref(), Some("t3"));
    }
}
