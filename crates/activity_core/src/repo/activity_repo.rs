//! In-memory activity repository.
//!
//! # Responsibility
//! - Own the activity collection seeded from one `SeedSnapshot`.
//! - Serve CRUD, contact/deal/email queries and the fixed type list.
//! - Await the injected latency hook before every operation.
//!
//! # Invariants
//! - New ids are `max(existing ids, 0) + 1`.
//! - Stored ids never change; update payloads cannot touch them.
//! - Ordered reads sort by `date` descending; ties keep storage order.
//! - Callers only ever receive clones, never references into storage.
//! - Each operation reads/writes the collection under one lock acquisition,
//!   taken after the latency pause.

use crate::clock::{Clock, SystemClock};
use crate::latency::{Latency, Operation, SimulatedLatency};
use crate::model::activity::{
    Activity, ActivityId, ActivityParseError, ActivityPatch, ActivityType, ContactId, DealId,
    EmailActivityRequest, EmailDirection, NewActivity,
};
use crate::seed::SeedSnapshot;
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Limit applied by `list_recent` when the caller passes none.
pub const RECENT_DEFAULT_LIMIT: i64 = 10;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for activity operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoError {
    /// No stored activity has this id.
    NotFound(ActivityId),
    /// Caller input rejected at the boundary (malformed id, unknown enum value).
    InvalidArgument(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "Activity not found: {id}"),
            Self::InvalidArgument(message) => write!(f, "invalid argument: {message}"),
        }
    }
}

impl Error for RepoError {}

impl From<ActivityParseError> for RepoError {
    fn from(value: ActivityParseError) -> Self {
        Self::InvalidArgument(value.to_string())
    }
}

/// Parses a raw activity id at the call boundary.
pub fn parse_activity_id(raw: &str) -> RepoResult<ActivityId> {
    Ok(raw.parse()?)
}

/// Parses a raw contact id at the call boundary.
pub fn parse_contact_id(raw: &str) -> RepoResult<ContactId> {
    Ok(raw.parse()?)
}

/// Parses a raw deal id at the call boundary.
pub fn parse_deal_id(raw: &str) -> RepoResult<DealId> {
    Ok(raw.parse()?)
}

/// Explicitly constructed activity store.
///
/// One instance per composition root; share it behind an `Arc` when several
/// callers need it.
pub struct ActivityRepository {
    activities: RwLock<Vec<Activity>>,
    types: Vec<ActivityType>,
    latency: Arc<dyn Latency>,
    clock: Arc<dyn Clock>,
}

impl ActivityRepository {
    /// Creates a repository over a copy of `seed` with default latency and
    /// the system clock.
    pub fn new(seed: &SeedSnapshot) -> Self {
        info!(
            "event=repo_init module=repo status=ok seeded={}",
            seed.len()
        );
        Self {
            activities: RwLock::new(seed.activities().to_vec()),
            types: ActivityType::ALL.to_vec(),
            latency: Arc::new(SimulatedLatency::default()),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the latency hook.
    pub fn with_latency(mut self, latency: impl Latency + 'static) -> Self {
        self.latency = Arc::new(latency);
        self
    }

    /// Replaces the clock used for defaulted dates.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Returns every activity, newest first.
    pub async fn list_all(&self) -> Vec<Activity> {
        self.latency.pause(Operation::ListAll).await;
        let activities = self.activities.read().await;
        newest_first(activities.iter())
    }

    /// Returns one activity by id.
    ///
    /// # Errors
    /// - `RepoError::NotFound` when no record has `id`.
    pub async fn get_by_id(&self, id: ActivityId) -> RepoResult<Activity> {
        self.latency.pause(Operation::GetById).await;
        let activities = self.activities.read().await;
        activities
            .iter()
            .find(|activity| activity.id == id)
            .cloned()
            .ok_or_else(|| not_found(Operation::GetById, id))
    }

    /// Returns activities linked to one contact, newest first.
    pub async fn list_by_contact(&self, contact_id: ContactId) -> Vec<Activity> {
        self.latency.pause(Operation::ListByContact).await;
        let activities = self.activities.read().await;
        newest_first(
            activities
                .iter()
                .filter(|activity| activity.contact_id == Some(contact_id)),
        )
    }

    /// Returns activities linked to one deal, newest first.
    pub async fn list_by_deal(&self, deal_id: DealId) -> Vec<Activity> {
        self.latency.pause(Operation::ListByDeal).await;
        let activities = self.activities.read().await;
        newest_first(
            activities
                .iter()
                .filter(|activity| activity.deal_id == Some(deal_id)),
        )
    }

    /// Stores a new activity and returns the stored record.
    ///
    /// # Contract
    /// - Assigns `max(existing ids, 0) + 1`.
    /// - Uses the injected clock when the payload has no `date`.
    pub async fn create(&self, payload: NewActivity) -> Activity {
        self.latency.pause(Operation::Create).await;
        self.insert(payload).await
    }

    /// Merges `patch` into the stored record and returns the result.
    ///
    /// The record keeps its id and its position in storage.
    ///
    /// # Errors
    /// - `RepoError::NotFound` when no record has `id`.
    pub async fn update(&self, id: ActivityId, patch: ActivityPatch) -> RepoResult<Activity> {
        self.latency.pause(Operation::Update).await;
        let mut activities = self.activities.write().await;
        let stored = activities
            .iter_mut()
            .find(|activity| activity.id == id)
            .ok_or_else(|| not_found(Operation::Update, id))?;

        stored.apply_patch(patch);
        info!("event=activity_update module=repo status=ok id={id}");
        Ok(stored.clone())
    }

    /// Removes one activity and returns it.
    ///
    /// # Errors
    /// - `RepoError::NotFound` when no record has `id`.
    pub async fn delete(&self, id: ActivityId) -> RepoResult<Activity> {
        self.latency.pause(Operation::Delete).await;
        let mut activities = self.activities.write().await;
        let index = activities
            .iter()
            .position(|activity| activity.id == id)
            .ok_or_else(|| not_found(Operation::Delete, id))?;

        let removed = activities.remove(index);
        info!(
            "event=activity_delete module=repo status=ok id={id} remaining={}",
            activities.len()
        );
        Ok(removed)
    }

    /// Returns the fixed activity type set.
    pub async fn list_types(&self) -> Vec<ActivityType> {
        self.latency.pause(Operation::ListTypes).await;
        self.types.clone()
    }

    /// Returns the newest activities, at most `limit` (default 10).
    ///
    /// A non-positive limit yields an empty list.
    pub async fn list_recent(&self, limit: Option<i64>) -> Vec<Activity> {
        self.latency.pause(Operation::ListRecent).await;
        let limit = limit.unwrap_or(RECENT_DEFAULT_LIMIT);
        if limit <= 0 {
            return Vec::new();
        }
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);

        let activities = self.activities.read().await;
        let mut recent = newest_first(activities.iter());
        recent.truncate(limit);
        recent
    }

    /// Logs one email as an `email` activity.
    ///
    /// Notes default to an empty string, duration is always 0, and the record
    /// goes through `create` (including its latency).
    pub async fn create_email_activity(&self, request: EmailActivityRequest) -> Activity {
        self.latency.pause(Operation::CreateEmail).await;
        let direction = request.direction;
        let created = self.create(NewActivity::from(request)).await;
        debug!(
            "event=email_logged module=repo id={} direction={}",
            created.id,
            direction.as_str()
        );
        created
    }

    /// Returns email activities, optionally for one contact, newest first.
    pub async fn list_email_activities(&self, contact_id: Option<ContactId>) -> Vec<Activity> {
        self.latency.pause(Operation::ListEmails).await;
        let activities = self.activities.read().await;
        newest_first(
            activities
                .iter()
                .filter(|activity| activity.is_email())
                .filter(|activity| matches_contact(activity, contact_id)),
        )
    }

    /// Returns email activities with `direction`, optionally for one contact,
    /// newest first.
    pub async fn list_emails_by_direction(
        &self,
        direction: EmailDirection,
        contact_id: Option<ContactId>,
    ) -> Vec<Activity> {
        self.latency.pause(Operation::ListEmailsByDirection).await;
        let activities = self.activities.read().await;
        newest_first(
            activities
                .iter()
                .filter(|activity| activity.is_email() && activity.direction == Some(direction))
                .filter(|activity| matches_contact(activity, contact_id)),
        )
    }

    /// Current record count. Does not pause.
    pub async fn len(&self) -> usize {
        self.activities.read().await.len()
    }

    /// Whether the collection holds no records. Does not pause.
    pub async fn is_empty(&self) -> bool {
        self.activities.read().await.is_empty()
    }

    /// Clone of the collection in storage order. Does not pause.
    pub async fn snapshot(&self) -> Vec<Activity> {
        self.activities.read().await.clone()
    }

    async fn insert(&self, payload: NewActivity) -> Activity {
        let mut activities = self.activities.write().await;
        let id = next_id(&activities);
        let activity = payload.into_activity(id, self.clock.now());
        activities.push(activity.clone());
        info!(
            "event=activity_create module=repo status=ok id={id} type={}",
            activity.kind.as_str()
        );
        activity
    }
}

fn next_id(activities: &[Activity]) -> ActivityId {
    activities
        .iter()
        .map(|activity| activity.id)
        .max()
        .map_or_else(ActivityId::first, ActivityId::next)
}

fn newest_first<'a>(activities: impl Iterator<Item = &'a Activity>) -> Vec<Activity> {
    let mut sorted: Vec<Activity> = activities.cloned().collect();
    sorted.sort_by(|left, right| right.date.cmp(&left.date));
    sorted
}

fn matches_contact(activity: &Activity, contact_id: Option<ContactId>) -> bool {
    match contact_id {
        Some(contact_id) => activity.contact_id == Some(contact_id),
        None => true,
    }
}

fn not_found(op: Operation, id: ActivityId) -> RepoError {
    warn!(
        "event=activity_lookup module=repo status=not_found op={} id={id}",
        op.as_str()
    );
    RepoError::NotFound(id)
}
