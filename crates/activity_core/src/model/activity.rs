//! Activity domain model.
//!
//! # Responsibility
//! - Define the canonical activity record and its typed identifiers.
//! - Define caller payloads for create, partial update and email logging.
//! - Own the merge rule used by partial updates.
//!
//! # Invariants
//! - Identifiers are integers in `1..=MAX_ID`; anything else never parses.
//! - `Activity::id` is never written by payload merges.
//! - `extra` never holds a key that names a typed field.

use crate::model::timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Wire keys owned by typed fields. Payload `extra` entries using these
/// keys are discarded, which is also how a caller-supplied `Id` is dropped.
pub const TYPED_FIELD_KEYS: &[&str] = &[
    "Id",
    "id",
    "type",
    "date",
    "contactId",
    "dealId",
    "subject",
    "notes",
    "direction",
    "sender",
    "recipient",
    "duration",
];

/// Largest identifier accepted from callers or seeds (2^53 - 1, the exact
/// integer range of a JSON number in most clients). Assigned ids may reach
/// `MAX_ID + 1`, which still fits `u64`.
pub const MAX_ID: u64 = (1 << 53) - 1;

/// Parse failure for values crossing into the model from untyped input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityParseError {
    /// Identifier is not a decimal integer in `1..=MAX_ID`.
    InvalidId { field: &'static str, value: String },
    /// Activity type outside `call|email|meeting|note`.
    UnknownType(String),
    /// Email direction outside `sent|received`.
    UnknownDirection(String),
}

impl Display for ActivityParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidId { field, value } => {
                write!(f, "{field} must be an integer in 1..={MAX_ID}, got `{value}`")
            }
            Self::UnknownType(value) => write!(
                f,
                "unknown activity type `{value}`; expected call|email|meeting|note"
            ),
            Self::UnknownDirection(value) => {
                write!(f, "unknown email direction `{value}`; expected sent|received")
            }
        }
    }
}

impl Error for ActivityParseError {}

fn parse_positive_id(field: &'static str, raw: &str) -> Result<u64, ActivityParseError> {
    let trimmed = raw.trim();
    match trimmed.parse::<u64>() {
        Ok(value) if (1..=MAX_ID).contains(&value) => Ok(value),
        _ => Err(ActivityParseError::InvalidId {
            field,
            value: trimmed.to_string(),
        }),
    }
}

fn positive_id(field: &'static str, value: u64) -> Result<u64, ActivityParseError> {
    if !(1..=MAX_ID).contains(&value) {
        return Err(ActivityParseError::InvalidId {
            field,
            value: value.to_string(),
        });
    }
    Ok(value)
}

/// Stable activity identifier, assigned by the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct ActivityId(u64);

impl ActivityId {
    /// Wraps a raw value, rejecting zero and values above `MAX_ID`.
    pub fn new(value: u64) -> Result<Self, ActivityParseError> {
        positive_id("activity id", value).map(Self)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    /// Id following `self` in assignment order.
    pub(crate) fn next(self) -> Self {
        Self(self.0 + 1)
    }

    pub(crate) fn first() -> Self {
        Self(1)
    }
}

impl FromStr for ActivityId {
    type Err = ActivityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_positive_id("activity id", s).map(Self)
    }
}

impl TryFrom<u64> for ActivityId {
    type Error = ActivityParseError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ActivityId> for u64 {
    fn from(value: ActivityId) -> Self {
        value.0
    }
}

impl Display for ActivityId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to a contact owned by another system. Not checked for existence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct ContactId(u64);

impl ContactId {
    pub fn new(value: u64) -> Result<Self, ActivityParseError> {
        positive_id("contact id", value).map(Self)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl FromStr for ContactId {
    type Err = ActivityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_positive_id("contact id", s).map(Self)
    }
}

impl TryFrom<u64> for ContactId {
    type Error = ActivityParseError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ContactId> for u64 {
    fn from(value: ContactId) -> Self {
        value.0
    }
}

impl Display for ContactId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to a deal owned by another system. Not checked for existence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct DealId(u64);

impl DealId {
    pub fn new(value: u64) -> Result<Self, ActivityParseError> {
        positive_id("deal id", value).map(Self)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl FromStr for DealId {
    type Err = ActivityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_positive_id("deal id", s).map(Self)
    }
}

impl TryFrom<u64> for DealId {
    type Error = ActivityParseError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DealId> for u64 {
    fn from(value: DealId) -> Self {
        value.0
    }
}

impl Display for DealId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of logged interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Call,
    Email,
    Meeting,
    Note,
}

impl ActivityType {
    /// The fixed type set, in listing order.
    pub const ALL: [ActivityType; 4] = [Self::Call, Self::Email, Self::Meeting, Self::Note];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::Email => "email",
            Self::Meeting => "meeting",
            Self::Note => "note",
        }
    }
}

impl FromStr for ActivityType {
    type Err = ActivityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| ActivityParseError::UnknownType(normalized.to_string()))
    }
}

/// Direction of an email activity relative to the account owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailDirection {
    Sent,
    Received,
}

impl EmailDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Received => "received",
        }
    }
}

impl FromStr for EmailDirection {
    type Err = ActivityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "sent" => Ok(Self::Sent),
            "received" => Ok(Self::Received),
            other => Err(ActivityParseError::UnknownDirection(other.to_string())),
        }
    }
}

/// Canonical activity record.
///
/// Wire names follow the external schema (`Id`, `type`, `contactId`, ...).
/// Fields the model does not know about round-trip through `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(rename = "Id", alias = "id")]
    pub id: ActivityId,
    #[serde(rename = "type")]
    pub kind: ActivityType,
    /// Sole sort key for ordered reads.
    #[serde(with = "timestamp::serde_utc")]
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub contact_id: Option<ContactId>,
    #[serde(default)]
    pub deal_id: Option<DealId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<EmailDirection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    /// Minutes. Always `Some(0)` for logged emails.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Activity {
    /// Creates a bare activity with only the required fields set.
    pub fn new(id: ActivityId, kind: ActivityType, date: DateTime<Utc>) -> Self {
        Self {
            id,
            kind,
            date,
            contact_id: None,
            deal_id: None,
            subject: None,
            notes: None,
            direction: None,
            sender: None,
            recipient: None,
            duration: None,
            extra: Map::new(),
        }
    }

    pub fn is_email(&self) -> bool {
        self.kind == ActivityType::Email
    }

    /// Merges a partial update into this record.
    ///
    /// # Invariants
    /// - `id` is left untouched whatever the patch carried.
    /// - Absent patch fields keep their current value; explicit `null`
    ///   clears nullable fields.
    /// - `extra` entries are merged key by key; a `null` value is stored as-is.
    pub fn apply_patch(&mut self, patch: ActivityPatch) {
        let ActivityPatch {
            kind,
            date,
            contact_id,
            deal_id,
            subject,
            notes,
            direction,
            sender,
            recipient,
            duration,
            extra,
        } = patch;

        if let Some(kind) = kind {
            self.kind = kind;
        }
        if let Some(date) = date {
            self.date = date;
        }
        if let Some(contact_id) = contact_id {
            self.contact_id = contact_id;
        }
        if let Some(deal_id) = deal_id {
            self.deal_id = deal_id;
        }
        if let Some(subject) = subject {
            self.subject = subject;
        }
        if let Some(notes) = notes {
            self.notes = notes;
        }
        if let Some(direction) = direction {
            self.direction = direction;
        }
        if let Some(sender) = sender {
            self.sender = sender;
        }
        if let Some(recipient) = recipient {
            self.recipient = recipient;
        }
        if let Some(duration) = duration {
            self.duration = duration;
        }
        self.extra.extend(strip_typed_keys(extra));
    }
}

/// Create payload. The repository assigns `id`; `date` defaults to now.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewActivity {
    #[serde(rename = "type")]
    pub kind: Option<ActivityType>,
    #[serde(default, with = "timestamp::serde_utc_option")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub contact_id: Option<ContactId>,
    #[serde(default)]
    pub deal_id: Option<DealId>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub direction: Option<EmailDirection>,
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default)]
    pub recipient: Option<String>,
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Type used when a create payload does not name one.
pub const DEFAULT_ACTIVITY_TYPE: ActivityType = ActivityType::Note;

impl NewActivity {
    /// Starts a payload of the given type with everything else unset.
    pub fn of_type(kind: ActivityType) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    /// Materializes the stored record.
    ///
    /// `fallback_date` is used only when the payload has no `date`.
    pub fn into_activity(self, id: ActivityId, fallback_date: DateTime<Utc>) -> Activity {
        Activity {
            id,
            kind: self.kind.unwrap_or(DEFAULT_ACTIVITY_TYPE),
            date: self.date.unwrap_or(fallback_date),
            contact_id: self.contact_id,
            deal_id: self.deal_id,
            subject: self.subject,
            notes: self.notes,
            direction: self.direction,
            sender: self.sender,
            recipient: self.recipient,
            duration: self.duration,
            extra: strip_typed_keys(self.extra),
        }
    }
}

/// Typed partial update.
///
/// Outer `None` leaves a field untouched. For nullable fields the inner
/// option distinguishes "set" from "clear" (`null` on the wire).
/// Identity keys in the payload end up in `extra` and are discarded on merge.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityPatch {
    #[serde(default, rename = "type")]
    pub kind: Option<ActivityType>,
    #[serde(default, with = "timestamp::serde_utc_option")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub contact_id: Option<Option<ContactId>>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub deal_id: Option<Option<DealId>>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub subject: Option<Option<String>>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub direction: Option<Option<EmailDirection>>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub sender: Option<Option<String>>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub recipient: Option<Option<String>>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub duration: Option<Option<u32>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ActivityPatch {
    /// Returns whether applying this patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self.kind.is_none()
            && self.date.is_none()
            && self.contact_id.is_none()
            && self.deal_id.is_none()
            && self.subject.is_none()
            && self.notes.is_none()
            && self.direction.is_none()
            && self.sender.is_none()
            && self.recipient.is_none()
            && self.duration.is_none()
            && self.extra.keys().all(|key| is_typed_key(key))
    }
}

/// Request model for logging one email as an activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailActivityRequest {
    #[serde(default)]
    pub subject: Option<String>,
    /// Stored as the activity `notes`; empty when absent.
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub contact_id: Option<ContactId>,
    #[serde(default)]
    pub deal_id: Option<DealId>,
    pub direction: EmailDirection,
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default)]
    pub recipient: Option<String>,
    #[serde(default, with = "timestamp::serde_utc_option")]
    pub date: Option<DateTime<Utc>>,
}

impl From<EmailActivityRequest> for NewActivity {
    fn from(request: EmailActivityRequest) -> Self {
        Self {
            kind: Some(ActivityType::Email),
            date: request.date,
            contact_id: request.contact_id,
            deal_id: request.deal_id,
            subject: request.subject,
            notes: Some(request.body.unwrap_or_default()),
            direction: Some(request.direction),
            sender: request.sender,
            recipient: request.recipient,
            duration: Some(0),
            extra: Map::new(),
        }
    }
}

fn is_typed_key(key: &str) -> bool {
    TYPED_FIELD_KEYS.contains(&key)
}

fn strip_typed_keys(mut extra: Map<String, Value>) -> Map<String, Value> {
    extra.retain(|key, _| !is_typed_key(key));
    extra
}

// Field present (value or null) => Some(..); absent => None via `default`.
fn present_or_null<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::{
        ActivityId, ActivityParseError, ActivityPatch, ActivityType, ContactId, EmailDirection,
    };

    #[test]
    fn id_parsing_trims_and_rejects_non_positive_values() {
        assert_eq!("  42 ".parse::<ActivityId>().unwrap().get(), 42);
        assert!(matches!(
            "0".parse::<ActivityId>(),
            Err(ActivityParseError::InvalidId { .. })
        ));
        assert!("-3".parse::<ContactId>().is_err());
        assert!("abc".parse::<ActivityId>().is_err());
        assert!("".parse::<ActivityId>().is_err());
    }

    #[test]
    fn activity_type_round_trips_through_str() {
        for kind in ActivityType::ALL {
            assert_eq!(kind.as_str().parse::<ActivityType>().unwrap(), kind);
        }
        assert_eq!(
            "fax".parse::<ActivityType>().unwrap_err(),
            ActivityParseError::UnknownType("fax".to_string())
        );
    }

    #[test]
    fn direction_parse_rejects_unknown_values() {
        assert_eq!(
            "received".parse::<EmailDirection>().unwrap(),
            EmailDirection::Received
        );
        assert!("forwarded".parse::<EmailDirection>().is_err());
    }

    #[test]
    fn patch_with_only_identity_keys_is_empty() {
        let patch: ActivityPatch = serde_json::from_value(serde_json::json!({
            "Id": 99,
        }))
        .unwrap();
        assert!(patch.is_empty());

        let patch: ActivityPatch = serde_json::from_value(serde_json::json!({
            "outcome": "left voicemail",
        }))
        .unwrap();
        assert!(!patch.is_empty());
    }
}
