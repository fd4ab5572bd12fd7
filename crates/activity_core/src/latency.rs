//! Simulated round-trip latency for repository operations.
//!
//! # Responsibility
//! - Name every latency-bearing repository operation.
//! - Hold the per-operation delay table and its defaults.
//! - Provide the injectable `Latency` hook plus timer-backed and no-op impls.
//!
//! # Invariants
//! - A pause happens before an operation touches the collection, never
//!   in the middle of it.
//! - Pauses are never cancelled by this layer.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use std::time::Duration;

const OPERATION_COUNT: usize = 12;

/// Repository operation, used as latency and log key.
///
/// Discriminants index the delay table, in `ALL` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListAll,
    GetById,
    ListByContact,
    ListByDeal,
    Create,
    Update,
    Delete,
    ListTypes,
    ListRecent,
    CreateEmail,
    ListEmails,
    ListEmailsByDirection,
}

impl Operation {
    pub const ALL: [Operation; OPERATION_COUNT] = [
        Self::ListAll,
        Self::GetById,
        Self::ListByContact,
        Self::ListByDeal,
        Self::Create,
        Self::Update,
        Self::Delete,
        Self::ListTypes,
        Self::ListRecent,
        Self::CreateEmail,
        Self::ListEmails,
        Self::ListEmailsByDirection,
    ];

    /// Stable snake_case key used in logs and latency config.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ListAll => "list_all",
            Self::GetById => "get_by_id",
            Self::ListByContact => "list_by_contact",
            Self::ListByDeal => "list_by_deal",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::ListTypes => "list_types",
            Self::ListRecent => "list_recent",
            Self::CreateEmail => "create_email",
            Self::ListEmails => "list_emails",
            Self::ListEmailsByDirection => "list_emails_by_direction",
        }
    }

    fn default_delay(self) -> Duration {
        let millis = match self {
            Self::ListAll => 300,
            Self::GetById => 200,
            Self::ListByContact | Self::ListByDeal => 250,
            Self::Create => 400,
            Self::Update => 300,
            Self::Delete => 250,
            Self::ListTypes => 100,
            Self::ListRecent => 200,
            Self::CreateEmail => 400,
            Self::ListEmails | Self::ListEmailsByDirection => 250,
        };
        Duration::from_millis(millis)
    }
}

/// Per-operation delay table.
///
/// Deserializes from a JSON object of milliseconds keyed by
/// `Operation::as_str`; keys left out keep their default delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatencyProfile {
    delays: [Duration; OPERATION_COUNT],
}

impl Default for LatencyProfile {
    fn default() -> Self {
        Self {
            delays: Operation::ALL.map(Operation::default_delay),
        }
    }
}

impl LatencyProfile {
    /// Profile where every operation resolves without waiting.
    pub fn zero() -> Self {
        Self::uniform(Duration::ZERO)
    }

    /// Profile with the same delay for every operation.
    pub fn uniform(delay: Duration) -> Self {
        Self {
            delays: [delay; OPERATION_COUNT],
        }
    }

    pub fn delay_for(&self, op: Operation) -> Duration {
        self.delays[slot(op)]
    }

    /// Overrides the delay of one operation.
    pub fn with_delay(mut self, op: Operation, delay: Duration) -> Self {
        self.delays[slot(op)] = delay;
        self
    }

    /// Parses a profile from a JSON object of milliseconds.
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

fn slot(op: Operation) -> usize {
    op as usize
}

impl<'de> Deserialize<'de> for LatencyProfile {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let overrides = std::collections::BTreeMap::<String, u64>::deserialize(deserializer)?;
        let mut profile = Self::default();
        for (key, millis) in overrides {
            let op = Operation::ALL
                .into_iter()
                .find(|op| op.as_str() == key)
                .ok_or_else(|| {
                    serde::de::Error::custom(format!("unknown latency operation `{key}`"))
                })?;
            profile = profile.with_delay(op, Duration::from_millis(millis));
        }
        Ok(profile)
    }
}

/// Delay hook awaited at the start of every repository operation.
#[async_trait]
pub trait Latency: Send + Sync {
    async fn pause(&self, op: Operation);
}

/// Timer-backed latency using `tokio::time::sleep`.
#[derive(Debug, Clone, Default)]
pub struct SimulatedLatency {
    profile: LatencyProfile,
}

impl SimulatedLatency {
    pub fn new(profile: LatencyProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &LatencyProfile {
        &self.profile
    }
}

#[async_trait]
impl Latency for SimulatedLatency {
    async fn pause(&self, op: Operation) {
        let delay = self.profile.delay_for(op);
        if delay.is_zero() {
            return;
        }
        tokio::time::sleep(delay).await;
    }
}

/// Latency that never waits. Used by tests and batch tooling.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLatency;

#[async_trait]
impl Latency for NoLatency {
    async fn pause(&self, _op: Operation) {}
}

#[cfg(test)]
mod tests {
    use super::{LatencyProfile, Operation};
    use std::time::Duration;

    #[test]
    fn default_profile_matches_operation_table() {
        let profile = LatencyProfile::default();
        assert_eq!(
            profile.delay_for(Operation::ListAll),
            Duration::from_millis(300)
        );
        assert_eq!(
            profile.delay_for(Operation::ListTypes),
            Duration::from_millis(100)
        );
        assert_eq!(
            profile.delay_for(Operation::CreateEmail),
            Duration::from_millis(400)
        );
    }

    #[test]
    fn operation_keys_are_unique() {
        let mut keys: Vec<_> = Operation::ALL.iter().map(|op| op.as_str()).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), Operation::ALL.len());
    }

    #[test]
    fn json_profile_overrides_only_named_operations() {
        let profile = LatencyProfile::from_json_str(r#"{"delete": 5, "list_all": 0}"#).unwrap();
        assert_eq!(profile.delay_for(Operation::Delete), Duration::from_millis(5));
        assert_eq!(profile.delay_for(Operation::ListAll), Duration::ZERO);
        assert_eq!(
            profile.delay_for(Operation::Update),
            Duration::from_millis(300)
        );
    }

    #[test]
    fn json_profile_rejects_unknown_keys() {
        let err = LatencyProfile::from_json_str(r#"{"teleport": 1}"#).unwrap_err();
        assert!(err.to_string().contains("teleport"));
    }

    #[test]
    fn zero_profile_has_no_delays() {
        let profile = LatencyProfile::zero();
        assert!(Operation::ALL
            .iter()
            .all(|op| profile.delay_for(*op).is_zero()));
    }
}
