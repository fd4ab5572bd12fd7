//! Core data access for activity records.
//! This crate is the single source of truth for activity invariants.

pub mod clock;
pub mod latency;
pub mod logging;
pub mod model;
pub mod repo;
pub mod seed;

pub use clock::{Clock, FixedClock, SystemClock};
pub use latency::{Latency, LatencyProfile, NoLatency, Operation, SimulatedLatency};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::activity::{
    Activity, ActivityId, ActivityParseError, ActivityPatch, ActivityType, ContactId, DealId,
    EmailActivityRequest, EmailDirection, NewActivity,
};
pub use repo::activity_repo::{
    parse_activity_id, parse_contact_id, parse_deal_id, ActivityRepository, RepoError,
    RepoResult, RECENT_DEFAULT_LIMIT,
};
pub use seed::{SeedError, SeedSnapshot};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
