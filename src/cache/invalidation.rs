//! Rule-driven cache invalidation after writes
//!
//! A write to an endpoint drops the list views that depend on it. Rules map a
//! write prefix to the fixed keys it evicts; booking writes additionally evict
//! the per-hall and per-user conflict queries, which are parametrised by id and
//! cannot be listed up front. A write no rule accounts for clears everything.

use super::{RequestKey, ResponseCache};

pub const ALL_HALLS: &str = "api/hall/all-hall";
pub const ALL_EMPLOYEES: &str = "api/employee/all-employees";
pub const ALL_SCHOOLS: &str = "api/school/all-schools";
pub const ALL_DEPARTMENTS: &str = "api/department/all-department";
pub const MY_REQUESTS: &str = "api/booking/my-requests";
pub const APPROVALS: &str = "api/booking/approvals";
pub const CONFLICTS: &str = "api/booking/conflicts";

/// Prefix whose writes trigger the parametrised booking sweep
pub const BOOKING_WRITE_PREFIX: &str = "api/booking/";

/// Key prefixes swept on every booking write
pub const BOOKING_SECONDARY_PREFIXES: [&str; 2] = ["api/booking/hall/", "api/booking/conflicts/"];

/// Keys a write under `prefix` must evict
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidationRule {
    pub prefix: String,
    pub keys: Vec<RequestKey>,
}

impl InvalidationRule {
    pub fn new(prefix: impl Into<String>, keys: &[&str]) -> Self {
        Self {
            prefix: prefix.into(),
            keys: keys.iter().map(|k| RequestKey::new(*k)).collect(),
        }
    }

    pub fn matches(&self, endpoint: &str) -> bool {
        endpoint.starts_with(&self.prefix)
    }
}

/// What an invalidation pass removed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidationOutcome {
    /// Specific entries were dropped
    Targeted { removed: Vec<RequestKey> },
    /// Nothing matched, so the whole cache was cleared
    FullClear { removed: usize },
}

/// Ordered rule table checked by literal prefix comparison
#[derive(Debug, Clone)]
pub struct InvalidationRules {
    rules: Vec<InvalidationRule>,
    secondary_trigger: String,
    secondary_prefixes: Vec<String>,
}

impl Default for InvalidationRules {
    fn default() -> Self {
        Self::new(vec![
            InvalidationRule::new("api/hall/", &[ALL_HALLS]),
            InvalidationRule::new("api/employee/", &[ALL_EMPLOYEES]),
            InvalidationRule::new("api/school/", &[ALL_SCHOOLS]),
            InvalidationRule::new("api/department/", &[ALL_DEPARTMENTS]),
            InvalidationRule::new(
                BOOKING_WRITE_PREFIX,
                &[
                    MY_REQUESTS,
                    "api/booking/approvals?filter=all",
                    "api/booking/approvals?filter=internal",
                    "api/booking/approvals?filter=forward",
                    "api/booking/approvals?filter=external",
                    CONFLICTS,
                ],
            ),
        ])
    }
}

impl InvalidationRules {
    /// Table with the standard booking sweep and the given rules
    pub fn new(rules: Vec<InvalidationRule>) -> Self {
        Self {
            rules,
            secondary_trigger: BOOKING_WRITE_PREFIX.to_string(),
            secondary_prefixes: BOOKING_SECONDARY_PREFIXES
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }

    pub fn rules(&self) -> &[InvalidationRule] {
        &self.rules
    }

    /// Evict every cached read that a successful write to `endpoint` may
    /// have made stale.
    pub fn invalidate(&self, endpoint: &str, cache: &mut ResponseCache) -> InvalidationOutcome {
        let mut removed = Vec::new();

        // Every matching rule contributes, not just the first
        for rule in self.rules.iter().filter(|r| r.matches(endpoint)) {
            for key in &rule.keys {
                if cache.delete(key) {
                    removed.push(key.clone());
                }
            }
        }

        if endpoint.starts_with(&self.secondary_trigger) {
            for prefix in &self.secondary_prefixes {
                removed.extend(cache.delete_by_prefix(prefix));
            }
        }

        if removed.is_empty() {
            let count = cache.clear();
            log::warn!(
                "No cached reads mapped to write {}, cleared {} entries",
                endpoint,
                count
            );
            return InvalidationOutcome::FullClear { removed: count };
        }

        log::debug!("Write {} invalidated {:?}", endpoint, removed);
        InvalidationOutcome::Targeted { removed }
    }
}
