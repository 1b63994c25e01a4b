use std::collections::HashMap;
use std::time::Duration;

use super::key::KeyFamily;

const MINUTE: Duration = Duration::from_secs(60);

/// How long an entry is served without a request (`fresh`) and how long an
/// unobserved entry is kept before eviction (`retained`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub fresh: Duration,
    pub retained: Duration,
}

impl CachePolicy {
    pub const fn new(fresh: Duration, retained: Duration) -> Self {
        Self { fresh, retained }
    }

    pub fn defaults_for(family: KeyFamily) -> Self {
        match family {
            KeyFamily::People | KeyFamily::Person | KeyFamily::Message => {
                Self::new(Duration::ZERO, 5 * MINUTE)
            }
            KeyFamily::Installments | KeyFamily::OverdueInstallments => {
                Self::new(MINUTE, 5 * MINUTE)
            }
            KeyFamily::Installment
            | KeyFamily::InstallmentsByDueDate
            | KeyFamily::InstallmentsByCollector
            | KeyFamily::InstallmentsByDebtor
            | KeyFamily::TotalReceivable => Self::new(5 * MINUTE, 10 * MINUTE),
            KeyFamily::Messages => Self::new(5 * MINUTE, 5 * MINUTE),
        }
    }
}

/// Per-family policies: built-in defaults plus configured overrides.
#[derive(Debug, Clone, Default)]
pub struct PolicyTable {
    overrides: HashMap<KeyFamily, CachePolicy>,
}

impl PolicyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_override(mut self, family: KeyFamily, policy: CachePolicy) -> Self {
        self.set(family, policy);
        self
    }

    pub fn set(&mut self, family: KeyFamily, policy: CachePolicy) {
        self.overrides.insert(family, policy);
    }

    pub fn policy_for(&self, family: KeyFamily) -> CachePolicy {
        self.overrides
            .get(&family)
            .copied()
            .unwrap_or_else(|| CachePolicy::defaults_for(family))
    }
}
