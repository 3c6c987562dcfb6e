use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::LoginConfig;
use crate::error::ClientError;
use crate::login::digits::DigitSource;
use crate::login::existence::ExistenceCheck;
use crate::login::name::PersonName;

/// Inputs for one allocation cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationRequest {
    pub name: PersonName,
    pub scope: String,
    pub domain: String,
}

impl AllocationRequest {
    pub fn new(name: PersonName, scope: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            name,
            scope: scope.into().trim().to_string(),
            domain: domain.into(),
        }
    }

    /// Empty names or scope turn the cycle into a no-op.
    pub fn is_actionable(&self) -> bool {
        self.name.is_complete() && !self.scope.is_empty()
    }
}

/// Result of a successful cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub handle: String,
    pub domain: String,
    /// Existence checks performed to reach `handle`.
    pub checks: u32,
}

impl Allocation {
    fn empty(domain: &str) -> Self {
        Self {
            handle: String::new(),
            domain: domain.to_string(),
            checks: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.handle.is_empty()
    }

    pub fn full_identifier(&self) -> String {
        format!("{}{}", self.handle, self.domain)
    }
}

#[derive(Debug, Error)]
pub enum AllocationError {
    #[error("existence check for '{candidate}' failed: {source}")]
    Lookup {
        candidate: String,
        #[source]
        source: ClientError,
    },

    #[error("existence check for '{candidate}' timed out after {after:?}")]
    Timeout { candidate: String, after: Duration },

    #[error("no free login found after {attempts} digit-suffixed candidates")]
    Exhausted { attempts: u32 },
}

/// Limits applied to one allocation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocatorPolicy {
    /// Upper bound for a single existence check; `None` waits forever.
    pub check_timeout: Option<Duration>,
    /// Digit-suffixed candidates tried before giving up; `None` never gives up.
    pub max_digit_attempts: Option<u32>,
}

impl Default for AllocatorPolicy {
    fn default() -> Self {
        Self {
            check_timeout: Some(Duration::from_secs(5)),
            max_digit_attempts: Some(30),
        }
    }
}

impl AllocatorPolicy {
    pub fn from_config(config: &LoginConfig) -> Self {
        Self {
            check_timeout: Some(config.check_timeout()),
            max_digit_attempts: Some(config.max_digit_attempts),
        }
    }

    pub fn unbounded() -> Self {
        Self {
            check_timeout: None,
            max_digit_attempts: None,
        }
    }
}

/// Finds the shortest free login handle for a person within an
/// organizational unit.
///
/// Candidates are tried in order: `j.dupont`, `je.dupont`, ... up to the
/// whole given name, then `jean.dupont` plus a random digit until one is
/// free. Every candidate is confirmed against the [`ExistenceCheck`] before
/// being returned; a failed check aborts the cycle instead of guessing.
pub struct HandleAllocator<C, D> {
    checker: C,
    digits: Mutex<D>,
    policy: AllocatorPolicy,
}

impl<C, D> HandleAllocator<C, D>
where
    C: ExistenceCheck,
    D: DigitSource,
{
    pub fn new(checker: C, digits: D) -> Self {
        Self::with_policy(checker, digits, AllocatorPolicy::default())
    }

    pub fn with_policy(checker: C, digits: D, policy: AllocatorPolicy) -> Self {
        Self {
            checker,
            digits: Mutex::new(digits),
            policy,
        }
    }

    pub fn policy(&self) -> &AllocatorPolicy {
        &self.policy
    }

    pub fn checker(&self) -> &C {
        &self.checker
    }

    pub async fn allocate(&self, request: &AllocationRequest) -> Result<Allocation, AllocationError> {
        if !request.is_actionable() {
            tracing::debug!("Skipping login allocation: name or scope is empty");
            return Ok(Allocation::empty(&request.domain));
        }

        let name = request.name.clone().oriented();
        if name != request.name {
            tracing::debug!(
                "Swapped given/family name: {} {} -> {} {}",
                request.name.given(),
                request.name.family(),
                name.given(),
                name.family()
            );
        }

        let given_len = name.given_len();
        let mut prefix_len = 1;
        let mut digit_attempts = 0;
        let mut checks = 0;
        let mut candidate = name.prefix_candidate(prefix_len);

        loop {
            checks += 1;
            if !self.is_taken(&candidate, request).await? {
                tracing::info!(
                    "Allocated login {}{} in {} after {} check(s)",
                    candidate,
                    request.domain,
                    request.scope,
                    checks
                );
                return Ok(Allocation {
                    handle: candidate,
                    domain: request.domain.clone(),
                    checks,
                });
            }

            prefix_len += 1;
            if prefix_len <= given_len {
                candidate = name.prefix_candidate(prefix_len);
                continue;
            }

            if let Some(max) = self.policy.max_digit_attempts {
                if digit_attempts >= max {
                    tracing::warn!(
                        "Giving up on {} in {} after {} digit attempts",
                        name.full_name(),
                        request.scope,
                        digit_attempts
                    );
                    return Err(AllocationError::Exhausted {
                        attempts: digit_attempts,
                    });
                }
            }
            digit_attempts += 1;
            candidate = name.digit_candidate(self.next_digit());
        }
    }

    async fn is_taken(&self, candidate: &str, request: &AllocationRequest) -> Result<bool, AllocationError> {
        let full = format!("{}{}", candidate, request.domain);
        tracing::debug!("Checking {} in {}", full, request.scope);

        let check = self.checker.exists(&full, &request.scope);
        let outcome = match self.policy.check_timeout {
            Some(after) => match tokio::time::timeout(after, check).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    tracing::warn!("Existence check for {} timed out after {:?}", full, after);
                    return Err(AllocationError::Timeout {
                        candidate: candidate.to_string(),
                        after,
                    });
                }
            },
            None => check.await,
        };

        outcome.map_err(|source| {
            tracing::warn!("Existence check for {} failed: {}", full, source);
            AllocationError::Lookup {
                candidate: candidate.to_string(),
                source,
            }
        })
    }

    fn next_digit(&self) -> u8 {
        let mut digits = self.digits.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        digits.next_digit()
    }
}
