use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::{normalize_domain, LoginConfig, DEFAULT_DOMAINS};
use crate::login::allocator::{AllocationRequest, HandleAllocator};
use crate::login::digits::DigitSource;
use crate::login::existence::ExistenceCheck;
use crate::login::name::PersonName;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "lowercase")]
pub enum LoginStatus {
    /// Inputs incomplete, nothing to allocate.
    Idle,
    /// Inputs changed; an allocation is expected or running.
    Pending,
    Ready,
    Failed(String),
}

/// What the enclosing form displays: the allocated handle next to the
/// selected domain suffix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginSnapshot {
    pub handle: String,
    pub domain: String,
    pub status: LoginStatus,
    pub generation: u64,
}

impl LoginSnapshot {
    pub fn is_ready(&self) -> bool {
        self.status == LoginStatus::Ready && !self.handle.is_empty()
    }
}

/// Outcome of [`LoginField::refresh`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Refresh {
    /// The cycle was still current and its result is now visible.
    Published(LoginSnapshot),
    /// Inputs changed while the cycle ran; its result was dropped.
    Superseded { generation: u64, current: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("unknown domain suffix '{domain}', expected one of: {}", .allowed.join(", "))]
    UnknownDomain { domain: String, allowed: Vec<String> },
}

#[derive(Debug, Clone)]
struct FieldState {
    name: PersonName,
    scope: String,
    domain: String,
    generation: u64,
}

/// Login handle field of the onboarding form.
///
/// Every input change bumps a generation counter and clears the displayed
/// handle. A refresh captures the generation it started with and only
/// publishes if no newer change arrived in the meantime, so a slow cycle
/// can never overwrite the result of a later one.
///
/// With [`LoginField::auto_refresh`] running, each change starts its own
/// cycle; otherwise the owner calls [`LoginField::refresh`].
pub struct LoginField<C, D> {
    allocator: HandleAllocator<C, D>,
    domains: Vec<String>,
    state: Mutex<FieldState>,
    output: watch::Sender<LoginSnapshot>,
    // generation of the latest input change
    triggers: watch::Sender<u64>,
}

impl<C, D> LoginField<C, D>
where
    C: ExistenceCheck,
    D: DigitSource,
{
    pub fn new(allocator: HandleAllocator<C, D>, domains: Vec<String>) -> Self {
        let domains: Vec<String> = if domains.is_empty() {
            DEFAULT_DOMAINS.iter().map(|d| d.to_string()).collect()
        } else {
            domains.iter().map(|d| normalize_domain(d)).collect()
        };
        let domain = domains[0].clone();

        let (output, _) = watch::channel(LoginSnapshot {
            handle: String::new(),
            domain: domain.clone(),
            status: LoginStatus::Idle,
            generation: 0,
        });
        let (triggers, _) = watch::channel(0);

        Self {
            allocator,
            domains,
            state: Mutex::new(FieldState {
                name: PersonName::default(),
                scope: String::new(),
                domain,
                generation: 0,
            }),
            output,
            triggers,
        }
    }

    pub fn from_config(allocator: HandleAllocator<C, D>, config: &LoginConfig) -> Self {
        Self::new(allocator, config.domains.clone())
    }

    /// Selectable domain suffixes, default first.
    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    pub fn selected_domain(&self) -> String {
        self.lock().domain.clone()
    }

    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Latest published value.
    pub fn snapshot(&self) -> LoginSnapshot {
        self.output.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<LoginSnapshot> {
        self.output.subscribe()
    }

    /// Wait until the current inputs have a final value: a handle, a
    /// failure, or idle because the inputs are incomplete.
    pub async fn settled(&self) -> LoginSnapshot {
        let mut updates = self.output.subscribe();
        loop {
            let snapshot = updates.borrow_and_update().clone();
            if snapshot.status != LoginStatus::Pending && snapshot.generation == self.generation() {
                return snapshot;
            }
            if updates.changed().await.is_err() {
                return self.snapshot();
            }
        }
    }

    pub fn set_names(&self, given: &str, family: &str) -> u64 {
        self.update(|state| state.name = PersonName::new(given, family))
    }

    pub fn set_scope(&self, scope: &str) -> u64 {
        self.update(|state| state.scope = scope.trim().to_string())
    }

    /// Select a configured suffix; the leading `@` may be omitted.
    pub fn select_domain(&self, domain: &str) -> Result<u64, FieldError> {
        let domain = normalize_domain(domain);
        if !self.domains.iter().any(|d| *d == domain) {
            return Err(FieldError::UnknownDomain {
                domain,
                allowed: self.domains.clone(),
            });
        }
        Ok(self.update(move |state| state.domain = domain))
    }

    /// Back to empty names and scope with the default domain.
    pub fn reset(&self) -> u64 {
        let domain = self.domains[0].clone();
        self.update(move |state| {
            state.name = PersonName::default();
            state.scope.clear();
            state.domain = domain;
        })
    }

    /// Run one allocation cycle for the current inputs.
    pub async fn refresh(&self) -> Refresh {
        let (request, generation) = {
            let state = self.lock();
            (
                AllocationRequest::new(state.name.clone(), state.scope.clone(), state.domain.clone()),
                state.generation,
            )
        };

        let outcome = self.allocator.allocate(&request).await;

        let state = self.lock();
        if state.generation != generation {
            tracing::debug!(
                "Discarding login allocation for generation {} (current {})",
                generation,
                state.generation
            );
            return Refresh::Superseded {
                generation,
                current: state.generation,
            };
        }

        let snapshot = match outcome {
            Ok(allocation) if allocation.is_empty() => LoginSnapshot {
                handle: String::new(),
                domain: allocation.domain,
                status: LoginStatus::Idle,
                generation,
            },
            Ok(allocation) => LoginSnapshot {
                handle: allocation.handle,
                domain: allocation.domain,
                status: LoginStatus::Ready,
                generation,
            },
            Err(err) => LoginSnapshot {
                handle: String::new(),
                domain: request.domain,
                status: LoginStatus::Failed(err.to_string()),
                generation,
            },
        };
        self.output.send_replace(snapshot.clone());
        Refresh::Published(snapshot)
    }

    fn update(&self, apply: impl FnOnce(&mut FieldState)) -> u64 {
        let mut state = self.lock();
        apply(&mut state);
        state.generation += 1;

        let status = if state.name.is_complete() && !state.scope.is_empty() {
            LoginStatus::Pending
        } else {
            LoginStatus::Idle
        };
        self.output.send_replace(LoginSnapshot {
            handle: String::new(),
            domain: state.domain.clone(),
            status,
            generation: state.generation,
        });
        self.triggers.send_replace(state.generation);
        state.generation
    }

    fn lock(&self) -> MutexGuard<'_, FieldState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<C, D> LoginField<C, D>
where
    C: ExistenceCheck + 'static,
    D: DigitSource + 'static,
{
    /// Start a refresh in the background, as an input-change handler would.
    pub fn spawn_refresh(self: &Arc<Self>) -> JoinHandle<Refresh> {
        let field = Arc::clone(self);
        tokio::spawn(async move { field.refresh().await })
    }

    /// Start a refresh for every input change until the field is dropped.
    /// Inputs already pending when this is called get a cycle right away.
    pub fn auto_refresh(self: &Arc<Self>) -> JoinHandle<()> {
        let mut triggers = self.triggers.subscribe();
        let field = Arc::downgrade(self);

        if self.snapshot().status == LoginStatus::Pending {
            drop(self.spawn_refresh());
        }

        tokio::spawn(async move {
            while triggers.changed().await.is_ok() {
                let Some(field) = field.upgrade() else {
                    break;
                };
                tracing::debug!("Login inputs changed (generation {}), reallocating", *triggers.borrow_and_update());
                drop(field.spawn_refresh());
            }
        })
    }
}
