pub mod offboarding;
pub mod onboarding;
pub mod transfer;

use std::collections::HashMap;
use std::fmt;

pub use offboarding::{OffboardingForm, Retention};
pub use onboarding::{ContractType, OnboardingForm};
pub use transfer::TransferForm;

/// Client-side validation failure with per-field messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub message: String,
    pub field_errors: HashMap<String, String>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field_errors: HashMap::new(),
        }
    }

    pub fn field(mut self, field: &str, error: impl Into<String>) -> Self {
        self.field_errors.insert(field.to_string(), error.into());
        self
    }

    pub fn has(&self, field: &str) -> bool {
        self.field_errors.contains_key(field)
    }

    fn into_result(self) -> Result<(), Self> {
        if self.field_errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        let mut fields: Vec<_> = self.field_errors.iter().collect();
        fields.sort();
        for (field, error) in fields {
            write!(f, "; {}: {}", field, error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}
