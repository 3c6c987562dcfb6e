use serde::{Deserialize, Serialize};

/// A person's name as typed into a form: given name first, family name second.
///
/// Upstream data entry sometimes places the family name in the given-name
/// field (e.g. `MENGUY` / `Josselin`); [`PersonName::oriented`] undoes that
/// when the casing gives it away.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonName {
    given: String,
    family: String,
}

impl PersonName {
    pub fn new(given: impl Into<String>, family: impl Into<String>) -> Self {
        Self {
            given: given.into().trim().to_string(),
            family: family.into().trim().to_string(),
        }
    }

    pub fn given(&self) -> &str {
        &self.given
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    /// Both parts present.
    pub fn is_complete(&self) -> bool {
        !self.given.is_empty() && !self.family.is_empty()
    }

    /// Display form used for the directory `cn`: `"given family"`.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.given, self.family)
    }

    /// True when the given name is all upper case while the family name is
    /// capitalised but not all upper case, i.e. the two were likely entered
    /// in the wrong fields.
    ///
    /// Best-effort only: short or unusually cased names can misfire.
    pub fn looks_swapped(&self) -> bool {
        if self.given != self.given.to_uppercase() {
            return false;
        }

        let mut family = self.family.chars();
        let Some(first) = family.next() else {
            return false;
        };
        let rest = family.as_str();

        first.to_uppercase().eq(std::iter::once(first)) && rest != rest.to_uppercase()
    }

    /// Swap given and family names when [`looks_swapped`](Self::looks_swapped) says so.
    pub fn oriented(self) -> Self {
        if self.looks_swapped() {
            Self {
                given: self.family,
                family: self.given,
            }
        } else {
            self
        }
    }

    /// Number of characters available as a given-name prefix.
    pub fn given_len(&self) -> usize {
        self.given.chars().count()
    }

    /// `lower(first len chars of given) + "." + lower(family)`
    pub fn prefix_candidate(&self, len: usize) -> String {
        let prefix: String = self.given.chars().take(len).collect();
        format!("{}.{}", prefix.to_lowercase(), self.family.to_lowercase())
    }

    /// `lower(given) + "." + lower(family) + digit`, used once every prefix
    /// length has collided.
    pub fn digit_candidate(&self, digit: u8) -> String {
        format!(
            "{}.{}{}",
            self.given.to_lowercase(),
            self.family.to_lowercase(),
            digit % 10
        )
    }
}
