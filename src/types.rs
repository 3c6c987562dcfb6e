//! Shared types used across the codebase

use serde::{Deserialize, Serialize};

use crate::login::PersonName;

/// The parts of a distinguished name the console cares about, e.g.
/// `CN=Jean Dupont,OU=administratifs,DC=example,DC=com`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnSummary {
    pub cn: String,
    pub ou: String,
}

impl DnSummary {
    /// First `CN=` and first `OU=` components. `None` when either is missing.
    pub fn parse(dn: &str) -> Option<Self> {
        Some(Self {
            cn: component(dn, "CN")?,
            ou: component(dn, "OU")?,
        })
    }
}

/// First value of the `key=` component in `dn`, matched case-insensitively.
pub fn component(dn: &str, key: &str) -> Option<String> {
    dn.split(',').find_map(|part| {
        let (k, v) = part.trim().split_once('=')?;
        (k.trim().eq_ignore_ascii_case(key) && !v.trim().is_empty()).then(|| v.trim().to_string())
    })
}

/// Split the common name of `dn` into given and family name at the first
/// space: `CN=Jean de La Tour` gives `Jean` / `de La Tour`. Empty when the
/// common name is a single word.
pub fn person_from_dn(dn: &str) -> PersonName {
    component(dn, "CN")
        .and_then(|cn| {
            let (given, family) = cn.split_once(' ')?;
            Some(PersonName::new(given, family))
        })
        .unwrap_or_default()
}
