//! Partial-update inputs for self-service profile edits.
//!
//! Three cases are kept apart for every nullable field:
//!
//! | JSON            | Rust             | Effect        |
//! |-----------------|------------------|---------------|
//! | key absent      | `None`           | no change     |
//! | `"key": null`   | `Some(None)`     | clear         |
//! | `"key": "v"`    | `Some(Some(v))`  | set           |
//!
//! Required text fields (names) use a plain `Option`: absent or `null` leaves
//! them alone, a value replaces them.

use serde::{Deserialize, Deserializer};

use crate::account::{GuideProfile, InternProfile};

/// Deserialise a present key into `Some(..)`, so `null` becomes `Some(None)`.
/// Pair with `#[serde(default)]` so an absent key stays `None`.
pub fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
  T: Deserialize<'de>,
  D: Deserializer<'de>,
{
  Option::<T>::deserialize(de).map(Some)
}

/// Collapse empty-after-trim text to a clear.
fn normalize(value: &Option<String>) -> Option<String> {
  value
    .as_deref()
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(str::to_owned)
}

fn trim_list(items: &[String]) -> Vec<String> {
  items
    .iter()
    .map(|s| s.trim().to_owned())
    .filter(|s| !s.is_empty())
    .collect()
}

// ─── Intern ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InternProfilePatch {
  pub first_name:    Option<String>,
  pub last_name:     Option<String>,
  #[serde(default, deserialize_with = "double_option")]
  pub phone:         Option<Option<String>>,
  #[serde(default, deserialize_with = "double_option")]
  pub bio:           Option<Option<String>>,
  pub skills:        Option<Vec<String>>,
  #[serde(default, deserialize_with = "double_option")]
  pub institution:   Option<Option<String>>,
  #[serde(default, deserialize_with = "double_option")]
  pub year_of_study: Option<Option<String>>,
}

impl InternProfilePatch {
  pub fn apply_to(&self, profile: &mut InternProfile) {
    if let Some(v) = &self.first_name {
      profile.first_name = v.trim().to_owned();
    }
    if let Some(v) = &self.last_name {
      profile.last_name = v.trim().to_owned();
    }
    if let Some(v) = &self.phone {
      profile.phone = normalize(v);
    }
    if let Some(v) = &self.bio {
      profile.bio = normalize(v);
    }
    if let Some(v) = &self.skills {
      profile.skills = trim_list(v);
    }
    if let Some(v) = &self.institution {
      profile.institution = normalize(v);
    }
    if let Some(v) = &self.year_of_study {
      profile.year_of_study = normalize(v);
    }
  }
}

// ─── Guide ───────────────────────────────────────────────────────────────────

/// Self-service guide edit. `is_active` is deliberately absent: only an admin
/// may change it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuideProfilePatch {
  pub first_name:   Option<String>,
  pub last_name:    Option<String>,
  #[serde(default, deserialize_with = "double_option")]
  pub phone:        Option<Option<String>>,
  #[serde(default, deserialize_with = "double_option")]
  pub bio:          Option<Option<String>>,
  pub expertise:    Option<Vec<String>>,
  #[serde(default, deserialize_with = "double_option")]
  pub organization: Option<Option<String>>,
}

impl GuideProfilePatch {
  pub fn apply_to(&self, profile: &mut GuideProfile) {
    if let Some(v) = &self.first_name {
      profile.first_name = v.trim().to_owned();
    }
    if let Some(v) = &self.last_name {
      profile.last_name = v.trim().to_owned();
    }
    if let Some(v) = &self.phone {
      profile.phone = normalize(v);
    }
    if let Some(v) = &self.bio {
      profile.bio = normalize(v);
    }
    if let Some(v) = &self.expertise {
      profile.expertise = trim_list(v);
    }
    if let Some(v) = &self.organization {
      profile.organization = normalize(v);
    }
  }
}
