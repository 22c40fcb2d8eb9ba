use serde::{Deserialize, Deserializer, Serialize};

use crate::scoring::KolMetrics;

pub const PROFILE_FILE_VERSION: u32 = 1;

/// A KOL profile row as stored by the backend.
///
/// Numeric columns may be null or missing for new accounts; both read as 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KolProfile {
    pub id: String,
    pub display_name: String,
    /// Social username used to pull the post feed (without '@')
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub followers: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub campaigns_count: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_earnings: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rating: f64,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl KolProfile {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            handle: None,
            followers: 0,
            campaigns_count: 0,
            total_earnings: 0.0,
            rating: 0.0,
            avatar_url: None,
        }
    }

    /// Scoring input for this profile
    pub fn metrics(&self) -> KolMetrics {
        KolMetrics {
            followers: self.followers,
            campaigns: self.campaigns_count,
            earnings: self.total_earnings,
            rating: self.rating,
        }
    }
}

/// On-disk profile document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileFile {
    pub version: u32,
    #[serde(default)]
    pub profiles: Vec<KolProfile>,
}

impl Default for ProfileFile {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileFile {
    pub fn new() -> Self {
        Self {
            version: PROFILE_FILE_VERSION,
            profiles: Vec::new(),
        }
    }

    /// Replace the profile with the same id in place, or append it.
    /// Returns true if an existing profile was replaced.
    pub fn upsert(&mut self, profile: KolProfile) -> bool {
        match self.profiles.iter_mut().find(|p| p.id == profile.id) {
            Some(existing) => {
                *existing = profile;
                true
            }
            None => {
                self.profiles.push(profile);
                false
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&KolProfile> {
        self.profiles.iter().find(|p| p.id == id)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_from_profile() {
        let mut profile = KolProfile::new("kol-1", "Alpha Caller");
        profile.followers = 120_000;
        profile.campaigns_count = 14;
        profile.total_earnings = 23_500.0;
        profile.rating = 4.6;

        let metrics = profile.metrics();
        assert_eq!(metrics.followers, 120_000);
        assert_eq!(metrics.campaigns, 14);
        assert_eq!(metrics.earnings, 23_500.0);
        assert_eq!(metrics.rating, 4.6);
    }

    #[test]
    fn test_null_and_missing_numbers_read_as_zero() {
        let json = r#"{
            "id": "kol-2",
            "display_name": "New Account",
            "followers": null,
            "rating": null
        }"#;
        let profile: KolProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.followers, 0);
        assert_eq!(profile.campaigns_count, 0);
        assert_eq!(profile.total_earnings, 0.0);
        assert_eq!(profile.rating, 0.0);
        assert!(profile.handle.is_none());
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let mut file = ProfileFile::new();
        assert!(!file.upsert(KolProfile::new("a", "A")));
        assert!(!file.upsert(KolProfile::new("b", "B")));

        let mut updated = KolProfile::new("a", "A renamed");
        updated.followers = 10;
        assert!(file.upsert(updated));

        assert_eq!(file.profiles.len(), 2);
        assert_eq!(file.profiles[0].display_name, "A renamed");
        assert_eq!(file.get("a").map(|p| p.followers), Some(10));
        assert!(file.get("zzz").is_none());
    }
}
