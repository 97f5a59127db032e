//! External-facing form of a resolved profile.

use serde::Serialize;

use super::resolver::ResolvedFeatures;

/// Recommendation parameters, rounded for transmission: tempo to the nearest
/// integer, the unit-interval features to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureQuery {
    pub seed_genres: String,
    pub target_valence: f64,
    pub target_energy: f64,
    pub target_danceability: f64,
    pub target_acousticness: f64,
    pub target_tempo: u32,
}

impl FeatureQuery {
    pub fn from_resolved(resolved: &ResolvedFeatures) -> Self {
        let profile = &resolved.profile;
        Self {
            seed_genres: resolved.genre_seeds.to_string(),
            target_valence: round2(profile.valence),
            target_energy: round2(profile.energy),
            target_danceability: round2(profile.danceability),
            target_acousticness: round2(profile.acousticness),
            target_tempo: profile.tempo.round() as u32,
        }
    }

    /// Query-string pairs in the order the recommendation endpoint receives them.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("seed_genres", self.seed_genres.clone()),
            ("target_valence", self.target_valence.to_string()),
            ("target_energy", self.target_energy.to_string()),
            ("target_danceability", self.target_danceability.to_string()),
            ("target_acousticness", self.target_acousticness.to_string()),
            ("target_tempo", self.target_tempo.to_string()),
        ]
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
