//! Static mood and age-group tables.

use serde::{Serialize, Serializer};

/// Genre seeds used when the mood is not recognized.
pub const FALLBACK_GENRES: &str = "pop";

/// Lowest tempo (BPM) a profile may carry after adjustment.
pub const MIN_TEMPO: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MoodKey {
    Happy,
    Energetic,
    Calm,
    Sad,
    Stressed,
}

impl MoodKey {
    pub const ALL: [MoodKey; 5] = [
        MoodKey::Happy,
        MoodKey::Energetic,
        MoodKey::Calm,
        MoodKey::Sad,
        MoodKey::Stressed,
    ];

    /// Case-insensitive lookup, surrounding whitespace ignored.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|mood| mood.as_str().eq_ignore_ascii_case(s))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MoodKey::Happy => "happy",
            MoodKey::Energetic => "energetic",
            MoodKey::Calm => "calm",
            MoodKey::Sad => "sad",
            MoodKey::Stressed => "stressed",
        }
    }

    /// The unadjusted feature targets for this mood.
    ///
    /// Returned by value: callers get their own copy and can never write back
    /// into the table.
    pub fn base_profile(&self) -> AudioFeatureProfile {
        match self {
            MoodKey::Happy => AudioFeatureProfile {
                valence: 0.8,
                energy: 0.7,
                danceability: 0.7,
                acousticness: 0.2,
                tempo: 120.0,
            },
            MoodKey::Energetic => AudioFeatureProfile {
                valence: 0.7,
                energy: 0.9,
                danceability: 0.8,
                acousticness: 0.1,
                tempo: 130.0,
            },
            MoodKey::Calm => AudioFeatureProfile {
                valence: 0.3,
                energy: 0.2,
                danceability: 0.3,
                acousticness: 0.7,
                tempo: 70.0,
            },
            MoodKey::Sad => AudioFeatureProfile {
                valence: 0.2,
                energy: 0.25,
                danceability: 0.25,
                acousticness: 0.8,
                tempo: 60.0,
            },
            MoodKey::Stressed => AudioFeatureProfile {
                valence: 0.4,
                energy: 0.3,
                danceability: 0.3,
                acousticness: 0.6,
                tempo: 80.0,
            },
        }
    }

    /// Comma-joined genre seeds, in the order they are sent upstream.
    pub fn genre_seeds(&self) -> &'static str {
        match self {
            MoodKey::Happy => "pop",
            MoodKey::Energetic => "edm,rock,work-out",
            MoodKey::Calm => "ambient,chill,acoustic",
            MoodKey::Sad => "indie,alternative,folk",
            MoodKey::Stressed => "classical,piano,ambient",
        }
    }
}

impl std::fmt::Display for MoodKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgeBracket {
    Teen,
    YoungAdult,
    Adult,
    MiddleAge,
    Senior,
}

impl AgeBracket {
    pub const ALL: [AgeBracket; 5] = [
        AgeBracket::Teen,
        AgeBracket::YoungAdult,
        AgeBracket::Adult,
        AgeBracket::MiddleAge,
        AgeBracket::Senior,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL.into_iter().find(|bracket| bracket.as_str() == s)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgeBracket::Teen => "13-17",
            AgeBracket::YoungAdult => "18-25",
            AgeBracket::Adult => "26-35",
            AgeBracket::MiddleAge => "36-50",
            AgeBracket::Senior => "50+",
        }
    }

    pub fn adjustment(&self) -> AgeAdjustment {
        match self {
            AgeBracket::Teen => AgeAdjustment {
                danceability: Some(0.05),
                tempo: Some(10.0),
                energy: Some(0.03),
                ..AgeAdjustment::NONE
            },
            AgeBracket::YoungAdult => AgeAdjustment {
                danceability: Some(0.03),
                energy: Some(0.02),
                ..AgeAdjustment::NONE
            },
            AgeBracket::Adult => AgeAdjustment {
                acousticness: Some(0.03),
                tempo: Some(-5.0),
                ..AgeAdjustment::NONE
            },
            AgeBracket::MiddleAge => AgeAdjustment {
                acousticness: Some(0.05),
                tempo: Some(-10.0),
                energy: Some(-0.05),
                ..AgeAdjustment::NONE
            },
            AgeBracket::Senior => AgeAdjustment {
                acousticness: Some(0.08),
                tempo: Some(-15.0),
                energy: Some(-0.1),
                ..AgeAdjustment::NONE
            },
        }
    }
}

impl std::fmt::Display for AgeBracket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AgeBracket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Additive deltas applied on top of a mood's base profile.
/// `None` leaves the field untouched.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AgeAdjustment {
    pub valence: Option<f64>,
    pub energy: Option<f64>,
    pub danceability: Option<f64>,
    pub acousticness: Option<f64>,
    pub tempo: Option<f64>,
}

impl AgeAdjustment {
    pub const NONE: AgeAdjustment = AgeAdjustment {
        valence: None,
        energy: None,
        danceability: None,
        acousticness: None,
        tempo: None,
    };
}

/// Target audio features for a recommendation query.
///
/// `valence`, `energy`, `danceability` and `acousticness` live in [0, 1];
/// `tempo` is in BPM and never below [`MIN_TEMPO`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AudioFeatureProfile {
    pub valence: f64,
    pub energy: f64,
    pub danceability: f64,
    pub acousticness: f64,
    pub tempo: f64,
}

impl AudioFeatureProfile {
    /// Applies `adjustment`, clamping each field it touches right after the
    /// addition. Fields the adjustment leaves alone are not clamped.
    pub fn adjusted(self, adjustment: &AgeAdjustment) -> Self {
        let mut out = self;
        if let Some(delta) = adjustment.valence {
            out.valence = clamp_unit(out.valence + delta);
        }
        if let Some(delta) = adjustment.energy {
            out.energy = clamp_unit(out.energy + delta);
        }
        if let Some(delta) = adjustment.danceability {
            out.danceability = clamp_unit(out.danceability + delta);
        }
        if let Some(delta) = adjustment.acousticness {
            out.acousticness = clamp_unit(out.acousticness + delta);
        }
        if let Some(delta) = adjustment.tempo {
            out.tempo = (out.tempo + delta).max(MIN_TEMPO);
        }
        out
    }

    pub fn is_within_bounds(&self) -> bool {
        let unit = 0.0..=1.0;
        unit.contains(&self.valence)
            && unit.contains(&self.energy)
            && unit.contains(&self.danceability)
            && unit.contains(&self.acousticness)
            && self.tempo >= MIN_TEMPO
    }
}

fn clamp_unit(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}
