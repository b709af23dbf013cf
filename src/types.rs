use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::fmt;

/// Stroke style of a session or segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    Freestyle,
    Backstroke,
    Breaststroke,
    Butterfly,
}

impl Style {
    pub const ALL: [Self; 4] = [
        Self::Freestyle,
        Self::Backstroke,
        Self::Breaststroke,
        Self::Butterfly,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Freestyle => "freestyle",
            Self::Backstroke => "backstroke",
            Self::Breaststroke => "breaststroke",
            Self::Butterfly => "butterfly",
        }
    }

    /// Case-insensitive match against the wire names.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a session was meant to train.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrainingGoal {
    Endurance,
    Speed,
    Technique,
}

impl TrainingGoal {
    pub const ALL: [Self; 3] = [Self::Endurance, Self::Speed, Self::Technique];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Endurance => "endurance",
            Self::Speed => "speed",
            Self::Technique => "technique",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for TrainingGoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A sub-interval of a session swum in one stroke.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwimSegment {
    pub style: Option<Style>,
    /// meters
    pub distance: f64,
    /// minutes
    pub duration: f64,
    /// minutes per 100 m
    pub pace: f64,
    pub heart_rate: Option<f64>,
    pub laps: u32,
    pub notes: String,
}

/// One logged training event, already sanitized by `ingest`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwimSession {
    pub id: Option<i64>,
    pub date: NaiveDate,
    /// meters
    pub distance: f64,
    /// minutes
    pub duration: f64,
    pub style: Option<Style>,
    pub goal: Option<TrainingGoal>,
    /// 1..=7
    pub frequency_per_week: u8,
    pub average_heart_rate: Option<f64>,
    pub pool_length: Option<f64>,
    pub segments: Vec<SwimSegment>,
}

impl SwimSession {
    /// A session with only the required fields set.
    pub const fn new(date: NaiveDate, distance: f64, duration: f64) -> Self {
        Self {
            id: None,
            date,
            distance,
            duration,
            style: None,
            goal: None,
            frequency_per_week: 1,
            average_heart_rate: None,
            pool_length: None,
            segments: Vec::new(),
        }
    }

    /// meters per minute, `None` without a positive duration
    pub fn speed(&self) -> Option<f64> {
        (self.duration > 0.0).then(|| self.distance / self.duration)
    }

    /// minutes per 100 m, `None` without a positive distance
    pub fn pace(&self) -> Option<f64> {
        (self.distance > 0.0).then(|| self.duration / (self.distance / 100.0))
    }

    pub fn is_complex(&self) -> bool {
        self.segments.len() > 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalKind {
    Distance,
    Time,
    Frequency,
    Speed,
    StyleMastery,
    Streak,
}

impl GoalKind {
    pub const ALL: [Self; 6] = [
        Self::Distance,
        Self::Time,
        Self::Frequency,
        Self::Speed,
        Self::StyleMastery,
        Self::Streak,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Distance => "distance",
            Self::Time => "time",
            Self::Frequency => "frequency",
            Self::Speed => "speed",
            Self::StyleMastery => "style_mastery",
            Self::Streak => "streak",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for GoalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    Active,
    Completed,
    Failed,
    Paused,
}

impl GoalStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Paused => "paused",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Some(Self::Active),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            "paused" => Some(Self::Paused),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalRecord {
    pub id: Option<i64>,
    pub title: String,
    pub kind: Option<GoalKind>,
    pub target_value: f64,
    pub current_value: f64,
    pub unit: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: GoalStatus,
    pub is_completed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AchievementLevel {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl AchievementLevel {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bronze" => Some(Self::Bronze),
            "silver" => Some(Self::Silver),
            "gold" => Some(Self::Gold),
            "platinum" => Some(Self::Platinum),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: Option<i64>,
    pub kind: String,
    pub level: Option<AchievementLevel>,
    pub title: String,
    pub progress: f64,
    pub target: f64,
    pub is_unlocked: bool,
    pub unlocked_at: Option<DateTime<Utc>>,
}

/// Everything one load of a source yields.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Dataset {
    pub sessions: Vec<SwimSession>,
    pub goals: Vec<GoalRecord>,
    pub achievements: Vec<Achievement>,
}

impl Dataset {
    pub fn extend(&mut self, other: Self) {
        self.sessions.extend(other.sessions);
        self.goals.extend(other.goals);
        self.achievements.extend(other.achievements);
    }
}
