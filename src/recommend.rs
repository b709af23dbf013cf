//! User profile and rule-based training recommendation.

use crate::stats::{
    Intensity, average_session_duration, goal_distribution, in_trailing_window,
    record_style_stats, round_u32,
};
use crate::types::{Style, SwimSession, TrainingGoal};
use chrono::{Days, NaiveDate};
use serde::Serialize;

/// Trailing window (days) counted as current training frequency.
pub const FREQUENCY_WINDOW_DAYS: u64 = 30;
/// Number of consecutive weeks inspected for consistency.
pub const CONSISTENCY_WEEKS: u64 = 4;

/// m/min below which a swimmer is treated as a beginner.
pub const BEGINNER_MAX_SPEED: f64 = 35.0;
/// m/min below which a swimmer is treated as intermediate.
pub const INTERMEDIATE_MAX_SPEED: f64 = 50.0;

const MIN_DURATION: u32 = 30;
const MAX_DURATION: u32 = 90;
const DEFAULT_DURATION: u32 = 45;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub total_distance: f64,
    pub total_time: f64,
    /// meters per minute over all sessions
    pub average_speed: f64,
    pub preferred_styles: Vec<Style>,
    /// sessions in the trailing 30 days
    pub training_frequency: usize,
    /// share of the last four weeks with at least one session, 0..=1
    pub consistency: f64,
    pub goals: Vec<TrainingGoal>,
}

#[allow(clippy::cast_precision_loss)]
pub fn user_profile(sessions: &[SwimSession], reference: NaiveDate) -> UserProfile {
    let total_distance: f64 = sessions.iter().map(|s| s.distance).sum();
    let total_time: f64 = sessions.iter().map(|s| s.duration).sum();
    let average_speed = if total_time > 0.0 {
        total_distance / total_time
    } else {
        0.0
    };

    let mut by_count: Vec<(Style, usize)> = record_style_stats(sessions)
        .into_iter()
        .map(|(style, st)| (style, st.count))
        .collect();
    by_count.sort_by(|a, b| b.1.cmp(&a.1));
    let preferred_styles = by_count.into_iter().take(3).map(|(s, _)| s).collect();

    let training_frequency = sessions
        .iter()
        .filter(|s| in_trailing_window(s, reference, FREQUENCY_WINDOW_DAYS))
        .count();

    let active_weeks = (0..CONSISTENCY_WEEKS)
        .filter_map(|week| reference.checked_sub_days(Days::new(week * 7)))
        .filter(|end| sessions.iter().any(|s| in_trailing_window(s, *end, 6)))
        .count();

    UserProfile {
        total_distance,
        total_time,
        average_speed,
        preferred_styles,
        training_frequency,
        consistency: active_weeks as f64 / CONSISTENCY_WEEKS as f64,
        goals: goal_distribution(sessions).into_keys().collect(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn from_speed(average_speed: f64) -> Self {
        if average_speed < BEGINNER_MAX_SPEED {
            Self::Beginner
        } else if average_speed < INTERMEDIATE_MAX_SPEED {
            Self::Intermediate
        } else {
            Self::Advanced
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub difficulty: Difficulty,
    pub intensity: Intensity,
    pub focus: TrainingGoal,
    /// minutes
    pub duration: u32,
    pub swim_training: String,
    pub dryland_training: String,
}

fn dominant_goal(sessions: &[SwimSession]) -> TrainingGoal {
    let mut best: Option<(TrainingGoal, usize)> = None;
    for (goal, count) in goal_distribution(sessions) {
        if best.is_none_or(|(_, c)| count > c) {
            best = Some((goal, count));
        }
    }
    best.map_or(TrainingGoal::Endurance, |(g, _)| g)
}

fn suggested_duration(sessions: &[SwimSession]) -> u32 {
    if sessions.is_empty() {
        return DEFAULT_DURATION;
    }
    let blocks = (average_session_duration(sessions) / 5.0).clamp(
        f64::from(MIN_DURATION) / 5.0,
        f64::from(MAX_DURATION) / 5.0,
    );
    (round_u32(blocks) * 5).clamp(MIN_DURATION, MAX_DURATION)
}

/// (warm-up m, repeats, repeat m, cool-down m)
const fn set_shape(difficulty: Difficulty) -> (u32, u32, u32, u32) {
    match difficulty {
        Difficulty::Beginner => (200, 4, 100, 100),
        Difficulty::Intermediate => (400, 8, 100, 200),
        Difficulty::Advanced => (600, 10, 200, 300),
    }
}

fn swim_text(focus: TrainingGoal, difficulty: Difficulty, style: Style) -> String {
    let (warm, reps, rep, cool) = set_shape(difficulty);
    let main = match focus {
        TrainingGoal::Endurance => {
            format!("{reps}x{rep}m {style} at steady pace, 20s rest")
        }
        TrainingGoal::Speed => {
            format!("{reps}x{}m {style} sprints at max effort, 40s rest", rep / 2)
        }
        TrainingGoal::Technique => format!(
            "{reps}x{rep}m {style} drills (catch-up, fingertip drag), count strokes per length"
        ),
    };
    format!("Warm-up {warm}m easy, main set {main}, cool-down {cool}m easy.")
}

fn dryland_text(focus: TrainingGoal, difficulty: Difficulty) -> String {
    let rounds = match difficulty {
        Difficulty::Beginner => 2,
        Difficulty::Intermediate => 3,
        Difficulty::Advanced => 4,
    };
    let circuit = match focus {
        TrainingGoal::Endurance => "plank 45s, flutter kicks 30s, push-ups 12",
        TrainingGoal::Speed => "squat jumps 10, medicine-ball slams 10, burpees 8",
        TrainingGoal::Technique => "band shoulder rotations 15, thoracic openers 10, streamline holds 30s",
    };
    format!("{rounds} rounds: {circuit}.")
}

pub fn recommend(profile: &UserProfile, sessions: &[SwimSession]) -> Recommendation {
    let difficulty = Difficulty::from_speed(profile.average_speed);
    let focus = dominant_goal(sessions);
    let intensity = if profile.consistency < 0.5 {
        Intensity::Low
    } else {
        match focus {
            TrainingGoal::Technique => Intensity::Low,
            TrainingGoal::Endurance => Intensity::Medium,
            TrainingGoal::Speed => Intensity::High,
        }
    };
    let style = profile
        .preferred_styles
        .first()
        .copied()
        .unwrap_or(Style::Freestyle);

    Recommendation {
        difficulty,
        intensity,
        focus,
        duration: suggested_duration(sessions),
        swim_training: swim_text(focus, difficulty, style),
        dryland_training: dryland_text(focus, difficulty),
    }
}
