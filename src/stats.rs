//! Training statistics derived from a list of sanitized sessions.
//!
//! Everything here is a pure function over a slice: no I/O, no logging, no
//! hidden state. Empty or degenerate input never panics and yields a
//! neutral value (zero, empty map, `None`, or an explicit flag).

use crate::types::{Style, SwimSession, TrainingGoal};
use chrono::{Days, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

/// Length of the trailing window used by [`weekly_stats`].
pub const WEEK_DAYS: u64 = 7;

/// Heart rate (bpm) below which a session counts as low intensity.
pub const LOW_INTENSITY_MAX_HR: f64 = 130.0;
/// Heart rate (bpm) below which a session counts as medium intensity.
pub const MEDIUM_INTENSITY_MAX_HR: f64 = 155.0;

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn round_u32(x: f64) -> u32 {
    if x.is_nan() {
        return 0;
    }
    x.round().clamp(0.0, f64::from(u32::MAX)) as u32
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn mean(sum: f64, count: usize) -> f64 {
    if count == 0 { 0.0 } else { sum / count as f64 }
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    round_u32(part as f64 / whole as f64 * 100.0)
}

fn rounded_mean_of_present(values: impl Iterator<Item = Option<f64>>) -> u32 {
    let (sum, count) = values
        .flatten()
        .filter(|v| *v > 0.0)
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        return 0;
    }
    round_u32(mean(sum, count))
}

/// Mean session heart rate over sessions that report one, rounded.
///
/// A reading of 0 counts as absent.
pub fn average_heart_rate(sessions: &[SwimSession]) -> u32 {
    rounded_mean_of_present(sessions.iter().map(|s| s.average_heart_rate))
}

/// Mean pool length over sessions that report one, rounded.
pub fn average_pool_length(sessions: &[SwimSession]) -> u32 {
    rounded_mean_of_present(sessions.iter().map(|s| s.pool_length))
}

/// Mean duration (minutes) over all sessions.
pub fn average_session_duration(sessions: &[SwimSession]) -> f64 {
    mean(sessions.iter().map(|s| s.duration).sum(), sessions.len())
}

/// Percentage of sessions that mix more than one segment.
pub fn complex_training_ratio(sessions: &[SwimSession]) -> u32 {
    let complex = sessions.iter().filter(|s| s.is_complex()).count();
    percent(complex, sessions.len())
}

/// Per-stroke totals accumulated over segments.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleAggregate {
    pub total_distance: f64,
    pub segment_count: usize,
    pub total_duration: f64,
    /// minutes per 100 m; `None` when no distance was covered
    pub average_pace: Option<f64>,
    pub average_heart_rate: Option<f64>,
    #[serde(skip)]
    heart_rate_sum: f64,
    #[serde(skip)]
    heart_rate_count: usize,
}

/// Walks every segment of every session and aggregates per stroke.
///
/// Sessions without segments contribute nothing, nor do segments whose
/// style was not recognised at ingest.
pub fn style_breakdown(sessions: &[SwimSession]) -> BTreeMap<Style, StyleAggregate> {
    let mut out: BTreeMap<Style, StyleAggregate> = BTreeMap::new();

    for seg in sessions.iter().flat_map(|s| &s.segments) {
        let Some(style) = seg.style else {
            continue;
        };
        let agg = out.entry(style).or_default();
        agg.total_distance += seg.distance;
        agg.total_duration += seg.duration;
        agg.segment_count += 1;
        if let Some(hr) = seg.heart_rate.filter(|hr| *hr > 0.0) {
            agg.heart_rate_sum += hr;
            agg.heart_rate_count += 1;
        }
    }

    for agg in out.values_mut() {
        agg.average_pace = (agg.total_distance > 0.0)
            .then(|| agg.total_duration / (agg.total_distance / 100.0));
        agg.average_heart_rate =
            (agg.heart_rate_count > 0).then(|| mean(agg.heart_rate_sum, agg.heart_rate_count));
    }

    out
}

/// Percentage deltas of a session against a baseline.
///
/// Positive always means better: longer distance, faster pace, higher speed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImprovementResult {
    pub is_first_record: bool,
    pub distance_improvement: Option<f64>,
    /// reduction of pace (minutes per 100 m)
    pub time_improvement: Option<f64>,
    pub speed_improvement: Option<f64>,
}

fn percent_change(current: f64, previous: f64) -> Option<f64> {
    (previous > 0.0).then(|| (current - previous) / previous * 100.0)
}

pub fn improvement(current: &SwimSession, previous: Option<&SwimSession>) -> ImprovementResult {
    let Some(previous) = previous else {
        return ImprovementResult {
            is_first_record: true,
            ..ImprovementResult::default()
        };
    };

    let time_improvement = match (current.pace(), previous.pace()) {
        (Some(cur), Some(prev)) if prev > 0.0 => Some((prev - cur) / prev * 100.0),
        _ => None,
    };
    let speed_improvement = match (current.speed(), previous.speed()) {
        (Some(cur), Some(prev)) => percent_change(cur, prev),
        _ => None,
    };

    ImprovementResult {
        is_first_record: false,
        distance_improvement: percent_change(current.distance, previous.distance),
        time_improvement,
        speed_improvement,
    }
}

/// Independent maxima; the best-distance session need not be the fastest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalBests {
    pub distance: f64,
    pub duration: f64,
    /// meters per minute
    pub speed: f64,
}

pub fn personal_bests(sessions: &[SwimSession]) -> Option<PersonalBests> {
    if sessions.is_empty() {
        return None;
    }
    Some(
        sessions
            .iter()
            .fold(PersonalBests::default(), |best, s| PersonalBests {
                distance: best.distance.max(s.distance),
                duration: best.duration.max(s.duration),
                speed: s.speed().map_or(best.speed, |v| best.speed.max(v)),
            }),
    )
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyStats {
    pub total_distance: f64,
    pub total_time: f64,
    pub session_count: usize,
    pub average_distance: f64,
    pub average_time: f64,
}

/// True for dates in `[reference - days, reference]`, both ends inclusive.
pub fn in_trailing_window(session: &SwimSession, reference: NaiveDate, days: u64) -> bool {
    let start = reference
        .checked_sub_days(Days::new(days))
        .unwrap_or(NaiveDate::MIN);
    session.date >= start && session.date <= reference
}

/// Totals over the trailing 7 days ending at `reference`.
pub fn weekly_stats(sessions: &[SwimSession], reference: NaiveDate) -> WeeklyStats {
    let (total_distance, total_time, session_count) = sessions
        .iter()
        .filter(|s| in_trailing_window(s, reference, WEEK_DAYS))
        .fold((0.0, 0.0, 0usize), |(dist, time, n), s| {
            (dist + s.distance, time + s.duration, n + 1)
        });

    WeeklyStats {
        total_distance,
        total_time,
        session_count,
        average_distance: mean(total_distance, session_count),
        average_time: mean(total_time, session_count),
    }
}

/// Lifetime totals shown on the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_records: usize,
    pub total_distance: f64,
    pub total_time: f64,
    pub average_distance: f64,
    pub average_time: f64,
    pub personal_bests: Option<PersonalBests>,
    pub weekly_stats: WeeklyStats,
}

pub fn user_stats(sessions: &[SwimSession], reference: NaiveDate) -> UserStats {
    let total_distance: f64 = sessions.iter().map(|s| s.distance).sum();
    let total_time: f64 = sessions.iter().map(|s| s.duration).sum();
    UserStats {
        total_records: sessions.len(),
        total_distance,
        total_time,
        average_distance: mean(total_distance, sessions.len()),
        average_time: mean(total_time, sessions.len()),
        personal_bests: personal_bests(sessions),
        weekly_stats: weekly_stats(sessions, reference),
    }
}

/// Per-stroke totals keyed by the session-level style.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordStyleStats {
    pub count: usize,
    pub total_distance: f64,
    pub total_time: f64,
    pub average_distance: f64,
    pub average_time: f64,
    pub best_distance: f64,
    /// longest single session, minutes
    pub best_time: f64,
}

pub fn record_style_stats(sessions: &[SwimSession]) -> BTreeMap<Style, RecordStyleStats> {
    let mut out: BTreeMap<Style, RecordStyleStats> = BTreeMap::new();
    for s in sessions {
        let Some(style) = s.style else {
            continue;
        };
        let st = out.entry(style).or_default();
        st.count += 1;
        st.total_distance += s.distance;
        st.total_time += s.duration;
        st.best_distance = st.best_distance.max(s.distance);
        st.best_time = st.best_time.max(s.duration);
    }
    for st in out.values_mut() {
        st.average_distance = mean(st.total_distance, st.count);
        st.average_time = mean(st.total_time, st.count);
    }
    out
}

pub fn goal_distribution(sessions: &[SwimSession]) -> BTreeMap<TrainingGoal, usize> {
    let mut out = BTreeMap::new();
    for goal in sessions.iter().filter_map(|s| s.goal) {
        *out.entry(goal).or_insert(0) += 1;
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Low,
    Medium,
    High,
}

impl Intensity {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Heart rate decides when present, the declared goal otherwise.
pub fn classify_intensity(session: &SwimSession) -> Intensity {
    match session.average_heart_rate.filter(|hr| *hr > 0.0) {
        Some(hr) if hr < LOW_INTENSITY_MAX_HR => Intensity::Low,
        Some(hr) if hr < MEDIUM_INTENSITY_MAX_HR => Intensity::Medium,
        Some(_) => Intensity::High,
        None => match session.goal {
            Some(TrainingGoal::Technique) => Intensity::Low,
            Some(TrainingGoal::Speed) => Intensity::High,
            Some(TrainingGoal::Endurance) | None => Intensity::Medium,
        },
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IntensityStats {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

pub fn intensity_distribution(sessions: &[SwimSession]) -> IntensityStats {
    let mut out = IntensityStats::default();
    for s in sessions {
        match classify_intensity(s) {
            Intensity::Low => out.low += 1,
            Intensity::Medium => out.medium += 1,
            Intensity::High => out.high += 1,
        }
    }
    out
}

/// Everything the summary view shows, in one pass per aggregate.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    #[serde(flatten)]
    pub totals: UserStats,
    pub average_heart_rate: u32,
    pub average_pool_length: u32,
    pub average_session_duration: f64,
    pub complex_training_ratio: u32,
    pub intensity: IntensityStats,
    pub goal_distribution: BTreeMap<TrainingGoal, usize>,
}

pub fn dashboard(sessions: &[SwimSession], reference: NaiveDate) -> Dashboard {
    Dashboard {
        totals: user_stats(sessions, reference),
        average_heart_rate: average_heart_rate(sessions),
        average_pool_length: average_pool_length(sessions),
        average_session_duration: average_session_duration(sessions),
        complex_training_ratio: complex_training_ratio(sessions),
        intensity: intensity_distribution(sessions),
        goal_distribution: goal_distribution(sessions),
    }
}

/// Latest session of `history` not dated after `current`. `history` must
/// not contain `current` itself.
///
/// When `current` has a style only sessions of that style qualify. Among
/// sessions on the same date the later one in `history` wins.
pub fn previous_comparable<'a>(
    history: &'a [SwimSession],
    current: &SwimSession,
) -> Option<&'a SwimSession> {
    history
        .iter()
        .enumerate()
        .filter(|(_, s)| s.date <= current.date)
        .filter(|(_, s)| current.style.is_none() || s.style == current.style)
        .max_by_key(|(i, s)| (s.date, *i))
        .map(|(_, s)| s)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    Distance,
    Duration,
    Speed,
}

impl RecordType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Distance => "distance",
            Self::Duration => "duration",
            Self::Speed => "speed",
        }
    }
}

/// How the most recent session compares with everything before it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingAnalysis {
    pub session: SwimSession,
    pub is_new_record: bool,
    pub record_type: Option<RecordType>,
    pub improvement: ImprovementResult,
    pub weekly_stats: WeeklyStats,
    pub personal_bests: Option<PersonalBests>,
}

fn new_record_type(session: &SwimSession, history: &[SwimSession]) -> Option<RecordType> {
    let best = personal_bests(history)?;
    if session.distance > best.distance {
        Some(RecordType::Distance)
    } else if session.duration > best.duration {
        Some(RecordType::Duration)
    } else if session.speed().is_some_and(|v| v > best.speed) {
        Some(RecordType::Speed)
    } else {
        None
    }
}

pub fn analyze_latest(sessions: &[SwimSession], reference: NaiveDate) -> Option<TrainingAnalysis> {
    let (latest_idx, latest) = sessions
        .iter()
        .enumerate()
        .max_by_key(|(i, s)| (s.date, *i))?;

    let history: Vec<SwimSession> = sessions
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != latest_idx)
        .map(|(_, s)| s.clone())
        .collect();

    let record_type = new_record_type(latest, &history);

    Some(TrainingAnalysis {
        session: latest.clone(),
        is_new_record: record_type.is_some(),
        record_type,
        improvement: improvement(latest, previous_comparable(&history, latest)),
        weekly_stats: weekly_stats(sessions, reference),
        personal_bests: personal_bests(sessions),
    })
}
