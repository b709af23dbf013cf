//! Boundary validation: loosely-typed JSON in, closed record types out.
//!
//! This is the only place that looks at raw payloads. Numbers are
//! safe-parsed, unknown enum strings become `None`, and records that cannot
//! be placed on a calendar are skipped. Downstream code trusts the result.

use crate::dlog;
use crate::types::{
    Achievement, AchievementLevel, Dataset, GoalKind, GoalRecord, GoalStatus, Style, SwimSegment,
    SwimSession, TrainingGoal,
};
use crate::utils::{SourceHandle, is_json_file};
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

static LEADING_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([-+]?(?:\d[\d,]*(?:\.\d*)?|\.\d+))").expect("leading number regex")
});

/// Reads every JSON document behind `source` and merges them.
pub fn load(source: &SourceHandle) -> Result<Dataset> {
    let mut dataset = Dataset::default();
    for path in json_files(source.path())? {
        let value = read_json_file(&path)?;
        let part = sanitize_payload(&value);
        dlog!(
            "loaded file={} sessions={} goals={} achievements={}",
            path.display(),
            part.sessions.len(),
            part.goals.len(),
            part.achievements.len()
        );
        dataset.extend(part);
    }

    tracing::info!(
        sessions = dataset.sessions.len(),
        goals = dataset.goals.len(),
        achievements = dataset.achievements.len(),
        "source loaded"
    );
    Ok(dataset)
}

fn json_files(root: &Path) -> Result<Vec<PathBuf>> {
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }

    let mut out = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.with_context(|| format!("walking {}", root.display()))?;
        if is_json_file(entry.path()) {
            out.push(entry.into_path());
        }
    }
    if out.is_empty() {
        tracing::warn!(dir = %root.display(), "no .json files found");
    }
    Ok(out)
}

pub fn read_json_file(path: &Path) -> Result<Value> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing JSON in {}", path.display()))
}

/// Accepts a bare array of sessions, a bundle object with
/// `records`/`sessions`, `goals` and `achievements` arrays, or one session
/// object.
pub fn sanitize_payload(value: &Value) -> Dataset {
    match value {
        Value::Array(items) => Dataset {
            sessions: sanitize_sessions(items),
            ..Dataset::default()
        },
        Value::Object(obj) => {
            let records = field(obj, &["records", "sessions"]).and_then(Value::as_array);
            let goals = field(obj, &["goals"]).and_then(Value::as_array);
            let achievements = field(obj, &["achievements"]).and_then(Value::as_array);

            if records.is_none() && goals.is_none() && achievements.is_none() {
                return Dataset {
                    sessions: sanitize_session(value).into_iter().collect(),
                    ..Dataset::default()
                };
            }

            Dataset {
                sessions: records.map(|r| sanitize_sessions(r)).unwrap_or_default(),
                goals: goals
                    .map(|g| g.iter().filter_map(sanitize_goal).collect())
                    .unwrap_or_default(),
                achievements: achievements
                    .map(|a| a.iter().filter_map(sanitize_achievement).collect())
                    .unwrap_or_default(),
            }
        }
        other => {
            tracing::warn!(kind = json_kind(other), "ignoring JSON payload that is not an array or object");
            Dataset::default()
        }
    }
}

fn sanitize_sessions(items: &[Value]) -> Vec<SwimSession> {
    let sessions: Vec<SwimSession> = items.iter().filter_map(sanitize_session).collect();
    let skipped = items.len() - sessions.len();
    if skipped > 0 {
        tracing::warn!(skipped, kept = sessions.len(), "skipped records without a usable date");
    }
    sessions
}

const fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// First of `keys` present with a non-null value.
fn field<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find(|v| !v.is_null())
}

/// Safe numeric parse: JSON numbers as-is, strings by their leading number,
/// everything else 0. Negative and non-finite results clamp to 0.
pub fn coerce_number(value: Option<&Value>) -> f64 {
    let n = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => LEADING_NUMBER
            .captures(s)
            .and_then(|c| c[1].replace(',', "").parse::<f64>().ok())
            .unwrap_or(0.0),
        _ => 0.0,
    };
    if n.is_finite() && n > 0.0 { n } else { 0.0 }
}

fn positive(value: Option<&Value>) -> Option<f64> {
    let n = coerce_number(value);
    (n > 0.0).then_some(n)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn coerce_count(value: Option<&Value>) -> u32 {
    coerce_number(value).round().min(f64::from(u32::MAX)) as u32
}

fn coerce_bool(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        Some(Value::String(s)) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"),
        _ => false,
    }
}

fn text(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).map(str::trim).filter(|s| !s.is_empty())
}

fn coerce_id(value: Option<&Value>) -> Option<i64> {
    match value {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

/// `YYYY-MM-DD`, RFC 3339, or a naive `YYYY-MM-DDTHH:MM:SS` timestamp.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|dt| dt.date())
}

fn date_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<NaiveDate> {
    text(field(obj, keys)).and_then(parse_date)
}

fn style_field(obj: &Map<String, Value>) -> Option<Style> {
    let raw = text(field(obj, &["style", "stroke"]))?;
    let style = Style::parse(raw);
    if style.is_none() {
        tracing::warn!(style = raw, "unknown swim style");
    }
    style
}

fn goal_field(obj: &Map<String, Value>) -> Option<TrainingGoal> {
    let raw = text(field(obj, &["goal"]))?;
    let goal = TrainingGoal::parse(raw);
    if goal.is_none() {
        tracing::warn!(goal = raw, "unknown training goal");
    }
    goal
}

pub fn sanitize_segment(value: &Value) -> Option<SwimSegment> {
    let obj = value.as_object()?;
    let distance = coerce_number(field(obj, &["distance"]));
    let duration = coerce_number(field(obj, &["duration", "time"]));
    let pace = positive(field(obj, &["pace"])).unwrap_or_else(|| {
        if distance > 0.0 {
            duration / (distance / 100.0)
        } else {
            0.0
        }
    });

    Some(SwimSegment {
        style: style_field(obj),
        distance,
        duration,
        pace,
        heart_rate: positive(field(obj, &["heartRate", "heart_rate"])),
        laps: coerce_count(field(obj, &["laps"])),
        notes: text(field(obj, &["notes"])).unwrap_or_default().to_string(),
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn frequency(value: Option<&Value>) -> u8 {
    coerce_number(value).round().clamp(1.0, 7.0) as u8
}

/// `None` when the record is not an object or has no usable date.
pub fn sanitize_session(value: &Value) -> Option<SwimSession> {
    let obj = value.as_object()?;
    let Some(date) = date_field(obj, &["date", "sessionDate", "session_date"]) else {
        dlog!("session_without_date record={value}");
        return None;
    };

    let segments: Vec<SwimSegment> = field(obj, &["segments"])
        .and_then(Value::as_array)
        .map(|segs| segs.iter().filter_map(sanitize_segment).collect())
        .unwrap_or_default();

    let mut distance = coerce_number(field(obj, &["distance", "totalDistance", "total_distance"]));
    let mut duration = coerce_number(field(obj, &["duration", "totalDuration", "total_duration"]));
    if !segments.is_empty() {
        let seg_distance: f64 = segments.iter().map(|s| s.distance).sum();
        let seg_duration: f64 = segments.iter().map(|s| s.duration).sum();
        if (distance != 0.0 && distance != seg_distance)
            || (duration != 0.0 && duration != seg_duration)
        {
            dlog!(
                "session_totals_overridden declared={distance}m/{duration}min segments={seg_distance}m/{seg_duration}min"
            );
        }
        distance = seg_distance;
        duration = seg_duration;
    }

    Some(SwimSession {
        id: coerce_id(field(obj, &["id"])),
        date,
        distance,
        duration,
        style: style_field(obj),
        goal: goal_field(obj),
        frequency_per_week: frequency(field(obj, &["frequencyPerWeek", "frequency_per_week"])),
        average_heart_rate: positive(field(
            obj,
            &["averageHeartRate", "average_heart_rate", "avgHeartRate"],
        )),
        pool_length: positive(field(obj, &["poolLength", "pool_length"])),
        segments,
    })
}

pub fn sanitize_goal(value: &Value) -> Option<GoalRecord> {
    let obj = value.as_object()?;
    let is_completed = coerce_bool(field(obj, &["isCompleted", "is_completed"]));
    let status = text(field(obj, &["status"]))
        .and_then(GoalStatus::parse)
        .unwrap_or(if is_completed {
            GoalStatus::Completed
        } else {
            GoalStatus::Active
        });

    Some(GoalRecord {
        id: coerce_id(field(obj, &["id"])),
        title: text(field(obj, &["title"])).unwrap_or_default().to_string(),
        kind: text(field(obj, &["type", "kind"])).and_then(GoalKind::parse),
        target_value: coerce_number(field(obj, &["targetValue", "target_value"])),
        current_value: coerce_number(field(obj, &["currentValue", "current_value"])),
        unit: text(field(obj, &["unit"])).map(str::to_string),
        start_date: date_field(obj, &["startDate", "start_date"]),
        end_date: date_field(obj, &["endDate", "end_date"]),
        status,
        is_completed: is_completed || status == GoalStatus::Completed,
    })
}

pub fn sanitize_achievement(value: &Value) -> Option<Achievement> {
    let obj = value.as_object()?;
    Some(Achievement {
        id: coerce_id(field(obj, &["id"])),
        kind: text(field(obj, &["type", "kind"])).unwrap_or_default().to_string(),
        level: text(field(obj, &["level"])).and_then(AchievementLevel::parse),
        title: text(field(obj, &["title"])).unwrap_or_default().to_string(),
        progress: coerce_number(field(obj, &["progress"])),
        target: coerce_number(field(obj, &["target"])),
        is_unlocked: coerce_bool(field(obj, &["isUnlocked", "is_unlocked"])),
        unlocked_at: text(field(obj, &["unlockedAt", "unlocked_at"]))
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_coerce_number() {
        assert_eq!(coerce_number(Some(&json!(12.5))), 12.5);
        assert_eq!(coerce_number(Some(&json!("1,500m"))), 1500.0);
        assert_eq!(coerce_number(Some(&json!(" 25 min"))), 25.0);
        assert_eq!(coerce_number(Some(&json!("fast"))), 0.0);
        assert_eq!(coerce_number(Some(&json!(-3))), 0.0);
        assert_eq!(coerce_number(Some(&json!(true))), 0.0);
        assert_eq!(coerce_number(None), 0.0);
    }

    #[test]
    fn test_parse_date_shapes() {
        assert_eq!(parse_date("2024-05-01"), Some(day(2024, 5, 1)));
        assert_eq!(parse_date("2024-05-01T23:30:00.000Z"), Some(day(2024, 5, 1)));
        assert_eq!(parse_date("2024-05-02T00:30:00+02:00"), Some(day(2024, 5, 1)));
        assert_eq!(parse_date("2024-05-01T08:00:00"), Some(day(2024, 5, 1)));
        assert_eq!(parse_date("yesterday"), None);
    }

    #[test]
    fn test_sanitize_session_camel_case() {
        let raw = json!({
            "id": 7,
            "date": "2024-05-01",
            "distance": "1200",
            "duration": 30,
            "style": "Freestyle",
            "goal": "speed",
            "frequencyPerWeek": 9,
            "averageHeartRate": 0,
            "poolLength": 25
        });
        let s = sanitize_session(&raw).unwrap();
        assert_eq!(s.id, Some(7));
        assert_eq!(s.distance, 1200.0);
        assert_eq!(s.style, Some(Style::Freestyle));
        assert_eq!(s.goal, Some(TrainingGoal::Speed));
        assert_eq!(s.frequency_per_week, 7);
        assert_eq!(s.average_heart_rate, None);
        assert_eq!(s.pool_length, Some(25.0));
    }

    #[test]
    fn test_sanitize_session_fills_totals_from_segments() {
        let raw = json!({
            "date": "2024-05-01",
            "frequency_per_week": 3,
            "segments": [
                {"style": "freestyle", "distance": 100, "duration": 2, "heartRate": 120, "laps": 4},
                {"style": "backstroke", "distance": 300, "duration": 6},
                "garbage"
            ]
        });
        let s = sanitize_session(&raw).unwrap();
        assert_eq!(s.segments.len(), 2);
        assert_eq!(s.distance, 400.0);
        assert_eq!(s.duration, 8.0);
        assert_eq!(s.frequency_per_week, 3);
        assert_eq!(s.segments[0].pace, 2.0);
        assert_eq!(s.segments[0].heart_rate, Some(120.0));
        assert_eq!(s.segments[0].laps, 4);
        assert_eq!(s.segments[1].pace, 2.0);
    }

    #[test]
    fn test_sanitize_session_segments_override_totals_and_unknown_style() {
        let raw = json!({
            "date": "2024-05-01",
            "distance": 1000,
            "duration": 25,
            "style": "doggy paddle",
            "segments": [{"style": "medley", "distance": 200, "duration": 5, "pace": 2.4}]
        });
        let s = sanitize_session(&raw).unwrap();
        assert_eq!(s.distance, 200.0);
        assert_eq!(s.duration, 5.0);
        assert_eq!(s.style, None);
        assert_eq!(s.frequency_per_week, 1);
        assert_eq!(s.segments[0].style, None);
        assert_eq!(s.segments[0].pace, 2.4);
    }

    #[test]
    fn test_sanitize_session_requires_date() {
        assert_eq!(sanitize_session(&json!({"distance": 100})), None);
        assert_eq!(sanitize_session(&json!({"date": "soon"})), None);
        assert_eq!(sanitize_session(&json!([1, 2])), None);
    }

    #[test]
    fn test_sanitize_payload_shapes() {
        let array = json!([{"date": "2024-05-01", "distance": 100}, {"distance": 5}]);
        assert_eq!(sanitize_payload(&array).sessions.len(), 1);

        let bundle = json!({
            "records": [{"date": "2024-05-01", "distance": 100}],
            "goals": [{"title": "10k", "type": "distance", "targetValue": 10, "currentValue": 4, "status": "active"}],
            "achievements": [{"title": "first", "level": "gold", "progress": 1, "target": 1, "isUnlocked": true}]
        });
        let d = sanitize_payload(&bundle);
        assert_eq!(d.sessions.len(), 1);
        assert_eq!(d.goals.len(), 1);
        assert_eq!(d.achievements.len(), 1);

        let single = json!({"date": "2024-05-01", "distance": 100});
        assert_eq!(sanitize_payload(&single).sessions.len(), 1);

        assert_eq!(sanitize_payload(&json!("nope")), Dataset::default());
    }

    #[test]
    fn test_sanitize_goal_status_fallback() {
        let g = sanitize_goal(&json!({"title": "swim", "isCompleted": true, "type": "style_mastery"})).unwrap();
        assert_eq!(g.status, GoalStatus::Completed);
        assert!(g.is_completed);
        assert_eq!(g.kind, Some(GoalKind::StyleMastery));

        let g = sanitize_goal(&json!({"status": "paused", "targetValue": "5km"})).unwrap();
        assert_eq!(g.status, GoalStatus::Paused);
        assert!(!g.is_completed);
        assert_eq!(g.target_value, 5.0);
    }

    #[test]
    fn test_sanitize_achievement() {
        let a = sanitize_achievement(&json!({
            "type": "distance",
            "level": "Platinum",
            "title": "Marathon",
            "progress": 30,
            "target": "42",
            "isUnlocked": "false",
            "unlockedAt": "2024-05-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(a.level, Some(AchievementLevel::Platinum));
        assert_eq!(a.target, 42.0);
        assert!(!a.is_unlocked);
        assert!(a.unlocked_at.is_some());
    }
}
