use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use chrono::NaiveDate;
use swimstat::types::Style;
use swimstat::{ingest, stats, utils};
use zip::write::SimpleFileOptions;

const RECORDS: &str = r#"[
  {"id": 1, "date": "2024-05-01", "distance": 1000, "duration": 25, "style": "freestyle", "goal": "endurance", "frequencyPerWeek": 3},
  {"id": 2, "date": "2024-05-03T07:15:00.000Z", "distance": "1,200", "duration": 30, "style": "backstroke", "goal": "speed", "averageHeartRate": 150},
  {"id": 3, "date": "not a date", "distance": 999, "duration": 9}
]"#;

const BUNDLE: &str = r#"{
  "records": [
    {"date": "2024-05-05", "goal": "technique", "segments": [
      {"style": "freestyle", "distance": 100, "duration": 2},
      {"style": "freestyle", "distance": 300, "duration": 5}
    ]}
  ],
  "goals": [{"title": "Swim 10k", "type": "distance", "targetValue": 10, "currentValue": 4, "status": "active"}],
  "achievements": [{"title": "First splash", "level": "bronze", "progress": 1, "target": 1, "isUnlocked": true}]
}"#;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn write(path: &Path, body: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, body).unwrap();
}

#[test]
fn loads_single_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records.json");
    write(&path, RECORDS);

    let source = utils::open_source(&path).unwrap();
    let data = ingest::load(&source).unwrap();

    assert_eq!(data.sessions.len(), 2);
    assert_eq!(data.sessions[1].distance, 1200.0);
    assert_eq!(data.sessions[1].date, day(2024, 5, 3));
    assert!(data.goals.is_empty());

    let week = stats::weekly_stats(&data.sessions, day(2024, 5, 8));
    assert_eq!(week.session_count, 2);
    assert_eq!(stats::average_heart_rate(&data.sessions), 150);
}

#[test]
fn merges_directory_recursively() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("a_records.json"), RECORDS);
    write(&dir.path().join("nested/bundle.json"), BUNDLE);
    write(&dir.path().join("nested/readme.txt"), "not json");

    let source = utils::open_source(dir.path()).unwrap();
    let data = ingest::load(&source).unwrap();

    assert_eq!(data.sessions.len(), 3);
    assert_eq!(data.goals.len(), 1);
    assert_eq!(data.achievements.len(), 1);

    let breakdown = stats::style_breakdown(&data.sessions);
    let free = &breakdown[&Style::Freestyle];
    assert_eq!(free.total_distance, 400.0);
    assert_eq!(free.average_pace, Some(1.75));
    assert_eq!(stats::complex_training_ratio(&data.sessions), 33);
}

#[test]
fn extracts_zip_archives() {
    let dir = tempfile::tempdir().unwrap();
    let zip_path = dir.path().join("export.zip");

    let mut zw = zip::ZipWriter::new(File::create(&zip_path).unwrap());
    let opts = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    zw.add_directory("export/", opts).unwrap();
    zw.start_file("export/records.json", opts).unwrap();
    zw.write_all(RECORDS.as_bytes()).unwrap();
    zw.start_file("export/bundle.json", opts).unwrap();
    zw.write_all(BUNDLE.as_bytes()).unwrap();
    zw.finish().unwrap();

    let source = utils::open_source(&zip_path).unwrap();
    let data = ingest::load(&source).unwrap();
    assert_eq!(data.sessions.len(), 3);
    assert_eq!(data.goals.len(), 1);
}

#[test]
fn invalid_json_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    write(&path, "[{\"date\": ");

    let source = utils::open_source(&path).unwrap();
    let err = ingest::load(&source).unwrap_err();
    assert!(format!("{err:#}").contains("broken.json"));
}

#[test]
fn empty_directory_loads_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let source = utils::open_source(dir.path()).unwrap();
    let data = ingest::load(&source).unwrap();
    assert!(data.sessions.is_empty());

    let summary = stats::dashboard(&data.sessions, day(2024, 5, 1));
    assert_eq!(summary.totals.total_records, 0);
    assert_eq!(summary.complex_training_ratio, 0);
}
