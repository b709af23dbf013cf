#![deny(
    warnings,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo
)]
#![allow(clippy::multiple_crate_versions)]

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use swimstat::api::ApiClient;
use swimstat::progress::{self, AchievementProgress, AchievementStats, GoalStats};
use swimstat::recommend::{self, Recommendation, UserProfile};
use swimstat::stats::{self, RecordStyleStats, StyleAggregate};
use swimstat::types::{Dataset, Style};
use swimstat::utils::{format_distance, format_minutes, format_pace, format_speed};
use swimstat::{cli, ingest, utils};

#[macro_use]
extern crate swimstat;

#[derive(Serialize)]
struct StylesReport {
    segments: BTreeMap<Style, StyleAggregate>,
    records: BTreeMap<Style, RecordStyleStats>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GoalLine {
    title: String,
    kind: Option<String>,
    status: &'static str,
    progress: u32,
}

#[derive(Serialize)]
struct GoalsReport {
    stats: GoalStats,
    goals: Vec<GoalLine>,
}

#[derive(Serialize)]
struct AchievementsReport {
    stats: AchievementStats,
    closest: Vec<AchievementProgress>,
}

#[derive(Serialize)]
struct RecommendReport {
    profile: UserProfile,
    recommendation: Recommendation,
}

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    utils::init_logging(cli.verbose, cli.quiet);

    let cmd = cli.cmd.unwrap_or(cli::Cmd::Summary { date: None });
    run(cmd, &cli.input, cli.json)
}

fn load(input: &Path) -> Result<Dataset> {
    dlog!("load input={}", input.display());
    let source = utils::open_source(input)?;
    let data = ingest::load(&source)?;
    if data.sessions.is_empty() {
        tracing::warn!(input = %input.display(), "no sessions found; statistics will be empty");
    }
    Ok(data)
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn fetch(api_url: &str, token: Option<String>, out: &Path) -> Result<()> {
    let client = ApiClient::new(api_url, token);
    let bundle = client.fetch_bundle()?;

    let usable = ingest::sanitize_payload(&bundle);
    tracing::info!(
        sessions = usable.sessions.len(),
        goals = usable.goals.len(),
        achievements = usable.achievements.len(),
        "usable records"
    );

    let text = serde_json::to_string_pretty(&bundle).context("serializing bundle")?;
    fs::write(out, text).with_context(|| format!("writing {}", out.display()))?;
    tracing::info!(out = %out.display(), "bundle written");
    Ok(())
}

fn emit<T: Serialize>(as_json: bool, value: &T, text: impl FnOnce(&T)) -> Result<()> {
    if as_json {
        println!(
            "{}",
            serde_json::to_string_pretty(value).context("serializing output")?
        );
    } else {
        text(value);
    }
    Ok(())
}

fn pace_or_dash(pace: Option<f64>) -> String {
    pace.map_or_else(|| "-".to_string(), format_pace)
}

fn run(cmd: cli::Cmd, input: &Path, as_json: bool) -> Result<()> {
    match cmd {
        cli::Cmd::Summary { date } => {
            let data = load(input)?;
            let sessions = &data.sessions;
            let d = stats::dashboard(sessions, date.unwrap_or_else(today));
            emit(as_json, &d, print_dashboard)
        }
        cli::Cmd::Styles => {
            let data = load(input)?;
            let sessions = &data.sessions;
            let report = StylesReport {
                segments: stats::style_breakdown(sessions),
                records: stats::record_style_stats(sessions),
            };
            emit(as_json, &report, print_styles)
        }
        cli::Cmd::Weekly { date } => {
            let data = load(input)?;
            let sessions = &data.sessions;
            let reference = date.unwrap_or_else(today);
            let w = stats::weekly_stats(sessions, reference);
            emit(as_json, &w, |w| {
                println!("window\t{reference}\t7 days");
                println!("sessions\t{}", w.session_count);
                println!("distance\t{}", format_distance(w.total_distance));
                println!("time\t{}", format_minutes(w.total_time));
                println!("avg distance\t{}", format_distance(w.average_distance));
                println!("avg time\t{}", format_minutes(w.average_time));
            })
        }
        cli::Cmd::Bests => {
            let data = load(input)?;
            let sessions = &data.sessions;
            let bests = stats::personal_bests(sessions);
            emit(as_json, &bests, |b| match b {
                Some(b) => {
                    println!("distance\t{}", format_distance(b.distance));
                    println!("duration\t{}", format_minutes(b.duration));
                    println!("speed\t{}", format_speed(b.speed));
                }
                None => println!("no sessions"),
            })
        }
        cli::Cmd::Compare { date } => {
            let data = load(input)?;
            let sessions = &data.sessions;
            let analysis = stats::analyze_latest(sessions, date.unwrap_or_else(today));
            emit(as_json, &analysis, |a| match a {
                Some(a) => print_analysis(a),
                None => println!("no sessions"),
            })
        }
        cli::Cmd::Goals => {
            let data = load(input)?;
            let report = GoalsReport {
                stats: progress::goal_stats(&data.goals),
                goals: data
                    .goals
                    .iter()
                    .map(|g| GoalLine {
                        title: g.title.clone(),
                        kind: g.kind.map(|k| k.to_string()),
                        status: g.status.as_str(),
                        progress: progress::goal_progress(g),
                    })
                    .collect(),
            };
            emit(as_json, &report, |r| {
                println!(
                    "goals\t{}\tactive={} completed={} failed={} paused={}\tcompletion={}%",
                    r.stats.total_goals,
                    r.stats.active_goals,
                    r.stats.completed_goals,
                    r.stats.failed_goals,
                    r.stats.paused_goals,
                    r.stats.completion_rate
                );
                for (kind, n) in &r.stats.goals_by_type {
                    println!("type\t{kind}\t{n}");
                }
                for g in &r.goals {
                    let kind = g.kind.as_deref().unwrap_or("-");
                    println!("{}\t{kind}\t{}\t{}%", g.title, g.status, g.progress);
                }
            })
        }
        cli::Cmd::Achievements { limit } => {
            let data = load(input)?;
            let report = AchievementsReport {
                stats: progress::achievement_stats(&data.achievements),
                closest: progress::closest_achievements(&data.achievements, limit),
            };
            emit(as_json, &report, |r| {
                let l = r.stats.level_stats;
                println!(
                    "achievements\t{}/{}\tcompletion={}%",
                    r.stats.unlocked_achievements, r.stats.total_achievements, r.stats.completion_rate
                );
                println!(
                    "levels\tbronze={} silver={} gold={} platinum={}",
                    l.bronze, l.silver, l.gold, l.platinum
                );
                for a in &r.closest {
                    println!("{}\t{}%\t{}/{}", a.title, a.progress, a.current, a.target);
                }
            })
        }
        cli::Cmd::Recommend { date } => {
            let data = load(input)?;
            let sessions = &data.sessions;
            let profile = recommend::user_profile(sessions, date.unwrap_or_else(today));
            let recommendation = recommend::recommend(&profile, sessions);
            let report = RecommendReport {
                profile,
                recommendation,
            };
            emit(as_json, &report, print_recommendation)
        }
        cli::Cmd::Fetch {
            api_url,
            token,
            out,
        } => {
            let out = out.unwrap_or_else(|| input.to_path_buf());
            dlog!("fetch api_url={} out={}", api_url, out.display());
            fetch(&api_url, token, &out)
        }
    }
}

fn print_dashboard(d: &stats::Dashboard) {
    let t = &d.totals;
    println!("records\t{}", t.total_records);
    println!("distance\t{}", format_distance(t.total_distance));
    println!("time\t{}", format_minutes(t.total_time));
    println!("avg distance\t{}", format_distance(t.average_distance));
    println!("avg time\t{}", format_minutes(t.average_time));
    println!(
        "this week\t{} sessions\t{}\t{}",
        t.weekly_stats.session_count,
        format_distance(t.weekly_stats.total_distance),
        format_minutes(t.weekly_stats.total_time)
    );
    if let Some(b) = t.personal_bests {
        println!(
            "bests\t{}\t{}\t{}",
            format_distance(b.distance),
            format_minutes(b.duration),
            format_speed(b.speed)
        );
    }
    if d.average_heart_rate > 0 {
        println!("avg heart rate\t{} bpm", d.average_heart_rate);
    }
    if d.average_pool_length > 0 {
        println!("avg pool length\t{}m", d.average_pool_length);
    }
    println!("avg session\t{}", format_minutes(d.average_session_duration));
    println!("complex sessions\t{}%", d.complex_training_ratio);
    println!(
        "intensity\tlow={} medium={} high={}",
        d.intensity.low, d.intensity.medium, d.intensity.high
    );
    for (goal, n) in &d.goal_distribution {
        println!("goal\t{goal}\t{n}");
    }
}

fn print_styles(r: &StylesReport) {
    for (style, s) in &r.segments {
        let hr = s
            .average_heart_rate
            .map_or_else(|| "-".to_string(), |v| format!("{v:.0} bpm"));
        println!(
            "segments\t{style}\t{}x\t{}\t{}\t{}\t{hr}",
            s.segment_count,
            format_distance(s.total_distance),
            format_minutes(s.total_duration),
            pace_or_dash(s.average_pace)
        );
    }
    for (style, s) in &r.records {
        println!(
            "records\t{style}\t{}x\t{}\t{}\tbest {}",
            s.count,
            format_distance(s.total_distance),
            format_minutes(s.total_time),
            format_distance(s.best_distance)
        );
    }
}

fn signed_percent(v: Option<f64>) -> String {
    v.map_or_else(|| "-".to_string(), |v| format!("{v:+.1}%"))
}

fn print_analysis(a: &stats::TrainingAnalysis) {
    let s = &a.session;
    println!(
        "latest\t{}\t{}\t{}\t{}",
        s.date,
        format_distance(s.distance),
        format_minutes(s.duration),
        pace_or_dash(s.pace())
    );
    if a.improvement.is_first_record {
        println!("first record");
    } else {
        println!(
            "vs previous\tdistance {}\ttime {}\tspeed {}",
            signed_percent(a.improvement.distance_improvement),
            signed_percent(a.improvement.time_improvement),
            signed_percent(a.improvement.speed_improvement)
        );
    }
    if let Some(kind) = a.record_type {
        println!("new record\t{}", kind.as_str());
    }
    println!(
        "this week\t{} sessions\t{}",
        a.weekly_stats.session_count,
        format_distance(a.weekly_stats.total_distance)
    );
}

fn print_recommendation(r: &RecommendReport) {
    let p = &r.profile;
    let styles: Vec<&str> = p.preferred_styles.iter().copied().map(Style::as_str).collect();
    println!("distance\t{}", format_distance(p.total_distance));
    println!("time\t{}", format_minutes(p.total_time));
    println!("avg speed\t{}", format_speed(p.average_speed));
    println!("styles\t{}", styles.join(", "));
    println!("last 30 days\t{} sessions", p.training_frequency);
    println!("consistency\t{:.1}%", p.consistency * 100.0);

    let rec = &r.recommendation;
    println!(
        "plan\t{}\t{}\t{}\t{} min",
        rec.difficulty.as_str(),
        rec.intensity.as_str(),
        rec.focus,
        rec.duration
    );
    println!("swim\t{}", rec.swim_training);
    println!("dryland\t{}", rec.dryland_training);
}
