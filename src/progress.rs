use crate::stats::{percent, round_u32};
use crate::types::{Achievement, AchievementLevel, GoalKind, GoalRecord, GoalStatus};
use serde::Serialize;
use std::collections::BTreeMap;

fn clamped_percent(current: f64, target: f64) -> u32 {
    if target <= 0.0 {
        return 0;
    }
    round_u32(current / target * 100.0).min(100)
}

pub fn goal_progress(goal: &GoalRecord) -> u32 {
    clamped_percent(goal.current_value, goal.target_value)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalStats {
    pub total_goals: usize,
    pub active_goals: usize,
    pub completed_goals: usize,
    pub failed_goals: usize,
    pub paused_goals: usize,
    pub completion_rate: u32,
    pub goals_by_type: BTreeMap<GoalKind, usize>,
}

pub fn goal_stats(goals: &[GoalRecord]) -> GoalStats {
    let mut out = GoalStats {
        total_goals: goals.len(),
        ..GoalStats::default()
    };
    for g in goals {
        match g.status {
            GoalStatus::Active => out.active_goals += 1,
            GoalStatus::Completed => out.completed_goals += 1,
            GoalStatus::Failed => out.failed_goals += 1,
            GoalStatus::Paused => out.paused_goals += 1,
        }
        if let Some(kind) = g.kind {
            *out.goals_by_type.entry(kind).or_insert(0) += 1;
        }
    }
    out.completion_rate = percent(out.completed_goals, out.total_goals);
    out
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LevelStats {
    pub bronze: usize,
    pub silver: usize,
    pub gold: usize,
    pub platinum: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementStats {
    pub total_achievements: usize,
    pub unlocked_achievements: usize,
    pub completion_rate: u32,
    /// unlocked achievements only
    pub level_stats: LevelStats,
}

pub fn achievement_stats(achievements: &[Achievement]) -> AchievementStats {
    let mut out = AchievementStats {
        total_achievements: achievements.len(),
        ..AchievementStats::default()
    };
    for a in achievements.iter().filter(|a| a.is_unlocked) {
        out.unlocked_achievements += 1;
        match a.level {
            Some(AchievementLevel::Bronze) => out.level_stats.bronze += 1,
            Some(AchievementLevel::Silver) => out.level_stats.silver += 1,
            Some(AchievementLevel::Gold) => out.level_stats.gold += 1,
            Some(AchievementLevel::Platinum) => out.level_stats.platinum += 1,
            None => {}
        }
    }
    out.completion_rate = percent(out.unlocked_achievements, out.total_achievements);
    out
}

pub fn achievement_progress(achievement: &Achievement) -> u32 {
    clamped_percent(achievement.progress, achievement.target)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementProgress {
    pub title: String,
    pub progress: u32,
    pub current: f64,
    pub target: f64,
}

/// Locked achievements nearest to unlocking, best first.
pub fn closest_achievements(achievements: &[Achievement], limit: usize) -> Vec<AchievementProgress> {
    let mut out: Vec<AchievementProgress> = achievements
        .iter()
        .filter(|a| !a.is_unlocked)
        .map(|a| AchievementProgress {
            title: a.title.clone(),
            progress: achievement_progress(a),
            current: a.progress,
            target: a.target,
        })
        .collect();
    // stable: equal progress keeps input order
    out.sort_by(|a, b| b.progress.cmp(&a.progress));
    out.truncate(limit);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goal(status: GoalStatus, kind: Option<GoalKind>, current: f64, target: f64) -> GoalRecord {
        GoalRecord {
            id: None,
            title: "goal".to_string(),
            kind,
            target_value: target,
            current_value: current,
            unit: None,
            start_date: None,
            end_date: None,
            status,
            is_completed: status == GoalStatus::Completed,
        }
    }

    fn achievement(title: &str, level: AchievementLevel, unlocked: bool, progress: f64) -> Achievement {
        Achievement {
            id: None,
            kind: "distance".to_string(),
            level: Some(level),
            title: title.to_string(),
            progress,
            target: 10.0,
            is_unlocked: unlocked,
            unlocked_at: None,
        }
    }

    #[test]
    fn test_goal_progress_is_clamped() {
        assert_eq!(goal_progress(&goal(GoalStatus::Active, None, 5.0, 20.0)), 25);
        assert_eq!(goal_progress(&goal(GoalStatus::Active, None, 50.0, 20.0)), 100);
        assert_eq!(goal_progress(&goal(GoalStatus::Active, None, 5.0, 0.0)), 0);
    }

    #[test]
    fn test_goal_stats() {
        assert_eq!(goal_stats(&[]), GoalStats::default());

        let goals = [
            goal(GoalStatus::Completed, Some(GoalKind::Distance), 10.0, 10.0),
            goal(GoalStatus::Active, Some(GoalKind::Distance), 1.0, 10.0),
            goal(GoalStatus::Failed, Some(GoalKind::Streak), 1.0, 10.0),
        ];
        let s = goal_stats(&goals);
        assert_eq!(s.total_goals, 3);
        assert_eq!(s.completed_goals, 1);
        assert_eq!(s.failed_goals, 1);
        assert_eq!(s.completion_rate, 33);
        assert_eq!(s.goals_by_type.get(&GoalKind::Distance), Some(&2));
    }

    #[test]
    fn test_achievement_stats_counts_unlocked_levels() {
        let list = [
            achievement("a", AchievementLevel::Gold, true, 10.0),
            achievement("b", AchievementLevel::Gold, false, 3.0),
            achievement("c", AchievementLevel::Bronze, true, 10.0),
            achievement("d", AchievementLevel::Silver, false, 0.0),
        ];
        let s = achievement_stats(&list);
        assert_eq!(s.unlocked_achievements, 2);
        assert_eq!(s.completion_rate, 50);
        assert_eq!(s.level_stats.gold, 1);
        assert_eq!(s.level_stats.bronze, 1);
        assert_eq!(s.level_stats.silver, 0);
    }

    #[test]
    fn test_closest_achievements() {
        let list = [
            achievement("low", AchievementLevel::Bronze, false, 1.0),
            achievement("done", AchievementLevel::Gold, true, 10.0),
            achievement("high", AchievementLevel::Silver, false, 8.0),
            achievement("mid", AchievementLevel::Silver, false, 5.0),
        ];
        let top = closest_achievements(&list, 2);
        let titles: Vec<&str> = top.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, ["high", "mid"]);
        assert_eq!(top[0].progress, 80);
    }
}
