use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::data_loader::GameRecord;
use crate::error::{ReportError, Result};
use crate::report_context::ReportContext;
use crate::util::mean;

pub const BACK_TO_BACK_LABEL: &str = "Back-to-Back";
pub const RESTED_LABEL: &str = "Rested";

// Allowed range of the score cutoff. Always derived from the team's games before the cutoff
// is applied, so it moves with the team, never with the cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ThresholdBounds {
    pub min: u32,
    pub max: u32,
}

impl ThresholdBounds {
    pub fn default_threshold(&self) -> u32 {
        self.min
    }

    pub fn clamp(&self, threshold: u32) -> u32 {
        threshold.clamp(self.min, self.max)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub total: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopGameRow {
    pub date: NaiveDate,
    pub team: String,
    pub opp_team: String,
    pub total: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupAverage {
    pub label: String,
    pub average: f64,
    pub games: usize,
}

// Per-game rest information, in date order.
#[derive(Debug, Clone, PartialEq)]
pub struct RestGap {
    pub date: NaiveDate,
    pub total: u32,
    pub days_since_last_game: Option<i64>,
    pub back_to_back: bool,
}

// Everything one run of the report produces. Built fresh per run, never cached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameReport {
    pub team: String,
    pub first_year: i32,
    pub last_year: i32,
    pub bounds: ThresholdBounds,
    pub threshold: u32,
    pub games_shown: usize,

    pub trend: Vec<TrendPoint>,
    pub top_games: Vec<TopGameRow>,
    pub opponent_averages: Vec<GroupAverage>,
    pub monthly_averages: Vec<GroupAverage>,
    pub rest_averages: Vec<GroupAverage>,
}

// Runs the whole report for one cutoff. The source is only borrowed, so calling this again
// with a new cutoff starts from the same data.
pub fn run_pipeline(games: &[GameRecord], team: &str, threshold: Option<u32>, ctx: &ReportContext) -> Result<GameReport> {
    let team_games = filter_team(games, team);
    log::debug!("{} of {} games involve {}", team_games.len(), games.len(), team);

    let bounds = threshold_bounds(&team_games)
        .ok_or_else(|| ReportError::DataUnavailable(format!("no games found for {}", team)))?;

    let first_year = team_games.iter().map(|g| g.date.year()).min().unwrap_or_default();
    let last_year = team_games.iter().map(|g| g.date.year()).max().unwrap_or_default();

    let threshold = match threshold {
        Some(requested) => {
            let clamped = bounds.clamp(requested);
            if clamped != requested {
                log::warn!("Threshold {} outside {}..={}, using {}", requested, bounds.min, bounds.max, clamped);
            }
            clamped
        }
        None => bounds.default_threshold(),
    };

    let shown = filter_threshold(team_games, threshold);
    log::debug!("{} games with total >= {}", shown.len(), threshold);

    Ok(GameReport {
        team: team.to_string(),
        first_year,
        last_year,
        bounds,
        threshold,
        games_shown: shown.len(),

        trend: trend(&shown),
        top_games: top_games(&shown, ctx.top_n, ctx.rank_top_games_by_total),
        opponent_averages: opponent_averages(&shown, team),
        monthly_averages: monthly_averages(&shown),
        rest_averages: rest_averages(&shown),
    })
}

pub fn filter_team(games: &[GameRecord], team: &str) -> Vec<GameRecord> {
    games.iter().filter(|g| g.involves(team)).cloned().collect()
}

pub fn threshold_bounds(games: &[GameRecord]) -> Option<ThresholdBounds> {
    let min = games.iter().map(|g| g.total).min()?;
    let max = games.iter().map(|g| g.total).max()?;

    Some(ThresholdBounds { min, max })
}

pub fn filter_threshold(games: Vec<GameRecord>, threshold: u32) -> Vec<GameRecord> {
    games.into_iter().filter(|g| g.total >= threshold).collect()
}

// Points in the order the games arrive. Chronological only if the dataset is.
pub fn trend(games: &[GameRecord]) -> Vec<TrendPoint> {
    games.iter().map(|g| TrendPoint { date: g.date, total: g.total }).collect()
}

pub fn top_games(games: &[GameRecord], n: usize, rank_by_total: bool) -> Vec<TopGameRow> {
    let mut ordered: Vec<&GameRecord> = games.iter().collect();

    // Stable, so equal totals keep dataset order
    if rank_by_total {
        ordered.sort_by(|a, b| b.total.cmp(&a.total));
    }

    ordered
        .into_iter()
        .take(n)
        .map(|g| TopGameRow {
            date: g.date,
            team: g.team.clone(),
            opp_team: g.opp_team.clone(),
            total: g.total,
        })
        .collect()
}

// Highest average first. Equal averages fall back to opponent name.
pub fn opponent_averages(games: &[GameRecord], team: &str) -> Vec<GroupAverage> {
    let mut by_opponent: BTreeMap<&str, Vec<u32>> = BTreeMap::new();
    for g in games {
        by_opponent.entry(g.opponent_of(team)).or_default().push(g.total);
    }

    let mut averages = group_averages(by_opponent.into_iter().map(|(k, v)| (k.to_string(), v)));
    averages.sort_by(|a, b| b.average.total_cmp(&a.average));
    averages
}

pub fn monthly_averages(games: &[GameRecord]) -> Vec<GroupAverage> {
    let mut by_month: BTreeMap<(i32, u32), Vec<u32>> = BTreeMap::new();
    for g in games {
        by_month.entry((g.date.year(), g.date.month())).or_default().push(g.total);
    }

    group_averages(
        by_month
            .into_iter()
            .map(|((year, month), totals)| (format!("{:04}-{:02}", year, month), totals)),
    )
}

// Sorts by date first, whatever order the games came in. The first game has no previous
// game and so has no gap.
pub fn rest_gaps(games: &[GameRecord]) -> Vec<RestGap> {
    let mut by_date: Vec<&GameRecord> = games.iter().collect();
    by_date.sort_by_key(|g| g.date);

    let mut gaps = Vec::with_capacity(by_date.len());
    let mut previous: Option<NaiveDate> = None;

    for g in by_date {
        let days_since_last_game = previous.map(|p| (g.date - p).num_days());

        gaps.push(RestGap {
            date: g.date,
            total: g.total,
            days_since_last_game,
            back_to_back: days_since_last_game == Some(1),
        });

        previous = Some(g.date);
    }

    gaps
}

// Rested first, then back-to-back. Games without a previous game count as neither, and a
// group with no games is left out.
pub fn rest_averages(games: &[GameRecord]) -> Vec<GroupAverage> {
    let mut rested = Vec::new();
    let mut back_to_back = Vec::new();

    for gap in rest_gaps(games) {
        if gap.days_since_last_game.is_none() { continue; }

        if gap.back_to_back {
            back_to_back.push(gap.total);
        } else {
            rested.push(gap.total);
        }
    }

    group_averages([
        (RESTED_LABEL.to_string(), rested),
        (BACK_TO_BACK_LABEL.to_string(), back_to_back),
    ])
}

fn group_averages<I>(groups: I) -> Vec<GroupAverage>
where
    I: IntoIterator<Item = (String, Vec<u32>)>,
{
    groups
        .into_iter()
        .filter_map(|(label, totals)| {
            let average = mean(&totals)?;
            Some(GroupAverage { label, average, games: totals.len() })
        })
        .collect()
}
