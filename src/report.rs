use std::io::Write;

use serde::Serialize;

use crate::error::Result;
use crate::pipeline::{GameReport, GroupAverage};
use crate::report_context::ReportContext;
use crate::util::remap_value_clamped;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub x: String,
    pub y: f64,
}

// One element of the rendered page, in display order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Widget {
    Heading { level: u8, text: String },
    Text { text: String },
    LineChart {
        title: String,
        x_label: String,
        y_label: String,
        colors: Vec<String>,
        points: Vec<ChartPoint>,
    },
    Table {
        title: String,
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    BarChart {
        title: String,
        x_label: String,
        y_label: String,
        colors: Vec<String>,
        bars: Vec<ChartPoint>,
    },
    Warning { text: String },
}

fn heading(level: u8, text: impl Into<String>) -> Widget {
    Widget::Heading { level, text: text.into() }
}

fn text(text: impl Into<String>) -> Widget {
    Widget::Text { text: text.into() }
}

fn bars_from(averages: &[GroupAverage]) -> Vec<ChartPoint> {
    averages.iter().map(|a| ChartPoint { x: a.label.clone(), y: a.average }).collect()
}

pub fn build_page(report: &GameReport, ctx: &ReportContext) -> Vec<Widget> {
    let team = &report.team;
    let purple = ctx.primary_color.clone();
    let gold = ctx.secondary_color.clone();

    let mut page = vec![
        heading(1, format!("🏀 {} Game Breakdown ({}–{})", team, report.first_year, report.last_year)),
        text(format!(
            "A quick look at how the {} performed game by game, from overall trends to how they handled tough schedules.",
            team
        )),
        heading(3, format!("Showing {} games with total score ≥ {}", report.games_shown, report.threshold)),
    ];

    page.push(heading(2, "Scoring Trend Over Time"));
    page.push(Widget::LineChart {
        title: "Total Points by Game Date".to_string(),
        x_label: "Game Date".to_string(),
        y_label: "Points".to_string(),
        colors: vec![purple.clone()],
        points: report
            .trend
            .iter()
            .map(|p| ChartPoint { x: p.date.to_string(), y: p.total as f64 })
            .collect(),
    });

    let (table_heading, table_title) = if ctx.rank_top_games_by_total {
        (format!("Top {} Highest-Scoring Games", ctx.top_n), "Highest Scoring Games".to_string())
    } else {
        (format!("First {} Games", ctx.top_n), "Games".to_string())
    };
    page.push(heading(2, table_heading));
    page.push(Widget::Table {
        title: table_title,
        columns: ["date", "team", "opp_team", "total"].iter().map(|c| c.to_string()).collect(),
        rows: report
            .top_games
            .iter()
            .map(|r| vec![r.date.to_string(), r.team.clone(), r.opp_team.clone(), r.total.to_string()])
            .collect(),
    });

    page.push(heading(2, "Avg Points Scored vs Each Opponent"));
    page.push(Widget::BarChart {
        title: format!("{} Avg Points vs Other Teams", team),
        x_label: "Opponent".to_string(),
        y_label: "Avg Points".to_string(),
        colors: vec![gold.clone()],
        bars: bars_from(&report.opponent_averages),
    });

    page.push(heading(2, "Monthly Scoring Breakdown"));
    page.push(Widget::BarChart {
        title: "Average Score Per Month".to_string(),
        x_label: "Month".to_string(),
        y_label: "Avg Points".to_string(),
        colors: vec![purple.clone()],
        bars: bars_from(&report.monthly_averages),
    });

    page.push(heading(2, "Back-to-Back Game Impact"));
    page.push(text(format!(
        "Did playing two nights in a row have any effect on the {} scoring performance?",
        team
    )));
    page.push(Widget::BarChart {
        title: "Avg Score: Rested vs Back-to-Back".to_string(),
        x_label: "Game Type".to_string(),
        y_label: "Avg Points".to_string(),
        colors: vec![gold, purple],
        bars: bars_from(&report.rest_averages),
    });

    page
}

// The page shown instead of the report when there is nothing to report on.
pub fn warning_page(team: &str) -> Vec<Widget> {
    vec![Widget::Warning {
        text: format!("⚠️ Couldn't load any {} data. Please check your dataset or try reloading.", team),
    }]
}

pub fn render_json<W: Write>(out: &mut W, page: &[Widget]) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, page)?;
    writeln!(out)?;
    Ok(())
}

pub fn render_text<W: Write>(out: &mut W, page: &[Widget], bar_width: usize) -> Result<()> {
    for widget in page {
        match widget {
            Widget::Heading { level, text } => {
                writeln!(out, "{} {}", "#".repeat(*level as usize), text)?;
            }
            Widget::Text { text } => writeln!(out, "{}", text)?,
            Widget::Warning { text } => writeln!(out, "{}", text)?,
            Widget::LineChart { title, points, .. } => {
                // Scaled between the lowest and highest point so the movement is visible
                let low = points.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
                let high = points.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);

                writeln!(out, "{}", title)?;
                for p in points {
                    let width = remap_value_clamped(p.y, low, high, 1.0, bar_width as f64).round() as usize;
                    writeln!(out, "{0:12} | {1:5} | {2}", p.x, p.y, "#".repeat(width))?;
                }
            }
            Widget::BarChart { title, bars, .. } => {
                let high = bars.iter().map(|b| b.y).fold(0.0, f64::max);
                let label_width = bars.iter().map(|b| b.x.chars().count()).max().unwrap_or(0);

                writeln!(out, "{}", title)?;
                for b in bars {
                    let width = remap_value_clamped(b.y, 0.0, high, 0.0, bar_width as f64).round() as usize;
                    writeln!(out, "{0:1$} | {2:6.1} | {3}", b.x, label_width, b.y, "#".repeat(width))?;
                }
            }
            Widget::Table { title, columns, rows } => {
                let widths: Vec<usize> = (0..columns.len())
                    .map(|i| {
                        rows.iter()
                            .filter_map(|r| r.get(i))
                            .chain(std::iter::once(&columns[i]))
                            .map(|c| c.chars().count())
                            .max()
                            .unwrap_or(0)
                    })
                    .collect();

                writeln!(out, "{}", title)?;
                write_table_row(out, columns, &widths)?;
                for row in rows {
                    write_table_row(out, row, &widths)?;
                }
            }
        }
        writeln!(out)?;
    }

    Ok(())
}

fn write_table_row<W: Write>(out: &mut W, cells: &[String], widths: &[usize]) -> Result<()> {
    let mut line = String::from("|");
    for (cell, width) in cells.iter().zip(widths) {
        line.push_str(&format!(" {0:1$} |", cell, width));
    }
    writeln!(out, "{}", line)?;
    Ok(())
}
