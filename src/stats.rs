use crate::models::{ChartPoint, HeatmapPoint, HistoryRecord};

// History records arrive ordered ascending by date; the chart shows the most
// recent `days` records, not a calendar-filled window.
pub fn chart_series(history: &[HistoryRecord], exercise: &str, days: usize) -> Vec<ChartPoint> {
    let skip = history.len().saturating_sub(days);
    history[skip..]
        .iter()
        .map(|record| ChartPoint {
            date: record.date.clone(),
            count: record
                .exercises
                .iter()
                .find(|entry| entry.name == exercise)
                .map(|entry| entry.count)
                .unwrap_or(0),
        })
        .collect()
}

pub fn heatmap(history: &[HistoryRecord]) -> Vec<HeatmapPoint> {
    history
        .iter()
        .map(|record| {
            let total: u64 = record.exercises.iter().map(|entry| entry.count).sum();
            HeatmapPoint {
                date: record.date.clone(),
                total,
                level: heat_level(total),
            }
        })
        .collect()
}

fn heat_level(total: u64) -> u8 {
    if total == 0 {
        0
    } else if total < 20 {
        1
    } else if total < 50 {
        2
    } else if total < 100 {
        3
    } else {
        4
    }
}
