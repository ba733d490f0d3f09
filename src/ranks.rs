use crate::models::RankStatus;

pub struct Rank {
    pub name: &'static str,
    pub threshold: f64,
}

pub const RANKS: [Rank; 7] = [
    Rank { name: "Новичок", threshold: 0.0 },
    Rank { name: "Любитель", threshold: 500.0 },
    Rank { name: "Атлет", threshold: 1500.0 },
    Rank { name: "Мастер", threshold: 4000.0 },
    Rank { name: "Машина", threshold: 10000.0 },
    Rank { name: "Киборг", threshold: 25000.0 },
    Rank { name: "Легенда", threshold: 50000.0 },
];

pub fn current(xp: f64) -> &'static Rank {
    RANKS
        .iter()
        .rev()
        .find(|rank| xp >= rank.threshold)
        .unwrap_or(&RANKS[0])
}

pub fn next(xp: f64) -> Option<&'static Rank> {
    RANKS.iter().find(|rank| rank.threshold > xp)
}

pub fn progress_percent(xp: f64) -> f64 {
    let held = current(xp);
    match next(xp) {
        Some(coming) => {
            let fraction = (xp - held.threshold) / (coming.threshold - held.threshold);
            (fraction * 100.0).clamp(0.0, 100.0)
        }
        None => 100.0,
    }
}

pub fn status(xp: f64) -> RankStatus {
    RankStatus {
        rank: current(xp).name.to_string(),
        next_rank: next(xp).map(|rank| rank.name.to_string()),
        xp,
        progress_percent: progress_percent(xp),
    }
}
