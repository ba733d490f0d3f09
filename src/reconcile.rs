use crate::models::{Exercise, HistoryRecord, NotificationSettings, Unit, UserProfile};
use crate::schema;
use chrono::{Duration, Local, NaiveDate};
use serde::Serialize;
use std::collections::BTreeSet;

pub const DEFAULT_EXERCISE_NAME: &str = "Отжимания";
pub const DEFAULT_EXERCISE_TARGET: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileOutcome {
    Created,
    SameDay,
    RolledOver,
}

#[derive(Debug, Clone)]
pub struct ProfileSeed {
    pub email: String,
    pub display_name: String,
}

#[derive(Debug)]
pub struct Reconciliation {
    pub profile: UserProfile,
    pub archive: Option<HistoryRecord>,
    pub outcome: ReconcileOutcome,
}

pub fn reconcile(stored: Option<UserProfile>, seed: &ProfileSeed) -> Reconciliation {
    reconcile_at(Local::now().date_naive(), stored, seed)
}

pub fn reconcile_at(
    today: NaiveDate,
    stored: Option<UserProfile>,
    seed: &ProfileSeed,
) -> Reconciliation {
    let Some(mut profile) = stored else {
        return Reconciliation {
            profile: seeded_profile(seed, today),
            archive: None,
            outcome: ReconcileOutcome::Created,
        };
    };

    schema::migrate_profile(&mut profile);

    let today_key = today.to_string();
    if profile.last_date == today_key {
        return Reconciliation {
            profile,
            archive: None,
            outcome: ReconcileOutcome::SameDay,
        };
    }

    let yesterday = today - Duration::days(1);
    let closed_yesterday = profile.last_date == yesterday.to_string();
    let qualifying = profile.has_activity();
    let stored_date = NaiveDate::parse_from_str(&profile.last_date, "%Y-%m-%d");
    match &stored_date {
        // last_date never moves backwards; a stored date ahead of the clock
        // means the clock is wrong, not that a day ended.
        Ok(date) if *date > today => {
            tracing::warn!(
                last_date = %profile.last_date,
                %today,
                "stored last_date is ahead of the clock, skipping rollover"
            );
            return Reconciliation {
                profile,
                archive: None,
                outcome: ReconcileOutcome::SameDay,
            };
        }
        Err(_) => {
            tracing::warn!(
                last_date = %profile.last_date,
                "stored last_date does not parse, treating as multi-day gap"
            );
        }
        Ok(_) => {}
    }

    // The streak only survives an unbroken chain: the day being closed must
    // be exactly yesterday. A gap of two or more days always resets it, even
    // when the stale day itself had activity.
    let streak = if closed_yesterday {
        if qualifying {
            profile.streak + 1
        } else {
            profile.streak
        }
    } else {
        0
    };

    let archive = if qualifying && stored_date.is_ok() {
        Some(HistoryRecord {
            date: profile.last_date.clone(),
            exercises: profile.exercises.clone(),
            timestamp: Local::now().to_rfc3339(),
        })
    } else {
        None
    };

    for exercise in &mut profile.exercises {
        exercise.count = 0;
    }
    profile.last_date = today_key;
    profile.streak = streak;

    Reconciliation {
        profile,
        archive,
        outcome: ReconcileOutcome::RolledOver,
    }
}

fn seeded_profile(seed: &ProfileSeed, today: NaiveDate) -> UserProfile {
    UserProfile {
        exercises: vec![Exercise::new(
            DEFAULT_EXERCISE_NAME.to_string(),
            DEFAULT_EXERCISE_TARGET,
            schema::EXERCISE_DEFAULTS.xp_per_rep,
            Unit::Reps,
        )],
        last_date: today.to_string(),
        streak: 0,
        total_lifetime_count: 0,
        total_xp: Some(0.0),
        settings: NotificationSettings::default(),
        email: seed.email.clone(),
        display_name: seed.display_name.clone(),
        friends: BTreeSet::new(),
        schema_version: schema::SCHEMA_VERSION,
    }
}
