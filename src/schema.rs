use crate::models::{Exercise, Unit, UserProfile};

// Version history:
//   0-1: documents written before per-exercise XP existed; they lack
//        `lifetime`, `xp_per_rep`, `unit` and `total_xp`.
//   2:   current shape, all fields present.
pub const SCHEMA_VERSION: u32 = 2;

pub struct ExerciseDefaults {
    pub xp_per_rep: f64,
    pub unit: Unit,
}

pub const EXERCISE_DEFAULTS: ExerciseDefaults = ExerciseDefaults {
    xp_per_rep: 1.0,
    unit: Unit::Reps,
};

pub fn migrate_profile(profile: &mut UserProfile) {
    if profile.schema_version >= SCHEMA_VERSION {
        return;
    }
    for exercise in &mut profile.exercises {
        migrate_exercise(exercise);
    }
    if profile.total_xp.is_none() {
        profile.total_xp = Some(profile.total_lifetime_count as f64);
    }
    profile.schema_version = SCHEMA_VERSION;
}

fn migrate_exercise(exercise: &mut Exercise) {
    // A legacy lifetime is best approximated by the day's count, which is
    // what the counter showed before lifetimes were stored.
    if exercise.lifetime.is_none() {
        exercise.lifetime = Some(exercise.count);
    }
    if exercise.xp_per_rep.is_none() {
        exercise.xp_per_rep = Some(EXERCISE_DEFAULTS.xp_per_rep);
    }
    if exercise.unit.is_none() {
        exercise.unit = Some(EXERCISE_DEFAULTS.unit);
    }
}
