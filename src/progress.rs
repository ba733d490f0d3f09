use crate::models::UserProfile;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogOutcome {
    pub amount: u64,
    pub xp_gained: f64,
    pub goal_reached: bool,
}

pub fn parse_amount(input: &str) -> Option<u64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<u64>().ok()
}

pub fn apply(profile: &mut UserProfile, index: usize, amount: u64) -> LogOutcome {
    let exercise = &mut profile.exercises[index];
    let before = exercise.count;
    exercise.count = exercise.count.saturating_add(amount);
    exercise.lifetime = Some(exercise.lifetime_total().saturating_add(amount));

    let xp_gained = amount as f64 * exercise.xp_per_unit();
    let target = u64::from(exercise.target);
    let goal_reached = before < target && exercise.count >= target;

    profile.total_lifetime_count = profile.total_lifetime_count.saturating_add(amount);
    profile.total_xp = Some(profile.xp_total() + xp_gained);

    LogOutcome {
        amount,
        xp_gained,
        goal_reached,
    }
}
