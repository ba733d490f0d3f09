use crate::reconcile::ReconcileOutcome;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub const DAYS_OF_WEEK: [&str; 7] = ["Пн", "Вт", "Ср", "Чт", "Пт", "Сб", "Вс"];

pub const DEFAULT_DISPLAY_NAME: &str = "Аноним";

pub const INITIAL_QUOTES: [&str; 2] = [
    "Боль дисциплины весит граммы, а боль сожаления — тонны.",
    "Результаты не приходят за одну ночь. Будь терпелив.",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Reps,
    Seconds,
    Minutes,
    Km,
    Kg,
}

// The optional fields are absent in documents written before XP tracking
// existed; schema::migrate_profile backfills them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exercise {
    pub name: String,
    pub target: u32,
    #[serde(default)]
    pub count: u64,
    pub lifetime: Option<u64>,
    pub xp_per_rep: Option<f64>,
    pub unit: Option<Unit>,
}

impl Exercise {
    pub fn new(name: String, target: u32, xp_per_rep: f64, unit: Unit) -> Self {
        Self {
            name,
            target,
            count: 0,
            lifetime: Some(0),
            xp_per_rep: Some(xp_per_rep),
            unit: Some(unit),
        }
    }

    pub fn lifetime_total(&self) -> u64 {
        self.lifetime.unwrap_or(self.count)
    }

    pub fn xp_per_unit(&self) -> f64 {
        self.xp_per_rep
            .unwrap_or(crate::schema::EXERCISE_DEFAULTS.xp_per_rep)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSettings {
    pub notify: bool,
    pub times: Vec<String>,
    pub days: BTreeSet<String>,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            notify: false,
            times: vec!["10:00".to_string()],
            days: BTreeSet::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub exercises: Vec<Exercise>,
    pub last_date: String,
    #[serde(default)]
    pub streak: u32,
    #[serde(default)]
    pub total_lifetime_count: u64,
    pub total_xp: Option<f64>,
    #[serde(default)]
    pub settings: NotificationSettings,
    pub email: String,
    pub display_name: String,
    #[serde(default)]
    pub friends: BTreeSet<String>,
    #[serde(default)]
    pub schema_version: u32,
}

impl UserProfile {
    pub fn xp_total(&self) -> f64 {
        self.total_xp.unwrap_or(self.total_lifetime_count as f64)
    }

    pub fn has_activity(&self) -> bool {
        self.exercises.iter().any(|exercise| exercise.count > 0)
    }

    pub fn today_total(&self) -> u64 {
        self.exercises.iter().map(|exercise| exercise.count).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub date: String,
    pub exercises: Vec<Exercise>,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalStat {
    pub user_id: String,
    pub display_name: String,
    pub exercise: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub password_hash: String,
    pub reset_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreData {
    pub accounts: BTreeMap<String, Account>,
    pub users: BTreeMap<String, UserProfile>,
    pub history: BTreeMap<String, BTreeMap<String, HistoryRecord>>,
    pub global_stats: BTreeMap<String, GlobalStat>,
    pub quotes: Vec<String>,
}

impl Default for StoreData {
    fn default() -> Self {
        Self {
            accounts: BTreeMap::new(),
            users: BTreeMap::new(),
            history: BTreeMap::new(),
            global_stats: BTreeMap::new(),
            quotes: INITIAL_QUOTES.iter().map(|quote| quote.to_string()).collect(),
        }
    }
}

impl StoreData {
    pub fn find_account_by_email(&self, email: &str) -> Option<&Account> {
        self.accounts
            .values()
            .find(|account| account.email.eq_ignore_ascii_case(email))
    }

    pub fn global_stat_key(user_id: &str, exercise: &str) -> String {
        format!("{user_id}_{exercise}")
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetConfirmRequest {
    pub email: String,
    pub token: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
pub struct AddExerciseRequest {
    pub name: String,
    pub target: u32,
    pub xp_per_rep: Option<f64>,
    pub unit: Option<Unit>,
}

#[derive(Debug, Deserialize)]
pub struct RetargetRequest {
    pub name: String,
    pub target: u32,
}

// The amount arrives as the raw input string; anything that is not a plain
// non-negative integer is silently ignored.
#[derive(Debug, Deserialize)]
pub struct ProgressRequest {
    pub exercise: String,
    pub amount: String,
}

#[derive(Debug, Deserialize)]
pub struct FriendRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub exercise: Option<String>,
    pub range: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub exercise: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub service: &'static str,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct RankStatus {
    pub rank: String,
    pub next_rank: Option<String>,
    pub xp: f64,
    pub progress_percent: f64,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub session: SessionView,
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub profile: UserProfile,
    pub rank: RankStatus,
    pub outcome: ReconcileOutcome,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub profile: UserProfile,
    pub rank: RankStatus,
}

#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    pub exercise: Exercise,
    pub accepted: bool,
    pub xp_gained: f64,
    pub goal_reached: bool,
    pub rank: RankStatus,
}

#[derive(Debug, Serialize)]
pub struct ChartPoint {
    pub date: String,
    pub count: u64,
}

#[derive(Debug, Serialize)]
pub struct HeatmapPoint {
    pub date: String,
    pub total: u64,
    pub level: u8,
}

#[derive(Debug, Serialize)]
pub struct StatsView {
    pub rank: RankStatus,
    pub streak: u32,
    pub total_lifetime_count: u64,
    pub chart: Vec<ChartPoint>,
    pub heatmap: Vec<HeatmapPoint>,
}

#[derive(Debug, Serialize)]
pub struct FriendView {
    pub display_name: String,
    pub email: String,
    pub total_xp: f64,
    pub today_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FriendAddStatus {
    Added,
    NotFound,
    SelfAdd,
}

#[derive(Debug, Serialize)]
pub struct FriendAddResponse {
    pub status: FriendAddStatus,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub quote: String,
}
