use crate::auth;
use crate::errors::AppError;
use crate::models::{
    Account, AddExerciseRequest, AuthResponse, Exercise, FriendAddResponse, FriendAddStatus, FriendRequest,
    FriendView, GlobalStat, HistoryRecord, LeaderboardQuery, LoginRequest, MessageResponse,
    NotificationSettings, ProfileResponse, ProgressRequest, ProgressResponse, QuoteResponse,
    RegisterRequest, ResetConfirmRequest, ResetRequest, RetargetRequest, ServiceInfo, SessionView,
    StatsQuery, StatsView, StoreData, UpdateProfileRequest, DAYS_OF_WEEK, DEFAULT_DISPLAY_NAME,
};
use crate::progress;
use crate::ranks;
use crate::reconcile::{self, ProfileSeed};
use crate::schema;
use crate::state::AppState;
use crate::stats;
use crate::storage::persist_data;
use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use chrono::NaiveTime;
use rand::Rng;
use tracing::{info, warn};

pub async fn health() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: "fittracker",
        status: "ok",
    })
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let email = normalize_email(&payload.email)?;
    if payload.password.chars().count() < auth::MIN_PASSWORD_LEN {
        return Err(AppError::bad_request(format!(
            "password must be at least {} characters",
            auth::MIN_PASSWORD_LEN
        )));
    }
    let display_name = payload
        .display_name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string());

    let (user_id, session) = {
        let mut data = state.data.lock().await;
        if data.find_account_by_email(&email).is_some() {
            return Err(AppError::conflict("an account with that email already exists"));
        }
        let account = Account {
            id: auth::new_user_id(),
            email: email.clone(),
            display_name,
            password_hash: auth::hash_password(&payload.password)?,
            reset_token: None,
        };
        let user_id = account.id.clone();
        data.accounts.insert(user_id.clone(), account);
        let session = run_reconciliation(&mut data, &user_id)?;
        persist_data(&state.data_path, &data).await?;
        (user_id, session)
    };

    info!(%email, "account registered");
    let token = issue_session(&state, user_id).await;
    Ok(Json(AuthResponse { token, session }))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let email = normalize_email(&payload.email)?;

    let (user_id, session) = {
        let mut data = state.data.lock().await;
        let account = data
            .find_account_by_email(&email)
            .cloned()
            .ok_or_else(|| AppError::unauthorized("invalid credentials"))?;
        if !auth::verify_password(&payload.password, &account.password_hash) {
            warn!(%email, "failed login attempt");
            return Err(AppError::unauthorized("invalid credentials"));
        }
        let session = run_reconciliation(&mut data, &account.id)?;
        persist_data(&state.data_path, &data).await?;
        (account.id, session)
    };

    let token = issue_session(&state, user_id).await;
    Ok(Json(AuthResponse { token, session }))
}

pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MessageResponse>, AppError> {
    let token = auth::bearer_token(&headers)?;
    state.sessions.lock().await.remove(token);
    Ok(Json(MessageResponse {
        message: "signed out".to_string(),
    }))
}

pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(payload): Json<ResetRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let email = normalize_email(&payload.email)?;
    let mut data = state.data.lock().await;
    let account_id = data
        .find_account_by_email(&email)
        .map(|account| account.id.clone())
        .ok_or_else(|| AppError::not_found("no account for that email"))?;

    let token = auth::new_token();
    if let Some(account) = data.accounts.get_mut(&account_id) {
        account.reset_token = Some(token.clone());
    }
    persist_data(&state.data_path, &data).await?;

    // There is no mail channel; the token is delivered via the operator log.
    info!(%email, reset_token = %token, "password reset token issued");
    Ok(Json(MessageResponse {
        message: "reset token issued".to_string(),
    }))
}

pub async fn confirm_password_reset(
    State(state): State<AppState>,
    Json(payload): Json<ResetConfirmRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let email = normalize_email(&payload.email)?;
    if payload.new_password.chars().count() < auth::MIN_PASSWORD_LEN {
        return Err(AppError::bad_request(format!(
            "password must be at least {} characters",
            auth::MIN_PASSWORD_LEN
        )));
    }

    let mut data = state.data.lock().await;
    let account_id = data
        .find_account_by_email(&email)
        .filter(|account| account.reset_token.as_deref() == Some(payload.token.as_str()))
        .map(|account| account.id.clone())
        .ok_or_else(|| AppError::unauthorized("invalid reset token"))?;

    let password_hash = auth::hash_password(&payload.new_password)?;
    if let Some(account) = data.accounts.get_mut(&account_id) {
        account.password_hash = password_hash;
        account.reset_token = None;
    }
    persist_data(&state.data_path, &data).await?;

    Ok(Json(MessageResponse {
        message: "password updated".to_string(),
    }))
}

pub async fn update_display_name(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, AppError> {
    let user_id = require_user(&state, &headers).await?;
    let name = payload.display_name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::bad_request("display name must not be empty"));
    }

    let mut data = state.data.lock().await;
    if let Some(account) = data.accounts.get_mut(&user_id) {
        account.display_name = name.clone();
    }
    let profile = data
        .users
        .get_mut(&user_id)
        .ok_or_else(|| AppError::not_found("profile not initialized"))?;
    profile.display_name = name;
    let response = ProfileResponse {
        rank: ranks::status(profile.xp_total()),
        profile: profile.clone(),
    };
    persist_data(&state.data_path, &data).await?;

    Ok(Json(response))
}

pub async fn start_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SessionView>, AppError> {
    let user_id = require_user(&state, &headers).await?;
    let mut data = state.data.lock().await;
    let session = run_reconciliation(&mut data, &user_id)?;
    persist_data(&state.data_path, &data).await?;
    Ok(Json(session))
}

pub async fn get_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ProfileResponse>, AppError> {
    let user_id = require_user(&state, &headers).await?;
    let data = state.data.lock().await;
    let profile = data
        .users
        .get(&user_id)
        .ok_or_else(|| AppError::not_found("profile not initialized"))?;
    Ok(Json(ProfileResponse {
        rank: ranks::status(profile.xp_total()),
        profile: profile.clone(),
    }))
}

pub async fn add_exercise(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<AddExerciseRequest>,
) -> Result<Json<ProfileResponse>, AppError> {
    let user_id = require_user(&state, &headers).await?;
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::bad_request("exercise name must not be empty"));
    }
    if payload.target == 0 {
        return Err(AppError::bad_request("target must be positive"));
    }
    let xp_per_rep = payload
        .xp_per_rep
        .unwrap_or(schema::EXERCISE_DEFAULTS.xp_per_rep);
    if !(xp_per_rep > 0.0) {
        return Err(AppError::bad_request("xp_per_rep must be positive"));
    }

    let mut data = state.data.lock().await;
    let profile = data
        .users
        .get_mut(&user_id)
        .ok_or_else(|| AppError::not_found("profile not initialized"))?;
    if profile.exercises.iter().any(|exercise| exercise.name == name) {
        return Err(AppError::conflict("an exercise with that name already exists"));
    }
    profile.exercises.push(Exercise::new(
        name,
        payload.target,
        xp_per_rep,
        payload.unit.unwrap_or(schema::EXERCISE_DEFAULTS.unit),
    ));
    let response = ProfileResponse {
        rank: ranks::status(profile.xp_total()),
        profile: profile.clone(),
    };
    persist_data(&state.data_path, &data).await?;

    Ok(Json(response))
}

pub async fn retarget_exercise(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<RetargetRequest>,
) -> Result<Json<ProfileResponse>, AppError> {
    let user_id = require_user(&state, &headers).await?;
    if payload.target == 0 {
        return Err(AppError::bad_request("target must be positive"));
    }

    let mut data = state.data.lock().await;
    let profile = data
        .users
        .get_mut(&user_id)
        .ok_or_else(|| AppError::not_found("profile not initialized"))?;
    let exercise = profile
        .exercises
        .iter_mut()
        .find(|exercise| exercise.name == payload.name)
        .ok_or_else(|| AppError::not_found("unknown exercise"))?;
    exercise.target = payload.target;
    let response = ProfileResponse {
        rank: ranks::status(profile.xp_total()),
        profile: profile.clone(),
    };
    persist_data(&state.data_path, &data).await?;

    Ok(Json(response))
}

pub async fn log_progress(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ProgressRequest>,
) -> Result<Json<ProgressResponse>, AppError> {
    let user_id = require_user(&state, &headers).await?;
    let parsed = progress::parse_amount(&payload.amount);

    let mut data = state.data.lock().await;
    let profile = data
        .users
        .get_mut(&user_id)
        .ok_or_else(|| AppError::not_found("profile not initialized"))?;
    let index = profile
        .exercises
        .iter()
        .position(|exercise| exercise.name == payload.exercise)
        .ok_or_else(|| AppError::not_found("unknown exercise"))?;

    // Unparseable input is a silent no-op, not an error.
    let Some(amount) = parsed else {
        return Ok(Json(ProgressResponse {
            exercise: profile.exercises[index].clone(),
            accepted: false,
            xp_gained: 0.0,
            goal_reached: false,
            rank: ranks::status(profile.xp_total()),
        }));
    };

    let outcome = progress::apply(profile, index, amount);
    let exercise = profile.exercises[index].clone();
    let display_name = profile.display_name.clone();
    let rank = ranks::status(profile.xp_total());

    let stat = GlobalStat {
        user_id: user_id.clone(),
        display_name,
        exercise: exercise.name.clone(),
        count: exercise.lifetime_total(),
    };
    let key = StoreData::global_stat_key(&user_id, &exercise.name);
    data.global_stats.insert(key, stat);
    persist_data(&state.data_path, &data).await?;

    Ok(Json(ProgressResponse {
        exercise,
        accepted: true,
        xp_gained: outcome.xp_gained,
        goal_reached: outcome.goal_reached,
        rank,
    }))
}

pub async fn get_stats(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<StatsQuery>,
) -> Result<Json<StatsView>, AppError> {
    let user_id = require_user(&state, &headers).await?;
    let data = state.data.lock().await;
    let profile = data
        .users
        .get(&user_id)
        .ok_or_else(|| AppError::not_found("profile not initialized"))?;
    let history = user_history(&data, &user_id);
    let exercise = query
        .exercise
        .or_else(|| profile.exercises.first().map(|entry| entry.name.clone()))
        .unwrap_or_default();
    let days = if query.range.as_deref() == Some("month") {
        30
    } else {
        7
    };

    Ok(Json(StatsView {
        rank: ranks::status(profile.xp_total()),
        streak: profile.streak,
        total_lifetime_count: profile.total_lifetime_count,
        chart: stats::chart_series(&history, &exercise, days),
        heatmap: stats::heatmap(&history),
    }))
}

pub async fn get_history(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<HistoryRecord>>, AppError> {
    let user_id = require_user(&state, &headers).await?;
    let data = state.data.lock().await;
    let records = user_history(&data, &user_id);
    let skip = records.len().saturating_sub(365);
    Ok(Json(records[skip..].to_vec()))
}

pub async fn get_leaderboard(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<Vec<GlobalStat>>, AppError> {
    require_user(&state, &headers).await?;
    let exercise = query
        .exercise
        .ok_or_else(|| AppError::bad_request("exercise query parameter is required"))?;

    let data = state.data.lock().await;
    let mut entries: Vec<GlobalStat> = data
        .global_stats
        .values()
        .filter(|stat| stat.exercise == exercise)
        .cloned()
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count));
    entries.truncate(10);
    Ok(Json(entries))
}

pub async fn list_friends(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<FriendView>>, AppError> {
    let user_id = require_user(&state, &headers).await?;
    let data = state.data.lock().await;
    let profile = data
        .users
        .get(&user_id)
        .ok_or_else(|| AppError::not_found("profile not initialized"))?;

    let views = profile
        .friends
        .iter()
        .take(10)
        .filter_map(|friend_id| data.users.get(friend_id))
        .map(|friend| FriendView {
            display_name: friend.display_name.clone(),
            email: friend.email.clone(),
            total_xp: friend.xp_total(),
            today_count: friend.today_total(),
        })
        .collect();
    Ok(Json(views))
}

pub async fn add_friend(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<FriendRequest>,
) -> Result<Json<FriendAddResponse>, AppError> {
    let user_id = require_user(&state, &headers).await?;
    let email = normalize_email(&payload.email)?;

    let mut data = state.data.lock().await;
    let found = data
        .users
        .iter()
        .find(|(_, profile)| profile.email.eq_ignore_ascii_case(&email))
        .map(|(id, _)| id.clone());
    let Some(friend_id) = found else {
        return Ok(Json(FriendAddResponse {
            status: FriendAddStatus::NotFound,
            message: "Пользователь не найден".to_string(),
        }));
    };
    if friend_id == user_id {
        return Ok(Json(FriendAddResponse {
            status: FriendAddStatus::SelfAdd,
            message: "Это же вы".to_string(),
        }));
    }

    let profile = data
        .users
        .get_mut(&user_id)
        .ok_or_else(|| AppError::not_found("profile not initialized"))?;
    profile.friends.insert(friend_id);
    persist_data(&state.data_path, &data).await?;

    Ok(Json(FriendAddResponse {
        status: FriendAddStatus::Added,
        message: "Друг добавлен".to_string(),
    }))
}

pub async fn update_settings(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<NotificationSettings>,
) -> Result<Json<NotificationSettings>, AppError> {
    let user_id = require_user(&state, &headers).await?;
    for time in &payload.times {
        NaiveTime::parse_from_str(time, "%H:%M")
            .map_err(|_| AppError::bad_request(format!("invalid time {time:?}")))?;
    }
    for day in &payload.days {
        if !DAYS_OF_WEEK.contains(&day.as_str()) {
            return Err(AppError::bad_request(format!("unknown weekday label {day:?}")));
        }
    }

    let mut data = state.data.lock().await;
    let profile = data
        .users
        .get_mut(&user_id)
        .ok_or_else(|| AppError::not_found("profile not initialized"))?;
    profile.settings = payload;
    let settings = profile.settings.clone();
    persist_data(&state.data_path, &data).await?;

    Ok(Json(settings))
}

pub async fn get_quote(State(state): State<AppState>) -> Result<Json<QuoteResponse>, AppError> {
    let data = state.data.lock().await;
    if data.quotes.is_empty() {
        return Err(AppError::not_found("no quotes available"));
    }
    let index = rand::thread_rng().gen_range(0..data.quotes.len());
    Ok(Json(QuoteResponse {
        quote: data.quotes[index].clone(),
    }))
}

async fn require_user(state: &AppState, headers: &HeaderMap) -> Result<String, AppError> {
    let token = auth::bearer_token(headers)?;
    let sessions = state.sessions.lock().await;
    sessions
        .get(token)
        .cloned()
        .ok_or_else(|| AppError::unauthorized("invalid or expired token"))
}

async fn issue_session(state: &AppState, user_id: String) -> String {
    let token = auth::new_token();
    state.sessions.lock().await.insert(token.clone(), user_id);
    token
}

// Applies the reconciliation engine's output to the store: the history write
// is skip-if-present so replays cannot duplicate a day's record.
fn run_reconciliation(data: &mut StoreData, user_id: &str) -> Result<SessionView, AppError> {
    let account = data
        .accounts
        .get(user_id)
        .ok_or_else(|| AppError::unauthorized("unknown account"))?;
    let seed = ProfileSeed {
        email: account.email.clone(),
        display_name: account.display_name.clone(),
    };
    let stored = data.users.get(user_id).cloned();
    let result = reconcile::reconcile(stored, &seed);

    if let Some(record) = result.archive {
        data.history
            .entry(user_id.to_string())
            .or_default()
            .entry(record.date.clone())
            .or_insert(record);
    }
    let rank = ranks::status(result.profile.xp_total());
    data.users.insert(user_id.to_string(), result.profile.clone());

    Ok(SessionView {
        profile: result.profile,
        rank,
        outcome: result.outcome,
    })
}

fn user_history(data: &StoreData, user_id: &str) -> Vec<HistoryRecord> {
    data.history
        .get(user_id)
        .map(|records| records.values().cloned().collect())
        .unwrap_or_default()
}

fn normalize_email(email: &str) -> Result<String, AppError> {
    let email = email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::bad_request("invalid email"));
    }
    Ok(email)
}
