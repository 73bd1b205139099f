use actix_web::{
    http::StatusCode,
    web::{Data, Json, Path, Query},
    HttpResponse, Responder,
};
use chrono::Utc;
use reward_core::{
    constants::{COOLDOWN_MS, MS_PER_HOUR},
    policy::replay_status,
    units::format_token_amount,
    Address, ClaimFields, ClaimRequest, PlayerStats,
};

use crate::auth::AdminPrincipal;
use crate::claims::{issue_reward, ClaimError};
use crate::response::{internal_error, json_error};
use crate::types::{
    AdminOracleResponse, AdminSessionsResponse, CatalogEntry, CooldownResponse, HealthResponse,
    QuestStatusResponse, UserStatsResponse, VerifyGameRequest, VerifyGameResponse, WalletQuery,
};
use crate::AppState;

/// Runs `work` on the blocking pool and flattens join failures into the
/// store's `String` errors.
async fn run_blocking<T, F>(work: F) -> Result<T, String>
where
    F: FnOnce() -> Result<T, String> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| format!("blocking worker join failure: {err}"))?
}

fn wallet_from_query(query: &WalletQuery) -> Result<Address, HttpResponse> {
    query
        .user_address
        .as_deref()
        .and_then(|value| Address::parse(value).ok())
        .ok_or_else(|| json_error(StatusCode::BAD_REQUEST, "INVALID_ADDRESS"))
}

pub(crate) async fn verify_game(
    state: Data<AppState>,
    body: Json<VerifyGameRequest>,
) -> impl Responder {
    let request = match ClaimRequest::validate(ClaimFields::from(body.into_inner())) {
        Ok(request) => request,
        Err(rejection) => {
            tracing::info!(code = rejection.code(), "claim rejected");
            return json_error(StatusCode::BAD_REQUEST, rejection.code());
        }
    };

    let wallet = request.wallet;
    let quest_id = request.quest_id.clone();
    let worker_state = state.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        issue_reward(worker_state.get_ref(), request, Utc::now())
    })
    .await
    .unwrap_or_else(|err| Err(ClaimError::Internal(format!("claim worker join failure: {err}"))));

    match outcome {
        Ok(issued) => {
            tracing::info!(
                wallet = %wallet,
                quest_id = %quest_id,
                reward_wei = %issued.reward_amount_wei,
                nonce = %issued.nonce,
                "reward attestation issued"
            );
            HttpResponse::Ok().json(VerifyGameResponse::from(issued))
        }
        Err(ClaimError::Cooldown(active)) => {
            tracing::info!(
                wallet = %wallet,
                quest_id = %quest_id,
                hours_remaining = active.hours_remaining,
                "claim refused: replay cooldown"
            );
            HttpResponse::TooManyRequests().json(CooldownResponse::from(active))
        }
        Err(ClaimError::Internal(err)) => {
            tracing::error!(wallet = %wallet, quest_id = %quest_id, "verify_game failed: {err}");
            internal_error()
        }
    }
}

pub(crate) async fn quest_status(
    state: Data<AppState>,
    path: Path<String>,
    query: Query<WalletQuery>,
) -> impl Responder {
    let wallet = match wallet_from_query(&query) {
        Ok(wallet) => wallet,
        Err(response) => return response,
    };
    let quest_id = path.into_inner();

    let sessions = state.sessions.clone();
    let lookup_quest = quest_id.clone();
    match run_blocking(move || sessions.latest_completion(&wallet, &lookup_quest)).await {
        Ok(latest) => {
            let status = replay_status(latest.map(|s| s.created_at), Utc::now());
            HttpResponse::Ok().json(QuestStatusResponse::from(status))
        }
        Err(err) => {
            tracing::error!(wallet = %wallet, quest_id = %quest_id, "quest_status failed: {err}");
            internal_error()
        }
    }
}

pub(crate) async fn user_stats(state: Data<AppState>, query: Query<WalletQuery>) -> impl Responder {
    let wallet = match wallet_from_query(&query) {
        Ok(wallet) => wallet,
        Err(response) => return response,
    };

    let sessions = state.sessions.clone();
    match run_blocking(move || sessions.sessions_for_wallet(&wallet)).await {
        Ok(history) => {
            let stats = PlayerStats::from_sessions(&history, Utc::now());
            HttpResponse::Ok().json(UserStatsResponse {
                quests_completed: stats.quests_completed,
                total_earned: stats.total_earned(),
                current_streak: stats.streaks.current,
                best_streak: stats.streaks.best,
                total_moves: stats.total_moves,
                average_time: stats.average_time(),
                achievements: stats.achievements,
            })
        }
        Err(err) => {
            tracing::error!(wallet = %wallet, "user_stats failed: {err}");
            internal_error()
        }
    }
}

pub(crate) async fn health(state: Data<AppState>) -> impl Responder {
    let sessions = state.sessions.clone();
    let stored_sessions = match run_blocking(move || sessions.count()).await {
        Ok(count) => count,
        Err(err) => {
            tracing::error!("health check failed: {err}");
            return internal_error();
        }
    };

    HttpResponse::Ok().json(HealthResponse {
        status: "healthy",
        service: "quest-reward-oracle",
        oracle_address: state.signer.address().to_canonical(),
        vault_address: state.vault.address.to_canonical(),
        chain_id: state.vault.chain_id,
        stored_sessions,
    })
}

pub(crate) async fn admin_oracle(admin: AdminPrincipal, state: Data<AppState>) -> impl Responder {
    tracing::info!(admin = %admin.address, "admin oracle summary requested");
    HttpResponse::Ok().json(AdminOracleResponse {
        admin: admin.address.to_canonical(),
        signer_address: state.signer.address().to_canonical(),
        vault_address: state.vault.address.to_canonical(),
        chain_id: state.vault.chain_id,
        cooldown_hours: COOLDOWN_MS / MS_PER_HOUR,
        default_reward_amount: format_token_amount(state.catalog.default_reward_wei()),
        catalog: state
            .catalog
            .entries()
            .map(|(quest_id, wei)| CatalogEntry::new(quest_id, wei))
            .collect(),
    })
}

pub(crate) async fn admin_sessions(
    admin: AdminPrincipal,
    state: Data<AppState>,
    query: Query<WalletQuery>,
) -> impl Responder {
    let wallet = match wallet_from_query(&query) {
        Ok(wallet) => wallet,
        Err(response) => return response,
    };
    tracing::info!(admin = %admin.address, wallet = %wallet, "admin session audit");

    let sessions = state.sessions.clone();
    match run_blocking(move || sessions.sessions_for_wallet(&wallet)).await {
        Ok(sessions) => HttpResponse::Ok().json(AdminSessionsResponse {
            wallet: wallet.to_canonical(),
            sessions,
        }),
        Err(err) => {
            tracing::error!(wallet = %wallet, "admin_sessions failed: {err}");
            internal_error()
        }
    }
}

pub(crate) async fn not_found() -> impl Responder {
    json_error(StatusCode::NOT_FOUND, "NOT_FOUND")
}
