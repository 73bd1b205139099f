mod auth;
mod claims;
mod config;
mod handlers;
mod response;
mod store;
mod types;

use actix_cors::Cors;
use actix_web::{
    error::InternalError,
    http::{header, StatusCode},
    middleware, web, App, HttpServer,
};
use anyhow::{anyhow, Context};

use crate::auth::{ADMIN_ADDRESS_HEADER, ADMIN_MESSAGE_HEADER, ADMIN_SIGNATURE_HEADER};
use crate::config::ServerConfig;
use crate::handlers::{
    admin_oracle, admin_sessions, health, not_found, quest_status, user_stats, verify_game,
};
use crate::response::json_error;

pub(crate) use config::AppState;
pub(crate) use store::{IssueOutcome, SessionStore};

/// Malformed bodies, unknown fields and oversized payloads all map to one code.
fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req| {
            tracing::debug!("rejected request body: {err}");
            InternalError::from_response(err, json_error(StatusCode::BAD_REQUEST, "INVALID_REQUEST"))
                .into()
        })
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        InternalError::from_response(err, json_error(StatusCode::BAD_REQUEST, "INVALID_REQUEST"))
            .into()
    })
}

pub(crate) fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/api/verify-game", web::post().to(verify_game))
        .route(
            "/api/quest-status/{level_id}",
            web::get().to(quest_status),
        )
        .route("/api/user-stats", web::get().to(user_stats))
        .route("/api/admin/oracle", web::get().to(admin_oracle))
        .route("/api/admin/sessions", web::get().to(admin_sessions));
}

fn cors(origins: &[String]) -> Cors {
    origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_headers(vec![
            header::CONTENT_TYPE,
            header::HeaderName::from_static(ADMIN_ADDRESS_HEADER),
            header::HeaderName::from_static(ADMIN_SIGNATURE_HEADER),
            header::HeaderName::from_static(ADMIN_MESSAGE_HEADER),
        ])
        .max_age(3600)
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = ServerConfig::from_env().context("invalid server configuration")?;
    let sessions = SessionStore::open(&config.data_dir).map_err(|err| anyhow!(err))?;

    tracing::info!(
        bind_addr = %config.bind_addr,
        oracle = %config.signer.address(),
        vault = %config.vault.address,
        chain_id = config.vault.chain_id,
        admin_wallets = config.admin_wallets.len(),
        catalog_entries = config.catalog.entries().count(),
        "starting quest reward oracle"
    );
    if config.admin_wallets.is_empty() {
        tracing::warn!("ADMIN_WALLETS is empty; admin endpoints will answer 503");
    }

    let bind_addr = config.bind_addr.clone();
    let cors_origins = config.cors_origins.clone();
    let json_limit = config.json_limit;
    let http_workers = config.http_workers;
    let state = AppState::new(config, sessions);

    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .app_data(json_config(json_limit))
            .app_data(query_config())
            .wrap(cors(&cors_origins))
            .wrap(middleware::Logger::default())
            .configure(configure_routes)
            .default_service(web::to(not_found))
    });
    if let Some(workers) = http_workers {
        server = server.workers(workers);
    }

    server
        .bind(&bind_addr)
        .with_context(|| format!("failed to bind {bind_addr}"))?
        .run()
        .await
        .context("http server terminated")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::test as awtest;
    use reward_core::{
        attestation::verify_attestation, Address, AttestationPayload, Nonce, OracleSigner,
        RewardCatalog, Signature,
    };
    use serde_json::{json, Value};
    use tempfile::TempDir;

    use super::*;
    use crate::config::{VaultBinding, DEFAULT_ADMIN_MESSAGE, DEFAULT_JSON_LIMIT_BYTES};

    const ORACLE_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const ADMIN_KEY: &str = "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";
    const VAULT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
    const CHAIN_ID: u64 = 44787;
    const PLAYER: &str = "0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

    fn test_state(admin_wallets: Vec<Address>) -> (AppState, TempDir) {
        let dir = TempDir::new().unwrap();
        let sessions = SessionStore::open(dir.path()).unwrap();
        let state = AppState {
            signer: Arc::new(OracleSigner::from_hex_key(ORACLE_KEY).unwrap()),
            sessions: Arc::new(sessions),
            catalog: Arc::new(RewardCatalog::default()),
            vault: VaultBinding {
                address: Address::parse(VAULT).unwrap(),
                chain_id: CHAIN_ID,
            },
            admin_wallets: Arc::new(admin_wallets),
        };
        (state, dir)
    }

    fn admin() -> OracleSigner {
        OracleSigner::from_hex_key(ADMIN_KEY).unwrap()
    }

    macro_rules! test_app {
        ($state:expr) => {
            awtest::init_service(
                App::new()
                    .app_data(web::Data::new($state.clone()))
                    .app_data(json_config(DEFAULT_JSON_LIMIT_BYTES))
                    .app_data(query_config())
                    .configure(configure_routes)
                    .default_service(web::to(not_found)),
            )
            .await
        };
    }

    fn claim_body() -> Value {
        json!({
            "userAddress": PLAYER,
            "levelId": "celo-basics",
            "duration": 45,
            "moves": 16,
        })
    }

    #[actix_web::test]
    async fn verify_game_issues_then_enforces_cooldown() {
        let (state, _dir) = test_state(Vec::new());
        let app = test_app!(state);

        let req = awtest::TestRequest::post()
            .uri("/api/verify-game")
            .set_json(claim_body())
            .to_request();
        let resp = awtest::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = awtest::read_body_json(resp).await;
        assert_eq!(body["rewardAmount"], "100000000000000000");
        assert_eq!(body["levelId"], "celo-basics");
        let signature_hex = body["signature"].as_str().unwrap();
        let nonce_hex = body["nonce"].as_str().unwrap();
        assert_eq!(signature_hex.len(), 132);
        assert_eq!(nonce_hex.len(), 66);

        let payload = AttestationPayload {
            vault: Address::parse(VAULT).unwrap(),
            chain_id: CHAIN_ID,
            user: Address::parse(PLAYER).unwrap(),
            quest_id: "celo-basics".to_string(),
            reward_amount: 100_000_000_000_000_000,
            nonce: Nonce::from_hex(nonce_hex).unwrap(),
        };
        let signature = Signature::from_hex(signature_hex).unwrap();
        assert!(verify_attestation(&payload, &signature, state.signer.address()));

        let req = awtest::TestRequest::post()
            .uri("/api/verify-game")
            .set_json(claim_body())
            .to_request();
        let resp = awtest::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);

        let body: Value = awtest::read_body_json(resp).await;
        assert_eq!(body["error"], "REPLAY_COOLDOWN");
        assert_eq!(body["hoursRemaining"], 24);
        assert_eq!(
            body["message"],
            "You can replay this quest in 24 hour(s) for revision."
        );
        assert_eq!(state.sessions.count().unwrap(), 1);
    }

    #[actix_web::test]
    async fn verify_game_reports_first_failing_field() {
        let (state, _dir) = test_state(Vec::new());
        let app = test_app!(state);

        let cases = [
            (json!({ "userAddress": "0x123", "levelId": "celo-basics", "duration": 45, "moves": 16 }), "INVALID_ADDRESS"),
            (json!({ "userAddress": PLAYER, "levelId": "", "duration": 45, "moves": 16 }), "INVALID_LEVEL_ID"),
            (json!({ "userAddress": PLAYER, "levelId": "celo-basics", "duration": 9.5, "moves": 16 }), "DURATION_TOO_SHORT"),
            (json!({ "userAddress": PLAYER, "levelId": "celo-basics", "duration": 45, "moves": 201 }), "UNREALISTIC_MOVES"),
            (json!({ "userAddress": PLAYER, "levelId": "celo-basics", "duration": 45 }), "UNREALISTIC_MOVES"),
            (json!({ "userAddress": PLAYER, "levelId": "celo-basics", "duration": 45, "moves": 16, "score": 9000 }), "INVALID_REQUEST"),
            (json!({ "userAddress": 42, "levelId": "celo-basics", "duration": 45, "moves": 16 }), "INVALID_ADDRESS"),
            (json!({ "userAddress": "0XAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA", "levelId": "celo-basics", "duration": 45, "moves": 16 }), "INVALID_ADDRESS"),
            (json!({ "userAddress": 42, "levelId": 7, "duration": "45", "moves": 16 }), "INVALID_ADDRESS"),
            (json!({ "userAddress": PLAYER, "levelId": 7, "duration": 45, "moves": 16 }), "INVALID_LEVEL_ID"),
            (json!({ "userAddress": PLAYER, "levelId": null, "duration": 45, "moves": 16 }), "INVALID_LEVEL_ID"),
            (json!({ "userAddress": PLAYER, "levelId": "celo-basics", "duration": "45", "moves": 16 }), "DURATION_TOO_SHORT"),
            (json!({ "userAddress": PLAYER, "levelId": "celo-basics", "duration": 45, "moves": "16" }), "UNREALISTIC_MOVES"),
        ];

        for (body, code) in cases {
            let req = awtest::TestRequest::post()
                .uri("/api/verify-game")
                .set_json(body)
                .to_request();
            let resp = awtest::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{code}");
            let body: Value = awtest::read_body_json(resp).await;
            assert_eq!(body["error"], code);
        }
        assert_eq!(state.sessions.count().unwrap(), 0);
    }

    #[actix_web::test]
    async fn verify_game_rejects_malformed_json() {
        let (state, _dir) = test_state(Vec::new());
        let app = test_app!(state);

        let req = awtest::TestRequest::post()
            .uri("/api/verify-game")
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .set_payload("{\"userAddress\": ")
            .to_request();
        let resp = awtest::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = awtest::read_body_json(resp).await;
        assert_eq!(body["error"], "INVALID_REQUEST");
    }

    #[actix_web::test]
    async fn verify_game_hides_ledger_failures() {
        let (state, dir) = test_state(Vec::new());
        let app = test_app!(state);

        rusqlite::Connection::open(dir.path().join("sessions.db"))
            .unwrap()
            .execute_batch("DROP TABLE sessions;")
            .unwrap();

        let req = awtest::TestRequest::post()
            .uri("/api/verify-game")
            .set_json(claim_body())
            .to_request();
        let resp = awtest::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: Value = awtest::read_body_json(resp).await;
        assert_eq!(body, json!({ "error": "INTERNAL_ERROR" }));
    }

    #[actix_web::test]
    async fn quest_status_tracks_completion() {
        let (state, _dir) = test_state(Vec::new());
        let app = test_app!(state);
        let status_uri = format!("/api/quest-status/celo-basics?userAddress={PLAYER}");

        let resp = awtest::call_service(
            &app,
            awtest::TestRequest::get().uri(&status_uri).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = awtest::read_body_json(resp).await;
        assert_eq!(body["completed"], false);
        assert_eq!(body["canReplay"], true);
        assert_eq!(body["lastCompleted"], Value::Null);
        assert_eq!(body["hoursUntilReplay"], 0);

        let req = awtest::TestRequest::post()
            .uri("/api/verify-game")
            .set_json(claim_body())
            .to_request();
        assert_eq!(awtest::call_service(&app, req).await.status(), StatusCode::OK);

        let resp = awtest::call_service(
            &app,
            awtest::TestRequest::get().uri(&status_uri).to_request(),
        )
        .await;
        let body: Value = awtest::read_body_json(resp).await;
        assert_eq!(body["completed"], true);
        assert_eq!(body["canReplay"], false);
        assert_eq!(body["hoursUntilReplay"], 24);
        assert!(body["lastCompleted"].as_str().unwrap().ends_with('Z'));

        let resp = awtest::call_service(
            &app,
            awtest::TestRequest::get()
                .uri("/api/quest-status/celo-basics?userAddress=nope")
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = awtest::read_body_json(resp).await;
        assert_eq!(body["error"], "INVALID_ADDRESS");
    }

    #[actix_web::test]
    async fn user_stats_summarises_history() {
        let (state, _dir) = test_state(Vec::new());
        let app = test_app!(state);
        let stats_uri = format!("/api/user-stats?userAddress={PLAYER}");

        let resp = awtest::call_service(&app, awtest::TestRequest::get().uri(&stats_uri).to_request()).await;
        let body: Value = awtest::read_body_json(resp).await;
        assert_eq!(body["questsCompleted"], 0);
        assert_eq!(body["totalEarned"], "0.00");
        assert_eq!(body["averageTime"], "0:00");

        let req = awtest::TestRequest::post()
            .uri("/api/verify-game")
            .set_json(claim_body())
            .to_request();
        assert_eq!(awtest::call_service(&app, req).await.status(), StatusCode::OK);

        let resp = awtest::call_service(&app, awtest::TestRequest::get().uri(&stats_uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = awtest::read_body_json(resp).await;
        assert_eq!(body["questsCompleted"], 1);
        assert_eq!(body["totalEarned"], "0.10");
        assert_eq!(body["currentStreak"], 1);
        assert_eq!(body["bestStreak"], 1);
        assert_eq!(body["totalMoves"], 16);
        assert_eq!(body["averageTime"], "0:45");

        let achievements = body["achievements"].as_array().unwrap();
        let first = achievements
            .iter()
            .find(|a| a["id"] == "first-quest")
            .unwrap();
        assert_eq!(first["earned"], true);
        let scholar = achievements.iter().find(|a| a["id"] == "scholar").unwrap();
        assert_eq!(scholar["earned"], false);

        let resp = awtest::call_service(
            &app,
            awtest::TestRequest::get().uri("/api/user-stats").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn health_reports_binding() {
        let (state, _dir) = test_state(Vec::new());
        let app = test_app!(state);

        let resp = awtest::call_service(&app, awtest::TestRequest::get().uri("/health").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = awtest::read_body_json(resp).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["oracleAddress"], "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266");
        assert_eq!(body["vaultAddress"], "0x5fbdb2315678afecb367f032d93f642f64180aa3");
        assert_eq!(body["chainId"], CHAIN_ID);
        assert_eq!(body["storedSessions"], 0);
    }

    #[actix_web::test]
    async fn unknown_routes_return_json_404() {
        let (state, _dir) = test_state(Vec::new());
        let app = test_app!(state);

        let resp = awtest::call_service(&app, awtest::TestRequest::get().uri("/api/nope").to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = awtest::read_body_json(resp).await;
        assert_eq!(body["error"], "NOT_FOUND");
    }

    #[actix_web::test]
    async fn admin_endpoints_require_signed_wallet() {
        let admin = admin();
        let (state, _dir) = test_state(vec![admin.address()]);
        let app = test_app!(state);
        let signature = admin.sign_personal_message(DEFAULT_ADMIN_MESSAGE.as_bytes());

        let resp = awtest::call_service(
            &app,
            awtest::TestRequest::get().uri("/api/admin/oracle").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: Value = awtest::read_body_json(resp).await;
        assert_eq!(body["error"], "MISSING_AUTH_HEADERS");

        let req = awtest::TestRequest::get()
            .uri("/api/admin/oracle")
            .insert_header((ADMIN_ADDRESS_HEADER, admin.address().to_canonical()))
            .insert_header((ADMIN_SIGNATURE_HEADER, signature.to_hex()))
            .to_request();
        let resp = awtest::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = awtest::read_body_json(resp).await;
        assert_eq!(body["admin"], admin.address().to_canonical());
        assert_eq!(body["signerAddress"], "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266");
        assert_eq!(body["cooldownHours"], 24);
        assert_eq!(body["defaultRewardAmount"], "0.1");
        assert_eq!(body["catalog"].as_array().unwrap().len(), 4);

        let req = awtest::TestRequest::post()
            .uri("/api/verify-game")
            .set_json(claim_body())
            .to_request();
        assert_eq!(awtest::call_service(&app, req).await.status(), StatusCode::OK);

        let req = awtest::TestRequest::get()
            .uri(&format!("/api/admin/sessions?userAddress={PLAYER}"))
            .insert_header((ADMIN_ADDRESS_HEADER, admin.address().to_canonical()))
            .insert_header((ADMIN_SIGNATURE_HEADER, signature.to_hex()))
            .to_request();
        let resp = awtest::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = awtest::read_body_json(resp).await;
        assert_eq!(body["wallet"], PLAYER.to_lowercase());
        let sessions = body["sessions"].as_array().unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0]["questId"], "celo-basics");
        assert_eq!(sessions[0]["status"], "COMPLETED");
        assert_eq!(sessions[0]["rewardAmountWei"], "100000000000000000");
    }

    #[actix_web::test]
    async fn admin_endpoints_unavailable_without_allow_list() {
        let (state, _dir) = test_state(Vec::new());
        let app = test_app!(state);

        let resp = awtest::call_service(
            &app,
            awtest::TestRequest::get().uri("/api/admin/oracle").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: Value = awtest::read_body_json(resp).await;
        assert_eq!(body["error"], "ADMIN_NOT_CONFIGURED");
    }
}
