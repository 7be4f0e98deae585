//! End-to-end tests of the HTTP API over nullable infrastructure.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use cadastre_auth::{ChallengeAuthenticator, SessionIssuer};
use cadastre_crypto::{keypair_from_seed, WalletKey};
use cadastre_ledger::{CommitmentLedger, TimedLedger};
use cadastre_nullables::{LedgerFault, NullClock, NullLedger, NullNonceSource, NullStore};
use cadastre_proof::{OwnershipProofEngine, ShareableProofService};
use cadastre_registry::ParcelRegistry;
use cadastre_rpc::{router, AppState, RateLimitConfig, RateLimiter, RegistryMetrics};
use cadastre_store::IdentityStore;
use cadastre_types::{ProtocolParams, Timestamp};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

const NOW: u64 = 1_700_000_000_000;
const DAY_MS: u64 = 24 * 60 * 60 * 1000;

struct TestApp {
    app: Router,
    store: Arc<NullStore>,
    clock: Arc<NullClock>,
    ledger: Arc<NullLedger>,
}

fn test_app() -> TestApp {
    let params = ProtocolParams::default();
    let store = Arc::new(NullStore::new());
    let clock = Arc::new(NullClock::new(NOW));
    let null_ledger = Arc::new(NullLedger::new());
    let inner: Arc<dyn CommitmentLedger> = null_ledger.clone();
    let ledger = Arc::new(TimedLedger::new(
        inner,
        Duration::from_millis(params.ledger_timeout_ms),
    ));

    let engine = Arc::new(OwnershipProofEngine::new(clock.clone(), &params));
    let state = AppState {
        authenticator: Arc::new(ChallengeAuthenticator::new(
            store.clone(),
            Arc::new(NullNonceSource::counting_from(4_000)),
            clock.clone(),
        )),
        sessions: Arc::new(
            SessionIssuer::new(b"api-test-session-secret", 3_600, clock.clone()).unwrap(),
        ),
        engine: engine.clone(),
        envelopes: Arc::new(ShareableProofService::new(
            engine,
            ledger.clone(),
            store.clone(),
            clock.clone(),
            &params,
        )),
        registry: Arc::new(ParcelRegistry::new(
            store.clone(),
            store.clone(),
            ledger.clone(),
            clock.clone(),
            b"api-test-vault",
        )),
        audit: store.clone(),
        ledger,
        metrics: Arc::new(RegistryMetrics::new().unwrap()),
        clock: clock.clone(),
        params,
        general_limit: RateLimiter::new(RateLimitConfig::general()),
        auth_limit: RateLimiter::new(RateLimitConfig::auth()),
        started_at: Timestamp::from_millis(NOW),
    };

    TestApp {
        app: router(state),
        store,
        clock,
        ledger: null_ledger,
    }
}

fn wallet(seed: u8) -> WalletKey {
    keypair_from_seed(&[seed; 32]).unwrap()
}

impl TestApp {
    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let body = body.map_or_else(Body::empty, |v| Body::from(v.to_string()));
        let response = self
            .app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    async fn login(&self, key: &WalletKey) -> String {
        let address = key.address().to_string();
        let (status, nonce) = self
            .post("/api/auth/request-nonce", None, json!({ "address": address }))
            .await;
        assert_eq!(status, StatusCode::OK);
        let message = nonce["message"].as_str().unwrap();
        let signature = key.sign_personal_hex(message.as_bytes()).unwrap();

        let (status, body) = self
            .post(
                "/api/auth/verify-signature",
                None,
                json!({ "address": address, "signature": signature }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["token"].as_str().unwrap().to_string()
    }

    async fn login_authority(&self, key: &WalletKey) -> String {
        self.store
            .set_authority(&key.address(), true, Timestamp::from_millis(NOW))
            .unwrap();
        self.login(key).await
    }

    /// Register parcel `id` for `owner` through an authority session.
    async fn register(&self, authority: &str, id: u64, owner: &WalletKey) -> Value {
        let (status, body) = self
            .post(
                "/api/parcels",
                Some(authority),
                json!({ "parcelId": id.to_string(), "ownerAddress": owner.address().to_string() }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }
}

// ── Login ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn login_returns_session_and_signature_is_single_use() {
    let t = test_app();
    let key = wallet(1);
    let address = key.address().to_string();

    let (_, nonce) = t
        .post("/api/auth/request-nonce", None, json!({ "address": address }))
        .await;
    assert_eq!(nonce["success"], true);
    let message = nonce["message"].as_str().unwrap().to_string();
    assert_eq!(message, format!("Please sign this nonce: {}", nonce["nonce"].as_str().unwrap()));
    let signature = key.sign_personal_hex(message.as_bytes()).unwrap();

    let body = json!({ "address": address, "signature": signature });
    let (status, first) = t.post("/api/auth/verify-signature", None, body.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["user"]["address"], address);
    assert_eq!(first["user"]["isAuthority"], false);
    assert!(first["token"].as_str().unwrap().contains('.'));

    let (status, replay) = t.post("/api/auth/verify-signature", None, body).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(replay["code"], "SIGNATURE_MISMATCH");
    assert_eq!(replay["success"], false);
}

#[tokio::test]
async fn verify_without_challenge_is_not_found() {
    let t = test_app();
    let key = wallet(2);
    let signature = key.sign_personal_hex(b"Please sign this nonce: 1").unwrap();
    let (status, body) = t
        .post(
            "/api/auth/verify-signature",
            None,
            json!({ "address": key.address().to_string(), "signature": signature }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "USER_NOT_FOUND");
}

#[tokio::test]
async fn malformed_address_is_invalid_input() {
    let t = test_app();
    let (status, body) = t
        .post("/api/auth/request-nonce", None, json!({ "address": "0x1234" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_INPUT");

    let (status, body) = t.post("/api/auth/request-nonce", None, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn failed_logins_are_rate_limited() {
    let t = test_app();
    let body = json!({ "address": "0x1234", "signature": "0x00" });
    for _ in 0..5 {
        let (status, _) = t.post("/api/auth/verify-signature", None, body.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
    let (status, limited) = t.post("/api/auth/verify-signature", None, body).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(limited["code"], "RATE_LIMITED");
}

#[tokio::test]
async fn successful_logins_do_not_use_the_auth_budget() {
    let t = test_app();
    let key = wallet(3);
    for _ in 0..7 {
        t.login(&key).await;
    }
}

// ── Sessions ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn protected_routes_require_a_valid_session() {
    let t = test_app();
    let (status, body) = t.get("/api/parcels/mine", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "MISSING_TOKEN");

    let (status, body) = t.get("/api/parcels/mine", Some("garbage")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn expired_session_is_rejected() {
    let t = test_app();
    let token = t.login(&wallet(4)).await;
    t.clock.advance(3_600_001);
    let (status, body) = t.get("/api/parcels/mine", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "TOKEN_EXPIRED");
}

#[tokio::test]
async fn registration_requires_an_authority() {
    let t = test_app();
    let owner = wallet(5);
    let token = t.login(&owner).await;
    let (status, body) = t
        .post(
            "/api/parcels",
            Some(&token),
            json!({ "parcelId": "1", "ownerAddress": owner.address().to_string() }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "AUTHORITY_REQUIRED");
}

// ── Parcels ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn registered_parcel_is_listed_and_duplicates_conflict() {
    let t = test_app();
    let authority = t.login_authority(&wallet(9)).await;
    let owner = wallet(10);
    let created = t.register(&authority, 42, &owner).await;
    assert_eq!(created["parcel"]["parcelId"], "42");

    let (status, dup) = t
        .post(
            "/api/parcels",
            Some(&authority),
            json!({ "parcelId": 42, "ownerAddress": owner.address().to_string() }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(dup["code"], "PARCEL_ALREADY_REGISTERED");

    let token = t.login(&owner).await;
    let (status, mine) = t.get("/api/parcels/mine", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine["count"], 1);
    assert_eq!(mine["parcels"][0]["commitment"], created["parcel"]["commitment"]);
    assert!(mine["parcels"][0].get("salt").is_none());

    let (status, one) = t.get("/api/parcels/42", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(one["parcel"]["ledgerStatus"], "MATCHED");

    let (status, missing) = t.get("/api/parcels/43", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(missing["code"], "PARCEL_NOT_FOUND");
}

#[tokio::test]
async fn ledger_record_is_readable_without_a_session() {
    let t = test_app();
    let authority = t.login_authority(&wallet(9)).await;
    let owner = wallet(10);
    let created = t.register(&authority, 42, &owner).await;

    let (status, on_ledger) = t.get("/api/parcels/blockchain/42", None).await;
    assert_eq!(status, StatusCode::OK, "{on_ledger}");
    assert_eq!(on_ledger["parcelId"], "42");
    assert_eq!(on_ledger["exists"], true);
    assert_eq!(on_ledger["owner"], owner.address().to_string());
    assert_eq!(on_ledger["commitmentHash"], created["parcel"]["commitment"]);

    let (status, absent) = t.get("/api/parcels/blockchain/43", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(absent["exists"], false);

    let (status, bad) = t.get("/api/parcels/blockchain/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(bad["code"], "INVALID_INPUT");

    t.ledger.set_fault(LedgerFault::Unavailable);
    let (status, down) = t.get("/api/parcels/blockchain/42", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE, "{down}");
}

// ── Users ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn profile_reports_the_session_identity_and_role() {
    let t = test_app();
    let owner = wallet(20);
    let token = t.login(&owner).await;

    let (status, profile) = t.get("/api/users/profile", Some(&token)).await;
    assert_eq!(status, StatusCode::OK, "{profile}");
    assert_eq!(profile["user"]["address"], owner.address().to_string());
    assert_eq!(profile["user"]["role"], "owner");
    assert_eq!(profile["user"]["isAuthority"], false);
    assert!(profile["user"].get("currentNonce").is_none());

    let authority = wallet(21);
    let token = t.login_authority(&authority).await;
    let (_, profile) = t.get("/api/users/profile", Some(&token)).await;
    assert_eq!(profile["user"]["role"], "authority");

    let (status, body) = t.get("/api/users/profile", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "MISSING_TOKEN");
}

#[tokio::test]
async fn user_lookup_by_address() {
    let t = test_app();
    let owner = wallet(22);
    t.login(&owner).await;

    let (status, found) = t
        .get(&format!("/api/users/{}", owner.address()), None)
        .await;
    assert_eq!(status, StatusCode::OK, "{found}");
    assert_eq!(found["user"]["role"], "owner");

    let stranger = wallet(23);
    let (status, missing) = t
        .get(&format!("/api/users/{}", stranger.address()), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(missing["code"], "USER_NOT_FOUND");

    let (status, bad) = t.get("/api/users/0x1234", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(bad["code"], "INVALID_INPUT");
}

// ── Proofs ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn generated_proof_verifies_and_tampering_is_caught() {
    let t = test_app();
    let authority = t.login_authority(&wallet(9)).await;
    let owner = wallet(11);
    t.register(&authority, 7, &owner).await;
    let token = t.login(&owner).await;

    let (status, generated) = t
        .post(
            "/api/zk/generate-proof",
            Some(&token),
            json!({ "parcelId": "7", "challengeNonce": "123456" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{generated}");
    assert_eq!(generated["publicSignals"]["isPublic"], true);

    let (_, verdict) = t
        .post(
            "/api/zk/verify-proof",
            None,
            json!({ "proof": generated["proof"], "publicSignals": generated["publicSignals"] }),
        )
        .await;
    assert_eq!(verdict["isValid"], true);

    let mut tampered = generated.clone();
    tampered["proof"]["pi_b"][0][0] = json!("8");
    let (_, verdict) = t
        .post(
            "/api/zk/verify-proof",
            None,
            json!({ "proof": tampered["proof"], "publicSignals": tampered["publicSignals"] }),
        )
        .await;
    assert_eq!(verdict["isValid"], false);
    assert_eq!(verdict["details"]["code"], "PARCEL_ID_MISMATCH");

    let (_, ownership) = t
        .post(
            "/api/zk/verify-ownership",
            Some(&token),
            json!({
                "parcelId": "7",
                "proof": generated["proof"],
                "publicSignals": generated["publicSignals"],
            }),
        )
        .await;
    assert_eq!(ownership["verified"], true);
    assert_eq!(ownership["zkProofValid"], true);
    assert_eq!(ownership["blockchainVerified"], true);
}

#[tokio::test]
async fn wrongly_shaped_proof_arrays_are_a_verdict_not_a_bad_request() {
    let t = test_app();
    let authority = t.login_authority(&wallet(9)).await;
    let owner = wallet(11);
    t.register(&authority, 7, &owner).await;
    let token = t.login(&owner).await;

    let (_, generated) = t
        .post(
            "/api/zk/generate-proof",
            Some(&token),
            json!({ "parcelId": "7", "challengeNonce": "123456" }),
        )
        .await;

    for (field, shape) in [
        ("pi_a", Value::Null),
        ("pi_b", json!("7,123456")),
        ("pi_c", json!([{ "verifier": 0 }])),
    ] {
        let mut proof = generated["proof"].clone();
        proof[field] = shape;
        let (status, verdict) = t
            .post(
                "/api/zk/verify-proof",
                None,
                json!({ "proof": proof, "publicSignals": generated["publicSignals"] }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{field}: {verdict}");
        assert_eq!(verdict["isValid"], false);
        assert_eq!(verdict["details"]["code"], "MALFORMED_PROOF", "{field}");
    }

    let mut proof = generated["proof"].clone();
    proof["pi_b"] = json!([[7, 123456]]);
    let (status, verdict) = t
        .post(
            "/api/zk/verify-proof",
            None,
            json!({ "proof": proof, "publicSignals": generated["publicSignals"] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(verdict["isValid"], true, "{verdict}");
}

#[tokio::test]
async fn proof_generation_for_someone_elses_parcel_is_not_found() {
    let t = test_app();
    let authority = t.login_authority(&wallet(9)).await;
    t.register(&authority, 8, &wallet(12)).await;
    let stranger = t.login(&wallet(13)).await;

    let (status, body) = t
        .post("/api/zk/generate-proof", Some(&stranger), json!({ "parcelId": 8 }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "PARCEL_NOT_FOUND");
}

#[tokio::test]
async fn generate_commitment_is_deterministic() {
    let t = test_app();
    let body = json!({
        "ownerAddress": wallet(14).address().to_string(),
        "salt": format!("0x{}", "ab".repeat(32)),
        "parcelId": "5",
    });
    let (status, a) = t.post("/api/zk/generate-commitment", None, body.clone()).await;
    assert_eq!(status, StatusCode::OK);
    let (_, b) = t.post("/api/zk/generate-commitment", None, body).await;
    assert_eq!(a["commitment"], b["commitment"]);
    assert_eq!(a["commitment"].as_str().unwrap().len(), 66);
}

// ── Shareable proofs ─────────────────────────────────────────────────────

#[tokio::test]
async fn shareable_proof_round_trip_is_audited() {
    let t = test_app();
    let authority = t.login_authority(&wallet(9)).await;
    let owner = wallet(15);
    t.register(&authority, 21, &owner).await;
    let token = t.login(&owner).await;

    let (status, shared) = t
        .post(
            "/api/zk/generate-shareable-proof",
            Some(&token),
            json!({ "parcelId": "21", "message": "for the bank" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{shared}");
    let envelope = shared["shareableProof"].clone();
    assert_eq!(envelope["type"], "LAND_OWNERSHIP_PROOF");
    assert_eq!(envelope["verifier"], "PUBLIC");

    let (status, verdict) = t
        .post(
            "/api/zk/verify-shareable-proof",
            None,
            json!({ "shareableProof": envelope }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(verdict["proofValid"], true);
    assert_eq!(verdict["blockchainVerified"], true);
    assert_eq!(verdict["status"], "OWNERSHIP_VERIFIED");

    let (_, history) = t.get("/api/zk/my-proofs", Some(&token)).await;
    assert_eq!(history["count"], 1);
    assert_eq!(history["proofs"][0]["verificationCount"], 1);
    assert_eq!(history["proofs"][0]["expired"], false);
}

#[tokio::test]
async fn expired_envelope_is_rejected_with_its_expiry() {
    let t = test_app();
    let authority = t.login_authority(&wallet(9)).await;
    let owner = wallet(16);
    t.register(&authority, 22, &owner).await;
    let token = t.login(&owner).await;
    let (_, shared) = t
        .post(
            "/api/zk/generate-shareable-proof",
            Some(&token),
            json!({ "parcelId": "22" }),
        )
        .await;

    t.clock.advance(DAY_MS + 1);
    let (status, body) = t
        .post(
            "/api/zk/verify-shareable-proof",
            None,
            json!({ "shareableProof": shared["shareableProof"] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "ENVELOPE_EXPIRED");
    assert_eq!(body["expiredAt"], shared["shareableProof"]["expiresAt"]);
}

// ── Transfers ────────────────────────────────────────────────────────────

#[tokio::test]
async fn approved_transfer_moves_the_parcel() {
    let t = test_app();
    let authority = t.login_authority(&wallet(9)).await;
    let seller = wallet(17);
    let buyer = wallet(18);
    let registered = t.register(&authority, 30, &seller).await;
    let seller_token = t.login(&seller).await;

    let (status, requested) = t
        .post(
            "/api/transfers/request",
            Some(&seller_token),
            json!({ "parcelId": "30", "toAddress": buyer.address().to_string(), "reason": "sale" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{requested}");
    assert_eq!(requested["transfer"]["status"], "pending");

    let (status, again) = t
        .post(
            "/api/transfers/request",
            Some(&seller_token),
            json!({ "parcelId": "30", "toAddress": buyer.address().to_string() }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(again["code"], "TRANSFER_PENDING");

    let (_, pending) = t.get("/api/transfers/pending", Some(&authority)).await;
    assert_eq!(pending["count"], 1);

    let (status, approved) = t
        .post(
            "/api/transfers/approve",
            Some(&authority),
            json!({ "transferId": requested["transfer"]["id"], "notes": "deed checked" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{approved}");
    assert_eq!(approved["transfer"]["status"], "approved");

    let (_, parcel) = t.get("/api/parcels/30", None).await;
    assert_eq!(parcel["parcel"]["owner"], buyer.address().to_string());
    assert_ne!(parcel["parcel"]["commitment"], registered["parcel"]["commitment"]);

    let (status, redecide) = t
        .post(
            "/api/transfers/reject",
            Some(&authority),
            json!({ "transferId": requested["transfer"]["id"] }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(redecide["code"], "TRANSFER_ALREADY_DECIDED");
}

#[tokio::test]
async fn only_the_owner_may_request_a_transfer() {
    let t = test_app();
    let authority = t.login_authority(&wallet(9)).await;
    t.register(&authority, 31, &wallet(19)).await;
    let intruder = t.login(&wallet(20)).await;

    let (status, body) = t
        .post(
            "/api/transfers/request",
            Some(&intruder),
            json!({ "parcelId": "31", "toAddress": wallet(20).address().to_string() }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "NOT_OWNER");
}

// ── Health ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_reports_degraded_when_the_ledger_is_down() {
    let t = test_app();
    let (status, body) = t.get("/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["services"]["ledger"], "healthy");

    t.ledger.set_fault(LedgerFault::Unavailable);
    let (status, body) = t.get("/api/health", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["services"]["ledger"], "unhealthy");

    let (status, body) = t.get("/api/health/ledger", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "LEDGER_UNAVAILABLE");
}

#[tokio::test]
async fn metrics_are_exposed_as_text() {
    let t = test_app();
    t.login(&wallet(21)).await;

    let response = t
        .app
        .clone()
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("cadastre_challenges_issued_total 1"));
    assert!(text.contains("cadastre_authentications_total{outcome=\"success\"} 1"));
}
