#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use chrono::Utc;
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use tower::ServiceExt;
use uuid::Uuid;

use soraclean_api::auth::jwt::{Claims, JwtConfig, DEFAULT_AUDIENCE};
use soraclean_api::config::{ProviderConfig, ServerConfig};
use soraclean_api::router::build_app_router;
use soraclean_api::state::AppState;
use soraclean_core::processing::{
    HISTORY_STATUS_COMPLETED, HISTORY_STATUS_FAILED, HISTORY_STATUS_PROCESSING,
};
use soraclean_core::types::DbId;
use soraclean_db::ledger::CreditLedger;
use soraclean_db::models::history::{CreateHistoryEntry, ProcessingHistory};
use soraclean_db::models::profile::Profile;
use soraclean_db::models::subscription::{
    SubscriptionPlan, SubscriptionSummary, UserSubscription,
};

pub const TEST_JWT_SECRET: &str = "test-secret-that-is-long-enough-for-hmac";
pub const SORA_URL: &str = "https://sora.chatgpt.com/p/s_68a1b2c3";

// ---------------------------------------------------------------------------
// In-memory ledger
// ---------------------------------------------------------------------------

#[derive(Default)]
struct LedgerData {
    profiles: Vec<Profile>,
    plans: Vec<SubscriptionPlan>,
    subscriptions: Vec<UserSubscription>,
    history: Vec<ProcessingHistory>,
}

/// [`CreditLedger`] backed by vectors, standing in for the hosted database.
pub struct MemoryLedger {
    data: Mutex<LedgerData>,
    healthy: AtomicBool,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self {
            data: Mutex::new(LedgerData::default()),
            healthy: AtomicBool::new(true),
        }
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    pub fn add_profile(&self, user_id: DbId, email: &str) -> Profile {
        let now = Utc::now();
        let profile = Profile {
            id: user_id,
            email: Some(email.to_string()),
            full_name: Some("Test User".to_string()),
            avatar_url: None,
            created_at: now,
            updated_at: now,
        };
        self.data.lock().unwrap().profiles.push(profile.clone());
        profile
    }

    pub fn add_plan(&self, name: &str, price: f64, video_credits: i32, is_active: bool) -> SubscriptionPlan {
        let plan = SubscriptionPlan {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            price,
            video_credits,
            is_active,
            created_at: Utc::now(),
        };
        self.data.lock().unwrap().plans.push(plan.clone());
        plan
    }

    /// Give `user_id` an active subscription with `credits` left.
    pub fn grant_credits(&self, user_id: DbId, credits: i32) -> UserSubscription {
        let now = Utc::now();
        let subscription = UserSubscription {
            id: Uuid::new_v4(),
            user_id,
            plan_id: Uuid::new_v4(),
            credits_remaining: credits,
            credits_total: credits,
            payment_id: None,
            is_active: credits > 0,
            created_at: now,
            updated_at: now,
        };
        self.data.lock().unwrap().subscriptions.push(subscription.clone());
        subscription
    }

    pub fn subscription(&self, id: DbId) -> UserSubscription {
        self.data
            .lock()
            .unwrap()
            .subscriptions
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .expect("subscription should exist")
    }

    pub fn history_entries(&self) -> Vec<ProcessingHistory> {
        self.data.lock().unwrap().history.clone()
    }

    fn update_history(&self, id: DbId, f: impl FnOnce(&mut ProcessingHistory)) {
        let mut data = self.data.lock().unwrap();
        if let Some(entry) = data.history.iter_mut().find(|h| h.id == id) {
            f(entry);
        }
    }

    fn check_health(&self) -> Result<(), sqlx::Error> {
        if self.healthy.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(sqlx::Error::PoolTimedOut)
        }
    }
}

#[async_trait]
impl CreditLedger for MemoryLedger {
    async fn health_check(&self) -> Result<(), sqlx::Error> {
        self.check_health()
    }

    async fn spendable_subscription(
        &self,
        user_id: DbId,
    ) -> Result<Option<UserSubscription>, sqlx::Error> {
        self.check_health()?;
        let data = self.data.lock().unwrap();
        Ok(data
            .subscriptions
            .iter()
            .filter(|s| s.user_id == user_id && s.is_active && s.credits_remaining > 0)
            .max_by_key(|s| s.created_at)
            .cloned())
    }

    async fn deduct_credit(&self, subscription_id: DbId) -> Result<UserSubscription, sqlx::Error> {
        let mut data = self.data.lock().unwrap();
        let sub = data
            .subscriptions
            .iter_mut()
            .find(|s| s.id == subscription_id && s.credits_remaining > 0)
            .ok_or(sqlx::Error::RowNotFound)?;
        sub.credits_remaining -= 1;
        sub.is_active = sub.credits_remaining > 0;
        sub.updated_at = Utc::now();
        Ok(sub.clone())
    }

    async fn refund_credit(&self, subscription_id: DbId) -> Result<(), sqlx::Error> {
        let mut data = self.data.lock().unwrap();
        if let Some(sub) = data
            .subscriptions
            .iter_mut()
            .find(|s| s.id == subscription_id && s.credits_remaining < s.credits_total)
        {
            sub.credits_remaining += 1;
            sub.is_active = true;
            sub.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn create_history(
        &self,
        entry: &CreateHistoryEntry,
    ) -> Result<ProcessingHistory, sqlx::Error> {
        let history = ProcessingHistory {
            id: Uuid::new_v4(),
            user_id: entry.user_id,
            subscription_id: entry.subscription_id,
            video_url: entry.video_url.clone(),
            status: HISTORY_STATUS_PROCESSING.to_string(),
            task_id: None,
            processed_video_url: None,
            error_message: None,
            created_at: Utc::now(),
            processing_completed_at: None,
        };
        self.data.lock().unwrap().history.push(history.clone());
        Ok(history)
    }

    async fn attach_task_id(&self, history_id: DbId, task_id: &str) -> Result<(), sqlx::Error> {
        self.update_history(history_id, |h| h.task_id = Some(task_id.to_string()));
        Ok(())
    }

    async fn mark_history_completed(
        &self,
        history_id: DbId,
        processed_video_url: &str,
    ) -> Result<(), sqlx::Error> {
        self.update_history(history_id, |h| {
            h.status = HISTORY_STATUS_COMPLETED.to_string();
            h.processed_video_url = Some(processed_video_url.to_string());
            h.processing_completed_at = Some(Utc::now());
        });
        Ok(())
    }

    async fn mark_history_failed(
        &self,
        history_id: DbId,
        message: &str,
    ) -> Result<(), sqlx::Error> {
        self.update_history(history_id, |h| {
            h.status = HISTORY_STATUS_FAILED.to_string();
            h.error_message = Some(message.to_string());
            h.processing_completed_at = Some(Utc::now());
        });
        Ok(())
    }

    async fn find_profile(&self, user_id: DbId) -> Result<Option<Profile>, sqlx::Error> {
        let data = self.data.lock().unwrap();
        Ok(data.profiles.iter().find(|p| p.id == user_id).cloned())
    }

    async fn subscription_summary(
        &self,
        user_id: DbId,
    ) -> Result<SubscriptionSummary, sqlx::Error> {
        let data = self.data.lock().unwrap();
        let mut active: Vec<_> = data
            .subscriptions
            .iter()
            .filter(|s| s.user_id == user_id && s.is_active)
            .cloned()
            .collect();
        active.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(SubscriptionSummary::from_active(active))
    }

    async fn list_history(
        &self,
        user_id: DbId,
        limit: i64,
    ) -> Result<Vec<ProcessingHistory>, sqlx::Error> {
        let data = self.data.lock().unwrap();
        let mut entries: Vec<_> = data
            .history
            .iter()
            .filter(|h| h.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        entries.truncate(limit as usize);
        Ok(entries)
    }

    async fn list_plans(&self) -> Result<Vec<SubscriptionPlan>, sqlx::Error> {
        let data = self.data.lock().unwrap();
        let mut plans: Vec<_> = data.plans.iter().filter(|p| p.is_active).cloned().collect();
        plans.sort_by(|a, b| a.price.total_cmp(&b.price));
        Ok(plans)
    }

    async fn create_subscription(
        &self,
        user_id: DbId,
        plan_id: DbId,
        payment_id: Option<&str>,
    ) -> Result<Option<UserSubscription>, sqlx::Error> {
        let mut data = self.data.lock().unwrap();
        let Some(plan) = data.plans.iter().find(|p| p.id == plan_id && p.is_active).cloned() else {
            return Ok(None);
        };
        let now = Utc::now();
        let subscription = UserSubscription {
            id: Uuid::new_v4(),
            user_id,
            plan_id,
            credits_remaining: plan.video_credits,
            credits_total: plan.video_credits,
            payment_id: payment_id.map(str::to_string),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        data.subscriptions.push(subscription.clone());
        Ok(Some(subscription))
    }
}

// ---------------------------------------------------------------------------
// App construction
// ---------------------------------------------------------------------------

/// Build a test `ServerConfig` pointing the provider client at `provider_url`.
pub fn test_config(provider_url: &str) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5000".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        public_base_url: "http://backend.test".to_string(),
        task_retention_secs: 3600,
        run_migrations: false,
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
            audience: DEFAULT_AUDIENCE.to_string(),
        },
        provider: ProviderConfig {
            api_key: Some("test-key".to_string()),
            use_real_api: true,
            api_url: provider_url.to_string(),
            dashboard_url: "https://kie.ai/dashboard".to_string(),
        },
    }
}

/// A running test application plus handles on its shared state.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub ledger: Arc<MemoryLedger>,
}

impl TestApp {
    /// A fresh clone of the router for one `oneshot` call.
    pub fn app(&self) -> Router {
        self.router.clone()
    }
}

/// Build the full application router with all middleware layers.
pub fn build_test_app(provider_url: &str) -> TestApp {
    build_test_app_with_config(test_config(provider_url))
}

pub fn build_test_app_with_config(config: ServerConfig) -> TestApp {
    let ledger = Arc::new(MemoryLedger::new());
    let state = AppState::new(config.clone(), ledger.clone());
    let router = build_app_router(state.clone(), &config);
    TestApp {
        router,
        state,
        ledger,
    }
}

/// Mint an access token the way the identity service would.
pub fn mint_token(user_id: DbId) -> String {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user_id,
        email: Some("user@example.com".to_string()),
        aud: DEFAULT_AUDIENCE.to_string(),
        exp: now + 3600,
        iat: Some(now),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .expect("encoding should succeed")
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

/// POST a raw body without a content type, as an untrusted webhook might.
pub async fn post_raw(app: Router, uri: &str, body: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Build a provider success callback body for `task_id`.
pub fn success_callback(task_id: &str, result_url: &str) -> serde_json::Value {
    let result_json = serde_json::json!({ "resultUrls": [result_url] }).to_string();
    serde_json::json!({
        "code": 200,
        "msg": "success",
        "data": {
            "taskId": task_id,
            "state": "success",
            "resultJson": result_json,
        }
    })
}

/// Build a provider failure callback body for `task_id`.
pub fn failure_callback(task_id: &str, fail_msg: &str) -> serde_json::Value {
    serde_json::json!({
        "code": 501,
        "msg": "failed",
        "data": {
            "taskId": task_id,
            "state": "fail",
            "failMsg": fail_msg,
        }
    })
}
