//! Plan guard: request-time enforcement of content gates.
//!
//! ```text
//! auth_middleware → plan_guard → handler
//!                       │
//!                       ├─ anonymous on a members-only route → 401
//!                       ├─ unparseable gate value            → 400
//!                       ├─ tier below the gate floor         → 403 with upgrade guidance
//!                       └─ allowed                           → ResolvedPlan in extensions
//! ```
//!
//! Entitlements are read from the user store on every request, never from
//! the session token.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::adapters::http::error::ApiError;
use crate::domain::access::{
    tier_for_set, AccessDecision, AccessPolicy, ContentGate, ContentMode, Difficulty,
    FrameworkKey, PlanLimits, PlanTier, QuestionLimitCheck, QuizLevel,
};
use crate::domain::foundation::AuthenticatedUser;
use crate::ports::UserAccountRepository;

/// Tier the guard resolved for the caller, available to handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedPlan {
    pub tier: PlanTier,
}

/// Where the gate value is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateSource {
    /// `?difficulty=easy|medium|hard`
    Difficulty,
    /// `?level=junior|intermediate|senior`
    Level,
    /// `/:framework` path segment, with optional `?mode=&count=` limits.
    Framework,
}

impl GateSource {
    fn invalid_message(&self) -> &'static str {
        match self {
            GateSource::Difficulty => "Invalid difficulty level",
            GateSource::Level => "Invalid quiz level",
            GateSource::Framework => "Invalid framework",
        }
    }
}

/// Guard configuration for one route.
#[derive(Clone)]
pub struct PlanGuard {
    users: Arc<dyn UserAccountRepository>,
    policy: Arc<AccessPolicy>,
    source: GateSource,
    allow_anonymous: bool,
}

impl PlanGuard {
    pub fn new(
        users: Arc<dyn UserAccountRepository>,
        policy: Arc<AccessPolicy>,
        source: GateSource,
    ) -> Self {
        Self {
            users,
            policy,
            source,
            allow_anonymous: false,
        }
    }

    /// Anonymous callers are evaluated as free instead of rejected.
    pub fn allow_anonymous(mut self) -> Self {
        self.allow_anonymous = true;
        self
    }

    /// Gate named by the request, `None` when the request names none.
    fn gate(
        &self,
        query: &HashMap<String, String>,
        path: &HashMap<String, String>,
    ) -> Result<Option<ContentGate>, GuardRejection> {
        let invalid = || GuardRejection::invalid(self.source.invalid_message());
        let gate = match self.source {
            GateSource::Difficulty => query
                .get("difficulty")
                .map(|v| v.parse::<Difficulty>().map(ContentGate::from)),
            GateSource::Level => query
                .get("level")
                .map(|v| v.parse::<QuizLevel>().map(ContentGate::from)),
            GateSource::Framework => path
                .get("framework")
                .map(|v| FrameworkKey::parse(v).map(ContentGate::Framework)),
        };
        gate.transpose().map_err(|_| invalid())
    }

    async fn tier_for(&self, user: Option<&AuthenticatedUser>) -> Result<PlanTier, ApiError> {
        match user {
            Some(user) => {
                let entitlements = self.users.entitlements(&user.id).await?;
                Ok(tier_for_set(&entitlements))
            }
            None => Ok(PlanTier::Free),
        }
    }
}

/// Gate enforcement middleware. Mount with `route_layer` so path params are matched.
pub async fn plan_guard(
    State(guard): State<PlanGuard>,
    query: Option<Query<HashMap<String, String>>>,
    path: Option<Path<HashMap<String, String>>>,
    mut request: Request,
    next: Next,
) -> Response {
    let query = query.map(|Query(q)| q).unwrap_or_default();
    let path = path.map(|Path(p)| p).unwrap_or_default();
    let user = request.extensions().get::<AuthenticatedUser>().cloned();

    // 1. Members-only routes reject anonymous callers before any gate work
    if user.is_none() && !guard.allow_anonymous {
        return GuardRejection::Unauthenticated.into_response();
    }

    // 2. Gate value
    let gate = match guard.gate(&query, &path) {
        Ok(gate) => gate,
        Err(rejection) => return rejection.into_response(),
    };

    // 3. Caller tier from stored entitlements
    let tier = match guard.tier_for(user.as_ref()).await {
        Ok(tier) => tier,
        Err(e) => return e.into_response(),
    };

    // 4. Policy
    if let Some(gate) = &gate {
        if let AccessDecision::Denied {
            required,
            suggested,
            current,
        } = guard.policy.evaluate(tier, gate)
        {
            tracing::info!(
                user_id = %user.as_ref().map(|u| u.id.as_str()).unwrap_or("anonymous"),
                gate = %gate,
                current_tier = %current,
                required_tier = %required,
                "Content access denied"
            );
            return GuardRejection::Denied(PlanDenial::new(gate, required, suggested, current))
                .into_response();
        }

        // 5. Question allowance for framework content
        if let ContentGate::Framework(framework) = gate {
            if let Some(rejection) = check_allowance(tier, framework, &query) {
                return rejection.into_response();
            }
        }
    }

    request.extensions_mut().insert(ResolvedPlan { tier });
    next.run(request).await
}

fn check_allowance(
    tier: PlanTier,
    framework: &FrameworkKey,
    query: &HashMap<String, String>,
) -> Option<GuardRejection> {
    let mode = match query.get("mode").map(String::as_str) {
        Some("study") => ContentMode::Study,
        Some("quiz") => ContentMode::Quiz,
        Some(_) => return Some(GuardRejection::invalid("Invalid content mode")),
        None => return None,
    };
    let count = match query.get("count").map(|c| c.parse::<u32>()) {
        Some(Ok(count)) => count,
        Some(Err(_)) => return Some(GuardRejection::invalid("Invalid question count")),
        None => return None,
    };

    match PlanLimits::for_tier(tier).check_questions(framework, mode, count) {
        QuestionLimitCheck::Allowed { .. } => None,
        QuestionLimitCheck::Exceeded { limit, message } => {
            Some(GuardRejection::LimitExceeded(LimitDenial {
                code: 403,
                error: "Forbidden",
                message,
                limit,
                current_plan: tier,
                upgrade_url: "/pricing".to_string(),
            }))
        }
    }
}

/// Body of a 403 gate denial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDenial {
    pub code: u16,
    pub error: &'static str,
    pub message: String,
    pub required_plan: PlanTier,
    pub suggested_plan: PlanTier,
    pub current_plan: PlanTier,
    pub upgrade_url: String,
}

impl PlanDenial {
    pub fn new(
        gate: &ContentGate,
        required: PlanTier,
        suggested: PlanTier,
        current: PlanTier,
    ) -> Self {
        let subject = match gate {
            ContentGate::Difficulty(d) => format!("{} difficulty", d.as_str()),
            ContentGate::QuizLevel(l) => format!("{} level", l.as_str()),
            ContentGate::Framework(k) => match k.known() {
                Some(f) => format!("{} questions", f.display_name()),
                None => format!("{} questions", k.as_str()),
            },
        };
        Self {
            code: 403,
            error: "Forbidden",
            message: format!("Access to {} requires {} plan or higher", subject, required),
            required_plan: required,
            suggested_plan: suggested,
            current_plan: current,
            upgrade_url: format!("/pricing?plan={}", suggested),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitDenial {
    pub code: u16,
    pub error: &'static str,
    pub message: String,
    pub limit: u32,
    pub current_plan: PlanTier,
    pub upgrade_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardRejection {
    Unauthenticated,
    Invalid(&'static str),
    Denied(PlanDenial),
    LimitExceeded(LimitDenial),
}

impl GuardRejection {
    fn invalid(message: &'static str) -> Self {
        GuardRejection::Invalid(message)
    }
}

impl IntoResponse for GuardRejection {
    fn into_response(self) -> Response {
        match self {
            GuardRejection::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({
                    "code": 401,
                    "error": "Unauthorized",
                    "message": "Authentication required"
                })),
            )
                .into_response(),
            GuardRejection::Invalid(message) => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "code": 400,
                    "error": "Bad Request",
                    "message": message
                })),
            )
                .into_response(),
            GuardRejection::Denied(body) => (StatusCode::FORBIDDEN, Json(body)).into_response(),
            GuardRejection::LimitExceeded(body) => {
                (StatusCode::FORBIDDEN, Json(body)).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::domain::access::{Entitlement, EntitlementSet};
    use crate::domain::foundation::{Timestamp, UserId};
    use axum::{body::Body, middleware, routing::get, Extension, Router};
    use tower::ServiceExt;

    async fn tier_handler(Extension(plan): Extension<ResolvedPlan>) -> String {
        plan.tier.to_string()
    }

    fn guarded(store: &InMemoryStore, path: &str, source: GateSource, anonymous: bool) -> Router {
        let mut guard = PlanGuard::new(
            Arc::new(store.clone()),
            Arc::new(AccessPolicy::standard()),
            source,
        );
        if anonymous {
            guard = guard.allow_anonymous();
        }
        Router::new()
            .route(path, get(tier_handler))
            .route_layer(middleware::from_fn_with_state(guard, plan_guard))
    }

    fn as_user(router: Router, id: &str) -> Router {
        router.layer(Extension(AuthenticatedUser::new(
            UserId::new(id).unwrap(),
            format!("{}@example.com", id),
        )))
    }

    async fn grant(store: &InMemoryStore, id: &str, entitlement: Entitlement) {
        let set: EntitlementSet = [entitlement].into_iter().collect();
        store
            .set_entitlements(&UserId::new(id).unwrap(), &set, Timestamp::now())
            .await
            .unwrap();
    }

    async fn call(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(axum::http::Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Difficulty
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn anonymous_hard_difficulty_is_denied_with_guidance() {
        let store = InMemoryStore::new();
        let app = guarded(&store, "/study", GateSource::Difficulty, true);

        let (status, body) = call(app, "/study?difficulty=hard").await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["code"], 403);
        assert_eq!(json["error"], "Forbidden");
        assert_eq!(json["requiredPlan"], "advanced");
        assert_eq!(json["suggestedPlan"], "advanced");
        assert_eq!(json["currentPlan"], "free");
        assert_eq!(json["upgradeUrl"], "/pricing?plan=advanced");
        assert_eq!(
            json["message"],
            "Access to hard difficulty requires advanced plan or higher"
        );
    }

    #[tokio::test]
    async fn free_user_medium_gets_cheapest_suggestion() {
        let store = InMemoryStore::new();
        let app = as_user(guarded(&store, "/study", GateSource::Difficulty, true), "u1");

        let (status, body) = call(app, "/study?difficulty=medium").await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["requiredPlan"], "intermediate");
        assert_eq!(json["suggestedPlan"], "intermediate");
    }

    #[tokio::test]
    async fn stored_entitlements_open_the_gate() {
        let store = InMemoryStore::new();
        grant(&store, "u1", Entitlement::Senior).await;
        let app = as_user(guarded(&store, "/study", GateSource::Difficulty, true), "u1");

        let (status, body) = call(app, "/study?difficulty=hard").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "advanced");
    }

    #[tokio::test]
    async fn invalid_difficulty_is_400() {
        let store = InMemoryStore::new();
        let app = guarded(&store, "/study", GateSource::Difficulty, true);

        let (status, body) = call(app, "/study?difficulty=extreme").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("Invalid difficulty level"));
    }

    #[tokio::test]
    async fn missing_gate_passes_with_tier() {
        let store = InMemoryStore::new();
        let app = guarded(&store, "/study", GateSource::Difficulty, true);

        let (status, body) = call(app, "/study").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "free");
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Level
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn members_only_route_rejects_anonymous_before_gate() {
        let store = InMemoryStore::new();
        let app = guarded(&store, "/quizzes", GateSource::Level, false);

        let (status, body) = call(app, "/quizzes?level=bogus").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["code"], 401);
        assert_eq!(json["message"], "Authentication required");
    }

    #[tokio::test]
    async fn senior_level_needs_advanced() {
        let store = InMemoryStore::new();
        grant(&store, "u1", Entitlement::Intermediate).await;
        let app = as_user(guarded(&store, "/quizzes", GateSource::Level, false), "u1");

        let (status, body) = call(app, "/quizzes?level=senior").await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["message"], "Access to senior level requires advanced plan or higher");
        assert_eq!(json["currentPlan"], "intermediate");
        assert_eq!(json["suggestedPlan"], "advanced");
    }

    #[tokio::test]
    async fn invalid_level_is_400() {
        let store = InMemoryStore::new();
        let app = as_user(guarded(&store, "/quizzes", GateSource::Level, false), "u1");

        let (status, body) = call(app, "/quizzes?level=principal").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("Invalid quiz level"));
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Framework
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn vue_requires_pro_and_suggests_pro() {
        let store = InMemoryStore::new();
        let app = guarded(&store, "/frameworks/:framework", GateSource::Framework, true);

        let (status, body) = call(app, "/frameworks/vue").await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["requiredPlan"], "pro");
        assert_eq!(json["suggestedPlan"], "pro");
    }

    #[tokio::test]
    async fn unknown_framework_fails_closed() {
        let store = InMemoryStore::new();
        grant(&store, "u1", Entitlement::Senior).await;
        let app = as_user(
            guarded(&store, "/frameworks/:framework", GateSource::Framework, true),
            "u1",
        );

        let (status, _) = call(app, "/frameworks/svelte").await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn malformed_framework_is_400() {
        let store = InMemoryStore::new();
        let app = guarded(&store, "/frameworks/:framework", GateSource::Framework, true);

        let (status, body) = call(app, "/frameworks/re%24ct").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("Invalid framework"));
    }

    #[tokio::test]
    async fn free_question_allowance_is_enforced() {
        let store = InMemoryStore::new();
        let app = guarded(&store, "/frameworks/:framework", GateSource::Framework, true);

        let (status, _) = call(app.clone(), "/frameworks/react?mode=quiz&count=10").await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = call(app, "/frameworks/react?mode=quiz&count=11").await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["limit"], 10);
        assert_eq!(json["currentPlan"], "free");
    }
}
