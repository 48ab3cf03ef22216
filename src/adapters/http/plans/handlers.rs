//! HTTP handlers for plan reads and gated content.

use std::collections::HashMap;

use axum::extract::{Extension, Json, Path, Query, State};
use axum::response::IntoResponse;

use crate::application::handlers::GetCurrentPlanQuery;

use super::super::error::ApiError;
use super::super::middleware::{RequireAuth, ResolvedPlan};
use super::super::state::AppState;
use super::dto::{CurrentPlanResponse, GatedContentResponse, PlanView};

// ════════════════════════════════════════════════════════════════════════════════
// Query Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/plans/current - Tier derived from the caller's stored entitlements
pub async fn get_current_plan(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let plan = state
        .current_plan_handler()
        .handle(GetCurrentPlanQuery { user_id: user.id })
        .await?;
    let frameworks = state.policy.accessible_frameworks(plan.tier);

    Ok(Json(CurrentPlanResponse {
        success: true,
        plan: PlanView::new(plan, frameworks),
    }))
}

// ════════════════════════════════════════════════════════════════════════════════
// Gated Content
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/study?difficulty=
pub async fn list_study_items(
    Extension(plan): Extension<ResolvedPlan>,
    Query(query): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    Json(GatedContentResponse {
        success: true,
        resource: "study",
        gate: query.get("difficulty").cloned(),
        tier: plan.tier,
        items: Vec::new(),
    })
}

/// GET /api/quizzes?level=
pub async fn list_quizzes(
    Extension(plan): Extension<ResolvedPlan>,
    Query(query): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    Json(GatedContentResponse {
        success: true,
        resource: "quizzes",
        gate: query.get("level").cloned(),
        tier: plan.tier,
        items: Vec::new(),
    })
}

/// GET /api/frameworks/:framework/questions
pub async fn list_framework_questions(
    Extension(plan): Extension<ResolvedPlan>,
    Path(framework): Path<String>,
) -> impl IntoResponse {
    Json(GatedContentResponse {
        success: true,
        resource: "questions",
        gate: Some(framework.to_ascii_lowercase()),
        tier: plan.tier,
        items: Vec::new(),
    })
}
