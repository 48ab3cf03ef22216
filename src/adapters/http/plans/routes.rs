//! Routers for plan reads and gated content.

use axum::{middleware, routing::get, Router};

use super::super::middleware::{plan_guard, GateSource, PlanGuard};
use super::super::state::AppState;
use super::handlers::{get_current_plan, list_framework_questions, list_quizzes, list_study_items};

/// Plan routes.
///
/// # Routes
/// - `GET /api/plans/current` - Current tier, features and limits (auth)
pub fn plan_routes() -> Router<AppState> {
    Router::new().route("/api/plans/current", get(get_current_plan))
}

/// Content routes behind the plan guard.
///
/// # Routes
/// - `GET /api/study?difficulty=` - Anonymous callers allowed
/// - `GET /api/quizzes?level=` - Authentication required
/// - `GET /api/frameworks/:framework/questions` - Anonymous callers allowed
pub fn content_routes(state: &AppState) -> Router<AppState> {
    let guard = |source| PlanGuard::new(state.users.clone(), state.policy.clone(), source);

    let study = Router::new()
        .route("/api/study", get(list_study_items))
        .route_layer(middleware::from_fn_with_state(
            guard(GateSource::Difficulty).allow_anonymous(),
            plan_guard,
        ));

    let quizzes = Router::new()
        .route("/api/quizzes", get(list_quizzes))
        .route_layer(middleware::from_fn_with_state(
            guard(GateSource::Level),
            plan_guard,
        ));

    let frameworks = Router::new()
        .route("/api/frameworks/:framework/questions", get(list_framework_questions))
        .route_layer(middleware::from_fn_with_state(
            guard(GateSource::Framework).allow_anonymous(),
            plan_guard,
        ));

    study.merge(quizzes).merge(frameworks)
}
