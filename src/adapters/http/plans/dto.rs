//! Response bodies for plan and gated content endpoints.

use serde::Serialize;

use crate::application::handlers::CurrentPlan;
use crate::domain::access::{Framework, PlanLimits, PlanTier};

#[derive(Debug, Clone, Serialize)]
pub struct CurrentPlanResponse {
    pub success: bool,
    pub plan: PlanView,
}

/// Plan as the client renders it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanView {
    pub id: String,
    pub tier: PlanTier,
    pub name: PlanTier,
    pub display_name: &'static str,
    pub description: String,
    pub features: &'static [&'static str],
    pub is_active: bool,
    pub limits: PlanLimits,
    pub accessible_frameworks: Vec<Framework>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_remaining: Option<i64>,
}

impl PlanView {
    pub fn new(plan: CurrentPlan, accessible_frameworks: Vec<Framework>) -> Self {
        Self {
            id: format!("plan-{}", plan.user_id),
            tier: plan.tier,
            name: plan.tier,
            display_name: plan.display_name,
            description: format!("Access to {} content", plan.display_name),
            features: plan.features,
            is_active: true,
            limits: plan.limits,
            accessible_frameworks,
            expires_at: plan
                .subscription
                .as_ref()
                .map(|s| s.current_period_end.to_string()),
            days_remaining: plan.days_remaining,
        }
    }
}

/// Placeholder body for gated content; the content pipeline lives elsewhere.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatedContentResponse {
    pub success: bool,
    pub resource: &'static str,
    pub gate: Option<String>,
    pub tier: PlanTier,
    pub items: Vec<serde_json::Value>,
}
