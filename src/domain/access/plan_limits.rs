//! Per-tier usage limits and feature lists.

use serde::{Deserialize, Serialize};

use super::{FrameworkKey, PlanTier};

/// Whether a count applies to study items or quiz questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentMode {
    Study,
    Quiz,
}

/// Study and quiz allowances. `None` means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionAllowance {
    pub study_items: Option<u32>,
    pub quiz_questions: Option<u32>,
}

impl QuestionAllowance {
    const fn limited(study_items: u32, quiz_questions: u32) -> Self {
        Self {
            study_items: Some(study_items),
            quiz_questions: Some(quiz_questions),
        }
    }

    const UNLIMITED: Self = Self {
        study_items: None,
        quiz_questions: None,
    };

    pub fn for_mode(&self, mode: ContentMode) -> Option<u32> {
        match mode {
            ContentMode::Study => self.study_items,
            ContentMode::Quiz => self.quiz_questions,
        }
    }
}

/// Result of a question-count check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionLimitCheck {
    Allowed { limit: Option<u32> },
    Exceeded { limit: u32, message: String },
}

/// Limits attached to a tier.
///
/// | Tier | Questions | AI hints | Mock interviews |
/// |------|-----------|----------|-----------------|
/// | free | per framework (react 30/10, angular 20/7, others 30/10) | 0 | 0 |
/// | intermediate | 200 study / 250 quiz | 10 | 0 |
/// | advanced | 300 study / 350 quiz | 50 | 3 |
/// | pro | unlimited | unlimited | unlimited |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanLimits {
    pub tier: PlanTier,
    /// Applies to every framework for paid tiers.
    pub global: Option<QuestionAllowance>,
    pub ai_hints: Option<u32>,
    pub mock_interviews: Option<u32>,
}

impl PlanLimits {
    pub fn for_tier(tier: PlanTier) -> Self {
        match tier {
            PlanTier::Free => Self {
                tier,
                global: None,
                ai_hints: Some(0),
                mock_interviews: Some(0),
            },
            PlanTier::Intermediate => Self {
                tier,
                global: Some(QuestionAllowance::limited(200, 250)),
                ai_hints: Some(10),
                mock_interviews: Some(0),
            },
            PlanTier::Advanced => Self {
                tier,
                global: Some(QuestionAllowance::limited(300, 350)),
                ai_hints: Some(50),
                mock_interviews: Some(3),
            },
            PlanTier::Pro => Self {
                tier,
                global: Some(QuestionAllowance::UNLIMITED),
                ai_hints: None,
                mock_interviews: None,
            },
        }
    }

    /// Allowance for one framework.
    pub fn allowance_for(&self, framework: &FrameworkKey) -> QuestionAllowance {
        if let Some(global) = self.global {
            return global;
        }
        match framework.as_str() {
            "angular" => QuestionAllowance::limited(20, 7),
            _ => QuestionAllowance::limited(30, 10),
        }
    }

    /// Checks a requested count against the allowance.
    pub fn check_questions(
        &self,
        framework: &FrameworkKey,
        mode: ContentMode,
        requested: u32,
    ) -> QuestionLimitCheck {
        match self.allowance_for(framework).for_mode(mode) {
            Some(limit) if requested > limit => QuestionLimitCheck::Exceeded {
                limit,
                message: format!(
                    "Your {} plan allows {} {} questions for {}. Upgrade to access more.",
                    self.tier,
                    limit,
                    match mode {
                        ContentMode::Study => "study",
                        ContentMode::Quiz => "quiz",
                    },
                    framework.as_str()
                ),
            },
            limit => QuestionLimitCheck::Allowed { limit },
        }
    }

    /// Questions left after `used`, or `None` when unlimited.
    pub fn remaining(&self, framework: &FrameworkKey, mode: ContentMode, used: u32) -> Option<u32> {
        self.allowance_for(framework)
            .for_mode(mode)
            .map(|limit| limit.saturating_sub(used))
    }
}

/// Marketing feature list shown on the current-plan view.
pub fn features_for(tier: PlanTier) -> &'static [&'static str] {
    match tier {
        PlanTier::Free => &["Easy Study Guide", "Easy Quizzes", "Community Support"],
        PlanTier::Intermediate => &[
            "300+ Advanced Questions",
            "All Question Types",
            "Detailed Explanations",
            "Performance Analytics",
            "Bookmarks & Notes",
            "Priority Support",
        ],
        PlanTier::Advanced => &[
            "500+ Expert Questions",
            "System Design Questions",
            "Mock Interviews",
            "Advanced Analytics",
            "Custom Study Plans",
            "Expert Reviews",
            "Priority Support",
        ],
        PlanTier::Pro => &[
            "Everything in Senior",
            "Custom Questions",
            "24/7 Support",
            "Team Management",
            "Lifetime Updates",
            "Unlimited AI Assistant",
        ],
    }
}
