//! Content gates: the axes along which content is locked behind a tier.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

use super::PlanTier;

/// Study content difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl FromStr for Difficulty {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(ValidationError::unsupported("difficulty", s)),
        }
    }
}

/// Quiz seniority level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizLevel {
    Junior,
    Intermediate,
    Senior,
}

impl QuizLevel {
    pub const ALL: [QuizLevel; 3] = [QuizLevel::Junior, QuizLevel::Intermediate, QuizLevel::Senior];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuizLevel::Junior => "junior",
            QuizLevel::Intermediate => "intermediate",
            QuizLevel::Senior => "senior",
        }
    }

    /// Legacy level naming mapped onto the tier ladder.
    ///
    /// `junior -> free`, `intermediate -> intermediate`, `senior -> advanced`.
    pub fn as_tier(&self) -> PlanTier {
        match self {
            QuizLevel::Junior => PlanTier::Free,
            QuizLevel::Intermediate => PlanTier::Intermediate,
            QuizLevel::Senior => PlanTier::Advanced,
        }
    }
}

impl FromStr for QuizLevel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "junior" => Ok(QuizLevel::Junior),
            "intermediate" => Ok(QuizLevel::Intermediate),
            "senior" => Ok(QuizLevel::Senior),
            _ => Err(ValidationError::unsupported("level", s)),
        }
    }
}

/// Frameworks with a configured access rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Framework {
    React,
    Angular,
    Nextjs,
    Redux,
    Vue,
    Random,
}

impl Framework {
    pub const ALL: [Framework; 6] = [
        Framework::React,
        Framework::Angular,
        Framework::Nextjs,
        Framework::Redux,
        Framework::Vue,
        Framework::Random,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Framework::React => "react",
            Framework::Angular => "angular",
            Framework::Nextjs => "nextjs",
            Framework::Redux => "redux",
            Framework::Vue => "vue",
            Framework::Random => "random",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Framework::React => "React",
            Framework::Angular => "Angular",
            Framework::Nextjs => "Next.js",
            Framework::Redux => "Redux",
            Framework::Vue => "Vue.js",
            Framework::Random => "Random Mix",
        }
    }
}

/// A syntactically valid framework key, known or not.
///
/// Keys that parse but match no configured framework still reach the policy,
/// which resolves them to the top tier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FrameworkKey(String);

const MAX_FRAMEWORK_KEY_LEN: usize = 32;

impl FrameworkKey {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let key = raw.trim().to_ascii_lowercase();
        if key.is_empty() {
            return Err(ValidationError::empty_field("framework"));
        }
        if key.len() > MAX_FRAMEWORK_KEY_LEN
            || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ValidationError::invalid_format(
                "framework",
                "expected up to 32 letters, digits, '-' or '_'",
            ));
        }
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The configured framework this key names, if any.
    pub fn known(&self) -> Option<Framework> {
        Framework::ALL.into_iter().find(|f| f.as_str() == self.0)
    }
}

impl From<Framework> for FrameworkKey {
    fn from(f: Framework) -> Self {
        Self(f.as_str().to_string())
    }
}

impl TryFrom<String> for FrameworkKey {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<FrameworkKey> for String {
    fn from(key: FrameworkKey) -> Self {
        key.0
    }
}

/// One axis value that content can be gated on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContentGate {
    Difficulty(Difficulty),
    QuizLevel(QuizLevel),
    Framework(FrameworkKey),
}

impl ContentGate {
    /// Axis name, used in denial messages.
    pub fn axis(&self) -> &'static str {
        match self {
            ContentGate::Difficulty(_) => "difficulty",
            ContentGate::QuizLevel(_) => "level",
            ContentGate::Framework(_) => "framework",
        }
    }

    /// Axis value as it appeared on the wire.
    pub fn value(&self) -> &str {
        match self {
            ContentGate::Difficulty(d) => d.as_str(),
            ContentGate::QuizLevel(l) => l.as_str(),
            ContentGate::Framework(k) => k.as_str(),
        }
    }
}

impl fmt::Display for ContentGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.axis(), self.value())
    }
}

impl From<Difficulty> for ContentGate {
    fn from(d: Difficulty) -> Self {
        ContentGate::Difficulty(d)
    }
}

impl From<QuizLevel> for ContentGate {
    fn from(l: QuizLevel) -> Self {
        ContentGate::QuizLevel(l)
    }
}

impl From<Framework> for ContentGate {
    fn from(f: Framework) -> Self {
        ContentGate::Framework(f.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_parse_is_exact() {
        assert_eq!("hard".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert!("HARD".parse::<Difficulty>().is_err());
        assert!("extreme".parse::<Difficulty>().is_err());
    }

    #[test]
    fn level_maps_onto_tiers() {
        assert_eq!(QuizLevel::Junior.as_tier(), PlanTier::Free);
        assert_eq!(QuizLevel::Intermediate.as_tier(), PlanTier::Intermediate);
        assert_eq!(QuizLevel::Senior.as_tier(), PlanTier::Advanced);
    }

    #[test]
    fn framework_key_normalizes_case() {
        let key = FrameworkKey::parse(" NextJS ").unwrap();
        assert_eq!(key.as_str(), "nextjs");
        assert_eq!(key.known(), Some(Framework::Nextjs));
    }

    #[test]
    fn framework_key_allows_unknown_but_well_formed() {
        let key = FrameworkKey::parse("svelte").unwrap();
        assert_eq!(key.known(), None);
    }

    #[test]
    fn framework_key_rejects_injection() {
        assert!(FrameworkKey::parse("").is_err());
        assert!(FrameworkKey::parse("react;drop").is_err());
        assert!(FrameworkKey::parse(&"a".repeat(33)).is_err());
    }

    #[test]
    fn gate_display_names_axis_and_value() {
        let gate: ContentGate = Difficulty::Medium.into();
        assert_eq!(gate.to_string(), "difficulty=medium");
        let gate: ContentGate = Framework::Vue.into();
        assert_eq!(gate.to_string(), "framework=vue");
    }
}
