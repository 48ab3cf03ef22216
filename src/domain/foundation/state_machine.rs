//! Lifecycle rules shared by purchase, subscription and webhook statuses.

use super::ValidationError;

/// A status enum whose legal moves are a fixed table.
///
/// Implementors list each state's successors; the checks follow from that.
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug + 'static {
    fn successors(&self) -> &'static [Self];

    fn can_transition_to(&self, target: &Self) -> bool {
        self.successors().contains(target)
    }

    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if !self.can_transition_to(&target) {
            return Err(ValidationError::invalid_format(
                "state_transition",
                format!("Cannot transition from {:?} to {:?}", self, target),
            ));
        }
        Ok(target)
    }

    fn is_terminal(&self) -> bool {
        self.successors().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Light {
        Off,
        On,
        Broken,
    }

    impl StateMachine for Light {
        fn successors(&self) -> &'static [Self] {
            match self {
                Light::Off => &[Light::On, Light::Broken],
                Light::On => &[Light::Off, Light::Broken],
                Light::Broken => &[],
            }
        }
    }

    #[test]
    fn listed_move_is_allowed() {
        assert_eq!(Light::Off.transition_to(Light::On), Ok(Light::On));
    }

    #[test]
    fn unlisted_move_names_both_states() {
        let err = Light::Broken.transition_to(Light::On).unwrap_err();
        assert!(err.to_string().contains("Cannot transition from Broken to On"));
    }

    #[test]
    fn self_loop_is_not_implied() {
        assert!(!Light::On.can_transition_to(&Light::On));
    }

    #[test]
    fn terminal_when_no_successors() {
        assert!(Light::Broken.is_terminal());
        assert!(!Light::Off.is_terminal());
    }
}
