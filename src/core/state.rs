//! Core `StateId` trait for scheduler-managed state machines.
//!
//! Every machine is generic over a discrete state identifier type,
//! usually an enum. The scheduler never interprets identifiers beyond
//! equality and hashing; `name` exists for logging and diagnostics.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::hash::Hash;

/// Trait for state identifiers.
///
/// Identifiers are plain values: the mapping table keys on them, the
/// transition protocol compares them, and log output names them. They
/// carry no behavior of their own; behavior lives in the callbacks
/// bound to each identifier through a [`CallbackResolver`].
///
/// # Required Traits
///
/// - `Clone`: identifiers are copied into mappings and history records
/// - `Eq` + `Hash`: identifiers key the per-machine mapping table
/// - `Debug`: identifiers must be debuggable for diagnostics
/// - `Serialize` + `Deserialize`: history records are serializable
///
/// # Example
///
/// ```rust
/// use stagehand::core::StateId;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
/// enum EnemyState {
///     Idle,
///     Chasing,
///     Attacking,
/// }
///
/// impl StateId for EnemyState {
///     fn name(&self) -> &str {
///         match self {
///             Self::Idle => "Idle",
///             Self::Chasing => "Chasing",
///             Self::Attacking => "Attacking",
///         }
///     }
/// }
/// ```
///
/// [`CallbackResolver`]: crate::resolver::CallbackResolver
pub trait StateId:
    Clone + Eq + Hash + Debug + Serialize + for<'de> Deserialize<'de> + Send + Sync + 'static
{
    /// Get the identifier's name for display/logging.
    ///
    /// Returns a static string reference for zero-cost naming.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
    enum TestState {
        Idle,
        Walking,
        Dead,
    }

    impl StateId for TestState {
        fn name(&self) -> &str {
            match self {
                Self::Idle => "Idle",
                Self::Walking => "Walking",
                Self::Dead => "Dead",
            }
        }
    }

    #[test]
    fn state_name_returns_correct_value() {
        assert_eq!(TestState::Idle.name(), "Idle");
        assert_eq!(TestState::Walking.name(), "Walking");
        assert_eq!(TestState::Dead.name(), "Dead");
    }

    #[test]
    fn state_keys_a_hash_map() {
        use std::collections::HashMap;

        let mut table = HashMap::new();
        table.insert(TestState::Idle, 1u32);
        table.insert(TestState::Walking, 2u32);

        assert_eq!(table.get(&TestState::Idle), Some(&1));
        assert_eq!(table.get(&TestState::Walking), Some(&2));
        assert_eq!(table.get(&TestState::Dead), None);
    }

    #[test]
    fn state_serializes_correctly() {
        let state = TestState::Walking;
        let json = serde_json::to_string(&state).unwrap();
        let deserialized: TestState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, deserialized);
    }

    #[test]
    fn state_is_cloneable_and_comparable() {
        let state = TestState::Idle;
        let cloned = state.clone();
        assert_eq!(state, cloned);
        assert_ne!(state, TestState::Dead);
    }
}
