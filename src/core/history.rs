//! Transition history tracking.
//!
//! Each machine records every completed transition as an immutable
//! value. History is diagnostic only, never read back by the
//! scheduler, but it is serializable so hosts can export it.

use super::state::StateId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Record of a single completed transition.
///
/// `from` is `None` for the machine's first transition, before any
/// state was active.
///
/// # Example
///
/// ```rust
/// use stagehand::core::{StateId, TransitionRecord};
/// use serde::{Deserialize, Serialize};
/// use chrono::Utc;
///
/// #[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
/// enum DoorState {
///     Open,
///     Closed,
/// }
///
/// impl StateId for DoorState {
///     fn name(&self) -> &str {
///         match self {
///             Self::Open => "Open",
///             Self::Closed => "Closed",
///         }
///     }
/// }
///
/// let record = TransitionRecord {
///     from: Some(DoorState::Open),
///     to: DoorState::Closed,
///     timestamp: Utc::now(),
/// };
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct TransitionRecord<S: StateId> {
    /// The state exited, if any.
    pub from: Option<S>,
    /// The state entered.
    pub to: S,
    /// When the transition completed.
    pub timestamp: DateTime<Utc>,
}

/// Ordered history of completed transitions.
///
/// History is immutable: `record` returns a new history with the
/// transition appended.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct TransitionHistory<S: StateId> {
    records: Vec<TransitionRecord<S>>,
}

impl<S: StateId> Default for TransitionHistory<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: StateId> TransitionHistory<S> {
    /// Create a new empty history.
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Record a transition, returning a new history.
    pub fn record(&self, record: TransitionRecord<S>) -> Self {
        let mut records = self.records.clone();
        records.push(record);
        Self { records }
    }

    /// All recorded transitions, oldest first.
    pub fn records(&self) -> &[TransitionRecord<S>] {
        &self.records
    }

    /// The most recent transition, if any.
    pub fn last(&self) -> Option<&TransitionRecord<S>> {
        self.records.last()
    }

    /// The path of states traversed: the `to` of each transition in
    /// order.
    pub fn path(&self) -> Vec<&S> {
        self.records.iter().map(|r| &r.to).collect()
    }

    /// Number of recorded transitions.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether any transition has been recorded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
    enum TestState {
        Start,
        Middle,
        End,
    }

    impl StateId for TestState {
        fn name(&self) -> &str {
            match self {
                Self::Start => "Start",
                Self::Middle => "Middle",
                Self::End => "End",
            }
        }
    }

    fn record(from: Option<TestState>, to: TestState) -> TransitionRecord<TestState> {
        TransitionRecord {
            from,
            to,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn new_history_is_empty() {
        let history: TransitionHistory<TestState> = TransitionHistory::new();
        assert!(history.is_empty());
        assert_eq!(history.len(), 0);
        assert!(history.last().is_none());
    }

    #[test]
    fn record_returns_new_history() {
        let history = TransitionHistory::new();
        let updated = history.record(record(None, TestState::Start));

        assert_eq!(updated.len(), 1);
        assert_eq!(history.len(), 0); // Original unchanged
    }

    #[test]
    fn records_preserve_order() {
        let history = TransitionHistory::new()
            .record(record(None, TestState::Start))
            .record(record(Some(TestState::Start), TestState::Middle))
            .record(record(Some(TestState::Middle), TestState::End));

        let path = history.path();
        assert_eq!(
            path,
            vec![&TestState::Start, &TestState::Middle, &TestState::End]
        );
        assert_eq!(history.last().unwrap().to, TestState::End);
    }

    #[test]
    fn first_transition_has_no_from_state() {
        let history = TransitionHistory::new().record(record(None, TestState::Start));
        assert_eq!(history.records()[0].from, None);
    }

    #[test]
    fn history_serializes_correctly() {
        let history = TransitionHistory::new()
            .record(record(None, TestState::Start))
            .record(record(Some(TestState::Start), TestState::End));

        let json = serde_json::to_string(&history).unwrap();
        let restored: TransitionHistory<TestState> = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.len(), 2);
        assert_eq!(restored.records()[1].to, TestState::End);
    }
}
