//! Macros for ergonomic state identifier declaration.

/// Generate a `StateId` implementation for a simple enum.
///
/// # Example
///
/// ```
/// use stagehand::state_id;
///
/// state_id! {
///     pub enum GuardState {
///         Patrolling,
///         Investigating,
///         Alerted,
///     }
/// }
/// ```
#[macro_export]
macro_rules! state_id {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize,
        )]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl $crate::core::StateId for $name {
            fn name(&self) -> &str {
                match self {
                    $(Self::$variant => stringify!($variant)),*
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::core::StateId;

    state_id! {
        enum TestState {
            Spawning,
            Alive,
            Dying,
        }
    }

    #[test]
    fn macro_generates_names() {
        assert_eq!(TestState::Spawning.name(), "Spawning");
        assert_eq!(TestState::Alive.name(), "Alive");
        assert_eq!(TestState::Dying.name(), "Dying");
    }

    #[test]
    fn macro_generates_derives() {
        let a = TestState::Alive;
        let b = a;
        assert_eq!(a, b);

        let json = serde_json::to_string(&a).unwrap();
        let restored: TestState = serde_json::from_str(&json).unwrap();
        assert_eq!(a, restored);
    }
}
