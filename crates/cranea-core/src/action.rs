//! Action kinds and location paths.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::types::Key;

/// What an action does beyond its common effects.
///
/// The wire code is the `u32` stored at the head of an action's inner
/// payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ActionKind {
    /// Common effects only.
    #[default]
    Default,
    /// List visible items at the current location.
    Look,
    /// Take an item named by the arguments.
    Take,
    /// Drop an inventory item named by the arguments.
    Drop,
    /// List the inventory.
    Inventory,
    /// End the session.
    Quit,
    /// Discard the top traversal frame and re-enter.
    Return,
    /// Duplicate the traversal frame before the effects run.
    Call,
    /// Write a save file.
    Save,
    /// Restore from a save file.
    Load,
}

impl ActionKind {
    /// Wire code.
    pub const fn code(self) -> u32 {
        match self {
            ActionKind::Default => 0,
            ActionKind::Look => 1,
            ActionKind::Take => 2,
            ActionKind::Drop => 3,
            ActionKind::Inventory => 4,
            ActionKind::Quit => 5,
            ActionKind::Return => 6,
            ActionKind::Call => 7,
            ActionKind::Save => 8,
            ActionKind::Load => 9,
        }
    }

    /// Parse a wire code.
    pub fn from_code(code: u32) -> Result<Self> {
        Ok(match code {
            0 => ActionKind::Default,
            1 => ActionKind::Look,
            2 => ActionKind::Take,
            3 => ActionKind::Drop,
            4 => ActionKind::Inventory,
            5 => ActionKind::Quit,
            6 => ActionKind::Return,
            7 => ActionKind::Call,
            8 => ActionKind::Save,
            9 => ActionKind::Load,
            other => return Err(CoreError::UnknownActionKind(other)),
        })
    }
}

/// A route between two locations of the same tree.
///
/// Relative to the location owning the action: pop `levels_up` frames to
/// reach the common ancestor, then descend through `down`, whose keys are
/// enough to decrypt each step. When the route crosses roots, `levels_up`
/// pops the whole frame and `down` starts at a root location.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Path {
    pub levels_up: u32,
    pub down: Vec<Key>,
}

impl Path {
    /// The empty route: stay at the owning location.
    pub fn here() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_kind_codes() {
        let all = [
            ActionKind::Default,
            ActionKind::Look,
            ActionKind::Take,
            ActionKind::Drop,
            ActionKind::Inventory,
            ActionKind::Quit,
            ActionKind::Return,
            ActionKind::Call,
            ActionKind::Save,
            ActionKind::Load,
        ];
        for (i, kind) in all.iter().enumerate() {
            assert_eq!(kind.code(), i as u32);
            assert_eq!(ActionKind::from_code(i as u32).unwrap(), *kind);
        }
    }

    #[test]
    fn test_unknown_action_kind() {
        assert!(matches!(
            ActionKind::from_code(42),
            Err(CoreError::UnknownActionKind(42))
        ));
    }
}
