//! Userpage document and the four canonical edit operations
//!
//! A userpage is an ordered sequence of components. Order is render order and
//! the index is the only positional identity a component has, so every
//! operation names its target by index.

use serde::{Deserialize, Serialize};

use crate::types::component::{Component, HeaderSize};
use crate::types::error::{Error, Result};
use crate::types::ids::{PageId, UserId};

/// A user's page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Userpage {
    /// Page id
    pub id: PageId,
    /// Owning user
    pub user_id: UserId,
    /// Components in render order
    pub components: Vec<Component>,
}

impl Userpage {
    /// Create a page with a fresh id
    pub fn new(user_id: UserId, components: Vec<Component>) -> Self {
        Self {
            id: PageId::random(),
            user_id,
            components,
        }
    }

    /// Page created on first access: a single large "My Page" header
    pub fn with_default_header(user_id: UserId) -> Self {
        Self::new(user_id, vec![Component::header("My Page", HeaderSize::LARGE)])
    }

    /// Number of components
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether the page has no components
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Component at `index`
    pub fn get(&self, index: usize) -> Option<&Component> {
        self.components.get(index)
    }

    /// Component at `index`, or `NotFound`
    pub fn component(&self, index: usize) -> Result<&Component> {
        self.components
            .get(index)
            .ok_or_else(|| missing(index, self.components.len()))
    }
}

/// Canonical page mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PageOp {
    /// Insert at `index` in `0..=len`; later components shift right
    Insert {
        /// Target position
        index: usize,
        /// New component
        component: Component,
    },
    /// Replace the component at `index` with one of the same variant
    Update {
        /// Target position
        index: usize,
        /// Replacement
        component: Component,
    },
    /// Remove the component at `index`; later components shift left
    Delete {
        /// Target position
        index: usize,
    },
    /// Relocate one component from `prev_index` to `new_index`
    Move {
        /// Current position
        prev_index: usize,
        /// Position after the move
        new_index: usize,
    },
}

fn missing(index: usize, len: usize) -> Error {
    Error::not_found(format!("no component at index {} (page has {})", index, len))
}

impl PageOp {
    /// Short operation name for logs and metrics
    pub fn name(&self) -> &'static str {
        match self {
            PageOp::Insert { .. } => "insert",
            PageOp::Update { .. } => "update",
            PageOp::Delete { .. } => "delete",
            PageOp::Move { .. } => "move",
        }
    }

    /// Check preconditions against `components` without mutating them
    pub fn check(&self, components: &[Component]) -> Result<()> {
        let len = components.len();
        match self {
            PageOp::Insert { index, .. } => {
                if *index > len {
                    return Err(Error::not_found(format!(
                        "cannot insert at index {} (page has {})",
                        index, len
                    )));
                }
            }
            PageOp::Update { index, component } => {
                let existing = components.get(*index).ok_or_else(|| missing(*index, len))?;
                if existing.kind() != component.kind() {
                    return Err(Error::invalid_input(format!(
                        "cannot replace a {} component with a {}",
                        existing.kind(),
                        component.kind()
                    )));
                }
            }
            PageOp::Delete { index } => {
                if *index >= len {
                    return Err(missing(*index, len));
                }
            }
            PageOp::Move { prev_index, new_index } => {
                for index in [prev_index, new_index] {
                    if *index >= len {
                        return Err(missing(*index, len));
                    }
                }
            }
        }
        Ok(())
    }

    /// Apply to `components` in place. On error `components` is untouched.
    pub fn apply(&self, components: &mut Vec<Component>) -> Result<()> {
        self.check(components)?;
        match self {
            PageOp::Insert { index, component } => {
                components.insert(*index, component.clone());
            }
            PageOp::Update { index, component } => {
                components[*index] = component.clone();
            }
            PageOp::Delete { index } => {
                components.remove(*index);
            }
            PageOp::Move { prev_index, new_index } => {
                if prev_index != new_index {
                    let moved = components.remove(*prev_index);
                    components.insert(*new_index, moved);
                }
            }
        }
        Ok(())
    }

    /// New page with this operation applied; `page` is left as it was
    pub fn applied_to(&self, page: &Userpage) -> Result<Userpage> {
        let mut next = page.clone();
        self.apply(&mut next.components)?;
        Ok(next)
    }
}
