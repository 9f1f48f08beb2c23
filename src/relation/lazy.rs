//! Deferred values.
//!
//! A [`Lazy`] holds either a loader closure or the value it produced. The
//! loader runs on the first [`Lazy::get`]; afterwards the stored value is
//! returned and never recomputed.
//!
//! # Strategy
//!
//! 1. Store the loader, don't run it
//! 2. On first access run it synchronously and keep the result
//! 3. On failure put the loader back so a later access can retry
//!
//! Re-entering a handle while its own loader runs is reported as
//! [`OrmError::RelationCycle`] instead of recursing.

use std::cell::RefCell;
use std::fmt;

use crate::error::{OrmError, Result};

pub type Loader<V> = Box<dyn Fn() -> Result<V>>;

enum State<V> {
    Unresolved(Loader<V>),
    Resolving,
    Resolved(V),
}

pub struct Lazy<V> {
    label: String,
    state: RefCell<State<V>>,
}

impl<V: Clone> Lazy<V> {
    /// Deferred value; `label` names it in cycle errors.
    pub fn new(label: impl Into<String>, loader: Loader<V>) -> Self {
        Self {
            label: label.into(),
            state: RefCell::new(State::Unresolved(loader)),
        }
    }

    /// Already-resolved value.
    pub fn resolved(label: impl Into<String>, value: V) -> Self {
        Self {
            label: label.into(),
            state: RefCell::new(State::Resolved(value)),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(*self.state.borrow(), State::Resolved(_))
    }

    /// The value, running the loader if this is the first access.
    pub fn get(&self) -> Result<V> {
        let loader = {
            let mut state = self.state.borrow_mut();
            match std::mem::replace(&mut *state, State::Resolving) {
                State::Resolved(value) => {
                    *state = State::Resolved(value.clone());
                    return Ok(value);
                }
                State::Resolving => return Err(OrmError::RelationCycle(self.label.clone())),
                State::Unresolved(loader) => loader,
            }
        };

        // The borrow is released here: the loader may query, materialize and
        // touch other handles.
        match loader() {
            Ok(value) => {
                *self.state.borrow_mut() = State::Resolved(value.clone());
                Ok(value)
            }
            Err(err) => {
                *self.state.borrow_mut() = State::Unresolved(loader);
                Err(err)
            }
        }
    }
}

impl<V> fmt::Debug for Lazy<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.state.try_borrow().as_deref() {
            Ok(State::Unresolved(_)) => "unresolved",
            Ok(State::Resolving) | Err(_) => "resolving",
            Ok(State::Resolved(_)) => "resolved",
        };
        f.debug_struct("Lazy")
            .field("label", &self.label)
            .field("state", &state)
            .finish()
    }
}
