//! Notification actions
//!
//! An action pairs an identifier (reported back when the user picks it) with
//! the title shown on the button. Once created it cannot change.

use crate::handle::Handle;
use crate::runtime::ForeignRuntime;
use crate::BridgeResult;
use serde::{Deserialize, Serialize};
use std::ffi::CString;

/// Managed copy of an action's two strings
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Action {
    pub identifier: String,
    pub title: String,
}

/// Create an action object
///
/// Identifiers are not required to be unique.
pub fn new_action(rt: &dyn ForeignRuntime, identifier: &str, title: &str) -> BridgeResult<Handle> {
    let identifier = CString::new(identifier)?;
    let title = CString::new(title)?;
    rt.new_action(&identifier, &title)
}

pub fn action_identifier(rt: &dyn ForeignRuntime, action: Handle) -> BridgeResult<String> {
    rt.action_identifier(action)
}

pub fn action_title(rt: &dyn ForeignRuntime, action: Handle) -> BridgeResult<String> {
    rt.action_title(action)
}

/// Read identifier and title together
pub fn read_action(rt: &dyn ForeignRuntime, action: Handle) -> BridgeResult<Action> {
    Ok(Action {
        identifier: action_identifier(rt, action)?,
        title: action_title(rt, action)?,
    })
}

impl Action {
    pub fn new(identifier: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            title: title.into(),
        }
    }

    /// Create the native action for this value
    pub fn to_native(&self, rt: &dyn ForeignRuntime) -> BridgeResult<Handle> {
        new_action(rt, &self.identifier, &self.title)
    }
}
