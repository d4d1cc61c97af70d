//! Helpers for tests of the crate and of host plugins.

/// Test logging.
pub mod logging;
/// Event recording.
pub mod recorder;

use std::{cell::RefCell, rc::Rc};

use serde_json::Value as JsonValue;

pub use logging::init_logging;
pub use recorder::Recorder;

use crate::binding::{BindableRef, bindable};

/// A JSON record shared between a test and the blades bound to it. The
/// first handle lets the test inspect the record; the second is what gets
/// bound.
pub fn shared_record(value: JsonValue) -> (Rc<RefCell<JsonValue>>, BindableRef) {
    let obj = bindable(value);
    let bound: BindableRef = obj.clone();
    (obj, bound)
}
