use std::any::Any;

use crate::blade::BladeBody;

/// The body of a separator blade. It has no state of its own.
#[derive(Debug, Default)]
pub struct SeparatorBody;

impl BladeBody for SeparatorBody {
    fn as_any(&self) -> &dyn Any {
        self
    }
}
