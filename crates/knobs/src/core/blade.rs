//! Blades and blade controllers.
//!
//! A [`BladeController`] is the unit of tree membership: a shared shell of
//! identity, ordering hints, view state and parent link, plus a body that
//! supplies the capabilities of a particular blade kind. Shared import,
//! export and disposal logic lives on the shell; bodies only contribute
//! their own fields.

use std::{any::Any, cell::RefCell, fmt, rc::Rc, result::Result as StdResult};

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::debug;

use super::{
    emitter::{Subscription, Subscriptions},
    error::{Error, ParseError, Result},
    id::BladeId,
    rack::{Rack, WeakRack},
    state::{BladeState, merge_state},
    value::ValueChangeOptions,
    view_props::ViewProps,
};

/// An ordering hint. Positions only order siblings; they carry no content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BladePosition {
    /// Before everything else.
    VeryFirst,
    /// Before untagged blades.
    First,
    /// After untagged blades.
    Last,
    /// After everything else.
    VeryLast,
}

impl BladePosition {
    /// Every position.
    pub const ALL: [Self; 4] = [Self::VeryFirst, Self::First, Self::Last, Self::VeryLast];
}

/// Sort tier for a set of position tags. Lower sorts first. When tags
/// conflict, `veryfirst` beats `first`, which beats `verylast`, which beats
/// `last`.
pub fn position_tier(positions: &[BladePosition]) -> u8 {
    let has = |p| positions.contains(&p);
    if has(BladePosition::VeryFirst) {
        0
    } else if has(BladePosition::First) {
        1
    } else if has(BladePosition::VeryLast) {
        4
    } else if has(BladePosition::Last) {
        3
    } else {
        2
    }
}

crate::value_map! {
    /// Ordering state of a blade.
    pub struct Blade: BladeKey {
        /// Position tags.
        positions => Positions: Vec<BladePosition>,
    }
}

impl Blade {
    /// A blade with no position tags.
    pub fn create() -> Self {
        Self::new(vec![])
    }
}

/// Called with the options and origin of a value change.
pub type ValueChangeHandler = Rc<dyn Fn(ValueChangeOptions, bool)>;

/// The capabilities of one kind of blade.
pub trait BladeBody: Any {
    /// Check subtype state fields without applying them.
    fn validate_state(&self, _state: &BladeState) -> StdResult<(), ParseError> {
        Ok(())
    }

    /// Fail before any layer applies when the body cannot take an import
    /// at all.
    fn check_import(&self) -> Result<()> {
        Ok(())
    }

    /// Apply subtype state fields. Only called once every layer validated.
    fn apply_state(&self, _state: &BladeState) -> Result<()> {
        Ok(())
    }

    /// Export subtype state fields.
    fn export_state(&self) -> BladeState {
        BladeState::new()
    }

    /// The nested rack, for containers.
    fn rack(&self) -> Option<&Rack> {
        None
    }

    /// Observe changes of the bound value, for value-bearing blades. The
    /// handler receives the change options and whether the change was
    /// internal.
    fn on_value_change(&self, _handler: ValueChangeHandler) -> Option<Subscription> {
        None
    }

    /// The value reported by change events, with the bound key for
    /// bindings. `None` for blades that carry no value.
    fn change_value(&self) -> Option<(Option<&str>, Result<JsonValue>)> {
        None
    }

    /// Re-read bound values.
    fn refresh(&self) {}

    /// Release resources held by the body.
    fn dispose(&self) {}

    /// Downcasting support.
    fn as_any(&self) -> &dyn Any;
}

/// Shared controller handle.
pub type BladeRef = Rc<BladeController>;

/// A blade controller.
pub struct BladeController {
    /// Identity.
    id: BladeId,
    /// Ordering state.
    blade: Blade,
    /// View state.
    view_props: ViewProps,
    /// The rack this controller is attached to.
    parent: RefCell<Option<WeakRack>>,
    /// Kind-specific capabilities.
    body: Box<dyn BladeBody>,
    /// Subscriptions made on collaborators, released on dispose.
    subs: Subscriptions,
}

impl fmt::Debug for BladeController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BladeController")
            .field("id", &self.id)
            .field("view_props", &self.view_props)
            .finish()
    }
}

impl BladeController {
    /// Assemble a controller.
    pub fn new(blade: Blade, view_props: ViewProps, body: impl BladeBody) -> BladeRef {
        Rc::new(Self {
            id: BladeId::next(),
            blade,
            view_props,
            parent: RefCell::new(None),
            body: Box::new(body),
            subs: Subscriptions::new(),
        })
    }

    /// Identity.
    pub fn id(&self) -> BladeId {
        self.id
    }

    /// Ordering state.
    pub fn blade(&self) -> &Blade {
        &self.blade
    }

    /// View state.
    pub fn view_props(&self) -> &ViewProps {
        &self.view_props
    }

    /// The body.
    pub fn body(&self) -> &dyn BladeBody {
        self.body.as_ref()
    }

    /// The body as a concrete type.
    pub fn body_as<B: BladeBody>(&self) -> Option<&B> {
        self.body.as_any().downcast_ref::<B>()
    }

    /// The nested rack, for containers.
    pub fn rack(&self) -> Option<&Rack> {
        self.body.rack()
    }

    /// The rack this controller is attached to.
    pub fn parent(&self) -> Option<Rack> {
        self.parent.borrow().as_ref().and_then(WeakRack::upgrade)
    }

    /// Record the attaching rack.
    pub(crate) fn set_parent(&self, rack: Option<WeakRack>) {
        *self.parent.borrow_mut() = rack;
    }

    /// Hold a subscription until dispose.
    pub fn hold(&self, sub: Subscription) {
        self.subs.push(sub);
    }

    /// True once disposed.
    pub fn is_disposed(&self) -> bool {
        self.view_props.disposed()
    }

    /// Fail if disposed.
    fn ensure_live(&self) -> Result<()> {
        if self.is_disposed() {
            Err(Error::AlreadyDisposed)
        } else {
            Ok(())
        }
    }

    /// Restore exported state. Every layer is validated before any is
    /// applied, so a rejected record leaves the controller unchanged. Base
    /// fields are applied before body fields.
    pub fn import_state(&self, state: &BladeState) -> Result<()> {
        self.ensure_live()?;
        ViewProps::validate_state(state)?;
        self.body.validate_state(state)?;
        self.body.check_import()?;
        self.view_props.import_state(state)?;
        self.body.apply_state(state)
    }

    /// Export state, base fields first.
    pub fn export_state(&self) -> Result<BladeState> {
        self.ensure_live()?;
        Ok(merge_state([
            self.view_props.export_state(),
            self.body.export_state(),
        ]))
    }

    /// Re-read bound values.
    pub fn refresh(&self) -> Result<()> {
        self.ensure_live()?;
        self.body.refresh();
        Ok(())
    }

    /// Detach from the parent rack, release every subscription and mark the
    /// view state disposed. Disposal is terminal.
    pub fn dispose(&self) -> Result<()> {
        self.ensure_live()?;
        debug!(id = %self.id, "dispose");
        if let Some(rack) = self.parent() {
            rack.remove(self);
        }
        self.body.dispose();
        self.subs.release_all();
        self.view_props.set_disposed();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use serde_json::{Value as JsonValue, json};

    use super::*;
    use crate::core::state::{parse_record, record};

    /// A body with one integer field.
    #[derive(Default)]
    struct Counter {
        /// Stored count.
        count: Cell<i64>,
    }

    /// Counter state schema.
    #[derive(Deserialize)]
    struct CounterState {
        /// Stored count.
        count: i64,
    }

    impl BladeBody for Counter {
        fn validate_state(&self, state: &BladeState) -> StdResult<(), ParseError> {
            parse_record::<CounterState>(state).map(|_| ())
        }

        fn apply_state(&self, state: &BladeState) -> Result<()> {
            let s: CounterState = parse_record(state)?;
            self.count.set(s.count);
            Ok(())
        }

        fn export_state(&self) -> BladeState {
            record(json!({"count": self.count.get()}))
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn tiers() {
        use BladePosition::*;
        assert_eq!(position_tier(&[]), 2);
        assert_eq!(position_tier(&[VeryFirst]), 0);
        assert_eq!(position_tier(&[Last, First]), 1);
        assert_eq!(position_tier(&[VeryLast]), 4);
    }

    #[test]
    fn import_is_all_or_nothing() {
        let bc = BladeController::new(Blade::create(), ViewProps::default(), Counter::default());
        let err = bc
            .import_state(&record(json!({"disabled": true, "count": "x"})))
            .unwrap_err();
        assert_eq!(err, Error::invalid_params("count"));
        assert!(!bc.view_props().disabled());

        bc.import_state(&record(json!({"disabled": true, "count": 3})))
            .unwrap();
        assert!(bc.view_props().disabled());
        assert_eq!(bc.body_as::<Counter>().unwrap().count.get(), 3);
    }

    #[test]
    fn export_round_trip() {
        let bc = BladeController::new(Blade::create(), ViewProps::default(), Counter::default());
        bc.body_as::<Counter>().unwrap().count.set(9);
        bc.view_props().set_hidden(true);
        let s = bc.export_state().unwrap();
        assert_eq!(
            JsonValue::Object(s.clone()),
            json!({"disabled": false, "hidden": true, "count": 9})
        );
        let other = BladeController::new(Blade::create(), ViewProps::default(), Counter::default());
        other.import_state(&s).unwrap();
        assert_eq!(other.export_state().unwrap(), s);
    }

    #[test]
    fn disposed_rejects() {
        let bc = BladeController::new(Blade::create(), ViewProps::default(), Counter::default());
        bc.dispose().unwrap();
        assert!(bc.view_props().disposed());
        assert_eq!(bc.dispose(), Err(Error::AlreadyDisposed));
        assert_eq!(bc.export_state(), Err(Error::AlreadyDisposed));
        assert_eq!(
            bc.import_state(&BladeState::new()),
            Err(Error::AlreadyDisposed)
        );
    }
}
