//! The generic blade API.

use std::{any::Any, rc::Rc};

use super::BindingApi;
use crate::{
    blade::BladeRef,
    error::{Error, Result},
    plugins::PluginPool,
    state::BladeState,
};

/// Any API object. Every API wraps a [`BladeApi`].
pub trait AnyBladeApi: Any {
    /// The generic part of the API.
    fn blade_api(&self) -> &BladeApi;

    /// Downcasting support.
    fn as_any(&self) -> &dyn Any;

    /// Downcast a shared API object.
    fn into_any(self: Rc<Self>) -> Rc<dyn Any>;

    /// The binding API of an input or monitor, whatever plugin-specific
    /// API extends it.
    fn into_binding(self: Rc<Self>) -> Option<Rc<BindingApi>> {
        None
    }
}

/// Implement [`AnyBladeApi`] and `Deref<Target = BladeApi>` for an API
/// type with a `blade: BladeApi` field.
macro_rules! blade_api {
    ($t:ident $(<$g:ident>)?) => {
        impl$(<$g: Clone + PartialEq + 'static>)? $crate::api::AnyBladeApi for $t$(<$g>)? {
            fn blade_api(&self) -> &$crate::api::BladeApi {
                &self.blade
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn into_any(self: ::std::rc::Rc<Self>) -> ::std::rc::Rc<dyn ::std::any::Any> {
                self
            }
        }

        impl$(<$g: Clone + PartialEq + 'static>)? ::std::ops::Deref for $t$(<$g>)? {
            type Target = $crate::api::BladeApi;

            fn deref(&self) -> &Self::Target {
                &self.blade
            }
        }
    };
}
pub(crate) use blade_api;

/// Implement [`AnyBladeApi`] and `Deref<Target = $base>` for an API type
/// that extends another API held as `base: Rc<$base>`.
macro_rules! extended_api {
    ($t:ident $(<$g:ident>)? => $base:ty) => {
        impl$(<$g: Clone + PartialEq + 'static>)? $crate::api::AnyBladeApi for $t$(<$g>)? {
            fn blade_api(&self) -> &$crate::api::BladeApi {
                $crate::api::AnyBladeApi::blade_api(self.base.as_ref())
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn into_any(self: ::std::rc::Rc<Self>) -> ::std::rc::Rc<dyn ::std::any::Any> {
                self
            }

            fn into_binding(
                self: ::std::rc::Rc<Self>,
            ) -> Option<::std::rc::Rc<$crate::api::BindingApi>> {
                $crate::api::AnyBladeApi::into_binding(self.base.clone())
            }
        }

        impl$(<$g: Clone + PartialEq + 'static>)? ::std::ops::Deref for $t$(<$g>)? {
            type Target = $base;

            fn deref(&self) -> &Self::Target {
                &self.base
            }
        }
    };
}
pub(crate) use extended_api;

/// Host-facing handle to a blade.
#[derive(Debug, Clone)]
pub struct BladeApi {
    /// The controller.
    controller: BladeRef,
    /// The pool that built it.
    pool: Rc<PluginPool>,
}

impl BladeApi {
    /// Wrap a controller.
    pub fn new(controller: BladeRef, pool: Rc<PluginPool>) -> Self {
        Self { controller, pool }
    }

    /// The controller.
    pub fn controller(&self) -> &BladeRef {
        &self.controller
    }

    /// The pool that built the controller.
    pub fn pool(&self) -> &Rc<PluginPool> {
        &self.pool
    }

    /// Fail if the blade was disposed.
    pub fn ensure_live(&self) -> Result<()> {
        if self.controller.is_disposed() {
            Err(Error::AlreadyDisposed)
        } else {
            Ok(())
        }
    }

    /// Own disabled flag.
    pub fn disabled(&self) -> bool {
        self.controller.view_props().disabled()
    }

    /// Own disabled flag or any ancestor's.
    pub fn globally_disabled(&self) -> bool {
        self.controller.view_props().is_globally_disabled()
    }

    /// Set the own disabled flag.
    pub fn set_disabled(&self, disabled: bool) -> Result<()> {
        self.ensure_live()?;
        self.controller.view_props().set_disabled(disabled);
        Ok(())
    }

    /// Own hidden flag.
    pub fn hidden(&self) -> bool {
        self.controller.view_props().hidden()
    }

    /// Set the own hidden flag.
    pub fn set_hidden(&self, hidden: bool) -> Result<()> {
        self.ensure_live()?;
        self.controller.view_props().set_hidden(hidden);
        Ok(())
    }

    /// True once disposed.
    pub fn is_disposed(&self) -> bool {
        self.controller.is_disposed()
    }

    /// Detach and dispose the blade.
    pub fn dispose(&self) -> Result<()> {
        self.controller.dispose()
    }

    /// Restore exported state.
    pub fn import_state(&self, state: &BladeState) -> Result<()> {
        self.controller.import_state(state)
    }

    /// Export state.
    pub fn export_state(&self) -> Result<BladeState> {
        self.controller.export_state()
    }
}

impl AnyBladeApi for BladeApi {
    fn blade_api(&self) -> &BladeApi {
        self
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}
