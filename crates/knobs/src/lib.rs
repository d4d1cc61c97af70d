//! Knobs: live-tunable values bound to host objects.
//!
//! A host exposes properties of its own objects as controls. Each binding
//! is dispatched to a plugin that knows how to edit that kind of value, and
//! the resulting controllers form a tree whose disabled state cascades down
//! and whose value changes bubble up.
//!
//! # Quick Start
//!
//! The main entry points are:
//! - [`Pane`] - The root container, owning the plugin pool
//! - [`api::Container`] - Adding bindings, folders, buttons and tabs
//! - [`binding::Bindable`] - The trait host objects implement
//!
//! # Module Organization
//!
//! - [`api`] - Host-facing handles for blades
//! - [`controllers`] - Blade bodies and value controllers
//! - [`plugins`] - Plugin protocol, built-in plugins and dispatch

#![warn(missing_docs)]

// Internal core module - re-export specific items below
mod core;

// Public modules
pub mod api;
pub mod controllers;
pub mod plugins;

#[cfg(any(test, feature = "testing"))]
pub use core::testing;
pub use core::{
    binding, binding_value, blade, constraint, emitter, error, id, rack, scheduler, semver, state,
    ticker, value, value_map, view_props,
};

pub use api::{Container, Pane, PaneConfig};
pub use core::{
    binding::{Bindable, BindableRef, bindable},
    error::{Error, Result},
    scheduler::Scheduler,
    state::{BladeState, record},
};
