//! The root container.

use std::{ops::Deref, rc::Rc, time::Duration};

use tracing::debug;

use super::folder::{FolderApi, FolderParts};
use crate::{
    blade::{Blade, BladeController},
    controllers::FolderBody,
    error::Result,
    plugins::{PluginBundle, PluginPool},
    scheduler::Scheduler,
    view_props::ViewProps,
};

/// Root container options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaneConfig {
    /// Caption of the root folder.
    pub title: Option<String>,
    /// Initial fold state.
    pub expanded: bool,
}

impl Default for PaneConfig {
    fn default() -> Self {
        Self {
            title: None,
            expanded: true,
        }
    }
}

/// The root of a control tree.
///
/// A pane is a folder that owns the plugin pool and the timer host. It
/// dereferences to [`FolderApi`], so blades are added to it through
/// [`Container`](super::Container). Monitors poll only while the host
/// pumps [`Pane::dispatch`].
pub struct Pane {
    /// The root folder.
    folder: FolderApi,
    /// Timer host for monitors.
    scheduler: Scheduler,
}

impl Pane {
    /// A pane with the built-in plugins.
    pub fn new(config: PaneConfig) -> Self {
        let scheduler = Scheduler::new();
        let pool = PluginPool::with_defaults(scheduler.clone());
        let view_props = ViewProps::default();
        let title = config.title.unwrap_or_default();
        let body = FolderBody::new(title, config.expanded, &view_props);
        let parts = FolderParts::of(&body);
        let controller = BladeController::new(Blade::create(), view_props, body);
        debug!(id = %controller.id(), "pane created");
        Self {
            folder: FolderApi::with_parts(controller, pool, parts),
            scheduler,
        }
    }

    /// Register every plugin of a bundle, in order. Registration stops at
    /// the first rejected plugin.
    pub fn register_plugin(&self, bundle: PluginBundle) -> Result<()> {
        for plugin in bundle.plugins {
            self.folder.pool().register(&bundle.id, plugin)?;
        }
        Ok(())
    }

    /// The plugin pool.
    pub fn plugin_pool(&self) -> &Rc<PluginPool> {
        self.folder.pool()
    }

    /// The timer host.
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Run every due monitor tick without blocking. Returns the number of
    /// ticks run.
    pub fn dispatch(&self) -> usize {
        self.scheduler.dispatch()
    }

    /// Wait up to `timeout` for a monitor tick, then run every due tick.
    pub fn wait_dispatch(&self, timeout: Duration) -> usize {
        self.scheduler.wait_dispatch(timeout)
    }
}

impl Default for Pane {
    fn default() -> Self {
        Self::new(PaneConfig::default())
    }
}

impl Deref for Pane {
    type Target = FolderApi;

    fn deref(&self) -> &FolderApi {
        &self.folder
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        api::Container,
        binding::{BindableRef, bindable},
        error::Error,
        plugins::{Plugin, number::NumberInputPlugin},
        state::record,
    };

    #[test]
    fn config() {
        let pane = Pane::new(PaneConfig {
            title: Some("Tweaks".into()),
            expanded: false,
        });
        assert_eq!(pane.title(), "Tweaks");
        assert!(!pane.expanded());
        assert_eq!(Pane::default().title(), "");
    }

    #[test]
    fn register_plugin_bundle() {
        let pane = Pane::default();
        let before = pane.plugin_pool().plugins().len();
        let bundle = PluginBundle::new("extra").with(Plugin::input(NumberInputPlugin));
        pane.register_plugin(bundle).unwrap();
        assert_eq!(pane.plugin_pool().plugins().len(), before + 1);
    }

    #[test]
    fn dispose_cascades() {
        let pane = Pane::default();
        let obj: BindableRef = bindable(json!({"x": 1}));
        let folder = pane.add_folder(&record(json!({"title": "F"}))).unwrap();
        let binding = folder.add_binding(&obj, "x", &record(json!({}))).unwrap();
        pane.dispose().unwrap();
        assert!(folder.is_disposed());
        assert!(binding.is_disposed());
        assert_eq!(pane.refresh(), Err(Error::AlreadyDisposed));
        assert_eq!(pane.dispose(), Err(Error::AlreadyDisposed));
    }
}
