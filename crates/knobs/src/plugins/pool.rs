//! Plugin registration and dispatch.

use std::{cell::RefCell, fmt, rc::Rc};

use tracing::debug;

use super::{
    blades::{
        ButtonPlugin, FolderPlugin, ListBladePlugin, SeparatorPlugin, SliderBladePlugin,
        TabPlugin, TextBladePlugin,
    },
    boolean::{BoolInputPlugin, BoolMonitorPlugin},
    color::{ColorNumberInputPlugin, ColorObjectInputPlugin},
    number::{NumberInputPlugin, NumberMonitorPlugin},
    params::{BindingParams, BladeParams, Params, parse_params},
    plugin::{BindingContext, Plugin},
    point::PointInputPlugin,
    string::{StringInputPlugin, StringMonitorPlugin},
};
use crate::{
    api::{AnyBladeApi, BindingApi, BladeApi, BladeApiCache},
    binding::{BindableRef, BindingTarget},
    blade::BladeRef,
    error::{Error, Result},
    id::PluginId,
    scheduler::Scheduler,
    semver::Semver,
};

/// A plugin registry owned by one top-level container.
///
/// Dispatch searches the most recently registered plugin first and commits
/// to the first one that accepts, so host plugins shadow built-ins without
/// removing them.
pub struct PluginPool {
    /// Plugins in search order, most recent first.
    plugins: RefCell<Vec<Plugin>>,
    /// API objects built so far.
    api_cache: BladeApiCache,
    /// Timer host for monitors.
    scheduler: Scheduler,
}

impl fmt::Debug for PluginPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginPool")
            .field("plugins", &self.plugins.borrow())
            .finish()
    }
}

impl PluginPool {
    /// An empty pool.
    pub fn new(scheduler: Scheduler) -> Rc<Self> {
        Rc::new(Self {
            plugins: RefCell::new(vec![]),
            api_cache: BladeApiCache::default(),
            scheduler,
        })
    }

    /// A pool holding the built-in plugins.
    pub fn with_defaults(scheduler: Scheduler) -> Rc<Self> {
        let pool = Self::new(scheduler);
        for plugin in default_plugins() {
            pool.insert(plugin);
        }
        pool
    }

    /// The timer host.
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Registered plugins, in search order.
    pub fn plugins(&self) -> Vec<Plugin> {
        self.plugins.borrow().clone()
    }

    /// Register a plugin under a bundle id. The plugin shadows every plugin
    /// registered before it.
    pub fn register(&self, bundle: &str, plugin: Plugin) -> Result<()> {
        PluginId::new(plugin.id())?;
        if !plugin.core().is_compatible_with(&Semver::core()) {
            return Err(Error::NotCompatible {
                bundle: bundle.to_string(),
                id: plugin.id().to_string(),
            });
        }
        debug!(bundle, plugin = ?plugin, "register");
        self.insert(plugin);
        Ok(())
    }

    /// Put a plugin at the front of the search order.
    fn insert(&self, plugin: Plugin) {
        self.plugins.borrow_mut().insert(0, plugin);
    }

    /// Build a binding controller for `object[key]`. Readonly params route
    /// to monitor plugins; all others to input plugins.
    pub fn create_binding(
        &self,
        object: &BindableRef,
        key: &str,
        params: &Params,
    ) -> Result<BladeRef> {
        let target = BindingTarget::new(object, key)?;
        let initial = target.read()?;
        let base: BindingParams = parse_params(params)?;
        let readonly = base.readonly.unwrap_or(false);
        let cx = BindingContext {
            target: &target,
            initial: &initial,
            params,
            base: &base,
            scheduler: &self.scheduler,
        };
        for plugin in self.plugins() {
            let candidate = match (&plugin, readonly) {
                (Plugin::Input(p), false) | (Plugin::Monitor(p), true) => p,
                _ => continue,
            };
            if let Some(bc) = candidate.create(&cx)? {
                debug!(key, plugin = ?plugin, "binding dispatched");
                return Ok(bc);
            }
        }
        Err(Error::NoMatchingController {
            key: key.to_string(),
        })
    }

    /// Build a blade controller from params.
    pub fn create_blade(&self, params: &Params) -> Result<BladeRef> {
        let base: BladeParams = parse_params(params)?;
        for plugin in self.plugins() {
            if let Plugin::Blade(p) = &plugin
                && let Some(bc) = p.create(params, &base)?
            {
                debug!(plugin = ?plugin, "blade dispatched");
                return Ok(bc);
            }
        }
        Err(Error::NoMatchingView {
            params: params.clone(),
        })
    }

    /// The API object for a controller. The same object is returned while
    /// the host holds it.
    pub fn create_api(self: &Rc<Self>, controller: &BladeRef) -> Rc<dyn AnyBladeApi> {
        if let Some(api) = self.api_cache.get(controller.id()) {
            return api;
        }
        let api = self
            .plugins()
            .iter()
            .find_map(|p| p.api(controller, self))
            .unwrap_or_else(|| self.generic_api(controller));
        self.api_cache.insert(controller.id(), &api);
        api
    }

    /// The fallback API object.
    fn generic_api(self: &Rc<Self>, controller: &BladeRef) -> Rc<dyn AnyBladeApi> {
        match BindingApi::new(controller.clone(), self.clone()) {
            Some(api) => Rc::new(api),
            None => Rc::new(BladeApi::new(controller.clone(), self.clone())),
        }
    }
}

/// The built-in plugins, in registration order.
fn default_plugins() -> Vec<Plugin> {
    vec![
        Plugin::blade(ButtonPlugin),
        Plugin::blade(FolderPlugin),
        Plugin::blade(TabPlugin),
        Plugin::blade(SeparatorPlugin),
        Plugin::blade(ListBladePlugin),
        Plugin::blade(SliderBladePlugin),
        Plugin::blade(TextBladePlugin),
        Plugin::input(PointInputPlugin::new(2)),
        Plugin::input(PointInputPlugin::new(3)),
        Plugin::input(PointInputPlugin::new(4)),
        Plugin::input(StringInputPlugin),
        Plugin::input(NumberInputPlugin),
        Plugin::input(ColorObjectInputPlugin),
        Plugin::input(ColorNumberInputPlugin),
        Plugin::input(BoolInputPlugin),
        Plugin::monitor(BoolMonitorPlugin),
        Plugin::monitor(StringMonitorPlugin),
        Plugin::monitor(NumberMonitorPlugin),
    ]
}
