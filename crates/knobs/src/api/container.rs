//! Adding and removing blades through a container API.

use std::rc::Rc;

use serde_json::Value as JsonValue;
use tracing::debug;

use super::{AnyBladeApi, BindingApi, button::ButtonApi, folder::FolderApi, tab::TabApi};
use crate::{
    binding::BindableRef,
    error::{Error, Result},
    plugins::{BindingParams, BladeParams, Params, PluginPool, params::parse_params},
    rack::Rack,
};

/// Downcast a shared API object to a concrete API type.
fn downcast_api<A: AnyBladeApi>(api: Rc<dyn AnyBladeApi>) -> Result<Rc<A>> {
    api.into_any()
        .downcast::<A>()
        .map_err(|_| Error::ShouldNeverHappen)
}

/// Params with the `view` key forced to `view`.
fn with_view(params: &Params, view: &str) -> Params {
    let mut params = params.clone();
    params.insert("view".into(), JsonValue::String(view.into()));
    params
}

/// An API object that holds child blades: the pane, folders and tab
/// pages.
///
/// Every method fails with [`Error::AlreadyDisposed`] once the container
/// itself was disposed.
pub trait Container {
    /// The rack holding the children.
    fn rack(&self) -> &Rack;

    /// The pool used to build children.
    fn pool(&self) -> &Rc<PluginPool>;

    /// Fail if the container was disposed.
    fn ensure_open(&self) -> Result<()> {
        if self.rack().view_props().disposed() {
            Err(Error::AlreadyDisposed)
        } else {
            Ok(())
        }
    }

    /// Bind `object[key]` and add the resulting input or monitor. The
    /// `index` param picks the raw insertion index.
    ///
    /// Only the binding part of the API is returned. Use
    /// [`Container::add_binding_as`] to keep a plugin-specific API such as
    /// [`SliderBindingApi`](super::SliderBindingApi).
    fn add_binding(
        &self,
        object: &BindableRef,
        key: &str,
        params: &Params,
    ) -> Result<Rc<BindingApi>> {
        self.add_binding_blade(object, key, params)?
            .into_binding()
            .ok_or(Error::ShouldNeverHappen)
    }

    /// Like [`Container::add_binding`], returning the API the plugin built
    /// as `A`.
    fn add_binding_as<A: AnyBladeApi>(
        &self,
        object: &BindableRef,
        key: &str,
        params: &Params,
    ) -> Result<Rc<A>>
    where
        Self: Sized,
    {
        downcast_api(self.add_binding_blade(object, key, params)?)
    }

    /// Bind `object[key]`, add the blade and return whatever API the pool
    /// built for it.
    fn add_binding_blade(
        &self,
        object: &BindableRef,
        key: &str,
        params: &Params,
    ) -> Result<Rc<dyn AnyBladeApi>> {
        self.ensure_open()?;
        let index = parse_params::<BindingParams>(params)?.index;
        let controller = self.pool().create_binding(object, key, params)?;
        self.rack().add(controller.clone(), index);
        debug!(key, "binding added");
        Ok(self.pool().create_api(&controller))
    }

    /// Build a blade from params and add it.
    fn add_blade(&self, params: &Params) -> Result<Rc<dyn AnyBladeApi>> {
        self.ensure_open()?;
        let index = parse_params::<BladeParams>(params)?.index;
        let controller = self.pool().create_blade(params)?;
        self.rack().add(controller.clone(), index);
        Ok(self.pool().create_api(&controller))
    }

    /// Add a folder. Params are those of a `folder` blade.
    fn add_folder(&self, params: &Params) -> Result<Rc<FolderApi>> {
        downcast_api(self.add_blade(&with_view(params, "folder"))?)
    }

    /// Add a button. Params are those of a `button` blade.
    fn add_button(&self, params: &Params) -> Result<Rc<ButtonApi>> {
        downcast_api(self.add_blade(&with_view(params, "button"))?)
    }

    /// Add a tab. Params are those of a `tab` blade.
    fn add_tab(&self, params: &Params) -> Result<Rc<TabApi>> {
        downcast_api(self.add_blade(&with_view(params, "tab"))?)
    }

    /// Add a separator.
    fn add_separator(&self) -> Result<Rc<dyn AnyBladeApi>> {
        self.add_blade(&with_view(&Params::new(), "separator"))
    }

    /// Move an existing blade into this container. Returns its render
    /// index.
    fn add(&self, api: &dyn AnyBladeApi, index: Option<usize>) -> Result<usize> {
        self.ensure_open()?;
        let blade = api.blade_api();
        blade.ensure_live()?;
        Ok(self.rack().add(blade.controller().clone(), index))
    }

    /// Detach a child. The blade stays alive and can be added elsewhere.
    /// Returns false if it was not a child.
    fn remove(&self, api: &dyn AnyBladeApi) -> bool {
        self.rack().remove(api.blade_api().controller())
    }

    /// The API objects of every child, in render order.
    fn children(&self) -> Vec<Rc<dyn AnyBladeApi>> {
        self.rack()
            .children()
            .iter()
            .map(|c| self.pool().create_api(c))
            .collect()
    }

    /// Re-read the bound values of every descendant.
    fn refresh(&self) -> Result<()> {
        self.ensure_open()?;
        self.rack().refresh_children();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        api::{Pane, PaneConfig},
        binding::bindable,
        controllers::SeparatorBody,
        state::record,
    };

    #[test]
    fn insertion_index() {
        let pane = Pane::new(PaneConfig::default());
        let obj: BindableRef = bindable(json!({"a": 1, "b": 2, "c": 3}));
        pane.add_binding(&obj, "a", &record(json!({}))).unwrap();
        pane.add_binding(&obj, "b", &record(json!({}))).unwrap();
        pane.add_binding(&obj, "c", &record(json!({"index": 0})))
            .unwrap();
        let keys: Vec<_> = pane
            .children()
            .iter()
            .filter_map(|c| c.as_any().downcast_ref::<BindingApi>().map(|b| b.key().to_string()))
            .collect();
        assert_eq!(keys, vec!["c", "a", "b"]);
    }

    #[test]
    fn move_between_containers() {
        let pane = Pane::new(PaneConfig::default());
        let folder = pane.add_folder(&record(json!({"title": "F"}))).unwrap();
        let sep = pane.add_separator().unwrap();
        assert!(sep.blade_api().controller().body_as::<SeparatorBody>().is_some());
        assert_eq!(pane.rack().len(), 2);
        folder.add(sep.as_ref(), None).unwrap();
        assert_eq!(pane.rack().len(), 1);
        assert_eq!(folder.rack().len(), 1);
        assert!(folder.remove(sep.as_ref()));
        assert!(!folder.remove(sep.as_ref()));
        assert!(!sep.blade_api().is_disposed());
    }

    #[test]
    fn disposed_container_rejects_children() {
        let pane = Pane::new(PaneConfig::default());
        let folder = pane.add_folder(&record(json!({"title": "F"}))).unwrap();
        folder.dispose().unwrap();
        assert_eq!(pane.rack().len(), 0);
        let err = folder.add_separator().err();
        assert_eq!(err, Some(Error::AlreadyDisposed));
    }

    #[test]
    fn unknown_view_fails() {
        let pane = Pane::new(PaneConfig::default());
        let err = pane.add_blade(&record(json!({"view": "knob"}))).err();
        assert!(matches!(err, Some(Error::NoMatchingView { .. })));
    }
}
