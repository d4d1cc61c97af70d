//! Tests for ordering and cascading in the blade tree.

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use knobs::{
        BindableRef, Container, Pane, bindable,
        api::{AnyBladeApi, BindingApi, SliderBindingApi},
        blade::{Blade, BladeController, BladePosition, BladeRef},
        controllers::SeparatorBody,
        rack::Rack,
        record,
        view_props::ViewProps,
    };
    use proptest::prelude::*;
    use serde_json::json;

    /// A separator tagged with one position.
    fn tagged(position: BladePosition) -> BladeRef {
        BladeController::new(
            Blade::new(vec![position]),
            ViewProps::default(),
            SeparatorBody,
        )
    }

    /// The position tags of a rack's children, in render order.
    fn order(rack: &Rack) -> Vec<BladePosition> {
        rack.children()
            .iter()
            .flat_map(|c| c.blade().positions.with_raw(Clone::clone))
            .collect()
    }

    #[test]
    fn position_tiers() {
        let rack = Rack::new(ViewProps::default());
        for p in [
            BladePosition::VeryLast,
            BladePosition::First,
            BladePosition::VeryFirst,
            BladePosition::Last,
        ] {
            rack.add(tagged(p), None);
        }
        assert_eq!(order(&rack), BladePosition::ALL.to_vec());
    }

    proptest! {
        #[test]
        fn any_insertion_order_sorts(
            positions in Just(BladePosition::ALL.to_vec()).prop_shuffle(),
            indexes in prop::collection::vec(prop::option::of(0usize..4), 4),
        ) {
            let rack = Rack::new(ViewProps::default());
            for (p, i) in positions.iter().zip(&indexes) {
                rack.add(tagged(*p), *i);
            }
            prop_assert_eq!(order(&rack), BladePosition::ALL.to_vec());
        }
    }

    #[test]
    fn disabled_cascades_without_touching_children() {
        let pane = Pane::default();
        let obj: BindableRef = bindable(json!({"x": 1, "s": "a"}));
        let folder = pane.add_folder(&record(json!({"title": "F"}))).unwrap();
        let x = folder.add_binding(&obj, "x", &record(json!({}))).unwrap();
        let s = pane.add_binding(&obj, "s", &record(json!({}))).unwrap();

        folder.set_disabled(true).unwrap();
        assert!(x.globally_disabled());
        assert!(!x.disabled());
        assert!(!s.globally_disabled());

        pane.set_disabled(true).unwrap();
        folder.set_disabled(false).unwrap();
        assert!(x.globally_disabled());
        assert!(s.globally_disabled());

        pane.set_disabled(false).unwrap();
        assert!(!x.globally_disabled());
        assert!(!s.globally_disabled());
    }

    #[test]
    fn detached_blades_stop_inheriting() {
        let pane = Pane::default();
        let obj: BindableRef = bindable(json!({"x": 1}));
        let x = pane.add_binding(&obj, "x", &record(json!({}))).unwrap();
        pane.set_disabled(true).unwrap();
        assert!(x.globally_disabled());
        assert!(pane.remove(&*x));
        assert!(!x.globally_disabled());
        assert!(pane.children().is_empty());
    }

    #[test]
    fn api_objects_are_stable() {
        let pane = Pane::default();
        let obj: BindableRef = bindable(json!({"x": 1}));
        let x = pane.add_binding(&obj, "x", &record(json!({}))).unwrap();
        let children = pane.children();
        assert_eq!(children.len(), 1);
        let again = children[0].clone().into_any().downcast::<BindingApi>();
        assert!(Rc::ptr_eq(&again.unwrap(), &x));
    }

    #[test]
    fn plugin_specific_apis_are_stable() {
        let pane = Pane::default();
        let obj: BindableRef = bindable(json!({"x": 3}));
        let api = pane
            .add_binding_as::<SliderBindingApi>(&obj, "x", &record(json!({"min": 0, "max": 10})))
            .unwrap();
        api.set_min(5.0).unwrap();
        assert_eq!(obj.borrow().read_property("x"), Some(json!(5)));

        let again = pane.children()[0].clone().into_any().downcast::<SliderBindingApi>();
        assert!(Rc::ptr_eq(&again.unwrap(), &api));
        let binding = pane.add_binding(&obj, "x", &record(json!({"min": 0, "max": 1})));
        assert!(binding.unwrap().as_any().is::<BindingApi>());
    }
}
