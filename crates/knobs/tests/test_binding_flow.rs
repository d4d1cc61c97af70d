//! Tests for values flowing between bound objects and controllers.

#[cfg(test)]
mod tests {
    use knobs::{
        BindableRef, Container, Error, Pane, bindable,
        api::{ApiEvent, ApiEventName},
        controllers::{BindingController, SliderController},
        record,
        testing::{Recorder, init_logging},
        value::{Value, ValueEvent, ValueEventName},
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn external_write_is_clamped_on_fetch() {
        init_logging();
        let pane = Pane::default();
        let obj: BindableRef = bindable(json!({"x": 5}));
        let api = pane
            .add_binding(&obj, "x", &record(json!({"min": 0, "max": 10})))
            .unwrap();
        let body = api.controller().body_as::<BindingController>().unwrap();
        let value = body.input_value::<f64>().unwrap();
        let rec = Recorder::new(value.emitter(), &[ValueEventName::Change]);

        obj.borrow_mut().write_property("x", json!(15)).unwrap();
        api.refresh().unwrap();

        assert_eq!(value.raw_value(), 10.0);
        let changes = rec.map(|ev| match ev {
            ValueEvent::Change(c) => {
                Some((c.previous_raw_value, c.raw_value, c.is_internal_change))
            }
            ValueEvent::BeforeChange => None,
        });
        assert_eq!(changes, vec![(5.0, 10.0, Some(false))]);
    }

    #[test]
    fn fetch_twice_changes_once() {
        init_logging();
        let pane = Pane::default();
        let obj: BindableRef = bindable(json!({"x": 1.5}));
        let api = pane.add_binding(&obj, "x", &record(json!({}))).unwrap();
        let rec = Recorder::new(api.emitter(), &[ApiEventName::Change]);
        obj.borrow_mut().write_property("x", json!(2.5)).unwrap();
        api.refresh().unwrap();
        api.refresh().unwrap();
        pane.refresh().unwrap();
        assert_eq!(rec.len(), 1);
    }

    #[test]
    fn controller_edits_reach_the_object() {
        init_logging();
        let pane = Pane::default();
        let obj: BindableRef = bindable(json!({"x": 0}));
        let api = pane
            .add_binding(&obj, "x", &record(json!({"min": 0, "max": 10})))
            .unwrap();
        let all = Recorder::new(
            pane.emitter(),
            &[ApiEventName::Change, ApiEventName::InternalChange],
        );
        let body = api.controller().body_as::<BindingController>().unwrap();
        let slider = body.controller_as::<SliderController>().unwrap();

        assert!(slider.set_ratio(0.25, false));
        assert!(slider.set_ratio(0.5, true));
        assert_eq!(obj.borrow().read_property("x"), Some(json!(5)));

        let seen = all.map(|ev| match ev {
            ApiEvent::Change(c) => Some(("change", c.value.clone(), c.last)),
            ApiEvent::InternalChange(c) => Some(("internal", c.value.clone(), c.last)),
            _ => None,
        });
        assert_eq!(
            seen,
            vec![
                ("change", json!(2.5), false),
                ("internal", json!(2.5), false),
                ("change", json!(5), true),
                ("internal", json!(5), true),
            ]
        );
    }

    #[test]
    fn disabled_controllers_ignore_edits() {
        init_logging();
        let pane = Pane::default();
        let obj: BindableRef = bindable(json!({"x": 0}));
        let api = pane
            .add_binding(&obj, "x", &record(json!({"min": 0, "max": 10})))
            .unwrap();
        pane.set_disabled(true).unwrap();
        assert!(api.globally_disabled());
        assert!(!api.disabled());
        let body = api.controller().body_as::<BindingController>().unwrap();
        let slider = body.controller_as::<SliderController>().unwrap();
        assert!(!slider.set_ratio(1.0, true));
        assert_eq!(obj.borrow().read_property("x"), Some(json!(0)));
        pane.set_disabled(false).unwrap();
        assert!(!api.globally_disabled());
    }

    #[test]
    fn dropped_object_fails_reads() {
        init_logging();
        let pane = Pane::default();
        let obj: BindableRef = bindable(json!({"x": 1}));
        let api = pane.add_binding(&obj, "x", &record(json!({}))).unwrap();
        drop(obj);
        assert_eq!(api.value(), Err(Error::NotBindable));
        let rec = Recorder::new(api.emitter(), &[ApiEventName::Change]);
        assert_eq!(api.refresh(), Ok(()));
        assert!(rec.is_empty());
    }
}
