//! Integration tests for the registry surface.

use std::thread;

use formal::{
    Arg, ClassId, DispatchError, GraphError, RegistrationError, Registry, ResolverConfig,
    SharedRegistry, TieBreak,
};
use pretty_assertions::assert_eq;

const NONE: &[&str] = &[];

/// Shape hierarchy used by several tests.
///
/// ```text
/// Shape <- Circle
/// Shape <- Polygon <- Rectangle <- Square
///          Polygon <------------- Square
/// ```
fn shapes() -> Registry<&'static str> {
    let mut registry = Registry::new();
    registry.declare_class("Shape", NONE).unwrap();
    registry.declare_class("Circle", &["Shape"]).unwrap();
    registry.declare_class("Polygon", &["Shape"]).unwrap();
    registry.declare_class("Rectangle", &["Polygon"]).unwrap();
    registry.declare_class("Square", &["Rectangle", "Polygon"]).unwrap();
    registry.declare_generic("area", &["shape"]);
    registry
}

mod classes {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cycle_rejected_and_state_kept() {
        let mut registry = shapes();
        registry.register_method("area", &["Polygon"], "area_polygon").unwrap();
        let call = registry.call(&["Square"]);
        let before = registry.resolve("area", &call).unwrap();

        let err = registry.declare_class("Shape", &["Square"]).unwrap_err();
        assert!(matches!(err, GraphError::CycleDetected { .. }));

        let after = registry.resolve("area", &call).unwrap();
        assert_eq!(before, after);
        let shape = registry.lookup_class("Shape").unwrap();
        assert_eq!(registry.classes().parents(shape).count(), 0);
    }

    #[test]
    fn test_ancestors_end_in_any() {
        let mut registry = shapes();
        let square = registry.class_id("Square");
        let chain = registry.ancestors(square);
        let named: Vec<_> = chain
            .iter()
            .map(|(id, d)| (registry.class_name(id).to_string(), d))
            .collect();
        assert_eq!(
            named,
            vec![
                ("Square".to_string(), 0),
                ("Rectangle".to_string(), 1),
                ("Polygon".to_string(), 1),
                ("Shape".to_string(), 2),
                ("ANY".to_string(), 3),
            ]
        );
    }

    #[test]
    fn test_extends() {
        let registry = shapes();
        let id = |name| registry.lookup_class(name).unwrap();
        assert!(registry.extends(id("Square"), id("Shape")));
        assert!(registry.extends(id("Circle"), ClassId::ANY));
        assert!(!registry.extends(id("Circle"), id("Polygon")));
    }

    #[test]
    fn test_redefinition_changes_dispatch() {
        let mut registry = shapes();
        registry.register_method("area", &["Polygon"], "area_polygon").unwrap();
        registry.register_method("area", &["Shape"], "area_shape").unwrap();
        let call = registry.call(&["Circle"]);
        assert_eq!(registry.resolve("area", &call).unwrap().handle, "area_shape");

        // Circle now claims to be a polygon; the cache must not hide it
        registry.declare_class("Circle", &["Polygon"]).unwrap();
        assert_eq!(registry.resolve("area", &call).unwrap().handle, "area_polygon");
    }
}

mod methods {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_short_signature_padded_with_any() {
        let mut registry = shapes();
        registry.declare_generic("overlap", &["a", "b"]);
        let signature = registry.register_method("overlap", &["Circle"], "overlap_circle").unwrap();
        assert_eq!(signature.classes()[1], ClassId::ANY);
        assert!(registry.exists_method("overlap", &["Circle", "ANY"]));
        assert!(registry.exists_method("overlap", &["Circle"]));
    }

    #[test]
    fn test_long_signature_rejected() {
        let mut registry = shapes();
        let err = registry
            .register_method("area", &["Circle", "Circle"], "bad")
            .unwrap_err();
        assert_eq!(
            err,
            RegistrationError::SignatureTooLong {
                generic: "area".to_string(),
                expected: 1,
                found: 2,
            }
        );
        assert!(registry.method_table("area").unwrap().is_empty());
    }

    #[test]
    fn test_implicit_generic() {
        let mut registry = shapes();
        registry.register_method("perimeter", &["Circle"], "perimeter_circle").unwrap();
        let table = registry.method_table("perimeter").unwrap();
        assert_eq!(table.params(), &["arg1".to_string()]);
        assert_eq!(registry.generics().collect::<Vec<_>>(), vec!["area", "perimeter"]);
    }

    #[test]
    fn test_replace_method() {
        let mut registry = shapes();
        registry.register_method("area", &["Circle"], "old").unwrap();
        registry.register_method("area", &["Circle"], "new").unwrap();
        let call = registry.call(&["Circle"]);
        assert_eq!(registry.resolve("area", &call).unwrap().handle, "new");
        assert_eq!(registry.method_table("area").unwrap().len(), 1);
    }

    #[test]
    fn test_identical_reregistration_is_idempotent() {
        let mut registry = shapes();
        registry.declare_class("D", NONE).unwrap();
        registry.declare_class("E", NONE).unwrap();
        registry.declare_class("F", &["D", "E"]).unwrap();
        registry.declare_generic("speak", &["x"]);
        for _ in 0..2 {
            registry.register_method("speak", &["D"], "speak_d").unwrap();
            registry.register_method("speak", &["E"], "speak_e").unwrap();
        }
        let call = registry.call(&["F"]);
        match registry.resolve("speak", &call) {
            Err(DispatchError::AmbiguousMethod(err)) => assert_eq!(err.candidates.len(), 2),
            other => panic!("Expected AmbiguousMethod, got {:?}", other),
        }
    }

    #[test]
    fn test_remove_method_falls_back() {
        let mut registry = shapes();
        registry.register_method("area", &["Square"], "area_square").unwrap();
        registry.register_method("area", &["Shape"], "area_shape").unwrap();
        let call = registry.call(&["Square"]);
        assert_eq!(registry.resolve("area", &call).unwrap().handle, "area_square");

        assert!(registry.remove_method("area", &["Square"]));
        assert!(!registry.remove_method("area", &["Square"]));
        assert!(!registry.exists_method("area", &["Square"]));
        let method = registry.resolve("area", &call).unwrap();
        assert_eq!(method.handle, "area_shape");
        assert_eq!(method.distance, 2);

        assert!(registry.remove_method("area", &["Shape"]));
        assert!(registry.resolve("area", &call).unwrap_err().is_no_match());
    }

    #[test]
    fn test_methods_in_registration_order() {
        let mut registry = shapes();
        registry.register_method("area", &["Square"], "area_square").unwrap();
        registry.register_method("area", &["Circle"], "area_circle").unwrap();
        registry.register_method("area", &["Square"], "area_square_v2").unwrap();

        let names: Vec<_> = registry
            .methods("area")
            .map(|s| registry.classes().name(s.classes()[0]).to_string())
            .collect();
        assert_eq!(names, vec!["Square", "Circle"]);
        assert_eq!(registry.methods("volume").count(), 0);
    }

    #[test]
    fn test_remove_unknown() {
        let mut registry = shapes();
        assert!(!registry.remove_method("area", &["Nowhere"]));
        assert!(!registry.remove_method("volume", &["Circle"]));
    }

    #[test]
    fn test_has_method() {
        let mut registry = shapes();
        registry.register_method("area", &["Polygon"], "area_polygon").unwrap();
        let square = registry.call(&["Square"]);
        let circle = registry.call(&["Circle"]);
        assert!(registry.has_method("area", &square));
        assert!(!registry.has_method("area", &circle));
        assert!(!registry.has_method("volume", &circle));
    }
}

mod dispatch {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_unknown_generic() {
        let registry = shapes();
        let call = registry.call(&["Circle"]);
        match registry.resolve("volume", &call) {
            Err(DispatchError::UnknownGeneric(name)) => assert_eq!(name, "volume"),
            other => panic!("Expected UnknownGeneric, got {:?}", other),
        }
    }

    #[test]
    fn test_call_does_not_intern_unseen_names() {
        let mut registry = shapes();
        registry.register_method("area", &["ANY"], "area_any").unwrap();

        let call = registry.call(&["Nowhere"]);
        assert_eq!(call, vec![Arg::Unknown]);
        assert!(registry.lookup_class("Nowhere").is_none());

        let method = registry.resolve("area", &call).unwrap();
        assert_eq!(method.handle, "area_any");
        assert_eq!(method.distance, 1);

        // Same outcome as an interned but undeclared class
        let ghost = registry.class_id("Ghost");
        let method = registry.resolve("area", &[Arg::Class(ghost)]).unwrap();
        assert_eq!(method.distance, 1);
    }

    #[test]
    fn test_unseen_name_in_no_match_error() {
        let registry = shapes();
        let call = registry.call(&["Nowhere"]);
        match registry.resolve("area", &call) {
            Err(DispatchError::NoApplicableMethod(err)) => {
                assert_eq!(err.call, vec!["<unknown>".to_string()]);
            }
            other => panic!("Expected NoApplicableMethod, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_in_call_names() {
        let mut registry = shapes();
        registry.declare_generic("draw", &["shape", "canvas"]);
        registry.register_method("draw", &["Shape", "MISSING"], "draw_default").unwrap();
        registry.register_method("draw", &["Shape", "ANY"], "draw_on").unwrap();

        let call = registry.call(&["Circle", "MISSING"]);
        assert_eq!(call[1], Arg::Missing);
        let method = registry.resolve("draw", &call).unwrap();
        assert_eq!(method.handle, "draw_default");
        assert_eq!(method.distance, 1);
    }

    #[test]
    fn test_dispatch_tie_break_policies() {
        let mut registry = shapes();
        registry.declare_generic("combine", &["a", "b"]);
        registry.register_method("combine", &["Shape", "ANY"], "shape_any").unwrap();
        registry.register_method("combine", &["ANY", "Shape"], "any_shape").unwrap();
        let call = registry.call(&["Shape", "Shape"]);

        assert!(registry.dispatch("combine", &call).unwrap_err().is_ambiguous());

        registry.set_tie_break(TieBreak::FirstRegistered);
        assert_eq!(registry.dispatch("combine", &call).unwrap().handle, "shape_any");

        registry.set_tie_break(TieBreak::Lexicographic);
        assert_eq!(registry.dispatch("combine", &call).unwrap().handle, "any_shape");

        // resolve itself never guesses
        assert!(registry.resolve("combine", &call).unwrap_err().is_ambiguous());
    }

    #[test]
    fn test_next_method_chain() {
        let mut registry = shapes();
        registry.register_method("area", &["Square"], "area_square").unwrap();
        registry.register_method("area", &["Rectangle"], "area_rectangle").unwrap();
        registry.register_method("area", &["ANY"], "area_any").unwrap();

        let call = registry.call(&["Square"]);
        let first = registry.resolve("area", &call).unwrap();
        assert_eq!(first.handle, "area_square");

        let second = registry.next_method("area", &first.signature).unwrap();
        assert_eq!(second.handle, "area_rectangle");

        let third = registry.next_method("area", &second.signature).unwrap();
        assert_eq!(third.handle, "area_any");

        let err = registry.next_method("area", &third.signature).unwrap_err();
        assert!(err.is_no_match());
    }

    #[test]
    fn test_cache_matches_uncached() {
        let mut cached = shapes();
        let mut uncached: Registry<&'static str> = Registry::with_config(ResolverConfig {
            cache: false,
            ..ResolverConfig::default()
        });
        uncached.declare_class("Shape", NONE).unwrap();
        uncached.declare_class("Circle", &["Shape"]).unwrap();
        uncached.declare_class("Polygon", &["Shape"]).unwrap();
        uncached.declare_class("Rectangle", &["Polygon"]).unwrap();
        uncached.declare_class("Square", &["Rectangle", "Polygon"]).unwrap();
        uncached.declare_generic("area", &["shape"]);

        for registry in [&mut cached, &mut uncached] {
            registry.register_method("area", &["Polygon"], "area_polygon").unwrap();
            registry.register_method("area", &["Rectangle"], "area_rectangle").unwrap();
        }

        for _ in 0..2 {
            for name in ["Shape", "Circle", "Polygon", "Rectangle", "Square"] {
                let a = cached.call(&[name]);
                let b = uncached.call(&[name]);
                let left = cached.resolve("area", &a).map(|m| (m.handle, m.distance)).ok();
                let right = uncached.resolve("area", &b).map(|m| (m.handle, m.distance)).ok();
                assert_eq!(left, right, "class {}", name);
            }
        }
    }

    #[test]
    fn test_shared_registry_across_threads() {
        let shared = SharedRegistry::new(shapes());
        shared.register_method("area", &["Shape"], "area_shape").unwrap();
        shared.register_method("area", &["Rectangle"], "area_rectangle").unwrap();
        // Building a call only needs the read lock
        let call = {
            let _reader = shared.read();
            shared.call(&["Square"])
        };

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let shared = shared.clone();
                let call = call.clone();
                thread::spawn(move || {
                    (0..100)
                        .map(|_| shared.resolve("area", &call).unwrap().handle)
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        shared.declare_class("Hexagon", &["Polygon"]).unwrap();

        for worker in workers {
            let results = worker.join().unwrap();
            assert!(results.iter().all(|&h| h == "area_rectangle"));
        }
        assert!(shared.read().lookup_class("Hexagon").is_some());
    }
}
