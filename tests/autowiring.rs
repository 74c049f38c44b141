use canister::{arg, ClassSpec, Container, DiError, Entry, Param, TypeCatalog};
use std::sync::Arc;

struct Clock;

struct Scheduler {
    clock: Arc<Clock>,
}

fn catalog_with_scheduler() -> TypeCatalog {
    let mut catalog = TypeCatalog::new();
    catalog.insert(ClassSpec::new("Clock", |_| Ok(Clock)));
    catalog.insert(
        ClassSpec::new("Scheduler", |args| {
            Ok(Scheduler {
                clock: arg::<Clock>(&args, 0)?,
            })
        })
        .with_param(Param::typed("clock", "Clock")),
    );
    catalog
}

#[test]
fn test_autowires_transitive_dependency() {
    let container = Container::new().with_reflector(Arc::new(catalog_with_scheduler()));

    let scheduler = container.get_as::<Scheduler>("Scheduler").unwrap();
    let clock = container.get_as::<Clock>("Clock").unwrap();
    assert!(Arc::ptr_eq(&scheduler.clock, &clock));
}

#[test]
fn test_autowired_instances_are_cached_under_the_class_id() {
    let container = Container::new().with_reflector(Arc::new(catalog_with_scheduler()));

    assert!(!container.has("Scheduler")); // not present until materialized

    let a = container.get_as::<Scheduler>("Scheduler").unwrap();
    let b = container.get_as::<Scheduler>("Scheduler").unwrap();
    assert!(Arc::ptr_eq(&a, &b));

    assert!(container.has("Scheduler"));
    // The dependency was materialized first, so it precedes its dependent.
    assert_eq!(container.keys(), vec!["Clock", "Scheduler"]);
}

#[test]
fn test_autowired_entry_becomes_immutable() {
    let container = Container::new().with_reflector(Arc::new(catalog_with_scheduler()));
    container.get("Clock").unwrap();

    match container.add("Clock", Entry::value(1u8)) {
        Err(DiError::Immutable(id)) => assert_eq!(id, "Clock"),
        other => panic!("expected Immutable, got {:?}", other),
    }
}

#[test]
fn test_registered_entries_win_over_the_reflector() {
    let container = Container::new().with_reflector(Arc::new(catalog_with_scheduler()));
    container.add("Clock", Entry::value("not a clock".to_string())).unwrap();

    // The store is consulted first; the catalog never runs for known ids.
    assert_eq!(*container.get_as::<String>("Clock").unwrap(), "not a clock");
}

#[test]
fn test_typed_param_can_hint_any_registered_id() {
    struct App {
        name: String,
    }

    let mut catalog = TypeCatalog::new();
    catalog.insert(
        ClassSpec::new("App", |args| {
            Ok(App {
                name: arg::<String>(&args, 0)?.as_ref().clone(),
            })
        })
        .with_param(Param::typed("name", "app.name")),
    );

    let container = Container::new().with_reflector(Arc::new(catalog));
    container.add("app.name", Entry::value("canister".to_string())).unwrap();

    assert_eq!(container.get_as::<App>("App").unwrap().name, "canister");
}

#[test]
fn test_zero_constructor_class() {
    struct Marker;

    let mut catalog = TypeCatalog::new();
    catalog.insert(ClassSpec::new("Marker", |_| Ok(Marker)));

    let container = Container::new().with_reflector(Arc::new(catalog));
    assert!(container.get_as::<Marker>("Marker").is_ok());
}

#[test]
fn test_defaulted_parameter_is_used() {
    struct Report {
        limit: u32,
    }

    let mut catalog = TypeCatalog::new();
    catalog.insert(
        ClassSpec::new("Report", |args| {
            Ok(Report {
                limit: *arg::<u32>(&args, 0)?,
            })
        })
        .with_param(Param::defaulted("limit", 10u32)),
    );

    let container = Container::new().with_reflector(Arc::new(catalog));
    assert_eq!(container.get_as::<Report>("Report").unwrap().limit, 10);
}

#[test]
fn test_untyped_required_parameter_fails() {
    struct Raw;

    let mut catalog = TypeCatalog::new();
    catalog.insert(
        ClassSpec::new("Raw", |_| Ok(Raw)).with_param(Param::untyped("payload")),
    );

    let container = Container::new().with_reflector(Arc::new(catalog));
    match container.get("Raw") {
        Err(DiError::UnresolvableParameter { parameter, class }) => {
            assert_eq!(parameter, "payload");
            assert_eq!(class, "Raw");
        }
        other => panic!("expected UnresolvableParameter, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_not_instantiable_class_fails() {
    let mut catalog = TypeCatalog::new();
    catalog.insert(ClassSpec::not_instantiable("Storage"));

    let container = Container::new().with_reflector(Arc::new(catalog));
    match container.get("Storage") {
        Err(DiError::NotInstantiable(class)) => assert_eq!(class, "Storage"),
        other => panic!("expected NotInstantiable, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_unknown_class_still_not_found() {
    let container = Container::new().with_reflector(Arc::new(TypeCatalog::new()));
    match container.get("Mystery") {
        Err(DiError::NotFound(id)) => assert_eq!(id, "Mystery"),
        other => panic!("expected NotFound, got {:?}", other.map(|_| ())),
    }
    // A failed autowire attempt leaves nothing behind.
    assert!(!container.has("Mystery"));
}

#[test]
fn test_cycle_through_autowired_parameters() {
    struct A;
    struct B;

    let mut catalog = TypeCatalog::new();
    catalog.insert(
        ClassSpec::new("A", |_| Ok(A)).with_param(Param::typed("b", "B")),
    );
    catalog.insert(
        ClassSpec::new("B", |_| Ok(B)).with_param(Param::typed("a", "A")),
    );

    let container = Container::new().with_reflector(Arc::new(catalog));
    match container.get("A") {
        Err(DiError::CyclicDependency(path)) => assert_eq!(path, vec!["A", "B", "A"]),
        other => panic!("expected CyclicDependency, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_autowired_value_reaches_observers() {
    use std::sync::Mutex;

    let seen = Arc::new(Mutex::new(0));
    let seen_clone = seen.clone();

    let container = Container::new().with_reflector(Arc::new(catalog_with_scheduler()));
    container.observe(move |_, _| {
        *seen_clone.lock().unwrap() += 1;
    });

    container.get("Scheduler").unwrap();
    // Two resolutions: the Clock dependency and the Scheduler itself.
    assert_eq!(*seen.lock().unwrap(), 2);
}
