use canister::{Container, Definition, DiError};

fn assert_cycle(result: canister::DiResult<canister::AnyValue>, expected_path: &[&str]) {
    match result {
        Err(DiError::CyclicDependency(path)) => assert_eq!(path, expected_path, "wrong cycle path"),
        Err(other) => panic!("expected CyclicDependency, got {}", other),
        Ok(_) => panic!("expected CyclicDependency, resolution succeeded"),
    }
}

#[test]
fn test_self_cycle() {
    let container = Container::new();
    container
        .add("a", Definition::erased(|c: &Container| c.get("a")))
        .unwrap();

    assert_cycle(container.get("a"), &["a", "a"]);
}

#[test]
fn test_two_level_cycle() {
    let container = Container::new();
    container
        .add("a", Definition::erased(|c: &Container| c.get("b")))
        .unwrap();
    container
        .add("b", Definition::erased(|c: &Container| c.get("a")))
        .unwrap();

    assert_cycle(container.get("a"), &["a", "b", "a"]);
    // The mark is popped on the error path, so the mirror cycle still reports.
    assert_cycle(container.get("b"), &["b", "a", "b"]);
}

#[test]
fn test_three_level_cycle_path() {
    let container = Container::new();
    container
        .add("x", Definition::erased(|c: &Container| c.get("y")))
        .unwrap();
    container
        .add("y", Definition::erased(|c: &Container| c.get("z")))
        .unwrap();
    container
        .add("z", Definition::erased(|c: &Container| c.get("x")))
        .unwrap();

    assert_cycle(container.get("x"), &["x", "y", "z", "x"]);
}

#[test]
fn test_diamond_is_not_a_cycle() {
    struct Leaf;
    struct Left(std::sync::Arc<Leaf>);
    struct Right(std::sync::Arc<Leaf>);
    struct Root {
        left: std::sync::Arc<Left>,
        right: std::sync::Arc<Right>,
    }

    let container = Container::new();
    container
        .add("leaf", Definition::new(|_: &Container| Ok(Leaf)))
        .unwrap();
    container
        .add(
            "left",
            Definition::new(|c: &Container| Ok(Left(c.get_as::<Leaf>("leaf")?))),
        )
        .unwrap();
    container
        .add(
            "right",
            Definition::new(|c: &Container| Ok(Right(c.get_as::<Leaf>("leaf")?))),
        )
        .unwrap();
    container
        .add(
            "root",
            Definition::new(|c: &Container| {
                Ok(Root {
                    left: c.get_as::<Left>("left")?,
                    right: c.get_as::<Right>("right")?,
                })
            }),
        )
        .unwrap();

    // Two paths to the same leaf: sharing, not a cycle.
    let root = container.get_as::<Root>("root").unwrap();
    assert!(std::sync::Arc::ptr_eq(&root.left.0, &root.right.0));
}

#[test]
fn test_cycle_detection_does_not_poison_later_calls() {
    let container = Container::new();
    container
        .add("a", Definition::erased(|c: &Container| c.get("a")))
        .unwrap();
    container
        .add("ok", Definition::new(|_: &Container| Ok(1u8)))
        .unwrap();

    assert!(container.get("a").is_err());
    assert!(container.get("a").is_err()); // still a cycle, not NotFound or worse
    assert_eq!(*container.get_as::<u8>("ok").unwrap(), 1);
}

#[test]
fn test_failed_lookup_inside_definition_propagates() {
    let container = Container::new();
    container
        .add("outer", Definition::erased(|c: &Container| c.get("inner")))
        .unwrap();

    match container.get("outer") {
        Err(DiError::NotFound(id)) => assert_eq!(id, "inner"),
        other => panic!("expected NotFound, got {:?}", other.map(|_| ())),
    }

    // The failure left "outer" unresolved; registering the dependency fixes it.
    container.add("inner", canister::Entry::value(3u8)).unwrap();
    assert_eq!(*container.get_as::<u8>("outer").unwrap(), 3);
}
