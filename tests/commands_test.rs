use pathgraph::graph::{EdgeId, GraphError, GraphStore, NodeRef, PropertyValue};
use pathgraph::query::{CommandOutput, QueryEngine, QueryError};
use pathgraph::EngineConfig;
use serde_json::json;

fn setup() -> (QueryEngine, GraphStore) {
    let engine = QueryEngine::new();
    let mut store = GraphStore::new();
    for command in [
        r#"CREATE NODE Person {id: 1, name: "Alice", age: 30}"#,
        r#"CREATE NODE Person {id: 2, name: "Bob", age: 25}"#,
        r#"CREATE NODE Company {id: 101, name: "Acme Inc."}"#,
        "CREATE RELATIONSHIP WORKS_AT FROM Person(id=1) TO Company(id=101) {since: 2018}",
        "CREATE RELATIONSHIP KNOWS FROM Person(id=1) TO Person(id=2)",
    ] {
        engine.execute(command, &mut store).unwrap();
    }
    (engine, store)
}

#[test]
fn test_create_node_assigns_identity() {
    let (engine, mut store) = setup();

    let output = engine.execute("CREATE NODE Person {name: 'Carol'}", &mut store).unwrap();
    assert_eq!(output, CommandOutput::NodeCreated(NodeRef::new("Person", 3)));

    let output = engine
        .execute("CREATE RELATIONSHIP KNOWS FROM Person(id=3) TO Person(id=1)", &mut store)
        .unwrap();
    assert_eq!(output, CommandOutput::RelationshipCreated { id: EdgeId::new(3) });
}

#[test]
fn test_get_node_record() {
    let (engine, mut store) = setup();
    let output = engine.execute("GET NODE Person 1", &mut store).unwrap();
    assert_eq!(
        output.records(),
        vec![json!({"id": 1, "type": "Person", "name": "Alice", "age": 30})]
    );
}

#[test]
fn test_get_neighbors_with_filters() {
    let (engine, mut store) = setup();

    let output = engine
        .execute("GET NEIGHBORS Person 1 WITH RELATIONSHIP KNOWS DIRECTION OUTGOING", &mut store)
        .unwrap();
    let records = output.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["node"]["name"], "Bob");
    assert_eq!(records[0]["relationship"]["type"], "KNOWS");

    let output = engine
        .execute("GET NEIGHBORS Company 101 DIRECTION INCOMING", &mut store)
        .unwrap();
    assert_eq!(output.records()[0]["node"]["id"], 1);
}

#[test]
fn test_traverse_command() {
    let (engine, mut store) = setup();

    let output = engine
        .execute("TRAVERSE Person(id=1) -[WORKS_AT]-> Company WHERE Person.age < 35", &mut store)
        .unwrap();
    let records = output.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["path"], json!(["Person:1", "WORKS_AT", "Company:101"]));

    let output = engine
        .execute("TRAVERSE Person(id=1) -[WORKS_AT]-> Company WHERE Person.age < 20", &mut store)
        .unwrap();
    assert!(output.records().is_empty());
}

#[test]
fn test_traverse_respects_configured_hop_limit() {
    let (_, mut store) = setup();
    let engine = QueryEngine::with_config(EngineConfig {
        max_hops: 1,
        ..EngineConfig::default()
    });

    let err = engine
        .execute(
            "TRAVERSE Person(id=1) -[KNOWS]-> Person -[WORKS_AT]-> Company",
            &mut store,
        )
        .unwrap_err();
    assert!(matches!(err, QueryError::Execution(_)));
}

#[test]
fn test_match_command() {
    let (engine, mut store) = setup();
    engine
        .execute(r#"CREATE NODE Person {id: 3, name: "Carol", age: 35}"#, &mut store)
        .unwrap();
    engine
        .execute("CREATE RELATIONSHIP KNOWS FROM Person(id=1) TO Person(id=3)", &mut store)
        .unwrap();

    let output = engine
        .execute("MATCH (a:Person)-[r:KNOWS]->(b:Person)", &mut store)
        .unwrap();
    let records = output.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["bindings"]["b"], "Person:2");
    assert_eq!(records[1]["bindings"]["b"], "Person:3");

    let output = engine
        .execute("MATCH (a:Person)-[r:KNOWS]->(b:Person) WHERE b.age >= 30 AND r.id == 6", &mut store)
        .unwrap();
    assert!(output.records().is_empty());
}

#[test]
fn test_update_commands() {
    let (engine, mut store) = setup();

    engine
        .execute("UPDATE NODE Person 2 {age: 26, city: 'Paris'}", &mut store)
        .unwrap();
    let bob = store.get_node(&NodeRef::new("Person", 2)).unwrap();
    assert_eq!(bob.get_property("age"), Some(&PropertyValue::Integer(26)));
    assert_eq!(bob.get_property("city"), Some(&PropertyValue::from("Paris")));

    let output = engine
        .execute(
            "UPDATE RELATIONSHIP WORKS_AT FROM Person(id=1) TO Company(id=101) {role: 'Engineer'}",
            &mut store,
        )
        .unwrap();
    assert_eq!(output, CommandOutput::RelationshipUpdated { id: EdgeId::new(1) });
    assert_eq!(
        store.get_relationship(EdgeId::new(1)).unwrap().get_property("role"),
        Some(&PropertyValue::from("Engineer"))
    );

    let err = engine
        .execute(
            "UPDATE RELATIONSHIP WORKS_AT FROM Person(id=2) TO Company(id=101) {role: 'Intern'}",
            &mut store,
        )
        .unwrap_err();
    assert!(matches!(
        err.graph_error(),
        Some(GraphError::RelationshipNotFound { .. })
    ));
}

#[test]
fn test_delete_commands() {
    let (engine, mut store) = setup();

    let output = engine.execute("DELETE RELATIONSHIP 2", &mut store).unwrap();
    assert_eq!(output, CommandOutput::RelationshipDeleted { id: EdgeId::new(2) });

    let output = engine.execute("DELETE NODE Person 1", &mut store).unwrap();
    assert_eq!(
        output,
        CommandOutput::NodeDeleted {
            node: NodeRef::new("Person", 1),
            relationships_removed: 1,
        }
    );
    assert_eq!(store.relationship_count(), 0);

    let err = engine.execute("DELETE NODE Person 1", &mut store).unwrap_err();
    assert!(err.graph_error().is_some_and(GraphError::is_not_found));

    let err = engine.execute("DELETE RELATIONSHIP 2", &mut store).unwrap_err();
    assert!(err.graph_error().is_some_and(GraphError::is_not_found));
}

#[test]
fn test_rejected_commands_leave_store_unchanged() {
    let (engine, mut store) = setup();

    let err = engine
        .execute(r#"CREATE NODE Person {id: 1, name: "Mallory"}"#, &mut store)
        .unwrap_err();
    assert_eq!(
        err.graph_error(),
        Some(&GraphError::DuplicateIdentity(NodeRef::new("Person", 1)))
    );

    let err = engine.execute("CREATE NODE Person {id: -4}", &mut store).unwrap_err();
    assert!(matches!(err.graph_error(), Some(GraphError::InvalidProperty { .. })));

    let err = engine
        .execute("CREATE RELATIONSHIP KNOWS FROM Person(id=1) TO Person(id=9)", &mut store)
        .unwrap_err();
    assert!(err.graph_error().is_some_and(GraphError::is_not_found));

    assert_eq!(store.node_count(), 3);
    assert_eq!(store.relationship_count(), 2);
}

#[test]
fn test_parse_failures() {
    let (engine, mut store) = setup();

    for input in [
        "",
        "CREATE EDGE Person",
        "GET NODE Person abc",
        "MATCH (a:Person)-[r:KNOWS]->",
        "CREATE NODE Person {name: 'Al', name: 'Bo'}",
        "TRAVERSE Person(id=1) WHERE Person.age < 3",
    ] {
        let err = engine.execute(input, &mut store).unwrap_err();
        assert!(matches!(err, QueryError::Parse(_)), "accepted {:?}", input);
    }
}

#[test]
fn test_invalid_pattern_surfaces_as_execution_error() {
    let (engine, mut store) = setup();
    let err = engine
        .execute("MATCH (a:Person)-[r:KNOWS]->(b:Person) WHERE c.age > 1", &mut store)
        .unwrap_err();
    assert!(matches!(
        err,
        QueryError::Execution(pathgraph::ExecutionError::InvalidPattern(_))
    ));
}

#[test]
fn test_status_outputs_serialize() {
    let (engine, mut store) = setup();
    let output = engine.execute("DELETE RELATIONSHIP 1", &mut store).unwrap();
    assert_eq!(output.records(), vec![json!({"relationship_deleted": {"id": 1}})]);
    assert_eq!(output.summary(), "Deleted relationship 1");
}
