use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use pathgraph::graph::{properties, Direction, GraphStore, Label, NodeRef, PropertyMap, PropertyValue};
use pathgraph::persistence::json::{from_json_str, to_json_string};
use pathgraph::query::{match_pattern, parse_command, traverse_steps, Command, Condition, TraversalStep};

fn person_store(size: u64) -> GraphStore {
    let mut store = GraphStore::new();
    for i in 0..size {
        store
            .create_node(
                "Person",
                Some(i.into()),
                properties([
                    ("name", PropertyValue::from(format!("Person{}", i))),
                    ("age", PropertyValue::Integer((i % 100) as i64)),
                ]),
            )
            .unwrap();
    }
    store
}

/// Chain `Person:0 -> Person:1 -> ... -> Person:{size-1}` over KNOWS
fn chain_store(size: u64) -> GraphStore {
    let mut store = person_store(size);
    for i in 1..size {
        store
            .create_relationship(
                "KNOWS",
                &NodeRef::new("Person", i - 1),
                &NodeRef::new("Person", i),
                PropertyMap::new(),
            )
            .unwrap();
    }
    store
}

/// Benchmark node insertion throughput
fn bench_node_insertion(c: &mut Criterion) {
    let mut group = c.benchmark_group("node_insertion");

    for size in [100u64, 1000, 10_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| criterion::black_box(person_store(size).node_count()));
        });
    }
    group.finish();
}

/// Benchmark label scan performance
fn bench_label_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("label_scan");

    for size in [100u64, 1000, 10_000].iter() {
        let mut store = person_store(*size);
        // Noise nodes under another tag
        for i in 0..(*size / 2) {
            store
                .create_node("Company", Some(i.into()), properties([("name", format!("Company{}", i))]))
                .unwrap();
        }

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let nodes = store.get_nodes_by_label(&Label::new("Person"));
                criterion::black_box(nodes.len());
            });
        });
    }
    group.finish();
}

/// Benchmark multi-hop traversal latency along a chain
fn bench_traversal(c: &mut Criterion) {
    let mut group = c.benchmark_group("traversal");
    let store = chain_store(100);
    let start = NodeRef::new("Person", 0);

    for hops in [1usize, 4, 16].iter() {
        let steps = vec![TraversalStep::any("KNOWS", Direction::Outgoing); *hops];
        group.bench_with_input(BenchmarkId::from_parameter(hops), hops, |b, &hops| {
            b.iter(|| {
                let paths = traverse_steps(&store, &start, &steps, &Condition::True, hops).unwrap();
                criterion::black_box(paths.len());
            });
        });
    }
    group.finish();
}

/// Benchmark pattern matching with and without a filter
fn bench_match(c: &mut Criterion) {
    let mut group = c.benchmark_group("match");
    let store = chain_store(1000);

    let cases = [
        ("1_hop", "MATCH (a:Person)-[:KNOWS]->(b:Person)"),
        ("2_hop", "MATCH (a:Person)-[:KNOWS]->(b:Person)-[:KNOWS]->(c:Person)"),
        ("filtered", "MATCH (a:Person)-[:KNOWS]->(b:Person) WHERE a.age > 20 AND b.age < 40"),
    ];
    for (name, text) in cases {
        let Ok(Command::Match { template, condition }) = parse_command(text) else {
            panic!("not a MATCH command: {}", text);
        };
        group.bench_function(name, |b| {
            b.iter(|| {
                let bindings = match_pattern(&store, &template, &condition).unwrap();
                criterion::black_box(bindings.len());
            });
        });
    }
    group.finish();
}

/// Benchmark command parse time
fn bench_command_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("command_parse");

    group.bench_function("create_node", |b| {
        b.iter(|| {
            criterion::black_box(
                parse_command(r#"CREATE NODE Person {id: 1, name: "Alice", age: 30, tags: ["a", "b"]}"#).unwrap(),
            )
        });
    });

    group.bench_function("match_where", |b| {
        b.iter(|| {
            criterion::black_box(
                parse_command(
                    "MATCH (a:Person)-[r:KNOWS]->(b:Person)<-[:WORKS_AT]-(c:Company) \
                     WHERE a.age > 30 AND (b.name = 'Bob' OR r.since < 2015)",
                )
                .unwrap(),
            )
        });
    });

    group.finish();
}

/// Benchmark whole-graph JSON serialization
fn bench_json(c: &mut Criterion) {
    let mut group = c.benchmark_group("json");
    let store = chain_store(1000);
    let text = to_json_string(&store, false).unwrap();

    group.bench_function("serialize", |b| {
        b.iter(|| criterion::black_box(to_json_string(&store, false).unwrap().len()));
    });
    group.bench_function("deserialize", |b| {
        b.iter(|| criterion::black_box(from_json_str(&text).unwrap().node_count()));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_node_insertion,
    bench_label_scan,
    bench_traversal,
    bench_match,
    bench_command_parse,
    bench_json
);
criterion_main!(benches);
