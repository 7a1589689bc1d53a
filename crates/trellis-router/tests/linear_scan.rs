//! Regression guard for the linear-scan lookup: a miss has to visit every
//! route, so its cost grows with the table.

use std::hint::black_box;
use std::time::{Duration, Instant};

use serde_json::json;

use trellis_router::{FnHandler, Response, RouteTable};

fn table_with(n: usize) -> RouteTable {
    let mut table = RouteTable::new();
    let handler = FnHandler::arc("scan", |_| Ok(Response::ok(json!(null))));
    for i in 0..n {
        table
            .add("GET", &format!(r"/@/plugin{i}/items/(\d+)"), handler.clone())
            .unwrap();
    }
    table
}

/// Best of several runs of `lookups` misses.
fn miss_cost(table: &RouteTable, lookups: usize) -> Duration {
    (0..5)
        .map(|_| {
            let start = Instant::now();
            for _ in 0..lookups {
                assert!(table.resolve("GET", black_box("/@/nowhere/items/1")).is_none());
            }
            start.elapsed()
        })
        .min()
        .unwrap()
}

#[test]
fn test_miss_cost_grows_with_route_count() {
    let sizes = [20usize, 200, 2_000];
    let costs: Vec<Duration> = sizes
        .iter()
        .map(|&n| miss_cost(&table_with(n), 200))
        .collect();

    for pair in costs.windows(2) {
        assert!(
            pair[1] >= pair[0],
            "miss cost should not shrink as routes grow: {costs:?}"
        );
    }
}

#[test]
fn test_late_registration_still_found() {
    let table = table_with(500);
    let found = table.resolve("GET", "/@/plugin499/items/3").unwrap();
    assert_eq!(found.params, vec!["3"]);
    assert_eq!(found.route.id.as_u64(), 499);
}
