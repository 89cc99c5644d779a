// tests/pool_lifecycle.rs

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use passpool::pool::{ExecPool, PoolState};
use passpool_test_utils::recording::{ActionGraphBuilder, Event};
use passpool_test_utils::{init_tracing, with_timeout};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn shared_dependency_runs_exactly_once() {
    init_tracing();

    let graph = ActionGraphBuilder::new()
        .action("S", &[])
        .action("R1", &["S"])
        .action("R2", &["S"])
        .build();

    let pool = ExecPool::new(2, &graph.roots(&["R1", "R2"]));
    pool.start();
    with_timeout(pool.dispose_and_wait()).await;

    assert_eq!(graph.log().runs_of("S"), 1);
    assert_eq!(graph.log().runs_of("R1"), 1);
    assert_eq!(graph.log().runs_of("R2"), 1);
    assert_eq!(pool.registry().claimed_count(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn overlapping_roots_execute_every_action_once() {
    init_tracing();

    let graph = ActionGraphBuilder::new()
        .action("parse", &[])
        .action("cfg", &["parse"])
        .action("ssa", &["cfg", "parse"])
        .action("nilness", &["ssa"])
        .action("unused", &["ssa", "cfg"])
        .action("printf", &["parse"])
        .build();

    let roots = graph.roots(&["nilness", "unused", "printf", "ssa"]);
    let pool = ExecPool::new(3, &roots);
    pool.start();
    with_timeout(pool.dispose_and_wait()).await;

    for name in ["parse", "cfg", "ssa", "nilness", "unused", "printf"] {
        assert_eq!(graph.log().runs_of(name), 1, "{name} should run exactly once");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn start_twice_spawns_workers_once() {
    init_tracing();

    let delay = Duration::from_millis(40);
    let graph = ActionGraphBuilder::new()
        .slow("a", &[], delay)
        .slow("b", &[], delay)
        .slow("c", &[], delay)
        .slow("d", &[], delay)
        .build();

    let pool = ExecPool::new(2, &graph.roots(&["a", "b", "c", "d"]));
    pool.start();
    pool.start();
    assert_eq!(pool.spawned_workers(), 2);

    with_timeout(pool.dispose_and_wait()).await;

    assert!(graph.log().max_in_flight() <= 2);
    assert_eq!(graph.log().started().len(), 4);
}

#[tokio::test]
async fn dispose_twice_returns_immediately() {
    init_tracing();

    let graph = ActionGraphBuilder::new().action("only", &[]).build();
    let pool = ExecPool::new(1, &graph.roots(&["only"]));

    pool.start();
    with_timeout(pool.dispose_and_wait()).await;
    assert_eq!(pool.state(), PoolState::Disposed);

    timeout(Duration::from_millis(200), pool.dispose_and_wait())
        .await
        .expect("second dispose should not wait");
    assert_eq!(pool.state(), PoolState::Disposed);
    assert_eq!(graph.log().runs_of("only"), 1);
}

#[tokio::test]
async fn lifecycle_states_advance_in_order() {
    init_tracing();

    let graph = ActionGraphBuilder::new().action("only", &[]).build();
    let pool = ExecPool::new(1, &graph.roots(&["only"]));
    assert_eq!(pool.state(), PoolState::Created);
    assert_eq!(pool.pending(), 1);
    assert_eq!(pool.spawned_workers(), 0);

    pool.start();
    assert_eq!(pool.state(), PoolState::Running);

    with_timeout(pool.dispose_and_wait()).await;
    assert_eq!(pool.state(), PoolState::Disposed);
    assert_eq!(pool.pending(), 0);

    // Not reusable: a late start is a no-op.
    pool.start();
    assert_eq!(pool.state(), PoolState::Disposed);
}

#[tokio::test]
async fn empty_pool_drains_without_blocking() {
    init_tracing();

    let pool = ExecPool::new(3, &[]);
    assert_eq!(pool.plan_count(), 0);

    pool.start();
    timeout(Duration::from_millis(500), pool.dispose_and_wait())
        .await
        .expect("empty pool should drain immediately");
    assert_eq!(pool.state(), PoolState::Disposed);
}

#[tokio::test]
async fn empty_pool_drains_even_without_start() {
    let pool = ExecPool::new(1, &[]);

    timeout(Duration::from_millis(500), pool.dispose_and_wait())
        .await
        .expect("empty pool should drain without workers");
}

#[tokio::test]
async fn zero_workers_never_drain() {
    init_tracing();

    let graph = ActionGraphBuilder::new().action("stuck", &[]).build();
    let pool = ExecPool::new(0, &graph.roots(&["stuck"]));
    pool.start();

    let res = timeout(Duration::from_millis(100), pool.dispose_and_wait()).await;
    assert!(res.is_err(), "a pool without workers cannot make progress");
    assert_eq!(graph.log().runs_of("stuck"), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn single_worker_takes_plans_in_queue_order() {
    init_tracing();

    let graph = ActionGraphBuilder::new()
        .action("first", &[])
        .action("second", &[])
        .action("third", &[])
        .build();

    let pool = ExecPool::new(1, &graph.roots(&["first", "second", "third"]));
    pool.start();
    with_timeout(pool.dispose_and_wait()).await;

    assert_eq!(graph.log().started(), vec!["first", "second", "third"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn dependent_can_start_before_shared_dependency_finishes() {
    init_tracing();

    // Plan 1 is just `S`, which is slow. Plan 2 reaches `S` only after
    // spending ~100ms on `W`, finds it claimed, and carries on to `A`
    // while `S` is still executing. Claims guard initiation, not completion.
    let graph = ActionGraphBuilder::new()
        .slow("S", &[], Duration::from_millis(400))
        .slow("W", &[], Duration::from_millis(100))
        .action("B", &["W"])
        .action("A", &["S", "B"])
        .build();

    let pool = ExecPool::new(2, &graph.roots(&["S", "A"]));
    pool.start();
    with_timeout(pool.dispose_and_wait()).await;

    let log = graph.log();
    assert_eq!(log.runs_of("S"), 1);
    assert_eq!(log.runs_of("A"), 1);

    let a_started = log.position_of(&Event::Started("A".to_string())).unwrap();
    let s_finished = log.position_of(&Event::Finished("S".to_string())).unwrap();
    assert!(a_started < s_finished);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[should_panic(expected = "pass exploded")]
async fn panicking_pass_escapes_dispose() {
    init_tracing();

    let graph = ActionGraphBuilder::new()
        .panicking("boom", &[], "pass exploded")
        .action("top", &["boom"])
        .build();

    let pool = ExecPool::new(1, &graph.roots(&["top"]));
    pool.start();
    with_timeout(pool.dispose_and_wait()).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn panic_stops_other_plans_before_dispose_returns() {
    init_tracing();

    // One plan panics right away; the other is a slow three-step chain.
    // The chain may finish the step it is on, but nothing after it.
    let step = Duration::from_millis(150);
    let graph = ActionGraphBuilder::new()
        .panicking("boom", &[], "pass exploded")
        .action("after_boom", &["boom"])
        .slow("s1", &[], step)
        .slow("s2", &["s1"], step)
        .slow("s3", &["s2"], step)
        .build();

    let pool = Arc::new(ExecPool::new(2, &graph.roots(&["after_boom", "s3"])));
    pool.start();

    let disposing = Arc::clone(&pool);
    let outcome =
        with_timeout(tokio::spawn(async move { disposing.dispose_and_wait().await })).await;
    let err = outcome.expect_err("panic should escape dispose_and_wait");
    assert!(err.is_panic());
    assert_eq!(pool.state(), PoolState::Disposed);
    assert!(pool.registry().is_halted());

    let at_dispose = graph.log().started();
    tokio::time::sleep(Duration::from_millis(500)).await;
    let later = graph.log().started();

    assert_eq!(later, at_dispose, "passes started after the pool was disposed");
    for name in ["after_boom", "s2", "s3"] {
        assert_eq!(graph.log().runs_of(name), 0, "{name} should never start");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn dispose_after_fault_returns_without_redraining() {
    init_tracing();

    let graph = ActionGraphBuilder::new()
        .panicking("boom", &[], "pass exploded")
        .build();

    let pool = Arc::new(ExecPool::new(1, &graph.roots(&["boom"])));
    pool.start();

    let disposing = Arc::clone(&pool);
    let first = with_timeout(tokio::spawn(async move { disposing.dispose_and_wait().await })).await;
    assert!(first.expect_err("first dispose should unwind").is_panic());
    assert_eq!(pool.state(), PoolState::Disposed);

    timeout(Duration::from_millis(200), pool.dispose_and_wait())
        .await
        .expect("second dispose should not wait");
    assert_eq!(pool.state(), PoolState::Disposed);
    assert_eq!(graph.log().runs_of("boom"), 1);
}
