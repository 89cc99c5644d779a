// src/pool/executor.rs

//! The pass pool itself.

use std::fmt;
use std::panic;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Once, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OnceCell, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::dag::{Action, ActionRef, ExecutionRegistry, Plan};
use crate::pool::PoolState;
use crate::pool::pending::{Drained, PendingPlans};

/// State shared between the pool handle and its workers.
struct Shared {
    queue_rx: AsyncMutex<mpsc::Receiver<Plan>>,
    pending: PendingPlans,
    registry: Arc<ExecutionRegistry>,
}

/// Runs one [`Plan`] per root across a fixed number of workers.
///
/// All plans share one [`ExecutionRegistry`], so an action reachable from
/// several roots executes once for the whole pool. Both lifecycle
/// operations are idempotent; the pool cannot be restarted once disposed.
///
/// A panic inside a pass is not contained. It halts the registry, so every
/// other plan stops before its next claim, and once the in-flight passes
/// have returned it resumes unwinding out of [`ExecPool::dispose_and_wait`].
pub struct ExecPool {
    workers: usize,
    plans: usize,
    registry: Arc<ExecutionRegistry>,
    /// `None` once the queue has been closed.
    queue_tx: Mutex<Option<mpsc::Sender<Plan>>>,
    shared: Arc<Shared>,
    init: Once,
    done: OnceCell<()>,
    tasks: Mutex<JoinSet<()>>,
    spawned: AtomicUsize,
    state: Mutex<PoolState>,
}

impl fmt::Debug for ExecPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecPool")
            .field("workers", &self.workers)
            .field("plans", &self.plans)
            .field("state", &self.state())
            .field("pending", &self.pending())
            .finish_non_exhaustive()
    }
}

impl ExecPool {
    /// Build one plan per root and queue them all.
    ///
    /// The queue holds exactly `roots.len()` plans, so queuing never waits.
    /// With `workers == 0` and at least one root, `dispose_and_wait` never
    /// returns.
    pub fn new(workers: usize, roots: &[ActionRef]) -> Self {
        let registry = Arc::new(ExecutionRegistry::new());
        let (queue_tx, queue_rx) = mpsc::channel(roots.len().max(1));

        debug!(
            workers,
            roots = roots.len(),
            "creating pass pool"
        );
        if workers == 0 && !roots.is_empty() {
            warn!(
                roots = roots.len(),
                "pass pool has no workers; draining it will never finish"
            );
        }

        let mut plans = 0;
        for root in roots {
            let plan = Plan::build(root, Arc::clone(&registry));
            debug!(
                root = %root.name(),
                max_depth = plan.max_depth(),
                entries = plan.len(),
                "built plan"
            );

            match queue_tx.try_send(plan) {
                Ok(()) => plans += 1,
                Err(err) => {
                    error!(root = %root.name(), error = %err, "failed to queue plan; dropping it");
                }
            }
        }

        let shared = Arc::new(Shared {
            queue_rx: AsyncMutex::new(queue_rx),
            pending: PendingPlans::new(plans),
            registry: Arc::clone(&registry),
        });

        Self {
            workers,
            plans,
            registry,
            queue_tx: Mutex::new(Some(queue_tx)),
            shared,
            init: Once::new(),
            done: OnceCell::new(),
            tasks: Mutex::new(JoinSet::new()),
            spawned: AtomicUsize::new(0),
            state: Mutex::new(PoolState::Created),
        }
    }

    /// Spawn the workers. Only the first call has an effect.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) {
        self.init.call_once(|| {
            if lock(&self.queue_tx).is_none() {
                debug!("pass pool already disposed; not spawning workers");
                return;
            }

            let mut tasks = lock(&self.tasks);
            for id in 0..self.workers {
                tasks.spawn(worker_loop(id, Arc::clone(&self.shared)));
            }
            self.spawned.store(self.workers, Ordering::SeqCst);

            {
                let mut state = lock(&self.state);
                if *state == PoolState::Created {
                    *state = PoolState::Running;
                }
            }

            info!(
                workers = self.workers,
                plans = self.plans,
                "pass pool started"
            );
        });
    }

    /// Wait for every plan to finish, then close the queue and join the
    /// workers. Only the first call waits; later calls return immediately.
    pub async fn dispose_and_wait(&self) {
        self.done.get_or_init(|| self.drain()).await;
    }

    pub fn state(&self) -> PoolState {
        *lock(&self.state)
    }

    /// Configured worker count.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Number of workers actually spawned (0 before `start`).
    pub fn spawned_workers(&self) -> usize {
        self.spawned.load(Ordering::SeqCst)
    }

    /// Number of plans queued at construction.
    pub fn plan_count(&self) -> usize {
        self.plans
    }

    /// Plans not yet completed.
    pub fn pending(&self) -> usize {
        self.shared.pending.remaining()
    }

    pub fn registry(&self) -> &Arc<ExecutionRegistry> {
        &self.registry
    }

    async fn drain(&self) {
        // A faulted drain unwinds before the `OnceCell` is filled, so a
        // later call lands here again.
        if self.state() == PoolState::Disposed {
            debug!("pass pool already disposed");
            return;
        }
        self.set_state(PoolState::Draining);

        if self.shared.pending.wait().await == Drained::Faulted {
            warn!(
                remaining = self.pending(),
                "pass panicked; waiting for in-flight passes before unwinding"
            );
        }

        // Closing the queue lets idle workers fall out of `recv`.
        drop(lock(&self.queue_tx).take());
        let mut tasks = std::mem::take(&mut *lock(&self.tasks));

        let mut fault = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Err(err) if err.is_panic() => {
                    if fault.is_none() {
                        fault = Some(err.into_panic());
                    }
                }
                Err(err) => debug!(error = %err, "worker ended without finishing"),
                Ok(()) => {}
            }
        }

        self.set_state(PoolState::Disposed);

        if let Some(payload) = fault {
            error!(
                plans = self.plans,
                executed = self.registry.claimed_count(),
                "pass pool aborted by a panicking pass"
            );
            panic::resume_unwind(payload);
        }

        info!(
            plans = self.plans,
            executed = self.registry.claimed_count(),
            "pass pool disposed"
        );
    }

    fn set_state(&self, next: PoolState) {
        let mut state = lock(&self.state);
        debug!(from = ?*state, to = ?next, "pass pool state change");
        *state = next;
    }
}

/// Pull plans until the queue is closed and empty, or the registry halts.
async fn worker_loop(id: usize, shared: Arc<Shared>) {
    debug!(worker = id, "worker started");

    loop {
        let next = shared.queue_rx.lock().await.recv().await;
        let Some(plan) = next else {
            break;
        };

        if shared.registry.is_halted() {
            debug!(worker = id, "registry halted; dropping queued plans");
            return;
        }

        let root = plan.root().name().to_string();
        debug!(
            worker = id,
            root = %root,
            max_depth = plan.max_depth(),
            "worker picked up plan"
        );

        // Pass routines are synchronous; keep them off the async workers.
        match tokio::task::spawn_blocking(move || plan.run()).await {
            Ok(()) => {
                shared.pending.done();
                debug!(
                    worker = id,
                    root = %root,
                    remaining = shared.pending.remaining(),
                    "plan finished"
                );
            }
            Err(err) if err.is_panic() => {
                error!(worker = id, root = %root, "pass panicked; halting pool");
                shared.registry.halt();
                shared.pending.fault();
                panic::resume_unwind(err.into_panic());
            }
            Err(err) => {
                warn!(worker = id, root = %root, error = %err, "plan task cancelled");
                return;
            }
        }
    }

    debug!(worker = id, "worker exiting (queue closed)");
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
