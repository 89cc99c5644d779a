#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use passpool::dag::{Action, ActionRef};

/// Something a [`RecordingAction`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Started(String),
    Finished(String),
}

/// Shared, ordered record of every action execution in a test graph.
#[derive(Debug, Default)]
pub struct ExecLog {
    events: Mutex<Vec<Event>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ExecLog {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    /// Names of actions in the order they started executing.
    pub fn started(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Started(name) => Some(name),
                Event::Finished(_) => None,
            })
            .collect()
    }

    /// How many times `name` started executing.
    pub fn runs_of(&self, name: &str) -> usize {
        self.started().iter().filter(|n| n.as_str() == name).count()
    }

    pub fn position_of(&self, event: &Event) -> Option<usize> {
        self.events().iter().position(|e| e == event)
    }

    /// Highest number of actions that were executing at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

/// Test action that records start/finish into an [`ExecLog`].
pub struct RecordingAction {
    name: String,
    deps: Vec<ActionRef>,
    log: Arc<ExecLog>,
    delay: Option<Duration>,
    panic_message: Option<String>,
}

impl Action for RecordingAction {
    fn name(&self) -> &str {
        &self.name
    }

    fn deps(&self) -> &[ActionRef] {
        &self.deps
    }

    fn exec(&self) {
        let now = self.log.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.log.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.log.push(Event::Started(self.name.clone()));

        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        if let Some(msg) = &self.panic_message {
            self.log.in_flight.fetch_sub(1, Ordering::SeqCst);
            panic!("{msg}");
        }

        self.log.push(Event::Finished(self.name.clone()));
        self.log.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

struct Declared {
    name: String,
    deps: Vec<String>,
    delay: Option<Duration>,
    panic_message: Option<String>,
}

/// Builder for a graph of [`RecordingAction`]s.
///
/// Dependencies must be declared before the actions that use them.
#[derive(Default)]
pub struct ActionGraphBuilder {
    declared: Vec<Declared>,
}

impl ActionGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn action(self, name: &str, deps: &[&str]) -> Self {
        self.push(name, deps, None, None)
    }

    /// An action that sleeps for `delay` while executing.
    pub fn slow(self, name: &str, deps: &[&str], delay: Duration) -> Self {
        self.push(name, deps, Some(delay), None)
    }

    /// An action that panics with `msg` when executed.
    pub fn panicking(self, name: &str, deps: &[&str], msg: &str) -> Self {
        self.push(name, deps, None, Some(msg.to_string()))
    }

    fn push(
        mut self,
        name: &str,
        deps: &[&str],
        delay: Option<Duration>,
        panic_message: Option<String>,
    ) -> Self {
        self.declared.push(Declared {
            name: name.to_string(),
            deps: deps.iter().map(|d| d.to_string()).collect(),
            delay,
            panic_message,
        });
        self
    }

    pub fn build(self) -> TestGraph {
        let log = Arc::new(ExecLog::default());
        let mut actions: HashMap<String, ActionRef> = HashMap::new();

        for decl in self.declared {
            let deps = decl
                .deps
                .iter()
                .map(|d| {
                    let dep = actions
                        .get(d)
                        .unwrap_or_else(|| panic!("dependency '{d}' declared after '{}'", decl.name));
                    Arc::clone(dep)
                })
                .collect();

            let action: ActionRef = Arc::new(RecordingAction {
                name: decl.name.clone(),
                deps,
                log: Arc::clone(&log),
                delay: decl.delay,
                panic_message: decl.panic_message,
            });
            actions.insert(decl.name, action);
        }

        TestGraph { actions, log }
    }
}

/// Actions built by [`ActionGraphBuilder`], plus their shared log.
pub struct TestGraph {
    actions: HashMap<String, ActionRef>,
    log: Arc<ExecLog>,
}

impl TestGraph {
    pub fn get(&self, name: &str) -> ActionRef {
        Arc::clone(
            self.actions
                .get(name)
                .unwrap_or_else(|| panic!("unknown action '{name}'")),
        )
    }

    pub fn roots(&self, names: &[&str]) -> Vec<ActionRef> {
        names.iter().map(|n| self.get(n)).collect()
    }

    pub fn log(&self) -> &ExecLog {
        &self.log
    }
}
