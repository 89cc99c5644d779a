// src/pool/pending.rs

//! Completion tracking for the plans of one pool.

use tokio::sync::watch;

/// How a wait on [`PendingPlans`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drained {
    /// Every plan finished.
    Completed,
    /// A worker hit a fatal fault; remaining plans will never finish.
    Faulted,
}

#[derive(Debug, Clone, Copy)]
struct Progress {
    remaining: usize,
    faulted: bool,
}

/// A countdown of unfinished plans that async callers can wait on.
#[derive(Debug)]
pub struct PendingPlans {
    tx: watch::Sender<Progress>,
}

impl PendingPlans {
    pub fn new(count: usize) -> Self {
        let (tx, _rx) = watch::channel(Progress {
            remaining: count,
            faulted: false,
        });
        Self { tx }
    }

    /// Mark one plan as finished.
    pub fn done(&self) {
        self.tx
            .send_modify(|p| p.remaining = p.remaining.saturating_sub(1));
    }

    /// Wake every waiter with [`Drained::Faulted`].
    pub fn fault(&self) {
        self.tx.send_modify(|p| p.faulted = true);
    }

    pub fn remaining(&self) -> usize {
        self.tx.borrow().remaining
    }

    /// Wait until every plan has finished or a fault was reported.
    pub async fn wait(&self) -> Drained {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so the channel cannot close
        // while we wait.
        let faulted = match rx.wait_for(|p| p.remaining == 0 || p.faulted).await {
            Ok(progress) => progress.faulted,
            Err(_) => true,
        };

        if faulted {
            Drained::Faulted
        } else {
            Drained::Completed
        }
    }
}
