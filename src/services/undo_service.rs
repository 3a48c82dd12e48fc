use std::sync::Arc;
use std::time::Duration;

use tokio::task::AbortHandle;
use tokio::time::Instant;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDeletion {
    pub activity: String,
    pub email: String,
    pub created_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoPhase {
    Empty,
    Offered,
    Restoring,
}

/// Called with the offer generation when the undo window elapses.
pub type ExpiryCallback = Arc<dyn Fn(u64) + Send + Sync>;

/// Countdown for the current offer. Dropping it cancels the countdown.
#[derive(Debug)]
struct Countdown {
    generation: u64,
    handle: AbortHandle,
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[derive(Debug)]
enum Slot {
    Empty,
    Offered {
        deletion: PendingDeletion,
        // `None` after a failed restore: the deletion stays undoable but never expires.
        countdown: Option<Countdown>,
    },
    Restoring {
        deletion: PendingDeletion,
    },
}

/// Owns the single undoable removal and its countdown.
pub struct UndoController {
    slot: Slot,
    generation: u64,
    window: Duration,
    on_expire: ExpiryCallback,
}

impl UndoController {
    pub fn new(window: Duration, on_expire: ExpiryCallback) -> Self {
        Self {
            slot: Slot::Empty,
            generation: 0,
            window,
            on_expire,
        }
    }

    pub fn phase(&self) -> UndoPhase {
        phase_of(&self.slot)
    }

    /// The deletion that can currently be undone.
    pub fn pending(&self) -> Option<&PendingDeletion> {
        match &self.slot {
            Slot::Offered { deletion, .. } => Some(deletion),
            _ => None,
        }
    }

    pub fn has_countdown(&self) -> bool {
        matches!(
            self.slot,
            Slot::Offered {
                countdown: Some(_),
                ..
            }
        )
    }

    /// Makes `(activity, email)` the one undoable removal and restarts the
    /// countdown. Any previous offer is dropped. Returns the offer generation.
    /// Must be called from within a tokio runtime.
    pub fn offer(&mut self, activity: &str, email: &str) -> u64 {
        self.generation += 1;
        let generation = self.generation;

        if let Some(previous) = self.pending() {
            debug!(
                activity = %previous.activity,
                email = %previous.email,
                "undo_offer_replaced"
            );
        }

        // Replacing the slot drops the old countdown before the new one starts.
        self.slot = Slot::Empty;
        let countdown = self.start_countdown(generation);
        self.slot = Slot::Offered {
            deletion: PendingDeletion {
                activity: activity.to_string(),
                email: email.to_string(),
                created_at: Instant::now(),
            },
            countdown: Some(countdown),
        };

        info!(activity = %activity, email = %email, generation, "undo_offered");
        generation
    }

    fn start_countdown(&self, generation: u64) -> Countdown {
        let window = self.window;
        let on_expire = Arc::clone(&self.on_expire);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            on_expire(generation);
        })
        .abort_handle();
        Countdown { generation, handle }
    }

    /// Starts restoring the offered deletion. The record is cleared and the
    /// countdown cancelled before this returns, so a second call is a no-op
    /// until the restore resolves.
    pub fn invoke(&mut self) -> Option<PendingDeletion> {
        match std::mem::replace(&mut self.slot, Slot::Empty) {
            Slot::Offered { deletion, countdown } => {
                drop(countdown);
                info!(activity = %deletion.activity, email = %deletion.email, "undo_restoring");
                self.slot = Slot::Restoring {
                    deletion: deletion.clone(),
                };
                Some(deletion)
            }
            other => {
                debug!(phase = ?phase_of(&other), "undo_invoke_ignored");
                self.slot = other;
                None
            }
        }
    }

    pub fn restore_succeeded(&mut self, deletion: &PendingDeletion) {
        if matches!(&self.slot, Slot::Restoring { deletion: current } if current == deletion) {
            self.slot = Slot::Empty;
            info!(activity = %deletion.activity, email = %deletion.email, "undo_restored");
        }
    }

    /// Puts the deletion back on offer so the user can retry. The original
    /// deadline is not restarted. If a newer removal was offered meanwhile,
    /// that one wins and this returns `false`.
    pub fn restore_failed(&mut self, deletion: PendingDeletion) -> bool {
        if !matches!(&self.slot, Slot::Restoring { deletion: current } if *current == deletion) {
            debug!(activity = %deletion.activity, email = %deletion.email, "undo_restore_failed_superseded");
            return false;
        }
        info!(activity = %deletion.activity, email = %deletion.email, "undo_reoffered");
        self.slot = Slot::Offered {
            deletion,
            countdown: None,
        };
        true
    }

    /// Countdown elapsed. Clears the offer if `generation` is still the live
    /// one; a countdown can fire and be queued just before it is cancelled.
    pub fn expire(&mut self, generation: u64) -> Option<PendingDeletion> {
        let live = matches!(
            &self.slot,
            Slot::Offered { countdown: Some(c), .. } if c.generation == generation
        );
        if !live {
            debug!(generation, "undo_expiry_stale");
            return None;
        }
        match std::mem::replace(&mut self.slot, Slot::Empty) {
            Slot::Offered { deletion, .. } => {
                info!(activity = %deletion.activity, email = %deletion.email, "undo_expired");
                Some(deletion)
            }
            other => {
                self.slot = other;
                None
            }
        }
    }
}

fn phase_of(slot: &Slot) -> UndoPhase {
    match slot {
        Slot::Empty => UndoPhase::Empty,
        Slot::Offered { .. } => UndoPhase::Offered,
        Slot::Restoring { .. } => UndoPhase::Restoring,
    }
}
