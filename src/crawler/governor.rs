//! Concurrency governor for page pipelines
//!
//! This module handles:
//! - The hard ceiling on simultaneous renders (a semaphore sized to the maximum)
//! - A target worker count that floats between the configured bounds
//! - Scaling the target from page outcomes
//!
//! Permits above the current target are held in reserve by the governor
//! itself, so the semaphore's available permits always equal the free
//! worker slots.

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

/// How a finished page should influence the worker count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSignal {
    /// Loaded and settled normally
    Healthy,
    /// Navigation failed or the page never settled
    Strained,
}

/// Bounded, adaptive worker pool accounting
#[derive(Debug)]
pub struct Governor {
    /// One permit per possible concurrent render
    semaphore: Arc<Semaphore>,

    /// Permits withheld to keep the pool at its target size
    reserved: Vec<OwnedSemaphorePermit>,

    min: usize,
    max: usize,

    /// Consecutive healthy pages since the last adjustment
    healthy_streak: usize,
}

impl Governor {
    /// Creates a governor that starts at `min` workers and may grow to `max`
    ///
    /// Bounds are clamped so that `1 <= min <= max`.
    pub fn new(min: usize, max: usize) -> Self {
        let max = max.max(1);
        let min = min.clamp(1, max);
        let semaphore = Arc::new(Semaphore::new(max));

        let reserved = (min..max)
            .filter_map(|_| Arc::clone(&semaphore).try_acquire_owned().ok())
            .collect();

        Self {
            semaphore,
            reserved,
            min,
            max,
            healthy_streak: 0,
        }
    }

    /// Current target worker count
    pub fn target(&self) -> usize {
        self.max - self.reserved.len()
    }

    /// Workers currently holding a permit
    pub fn active(&self) -> usize {
        self.target()
            .saturating_sub(self.semaphore.available_permits())
    }

    /// Configured bounds as `(min, max)`
    pub fn bounds(&self) -> (usize, usize) {
        (self.min, self.max)
    }

    /// Claims a worker slot if the pool is below its target
    ///
    /// The slot is released when the returned permit is dropped.
    pub fn try_acquire(&self) -> Option<OwnedSemaphorePermit> {
        Arc::clone(&self.semaphore).try_acquire_owned().ok()
    }

    /// Feeds a finished page back into the scaling policy
    ///
    /// A full round of healthy pages (one per current worker) grows the
    /// pool by one, provided there is queued work to use it. Any strained
    /// page shrinks it by one.
    pub fn observe(&mut self, signal: PageSignal, backlog: bool) {
        match signal {
            PageSignal::Healthy => {
                self.healthy_streak += 1;
                if backlog && self.healthy_streak >= self.target() {
                    self.grow();
                }
            }
            PageSignal::Strained => {
                self.healthy_streak = 0;
                self.shrink();
            }
        }
    }

    fn grow(&mut self) {
        if let Some(permit) = self.reserved.pop() {
            drop(permit);
            self.healthy_streak = 0;
            debug!("Scaled workers up to {}", self.target());
        }
    }

    fn shrink(&mut self) {
        if self.target() <= self.min {
            return;
        }

        // A slot held by a running worker cannot be reclaimed; the next
        // strained page will try again.
        if let Ok(permit) = Arc::clone(&self.semaphore).try_acquire_owned() {
            self.reserved.push(permit);
            debug!("Scaled workers down to {}", self.target());
        }
    }
}
