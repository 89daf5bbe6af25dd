//! Host-runtime integration around the blocking poll.
//!
//! A loop embedded in a larger runtime (an interpreter with a global lock,
//! a cooperative scheduler, ...) must give up its exclusive claim on that
//! runtime while it sleeps in the OS, and take it back before touching
//! shared state again.
//!
//! This module provides:
//! - [`SuspendHooks`], the pair of callbacks invoked around the blocking call,
//! - [`Exclusive`], a process-wide execution claim,
//! - [`ClaimHooks`], hooks that release an [`Exclusive`] while polling.

use std::sync::{Arc, Condvar, Mutex, PoisonError};

/// Callbacks invoked immediately before and after the blocking poll.
///
/// Both default to no-ops, so hosts without an exclusivity concept can
/// use [`NoHooks`].
pub trait SuspendHooks {
    /// Called right before the calling thread blocks.
    fn on_suspend(&mut self) {}

    /// Called right after the blocking call returns.
    fn on_resume(&mut self) {}
}

/// Hooks for hosts with nothing to release.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl SuspendHooks for NoHooks {}

impl<T: SuspendHooks + ?Sized> SuspendHooks for &mut T {
    fn on_suspend(&mut self) {
        (**self).on_suspend();
    }

    fn on_resume(&mut self) {
        (**self).on_resume();
    }
}

/// Scoped suspension.
///
/// Creating a `Suspended` calls [`SuspendHooks::on_suspend`]; dropping it
/// calls [`SuspendHooks::on_resume`]. The guard lives exactly as long as
/// the blocking call, so resume runs on every exit path.
pub(crate) struct Suspended<'a, S: SuspendHooks + ?Sized> {
    hooks: &'a mut S,
}

impl<'a, S: SuspendHooks + ?Sized> Suspended<'a, S> {
    pub(crate) fn new(hooks: &'a mut S) -> Self {
        hooks.on_suspend();
        Self { hooks }
    }
}

impl<S: SuspendHooks + ?Sized> Drop for Suspended<'_, S> {
    fn drop(&mut self) {
        self.hooks.on_resume();
    }
}

/// A process-wide execution claim.
///
/// At most one thread holds the claim at a time. Holding it is
/// represented by an [`ExclusiveGuard`], which releases the claim when
/// dropped, including while unwinding from a panic.
///
/// [`ClaimHooks`] may give the claim up while its holder is blocked and
/// take it back before the holder resumes; the guard stays alive in
/// between.
#[derive(Debug, Default)]
pub struct Exclusive {
    /// Whether the claim is currently held.
    held: Mutex<bool>,

    /// Signalled every time the claim is released.
    released: Condvar,
}

impl Exclusive {
    /// Creates an unheld claim.
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks until the claim is free, then takes it.
    pub fn acquire(&self) -> ExclusiveGuard<'_> {
        self.take();
        ExclusiveGuard { claim: self }
    }

    /// Takes the claim if it is free.
    pub fn try_acquire(&self) -> Option<ExclusiveGuard<'_>> {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        if *held {
            return None;
        }
        *held = true;

        Some(ExclusiveGuard { claim: self })
    }

    /// Returns `true` if some thread currently holds the claim.
    pub fn is_held(&self) -> bool {
        *self.held.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Blocks until the claim is free, then marks it held.
    pub(crate) fn take(&self) {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        while *held {
            held = self
                .released
                .wait(held)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *held = true;
    }

    /// Marks the claim free and wakes one waiter.
    pub(crate) fn release(&self) {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        *held = false;
        drop(held);
        self.released.notify_one();
    }
}

/// Guard returned by [`Exclusive::acquire`].
///
/// Releases the claim when dropped.
#[derive(Debug)]
#[must_use = "the claim is released as soon as the guard is dropped"]
pub struct ExclusiveGuard<'a> {
    claim: &'a Exclusive,
}

impl Drop for ExclusiveGuard<'_> {
    fn drop(&mut self) {
        self.claim.release();
    }
}

/// Hooks that hand an [`Exclusive`] claim to other threads while polling.
///
/// The owning thread is expected to hold an [`ExclusiveGuard`] whenever
/// it runs a loop iteration. Suspension releases the claim, resumption
/// blocks until it is available again.
#[derive(Debug, Clone)]
pub struct ClaimHooks {
    claim: Arc<Exclusive>,
}

impl ClaimHooks {
    pub fn new(claim: Arc<Exclusive>) -> Self {
        Self { claim }
    }
}

impl SuspendHooks for ClaimHooks {
    fn on_suspend(&mut self) {
        self.claim.release();
    }

    fn on_resume(&mut self) {
        self.claim.take();
    }
}
