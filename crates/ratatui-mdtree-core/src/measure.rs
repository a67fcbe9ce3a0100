//! Two-phase deferred measurement.
//!
//! Some values (the natural width of a table, the size of a viewport) are only known after a
//! frame has been laid out. Widgets that depend on them follow a fixed protocol:
//!
//! 1. [`DeferredMeasure::request`] during layout or event handling. Requests are idempotent:
//!    while one is pending, further requests coalesce into it.
//! 2. After the frame has been painted, the host measures and calls
//!    [`DeferredMeasure::commit`]. It returns `true` only when the new value differs from the last
//!    committed one by more than the tolerance, and the caller relayouts exactly once in that case.
//!
//! The tolerance keeps floating-point jitter from turning into an endless measure/relayout loop.

/// Tolerance, in layout units, used for sizes and scroll offsets.
pub const LAYOUT_TOLERANCE: f32 = 0.3;

/// A value that can be compared against a previous measurement with a tolerance.
pub trait Measurement: Copy + std::fmt::Debug {
    fn within(&self, other: &Self, tolerance: f32) -> bool;
}

impl Measurement for f32 {
    fn within(&self, other: &Self, tolerance: f32) -> bool {
        (self - other).abs() <= tolerance
    }
}

impl Measurement for (f32, f32) {
    fn within(&self, other: &Self, tolerance: f32) -> bool {
        self.0.within(&other.0, tolerance) && self.1.within(&other.1, tolerance)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DeferredMeasure<T> {
    pending: bool,
    value: Option<T>,
    tolerance: f32,
}

impl<T: Measurement> Default for DeferredMeasure<T> {
    fn default() -> Self {
        Self::new(LAYOUT_TOLERANCE)
    }
}

impl<T: Measurement> DeferredMeasure<T> {
    pub fn new(tolerance: f32) -> Self {
        Self {
            pending: false,
            value: None,
            tolerance,
        }
    }

    /// Schedules a measurement after the current frame.
    ///
    /// Returns `false` when a measurement is already pending (the request was coalesced).
    pub fn request(&mut self) -> bool {
        if self.pending {
            return false;
        }
        self.pending = true;
        true
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// The last committed measurement.
    pub fn value(&self) -> Option<T> {
        self.value
    }

    /// Completes a pending measurement.
    ///
    /// Returns `true` when the caller must relayout: the first measurement, or one that moved by
    /// more than the tolerance. Commits without a pending request are ignored.
    pub fn commit(&mut self, measured: T) -> bool {
        if !self.pending {
            return false;
        }
        self.pending = false;
        match self.value {
            Some(prev) if prev.within(&measured, self.tolerance) => false,
            prev => {
                log::trace!("measurement {prev:?} -> {measured:?}");
                self.value = Some(measured);
                true
            }
        }
    }
}
