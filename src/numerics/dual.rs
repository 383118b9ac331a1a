use nalgebra::{DVector, Dyn, U1};
use num_dual::{Derivative, DualDVec64};

/// Slots of the contact's forward-mode derivative vector.
pub const SLOT_METAL_PSI: usize = 0;
pub const SLOT_METAL_T: usize = 1;
pub const SLOT_SEMI_PSI: usize = 2;
pub const SLOT_SEMI_N: usize = 3;
pub const SLOT_SEMI_P: usize = 4;
pub const SLOT_SEMI_T: usize = 5;
/// Fixed slots ahead of the per-neighbor potential slots.
pub const CONTACT_SLOTS: usize = 6;

/// Insulator continuity layout: metal V/T then insulator V/T.
pub const INSULATOR_SLOTS: usize = 4;

/// Width of a derivative vector and the seeding of its unit directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotLayout {
    width: usize,
}

impl SlotLayout {
    pub fn with_width(width: usize) -> Self {
        Self { width }
    }

    /// Six fixed slots plus one per neighbor potential.
    pub fn contact(neighbors: usize) -> Self {
        Self::with_width(CONTACT_SLOTS + neighbors)
    }

    pub fn insulator() -> Self {
        Self::with_width(INSULATOR_SLOTS)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn neighbor_slot(j: usize) -> usize {
        CONTACT_SLOTS + j
    }

    /// Independent variable with a unit derivative in `slot`.
    #[inline]
    pub fn seed(&self, value: f64, slot: usize) -> DualDVec64 {
        let eps = Derivative::derivative_generic(Dyn(self.width), U1, slot);
        DualDVec64::new(value, eps)
    }

    #[inline]
    pub fn constant(value: f64) -> DualDVec64 {
        DualDVec64::from_re(value)
    }

    /// Derivative vector, zero-filled when nothing was seeded.
    pub fn gradient(&self, value: &DualDVec64) -> DVector<f64> {
        value.eps.clone().unwrap_generic(Dyn(self.width), U1)
    }
}
