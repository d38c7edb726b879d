//! Moore-neighbourhood sampling.

/// Number of slots in an [`AdjacentSample`] (8 neighbours plus the centre).
pub const ADJACENT_SLOTS: usize = 9;

/// Slot index of the centre cell.
pub const CENTER: usize = 4;

/// Offsets for every slot, x-offset outer, y-offset inner.
pub const OFFSETS: [(i32, i32); ADJACENT_SLOTS] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 0),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// One slot of a neighbourhood sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdjacentCell {
    pub dx: i32,
    pub dy: i32,
    pub value: u128,
}

/// A 3x3 neighbourhood read from one field, centre at [`CENTER`].
///
/// Owned by the caller, so two samples can be held at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdjacentSample {
    cells: [AdjacentCell; ADJACENT_SLOTS],
}

impl AdjacentSample {
    /// Build a sample by reading each offset through `read`.
    #[inline]
    pub fn gather(mut read: impl FnMut(i32, i32) -> u128) -> Self {
        let cells = OFFSETS.map(|(dx, dy)| AdjacentCell {
            dx,
            dy,
            value: read(dx, dy),
        });
        Self { cells }
    }

    /// All nine slots.
    #[inline]
    pub fn cells(&self) -> &[AdjacentCell; ADJACENT_SLOTS] {
        &self.cells
    }

    #[inline]
    pub fn center(&self) -> u128 {
        self.cells[CENTER].value
    }

    /// The eight ring cells, centre excluded.
    pub fn ring(&self) -> impl Iterator<Item = AdjacentCell> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != CENTER)
            .map(|(_, c)| *c)
    }

    /// Number of ring cells holding a non-zero value.
    pub fn occupied_neighbors(&self) -> usize {
        self.ring().filter(|c| c.value != 0).count()
    }
}

impl std::ops::Index<usize> for AdjacentSample {
    type Output = AdjacentCell;

    fn index(&self, index: usize) -> &AdjacentCell {
        &self.cells[index]
    }
}
