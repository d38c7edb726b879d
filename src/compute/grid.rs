//! Field storage for the gravity and mass layers.

use super::{AdjacentSample, Topology};

/// Selects one of the two live fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Gravity,
    Mass,
}

/// Dense gravity, mass and scratch layers over a fixed-size grid.
///
/// Cells are stored x-major: index = x * height + y.
pub struct Grid {
    width: usize,
    height: usize,
    /// Boundary behaviour used by every coordinate lookup.
    pub topology: Topology,
    pub(crate) gravity: Vec<u128>,
    pub(crate) mass: Vec<u128>,
    /// Next-phase values for whichever field is being rewritten.
    pub(crate) scratch: Vec<u128>,
}

impl Grid {
    /// Allocate zeroed layers.
    pub fn new(width: usize, height: usize, topology: Topology) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            topology,
            gravity: vec![0; size],
            mass: vec![0; size],
            scratch: vec![0; size],
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of cells per layer.
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }

    /// Flat index of an in-range cell.
    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        x * self.height + y
    }

    /// Resolve a logical coordinate through the current topology.
    #[inline]
    pub fn translate(&self, x: i32, y: i32) -> Option<(usize, usize)> {
        self.topology.translate(x, y, self.width, self.height)
    }

    /// Read-only view of a live layer.
    #[inline]
    pub fn layer(&self, field: Field) -> &[u128] {
        match field {
            Field::Gravity => &self.gravity,
            Field::Mass => &self.mass,
        }
    }

    #[inline]
    fn layer_mut(&mut self, field: Field) -> &mut Vec<u128> {
        match field {
            Field::Gravity => &mut self.gravity,
            Field::Mass => &mut self.mass,
        }
    }

    /// Value at a logical coordinate, or `default` if it resolves off-grid.
    #[inline]
    pub fn get(&self, field: Field, x: i32, y: i32, default: u128) -> u128 {
        match self.translate(x, y) {
            Some((tx, ty)) => self.layer(field)[self.index(tx, ty)],
            None => default,
        }
    }

    /// Write a logical coordinate; off-grid writes are dropped.
    #[inline]
    pub fn set(&mut self, field: Field, x: i32, y: i32, value: u128) {
        if let Some((tx, ty)) = self.translate(x, y) {
            let idx = self.index(tx, ty);
            self.layer_mut(field)[idx] = value;
        }
    }

    /// Sample the 3x3 neighbourhood around (x, y). Off-grid slots read 0.
    pub fn sample_adjacent(&self, field: Field, x: i32, y: i32) -> AdjacentSample {
        AdjacentSample::gather(|dx, dy| {
            self.get(field, x.saturating_add(dx), y.saturating_add(dy), 0)
        })
    }

    /// Exact sum of a live layer, or `None` if it overflows `u128`.
    pub fn checked_total(&self, field: Field) -> Option<u128> {
        self.layer(field)
            .iter()
            .try_fold(0u128, |acc, &v| acc.checked_add(v))
    }

    /// Zero one live layer.
    pub fn clear(&mut self, field: Field) {
        self.layer_mut(field).fill(0);
    }

    /// Zero every layer, scratch included.
    pub fn clear_all(&mut self) {
        self.gravity.fill(0);
        self.mass.fill(0);
        self.scratch.fill(0);
    }

    /// Copy the scratch layer over a live layer in one pass.
    pub(crate) fn commit_scratch(&mut self, field: Field) {
        match field {
            Field::Gravity => self.gravity.copy_from_slice(&self.scratch),
            Field::Mass => self.mass.copy_from_slice(&self.scratch),
        }
    }
}
