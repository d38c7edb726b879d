//! Boundary topologies for the automaton grid.
//!
//! A topology decides what an out-of-range coordinate means: wrap it back
//! onto the grid, mirror it, or reject it outright.

use serde::{Deserialize, Serialize};

/// How the grid treats coordinates that fall outside `[0, width) x [0, height)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Topology {
    /// Both axes wrap (periodic in x and y).
    #[default]
    Torus,
    /// Both axes wrap; crossing the x seam mirrors the y axis.
    KleinBottle,
    /// x wraps, y is bounded.
    CylinderX,
    /// y wraps, x is bounded.
    CylinderY,
    /// Neither axis wraps.
    Plane,
}

impl Topology {
    /// Every topology, in cycle order.
    pub const ALL: [Topology; 5] = [
        Topology::Torus,
        Topology::KleinBottle,
        Topology::CylinderX,
        Topology::CylinderY,
        Topology::Plane,
    ];

    /// The topology that follows `self` in cycle order.
    pub fn next(self) -> Self {
        match self {
            Topology::Torus => Topology::KleinBottle,
            Topology::KleinBottle => Topology::CylinderX,
            Topology::CylinderX => Topology::CylinderY,
            Topology::CylinderY => Topology::Plane,
            Topology::Plane => Topology::Torus,
        }
    }

    /// Resolve a logical coordinate to a grid cell, or `None` if it lies off a
    /// bounded edge.
    ///
    /// Total for every input, including zero-sized grids (which resolve nothing).
    #[inline]
    pub fn translate(self, x: i32, y: i32, width: usize, height: usize) -> Option<(usize, usize)> {
        if width == 0 || height == 0 {
            return None;
        }
        let (w, h) = (width as i64, height as i64);
        let (x, y) = (x as i64, y as i64);

        let (tx, ty) = match self {
            Topology::Torus => (x.rem_euclid(w), y.rem_euclid(h)),
            Topology::KleinBottle => {
                let ty = y.rem_euclid(h);
                let ty = if x.div_euclid(w) % 2 != 0 { h - 1 - ty } else { ty };
                (x.rem_euclid(w), ty)
            }
            Topology::CylinderX => (x.rem_euclid(w), bounded(y, h)?),
            Topology::CylinderY => (bounded(x, w)?, y.rem_euclid(h)),
            Topology::Plane => (bounded(x, w)?, bounded(y, h)?),
        };

        Some((tx as usize, ty as usize))
    }
}

impl std::fmt::Display for Topology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Topology::Torus => "Torus",
            Topology::KleinBottle => "Klein bottle",
            Topology::CylinderX => "Cylinder (x)",
            Topology::CylinderY => "Cylinder (y)",
            Topology::Plane => "Plane",
        };
        f.write_str(name)
    }
}

#[inline]
fn bounded(v: i64, size: i64) -> Option<i64> {
    (0..size).contains(&v).then_some(v)
}
