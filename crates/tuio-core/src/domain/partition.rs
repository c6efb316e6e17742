//! Display partitioning: slicing the normalized touch surface across tiles.
//!
//! A shared touch surface can be spread over up to [`MAX_TILES`] displays laid
//! out left to right.  Each outbound gateway owns exactly one tile and remaps
//! its local surface onto that tile's horizontal slice:
//!
//! ```text
//!  0.0        0.25        0.5        0.75        1.0
//!   |  tile 1  |  tile 2   |  tile 3  |  tile 4   |
//!                          ^cell_start ^cell_end        (tile 3 of 4)
//! ```
//!
//! `x' = cell_start + x * cell_size`, `y' = y`.  A cursor survives only if
//! `cell_start < x' < cell_end` and `0 < y < 1`.  The bounds are strict on
//! purpose: adjacent tiles never both claim a boundary cursor, and degenerate
//! `0`/`1` edge values are screened out.

use super::cursor::{CursorSession, Vec2};

/// Maximum number of display tiles.
pub const MAX_TILES: i32 = 8;

/// A `(tile_count, target_tile)` pair, always within range.
///
/// Out-of-range configuration is clamped on construction and never reported
/// as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayPartition {
    tile_count: i32,
    target_tile: i32,
}

impl Default for DisplayPartition {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl DisplayPartition {
    /// Creates a partition, clamping `tile_count` into `[1, MAX_TILES]` and
    /// `target_tile` into `[1, tile_count]`.
    pub fn new(tile_count: i32, target_tile: i32) -> Self {
        let tile_count = tile_count.clamp(1, MAX_TILES);
        let target_tile = target_tile.clamp(1, tile_count);
        Self {
            tile_count,
            target_tile,
        }
    }

    pub fn tile_count(&self) -> i32 {
        self.tile_count
    }

    /// One-based index of the tile this gateway feeds.
    pub fn target_tile(&self) -> i32 {
        self.target_tile
    }

    /// Width of one tile in normalized units.
    pub fn cell_size(&self) -> f32 {
        1.0 / self.tile_count as f32
    }

    /// Inclusive left edge of the target tile.
    pub fn cell_start(&self) -> f32 {
        self.cell_size() * (self.target_tile - 1) as f32
    }

    /// Exclusive right edge of the target tile.
    pub fn cell_end(&self) -> f32 {
        self.cell_size() * self.target_tile as f32
    }

    /// Maps a local x coordinate onto the target tile.
    pub fn remap_x(&self, x: f32) -> f32 {
        self.cell_start() + x * self.cell_size()
    }

    /// Returns `true` if a remapped position lies strictly inside the tile.
    pub fn admits(&self, remapped: Vec2) -> bool {
        remapped.x > self.cell_start()
            && remapped.x < self.cell_end()
            && remapped.y > 0.0
            && remapped.y < 1.0
    }

    /// Remaps one session, returning `None` if it falls outside the tile.
    pub fn route_one(&self, session: &CursorSession) -> Option<CursorSession> {
        let remapped = Vec2::new(self.remap_x(session.position.x), session.position.y);
        if !self.admits(remapped) {
            return None;
        }
        Some(CursorSession {
            position: remapped,
            ..session.clone()
        })
    }

    /// Filters and remaps a snapshot, preserving the snapshot's order.
    ///
    /// Velocity, acceleration and source pass through untouched.
    pub fn route(&self, sessions: &[CursorSession]) -> Vec<CursorSession> {
        sessions.iter().filter_map(|s| self.route_one(s)).collect()
    }
}
