//! Neighborhood templates for sampling complexity traces.
//!
//! A template is the ordered list of offsets within a Euclidean radius of
//! the origin. The estimator is order-sensitive, so the ordering is part of
//! the contract: squared distance ascending, then `dx`, then `dy`.

/// A single template offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Offset {
    pub dx: i64,
    pub dy: i64,
    /// Euclidean distance from the origin.
    pub distance: f64,
}

/// Precomputed, immutable neighborhood template.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborhoodTemplate {
    radius: u32,
    offsets: Vec<Offset>,
}

impl NeighborhoodTemplate {
    /// Enumerate every integer offset with `dx² + dy² ≤ radius²`.
    pub fn build(radius: u32) -> Self {
        let r = radius as i64;
        let limit = r * r;

        let side = (2 * r + 1) as usize;
        let mut keyed: Vec<(i64, i64, i64)> = Vec::with_capacity(side * side);
        for dx in -r..=r {
            for dy in -r..=r {
                let distance_sq = dx * dx + dy * dy;
                if distance_sq <= limit {
                    keyed.push((distance_sq, dx, dy));
                }
            }
        }

        // Integer keys keep ties exact; comparing float distances would not.
        keyed.sort_unstable();
        keyed.dedup();

        let offsets = keyed
            .into_iter()
            .map(|(distance_sq, dx, dy)| Offset {
                dx,
                dy,
                distance: (distance_sq as f64).sqrt(),
            })
            .collect();

        Self { radius, offsets }
    }

    #[inline]
    pub fn radius(&self) -> u32 {
        self.radius
    }

    #[inline]
    pub fn offsets(&self) -> &[Offset] {
        &self.offsets
    }

    /// Number of bytes in every trace sampled with this template.
    #[inline]
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}
