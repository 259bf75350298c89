// Seedable 3D simplex noise.
//
// Tables are owned per instance so several experiments can hold independent
// fields. Output is roughly [-1, 1]; callers clamp before bucketing.

const F3: f64 = 1.0 / 3.0;
const G3: f64 = 1.0 / 6.0;

// Radius² of a corner's kernel and the normalising scale for the 4-corner sum.
const KERNEL_R2: f64 = 0.6;
const SCALE_3D: f64 = 32.0;

// Edge midpoints of a cube.
const GRAD3: [[f64; 3]; 12] = [
    [1.0, 1.0, 0.0],
    [-1.0, 1.0, 0.0],
    [1.0, -1.0, 0.0],
    [-1.0, -1.0, 0.0],
    [1.0, 0.0, 1.0],
    [-1.0, 0.0, 1.0],
    [1.0, 0.0, -1.0],
    [-1.0, 0.0, -1.0],
    [0.0, 1.0, 1.0],
    [0.0, -1.0, 1.0],
    [0.0, 1.0, -1.0],
    [0.0, -1.0, -1.0],
];

// 64-bit LCG (Knuth MMIX constants). Seed 0 is a valid state.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        self.0 >> 33
    }
}

/// Gradient noise field with a reseedable permutation table.
#[derive(Clone)]
pub struct NoiseField {
    seed: u64,
    perm: [u8; 512],
    perm_mod12: [u8; 512],
}

impl NoiseField {
    pub fn new(seed: u64) -> Self {
        let mut field = Self {
            seed,
            perm: [0; 512],
            perm_mod12: [0; 512],
        };
        field.reseed(seed);
        field
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Rebuild both tables from `seed`. Same seed, same tables.
    pub fn reseed(&mut self, seed: u64) {
        let mut p: [u8; 256] = [0; 256];
        for (i, v) in p.iter_mut().enumerate() {
            *v = i as u8;
        }

        // Fisher–Yates
        let mut lcg = Lcg(seed);
        for i in (1..256usize).rev() {
            let j = (lcg.next() % (i as u64 + 1)) as usize;
            p.swap(i, j);
        }

        for i in 0..512 {
            self.perm[i] = p[i & 255];
            self.perm_mod12[i] = p[i & 255] % 12;
        }
        self.seed = seed;
    }

    pub fn sample3(&self, x: f64, y: f64, z: f64) -> f64 {
        // Skew into simplex cell space.
        let s = (x + y + z) * F3;
        let i = (x + s).floor();
        let j = (y + s).floor();
        let k = (z + s).floor();

        let t = (i + j + k) * G3;
        let x0 = x - (i - t);
        let y0 = y - (j - t);
        let z0 = z - (k - t);

        // Which of the six tetrahedra. Ties go to the earlier axis (>=).
        let (i1, j1, k1, i2, j2, k2) = if x0 >= y0 {
            if y0 >= z0 {
                (1, 0, 0, 1, 1, 0)
            } else if x0 >= z0 {
                (1, 0, 0, 1, 0, 1)
            } else {
                (0, 0, 1, 1, 0, 1)
            }
        } else if y0 < z0 {
            (0, 0, 1, 0, 1, 1)
        } else if x0 < z0 {
            (0, 1, 0, 0, 1, 1)
        } else {
            (0, 1, 0, 1, 1, 0)
        };

        let x1 = x0 - i1 as f64 + G3;
        let y1 = y0 - j1 as f64 + G3;
        let z1 = z0 - k1 as f64 + G3;
        let x2 = x0 - i2 as f64 + 2.0 * G3;
        let y2 = y0 - j2 as f64 + 2.0 * G3;
        let z2 = z0 - k2 as f64 + 2.0 * G3;
        let x3 = x0 - 1.0 + 3.0 * G3;
        let y3 = y0 - 1.0 + 3.0 * G3;
        let z3 = z0 - 1.0 + 3.0 * G3;

        let ii = (i as i64 & 255) as usize;
        let jj = (j as i64 & 255) as usize;
        let kk = (k as i64 & 255) as usize;

        let gi0 = self.grad_index(ii, jj, kk);
        let gi1 = self.grad_index(ii + i1, jj + j1, kk + k1);
        let gi2 = self.grad_index(ii + i2, jj + j2, kk + k2);
        let gi3 = self.grad_index(ii + 1, jj + 1, kk + 1);

        let n0 = corner(gi0, x0, y0, z0);
        let n1 = corner(gi1, x1, y1, z1);
        let n2 = corner(gi2, x2, y2, z2);
        let n3 = corner(gi3, x3, y3, z3);

        SCALE_3D * (n0 + n1 + n2 + n3)
    }

    /// Octave sum (lacunarity 2, gain 0.5), renormalised to about [-1, 1].
    pub fn fbm3(&self, x: f64, y: f64, z: f64, octaves: u32) -> f64 {
        let octaves = octaves.max(1);
        let mut amp = 1.0;
        let mut freq = 1.0;
        let mut sum = 0.0;
        let mut norm = 0.0;
        for o in 0..octaves {
            // Offset each octave so lattice points don't line up.
            let off = o as f64 * 17.31;
            sum += amp * self.sample3(x * freq + off, y * freq - off, z * freq + off * 0.5);
            norm += amp;
            amp *= 0.5;
            freq *= 2.0;
        }
        sum / norm
    }

    #[inline]
    fn grad_index(&self, i: usize, j: usize, k: usize) -> usize {
        let kj = j + self.perm[k] as usize;
        self.perm_mod12[i + self.perm[kj] as usize] as usize
    }
}

#[inline]
fn corner(gi: usize, x: f64, y: f64, z: f64) -> f64 {
    let t = KERNEL_R2 - x * x - y * y - z * z;
    if t < 0.0 {
        return 0.0;
    }
    let g = GRAD3[gi];
    let t2 = t * t;
    t2 * t2 * (g[0] * x + g[1] * y + g[2] * z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn permutation_is_bijection() {
        for seed in [0u64, 1, 42, u64::MAX] {
            let n = NoiseField::new(seed);
            let mut seen = [false; 256];
            for &v in &n.perm[..256] {
                assert!(!seen[v as usize], "duplicate {v} for seed {seed}");
                seen[v as usize] = true;
            }
            assert_eq!(&n.perm[..256], &n.perm[256..]);
            for i in 0..512 {
                assert_eq!(n.perm_mod12[i], n.perm[i] % 12);
            }
        }
    }

    #[test]
    fn same_seed_same_output() {
        let a = NoiseField::new(7);
        let b = NoiseField::new(7);
        for i in 0..200 {
            let x = i as f64 * 0.173;
            let y = i as f64 * -0.311;
            let z = i as f64 * 0.057;
            assert_eq!(a.sample3(x, y, z).to_bits(), b.sample3(x, y, z).to_bits());
            assert_eq!(a.sample3(x, y, z).to_bits(), a.sample3(x, y, z).to_bits());
        }
    }

    #[test]
    fn reseed_restores_sequence() {
        let mut n = NoiseField::new(11);
        let pts: Vec<(f64, f64, f64)> = (0..64)
            .map(|i| (i as f64 * 0.37, i as f64 * 0.11 - 3.0, i as f64 * 0.05))
            .collect();
        let first: Vec<u64> = pts.iter().map(|&(x, y, z)| n.sample3(x, y, z).to_bits()).collect();

        n.reseed(99);
        let other: Vec<u64> = pts.iter().map(|&(x, y, z)| n.sample3(x, y, z).to_bits()).collect();
        assert_ne!(first, other);

        n.reseed(11);
        let again: Vec<u64> = pts.iter().map(|&(x, y, z)| n.sample3(x, y, z).to_bits()).collect();
        assert_eq!(first, again);
        assert_eq!(n.seed(), 11);
    }

    #[test]
    fn continuous_across_lattice_boundary() {
        let n = NoiseField::new(3);
        let (y, z) = (1.25, 0.5);
        let mut last = f64::INFINITY;
        for eps in [1e-2, 1e-3, 1e-4, 1e-5, 1e-6] {
            let d = (n.sample3(4.0 + eps, y, z) - n.sample3(4.0, y, z)).abs();
            assert!(d <= last + 1e-12, "eps {eps}: {d} > {last}");
            last = d;
        }
        assert!(last < 1e-3);

        let d = (n.sample3(4.001, y, z) - n.sample3(3.999, y, z)).abs();
        assert!(d < 0.05, "jump at lattice boundary: {d}");
    }

    #[test]
    fn bounded_for_random_points() {
        let n = NoiseField::new(0);
        let mut rng = StdRng::seed_from_u64(1234);
        for _ in 0..10_000 {
            let x = rng.gen_range(-500.0..500.0);
            let y = rng.gen_range(-500.0..500.0);
            let z = rng.gen_range(-500.0..500.0);
            let v = n.sample3(x, y, z);
            assert!((-1.05..=1.05).contains(&v), "{v} at ({x},{y},{z})");
        }
    }

    #[test]
    fn zero_at_lattice_origin() {
        // Every corner offset is either zero or outside the kernel.
        let n = NoiseField::new(5);
        assert_eq!(n.sample3(0.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn fbm_stays_in_range() {
        let n = NoiseField::new(8);
        for i in 0..500 {
            let v = n.fbm3(i as f64 * 0.13, i as f64 * 0.07, 0.5, 4);
            assert!((-1.05..=1.05).contains(&v));
        }
        assert_eq!(n.fbm3(0.3, 0.4, 0.5, 0).to_bits(), n.fbm3(0.3, 0.4, 0.5, 1).to_bits());
    }
}
