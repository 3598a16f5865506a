//! Seeded 2D gradient noise with octave summation

/// Deterministic 2D gradient noise over a shuffled permutation table.
///
/// The table is doubled to 512 entries so lattice hashing never needs to wrap.
#[derive(Debug, Clone)]
pub struct NoiseField {
    seed: u32,
    perm: [u8; 512],
}

impl NoiseField {
    pub fn new(seed: u32) -> Self {
        let mut field = Self {
            seed,
            perm: [0; 512],
        };
        field.seed(seed);
        field
    }

    /// Reinitialize the permutation table from `value`
    pub fn seed(&mut self, value: u32) {
        let mut table: [u8; 256] = [0; 256];
        for (i, slot) in table.iter_mut().enumerate() {
            *slot = i as u8;
        }

        // Fisher-Yates driven by a linear congruential generator
        let mut state = value;
        for i in (1..256usize).rev() {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            let j = ((state >> 8) as usize) % (i + 1);
            table.swap(i, j);
        }

        for i in 0..512 {
            self.perm[i] = table[i & 255];
        }
        self.seed = value;
    }

    pub fn current_seed(&self) -> u32 {
        self.seed
    }

    /// Sample gradient noise at `(x, y)`, normalized to [0, 1]
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let xf = x.floor();
        let yf = y.floor();
        let xi = (xf as i64 & 255) as usize;
        let yi = (yf as i64 & 255) as usize;
        let x = x - xf;
        let y = y - yf;

        let u = fade(x);
        let v = fade(y);

        let p = &self.perm;
        let aa = p[p[xi] as usize + yi];
        let ab = p[p[xi] as usize + yi + 1];
        let ba = p[p[xi + 1] as usize + yi];
        let bb = p[p[xi + 1] as usize + yi + 1];

        let x1 = lerp(grad(aa, x, y), grad(ba, x - 1.0, y), u);
        let x2 = lerp(grad(ab, x, y - 1.0), grad(bb, x - 1.0, y - 1.0), u);
        let n = lerp(x1, x2, v);

        ((n + 1.0) * 0.5).clamp(0.0, 1.0)
    }

    /// Sum `octaves` samples at doubling frequency, normalized by total amplitude.
    ///
    /// An octave count of 0 is treated as 1; negative persistence as 0.
    pub fn octaves(&self, x: f64, y: f64, octaves: u32, persistence: f64) -> f64 {
        let octaves = octaves.max(1);
        let persistence = persistence.max(0.0);

        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut max_amplitude = 0.0;

        for _ in 0..octaves {
            total += self.sample(x * frequency, y * frequency) * amplitude;
            max_amplitude += amplitude;
            amplitude *= persistence;
            frequency *= 2.0;
        }

        total / max_amplitude
    }
}

#[inline]
fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + t * (b - a)
}

#[inline]
fn grad(hash: u8, x: f64, y: f64) -> f64 {
    let h = hash & 3;
    let u = if h & 1 == 0 { x } else { -x };
    let v = if h & 2 == 0 { y } else { -y };
    u + v
}
