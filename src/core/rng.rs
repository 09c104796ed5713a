use std::f64::consts::PI;
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of uniform draws used by the distribution sampler.
///
/// Implementors only need `next_f64`; the default `standard_normal` is a plain
/// Box–Muller transform over two uniform draws.
pub trait RandomSource {
    /// Uniform draw strictly inside (0, 1).
    fn next_f64(&mut self) -> f64;

    fn standard_normal(&mut self) -> f64 {
        let u1 = self.next_f64();
        let u2 = self.next_f64();
        box_muller(u1, u2).0
    }
}

/// Two independent standard normals from two uniform draws.
fn box_muller(u1: f64, u2: f64) -> (f64, f64) {
    let r = (-2.0 * u1.max(1e-12).ln()).sqrt();
    let theta = 2.0 * PI * u2;
    (r * theta.cos(), r * theta.sin())
}

/// xorshift64* generator. Identical seeds give identical sequences.
#[derive(Debug, Clone)]
pub struct SeededRng {
    state: u64,
    cached_normal: Option<f64>,
}

impl SeededRng {
    pub fn new(seed: u64) -> Self {
        let mixed = splitmix64(seed);
        let state = if mixed == 0 {
            0xA5A5_A5A5_A5A5_A5A5
        } else {
            mixed
        };
        Self {
            state,
            cached_normal: None,
        }
    }

    /// Seeds from the wall clock, for callers that did not ask for reproducibility.
    pub fn from_time() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        Self::new(nanos)
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }
}

impl RandomSource for SeededRng {
    fn next_f64(&mut self) -> f64 {
        const DENOM: f64 = (1_u64 << 53) as f64;
        let v = self.next_u64() >> 11;
        ((v as f64) + 0.5) / DENOM
    }

    fn standard_normal(&mut self) -> f64 {
        if let Some(z) = self.cached_normal.take() {
            return z;
        }

        let u1 = self.next_f64();
        let u2 = self.next_f64();
        let (z0, z1) = box_muller(u1, u2);
        self.cached_normal = Some(z1);
        z0
    }
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}
