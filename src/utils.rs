use rand::Rng;
use rand_distr::{Distribution, Normal, Uniform};

use crate::Float;

// draw a value uniformly from [a, b). a must be strictly below b.
pub fn randf<R: Rng + ?Sized>(rng: &mut R, a: Float, b: Float) -> Float {
    let uniform = Uniform::new(a, b);
    uniform.sample(rng)
}

// fill `out` with independent draws of `noise`.
pub fn fill_noise<R: Rng + ?Sized>(rng: &mut R, noise: &Normal<Float>, out: &mut [Float]) {
    for value in out.iter_mut() {
        *value = noise.sample(rng);
    }
}

pub fn zeros(n: usize) -> Vec<Float> {
    vec![0.0; n]
}

pub fn mean(values: &[Float]) -> Float {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<Float>() / values.len() as Float
}

// population variance, zero for an empty slice.
pub fn variance(values: &[Float]) -> Float {
    if values.is_empty() {
        return 0.0;
    }
    let mu = mean(values);
    values.iter().map(|v| (v - mu) * (v - mu)).sum::<Float>() / values.len() as Float
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinMax {
    pub min_value: Float,
    pub min_index: usize,
    pub max_value: Float,
    pub max_index: usize,
    pub diff_value: Float,
}

// return max and min of a given non-empty array.
pub fn maxmin(values: &[Float]) -> Option<MinMax> {
    if values.is_empty() {
        return None;
    }

    let mut maxv = values[0];
    let mut minv = values[0];
    let mut maxi = 0;
    let mut mini = 0;
    for (i, value) in values.iter().copied().enumerate() {
        if value > maxv {
            maxv = value;
            maxi = i;
        }
        if value < minv {
            minv = value;
            mini = i;
        }
    }
    Some(MinMax {
        min_value: minv,
        min_index: mini,
        max_value: maxv,
        max_index: maxi,
        diff_value: maxv - minv,
    })
}
