//! Bounded numeric parameter vectors.
//!
//! [`VectorSpace`] is a reference [`ParameterSpace`] for solvers whose
//! parameters are all numeric: each parameter has a closed domain
//! `[min, max]` and is either real-valued or integer-valued.
//!
//! # Operators
//!
//! - Crossover: one cut point (tail swap) or two cut points (segment swap).
//! - Mutation: per-parameter Gaussian perturbation with standard deviation
//!   `step_factor * (max - min)`, clamped to the domain and rounded for
//!   integer parameters.

use super::{CutPoints, ParameterSpace};
use crate::error::SpaceError;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

/// Value domain of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamKind {
    Real,
    Integer,
}

/// A named numeric parameter with a closed domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub min: f64,
    pub max: f64,
    pub kind: ParamKind,
}

impl Parameter {
    /// Real-valued parameter in `[min, max]`.
    pub fn real(name: impl Into<String>, min: f64, max: f64) -> Self {
        Self {
            name: name.into(),
            min: min.min(max),
            max: max.max(min),
            kind: ParamKind::Real,
        }
    }

    /// Integer-valued parameter in `[min, max]`.
    pub fn integer(name: impl Into<String>, min: i64, max: i64) -> Self {
        Self {
            name: name.into(),
            min: min.min(max) as f64,
            max: max.max(min) as f64,
            kind: ParamKind::Integer,
        }
    }

    fn span(&self) -> f64 {
        self.max - self.min
    }

    fn sample<R: Rng>(&self, rng: &mut R) -> f64 {
        match self.kind {
            ParamKind::Real if self.span() > 0.0 => rng.random_range(self.min..=self.max),
            ParamKind::Integer => rng.random_range(self.min as i64..=self.max as i64) as f64,
            ParamKind::Real => self.min,
        }
    }

    /// Projects a value back into the domain.
    fn project(&self, value: f64) -> f64 {
        let value = value.clamp(self.min, self.max);
        match self.kind {
            ParamKind::Real => value,
            ParamKind::Integer => value.round(),
        }
    }

    fn contains(&self, value: f64) -> bool {
        let in_range = value >= self.min && value <= self.max;
        match self.kind {
            ParamKind::Real => in_range,
            ParamKind::Integer => in_range && value.fract() == 0.0,
        }
    }
}

/// Parameter assignment of a [`VectorSpace`], one value per parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VectorConfig {
    values: Vec<f64>,
}

impl VectorConfig {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

/// Space of bounded numeric parameter vectors.
///
/// ```
/// use u_tuner::space::{CutPoints, Parameter, ParameterSpace, VectorConfig, VectorSpace};
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let space = VectorSpace::new(vec![
///     Parameter::real("noise", 0.0, 1.0),
///     Parameter::integer("restarts", 1, 100),
/// ]);
/// assert_eq!(space.dimension(), 2);
///
/// let a = VectorConfig::new(vec![0.1, 10.0]);
/// let b = VectorConfig::new(vec![0.9, 90.0]);
/// let child = space.crossover(&a, &b, CutPoints::One, &mut StdRng::seed_from_u64(1));
/// assert_eq!(child.values(), &[0.1, 90.0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct VectorSpace {
    params: Vec<Parameter>,
}

impl VectorSpace {
    pub fn new(params: Vec<Parameter>) -> Self {
        Self { params }
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.params
    }

    pub fn dimension(&self) -> usize {
        self.params.len()
    }

    fn validate(&self, config: &VectorConfig) -> Result<(), SpaceError> {
        if config.values.len() != self.params.len() {
            return Err(SpaceError::Dimension {
                expected: self.params.len(),
                found: config.values.len(),
            });
        }
        for (param, &value) in self.params.iter().zip(&config.values) {
            if !param.contains(value) {
                return Err(SpaceError::OutOfBounds {
                    name: param.name.clone(),
                    value,
                    min: param.min,
                    max: param.max,
                });
            }
        }
        Ok(())
    }
}

impl ParameterSpace for VectorSpace {
    type Config = VectorConfig;

    fn random_config<R: Rng>(&self, rng: &mut R) -> VectorConfig {
        VectorConfig::new(self.params.iter().map(|p| p.sample(rng)).collect())
    }

    fn crossover<R: Rng>(
        &self,
        a: &VectorConfig,
        b: &VectorConfig,
        points: CutPoints,
        rng: &mut R,
    ) -> VectorConfig {
        self.crossover_pair(a, b, points, rng).0
    }

    fn crossover_pair<R: Rng>(
        &self,
        a: &VectorConfig,
        b: &VectorConfig,
        points: CutPoints,
        rng: &mut R,
    ) -> (VectorConfig, VectorConfig) {
        let n = a.values.len().min(b.values.len());
        if n < 2 {
            return (a.clone(), b.clone());
        }

        let (c1, c2) = match points {
            CutPoints::One => {
                let point = rng.random_range(1..n);
                one_point_children(&a.values, &b.values, point)
            }
            CutPoints::Two => {
                let (start, end) = random_segment(n, rng);
                two_point_children(&a.values, &b.values, start, end)
            }
        };
        (VectorConfig::new(c1), VectorConfig::new(c2))
    }

    fn mutate<R: Rng>(
        &self,
        config: &mut VectorConfig,
        step_factor: f64,
        probability: f64,
        rng: &mut R,
    ) {
        let probability = if probability.is_nan() {
            0.0
        } else {
            probability.clamp(0.0, 1.0)
        };

        for (value, param) in config.values.iter_mut().zip(&self.params) {
            if !rng.random_bool(probability) {
                continue;
            }
            let sd = step_factor * param.span();
            if let Ok(normal) = Normal::new(0.0, sd) {
                if sd > 0.0 {
                    *value = param.project(*value + normal.sample(rng));
                }
            }
        }
    }

    fn canonical_name(&self, config: &VectorConfig) -> String {
        self.params
            .iter()
            .zip(&config.values)
            .map(|(p, v)| match p.kind {
                ParamKind::Real => format!("{}={}", p.name, v),
                ParamKind::Integer => format!("{}={}", p.name, *v as i64),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn encode(&self, config: &VectorConfig) -> Result<String, SpaceError> {
        Ok(serde_json::to_string(config)?)
    }

    fn decode(&self, encoded: &str) -> Result<VectorConfig, SpaceError> {
        let config: VectorConfig = serde_json::from_str(encoded)?;
        self.validate(&config)?;
        Ok(config)
    }
}

/// Children of a one-point crossover at `point`: `a[..point] ++ b[point..]`
/// and its complement.
fn one_point_children(a: &[f64], b: &[f64], point: usize) -> (Vec<f64>, Vec<f64>) {
    let mut c1 = Vec::with_capacity(a.len());
    c1.extend_from_slice(&a[..point]);
    c1.extend_from_slice(&b[point..]);

    let mut c2 = Vec::with_capacity(b.len());
    c2.extend_from_slice(&b[..point]);
    c2.extend_from_slice(&a[point..]);
    (c1, c2)
}

/// Children of a two-point crossover swapping the segment `[start, end]`.
fn two_point_children(a: &[f64], b: &[f64], start: usize, end: usize) -> (Vec<f64>, Vec<f64>) {
    let mut c1 = a.to_vec();
    let mut c2 = b.to_vec();
    c1[start..=end].copy_from_slice(&b[start..=end]);
    c2[start..=end].copy_from_slice(&a[start..=end]);
    (c1, c2)
}

/// Pick a random segment `[start, end]` within `0..n` where `start <= end`.
fn random_segment<R: Rng>(n: usize, rng: &mut R) -> (usize, usize) {
    let a = rng.random_range(0..n);
    let b = rng.random_range(0..n);
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
