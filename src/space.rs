//! Tunable-parameter space and concrete candidate configurations.
//!
//! The space describes names, types, and bounds; the coordinator only ever
//! sees fully-materialized candidates, so everything search-related stays on
//! this side of the boundary.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result, bail};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Bounds and type of a single tunable parameter.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParamKind {
    Int { min: i64, max: i64 },
    Float { min: f64, max: f64 },
}

/// One tunable parameter.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    #[serde(flatten)]
    pub kind: ParamKind,
}

/// A concrete value bound to a parameter name.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
}

/// Fully-materialized candidate: every parameter bound to a value. Ordered
/// map so serialized candidates are stable across runs.
pub type Candidate = BTreeMap<String, ParamValue>;

/// The full space of tunable parameters for one program.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParamSpace {
    pub params: Vec<Param>,
}

impl ParamSpace {
    /// Load and validate a space definition from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read parameter space {}", path.display()))?;
        let space: ParamSpace = serde_json::from_str(&text)
            .with_context(|| format!("parse parameter space {}", path.display()))?;
        space.validate()?;
        Ok(space)
    }

    /// Reject empty spaces, duplicate names, and inverted bounds.
    pub fn validate(&self) -> Result<()> {
        if self.params.is_empty() {
            bail!("parameter space has no parameters");
        }
        let mut seen = std::collections::HashSet::new();
        for p in &self.params {
            if !seen.insert(p.name.as_str()) {
                bail!("duplicate parameter name {:?}", p.name);
            }
            match p.kind {
                ParamKind::Int { min, max } if min > max => {
                    bail!("parameter {:?}: min {} > max {}", p.name, min, max)
                }
                ParamKind::Float { min, max } if min > max => {
                    bail!("parameter {:?}: min {} > max {}", p.name, min, max)
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Uniform random candidate over the whole space.
    pub fn random_candidate<R: Rng>(&self, rng: &mut R) -> Candidate {
        self.params
            .iter()
            .map(|p| (p.name.clone(), sample(&p.kind, rng)))
            .collect()
    }

    /// Copy of `base` with one randomly chosen parameter resampled.
    /// Parameters missing from `base` are filled in rather than skipped.
    pub fn perturb<R: Rng>(&self, base: &Candidate, rng: &mut R) -> Candidate {
        let mut next = base.clone();
        let pick = rng.gen_range(0..self.params.len());
        for (i, p) in self.params.iter().enumerate() {
            if i == pick || !next.contains_key(&p.name) {
                next.insert(p.name.clone(), sample(&p.kind, rng));
            }
        }
        next
    }

    /// True when `candidate` binds every parameter within its bounds.
    pub fn contains(&self, candidate: &Candidate) -> bool {
        self.params
            .iter()
            .all(|p| match (candidate.get(&p.name), &p.kind) {
                (Some(ParamValue::Int(v)), ParamKind::Int { min, max }) => min <= v && v <= max,
                (Some(ParamValue::Float(v)), ParamKind::Float { min, max }) => {
                    min <= v && v <= max
                }
                _ => false,
            })
    }
}

fn sample<R: Rng>(kind: &ParamKind, rng: &mut R) -> ParamValue {
    match *kind {
        ParamKind::Int { min, max } => ParamValue::Int(rng.gen_range(min..=max)),
        ParamKind::Float { min, max } => {
            if max > min {
                ParamValue::Float(rng.gen_range(min..max))
            } else {
                ParamValue::Float(min)
            }
        }
    }
}
