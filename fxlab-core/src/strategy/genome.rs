//! Genome — an encoded, evaluable strategy configuration.
//!
//! A genome is a template id plus a typed parameter vector. Templates
//! declare their parameter layout as `ParamSpec`s; every genome operation
//! (random init, crossover, mutation) is closed over those bounds, and
//! validation is re-checked before a genome is turned into a strategy.
//! All randomness comes from an injected `StdRng` — there is no ambient
//! RNG anywhere in the optimizer path.

use super::{channel_breakout, ma_crossover, rsi_reversion};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The closed set of strategy templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TemplateId {
    MaCrossover,
    ChannelBreakout,
    RsiReversion,
}

impl TemplateId {
    pub fn all() -> [TemplateId; 3] {
        [
            TemplateId::MaCrossover,
            TemplateId::ChannelBreakout,
            TemplateId::RsiReversion,
        ]
    }

    /// Parameter layout for this template. Genome indices follow this order.
    pub fn param_specs(self) -> &'static [ParamSpec] {
        match self {
            TemplateId::MaCrossover => ma_crossover::PARAMS,
            TemplateId::ChannelBreakout => channel_breakout::PARAMS,
            TemplateId::RsiReversion => rsi_reversion::PARAMS,
        }
    }
}

impl std::fmt::Display for TemplateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TemplateId::MaCrossover => "ma_crossover",
            TemplateId::ChannelBreakout => "channel_breakout",
            TemplateId::RsiReversion => "rsi_reversion",
        };
        f.write_str(s)
    }
}

/// Declared type and bounds of one genome parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamKind {
    Int { min: i64, max: i64 },
    Float { min: f64, max: f64 },
    Bool,
    Choice { options: &'static [&'static str] },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
}

/// One concrete parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Choice(u32),
}

/// Out-of-bound or ill-typed genome; fatal at run start.
#[derive(Debug, Error, PartialEq)]
pub enum GenomeError {
    #[error("{template} expects {expected} parameters, got {got}")]
    WrongArity {
        template: TemplateId,
        expected: usize,
        got: usize,
    },
    #[error("parameter '{name}' has the wrong type")]
    TypeMismatch { name: &'static str },
    #[error("parameter '{name}' is out of bounds")]
    OutOfBounds { name: &'static str },
    #[error("cannot recombine genomes of different templates ({a} vs {b})")]
    TemplateMismatch { a: TemplateId, b: TemplateId },
}

/// An encoded strategy configuration, immutable once scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    pub template: TemplateId,
    pub params: Vec<ParamValue>,
}

impl Genome {
    /// A mid-range genome for a template; the CLI default when no genome
    /// file is given.
    pub fn default_for(template: TemplateId) -> Genome {
        let params = template
            .param_specs()
            .iter()
            .map(|spec| match spec.kind {
                ParamKind::Int { min, max } => ParamValue::Int(min + (max - min) / 2),
                ParamKind::Float { min, max } => ParamValue::Float((min + max) / 2.0),
                ParamKind::Bool => ParamValue::Bool(false),
                ParamKind::Choice { .. } => ParamValue::Choice(0),
            })
            .collect();
        Genome { template, params }
    }

    /// Draw a uniformly random genome within the template's bounds.
    pub fn random(template: TemplateId, rng: &mut StdRng) -> Genome {
        let params = template
            .param_specs()
            .iter()
            .map(|spec| match spec.kind {
                ParamKind::Int { min, max } => ParamValue::Int(rng.gen_range(min..=max)),
                ParamKind::Float { min, max } => ParamValue::Float(rng.gen_range(min..=max)),
                ParamKind::Bool => ParamValue::Bool(rng.gen_bool(0.5)),
                ParamKind::Choice { options } => {
                    ParamValue::Choice(rng.gen_range(0..options.len()) as u32)
                }
            })
            .collect();
        Genome { template, params }
    }

    /// Check arity, types, and bounds against the template's specs.
    pub fn validate(&self) -> Result<(), GenomeError> {
        let specs = self.template.param_specs();
        if specs.len() != self.params.len() {
            return Err(GenomeError::WrongArity {
                template: self.template,
                expected: specs.len(),
                got: self.params.len(),
            });
        }
        for (spec, value) in specs.iter().zip(&self.params) {
            match (spec.kind, value) {
                (ParamKind::Int { min, max }, ParamValue::Int(v)) => {
                    if *v < min || *v > max {
                        return Err(GenomeError::OutOfBounds { name: spec.name });
                    }
                }
                (ParamKind::Float { min, max }, ParamValue::Float(v)) => {
                    if !v.is_finite() || *v < min || *v > max {
                        return Err(GenomeError::OutOfBounds { name: spec.name });
                    }
                }
                (ParamKind::Bool, ParamValue::Bool(_)) => {}
                (ParamKind::Choice { options }, ParamValue::Choice(v)) => {
                    if *v as usize >= options.len() {
                        return Err(GenomeError::OutOfBounds { name: spec.name });
                    }
                }
                _ => return Err(GenomeError::TypeMismatch { name: spec.name }),
            }
        }
        Ok(())
    }

    /// Uniform crossover: each gene comes from either parent with equal
    /// probability. Both parents must share a template.
    pub fn crossover(a: &Genome, b: &Genome, rng: &mut StdRng) -> Result<Genome, GenomeError> {
        if a.template != b.template {
            return Err(GenomeError::TemplateMismatch {
                a: a.template,
                b: b.template,
            });
        }
        let params = a
            .params
            .iter()
            .zip(&b.params)
            .map(|(pa, pb)| if rng.gen_bool(0.5) { *pa } else { *pb })
            .collect();
        Ok(Genome {
            template: a.template,
            params,
        })
    }

    /// Perturb each gene with probability `rate`, staying inside bounds.
    ///
    /// Numeric genes move by up to 10% of their declared range (at least one
    /// step for integers); bools flip; categorical genes re-draw.
    pub fn mutate(&mut self, rate: f64, rng: &mut StdRng) {
        let specs = self.template.param_specs();
        for (spec, value) in specs.iter().zip(self.params.iter_mut()) {
            if !rng.gen_bool(rate.clamp(0.0, 1.0)) {
                continue;
            }
            match (spec.kind, &mut *value) {
                (ParamKind::Int { min, max }, ParamValue::Int(v)) => {
                    let span = ((max - min) / 10).max(1);
                    let delta = rng.gen_range(-span..=span);
                    *v = (*v + delta).clamp(min, max);
                }
                (ParamKind::Float { min, max }, ParamValue::Float(v)) => {
                    let span = (max - min) * 0.1;
                    let delta = rng.gen_range(-span..=span);
                    *v = (*v + delta).clamp(min, max);
                }
                (ParamKind::Bool, ParamValue::Bool(v)) => *v = !*v,
                (ParamKind::Choice { options }, ParamValue::Choice(v)) => {
                    *v = rng.gen_range(0..options.len()) as u32;
                }
                _ => {} // ill-typed genomes are caught by validate()
            }
        }
    }

    // ── Typed accessors used by template constructors ──

    pub fn int(&self, index: usize) -> i64 {
        match self.params[index] {
            ParamValue::Int(v) => v,
            _ => panic!("parameter {index} is not an int"),
        }
    }

    pub fn float(&self, index: usize) -> f64 {
        match self.params[index] {
            ParamValue::Float(v) => v,
            _ => panic!("parameter {index} is not a float"),
        }
    }

    pub fn flag(&self, index: usize) -> bool {
        match self.params[index] {
            ParamValue::Bool(v) => v,
            _ => panic!("parameter {index} is not a bool"),
        }
    }
}
