//! Enzyme pools and rate laws for cMyBP-C (de)phosphorylation.
//!
//! Every kinase and phosphatase acts on several cMyBP-C species at once. The
//! species compete for the same active site, so each pool carries a shared
//! competition term
//!
//! κ_E = Σ [S_i] / Km_i
//!
//! over all of its substrates, and each individual reaction follows
//!
//! v = kcat * [E] * [S] / (Km * (1 + κ_E - [S]/Km) + [S])
//!
//! The `- [S]/Km` removes the substrate's own contribution from κ_E.
//!
//! References:
//! - Segel IH. Enzyme Kinetics. Wiley-Interscience, 1993 (Ch. 2, competing substrates)
//! - Kampourakis T, Ponnam S, Koch D. bioRxiv 2023.02.24.529959

use super::species::{Species, StateLayout};
use crate::error::{Result, SimulationError};

/// Enzyme pools acting on cMyBP-C
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum EnzymePool {
    /// Protein kinase A
    Pka,
    /// Protein kinase C
    Pkc,
    /// Protein phosphatase 1
    Pp1,
    /// Protein phosphatase 2A
    Pp2a,
    /// Ribosomal S6 kinase 2
    Rsk2,
}

impl EnzymePool {
    /// Pools sharing the competitive rate law
    pub const COMPETITIVE: [EnzymePool; 4] =
        [EnzymePool::Pka, EnzymePool::Pkc, EnzymePool::Pp1, EnzymePool::Pp2a];

    pub fn name(self) -> &'static str {
        match self {
            EnzymePool::Pka => "PKA",
            EnzymePool::Pkc => "PKC",
            EnzymePool::Pp1 => "PP1",
            EnzymePool::Pp2a => "PP2A",
            EnzymePool::Rsk2 => "RSK2",
        }
    }

    pub fn is_kinase(self) -> bool {
        !matches!(self, EnzymePool::Pp1 | EnzymePool::Pp2a)
    }
}

/// Enzyme concentrations (mol/L), constant over one integration
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct EnzymeLevels {
    pub pka_M: f64,
    pub pkc_M: f64,
    pub pp1_M: f64,
    pub pp2a_M: f64,
    /// Only read by the RSK2 model
    pub rsk2_M: f64,
}

impl EnzymeLevels {
    pub fn new(pka_M: f64, pkc_M: f64, pp1_M: f64, pp2a_M: f64) -> Self {
        Self {
            pka_M,
            pkc_M,
            pp1_M,
            pp2a_M,
            rsk2_M: 0.0,
        }
    }

    /// Builder-style RSK2 level
    pub fn with_rsk2(mut self, rsk2_M: f64) -> Self {
        self.rsk2_M = rsk2_M;
        self
    }

    /// Build from `[PKA, PKC, PP1, PP2A]` or `[PKA, PKC, PP1, PP2A, RSK2]`
    pub fn from_slice(values: &[f64]) -> Result<Self> {
        match *values {
            [pka, pkc, pp1, pp2a] => Ok(Self::new(pka, pkc, pp1, pp2a)),
            [pka, pkc, pp1, pp2a, rsk2] => Ok(Self::new(pka, pkc, pp1, pp2a).with_rsk2(rsk2)),
            _ => Err(SimulationError::InvalidEnzymeCount {
                expected: 4,
                got: values.len(),
            }),
        }
    }

    #[inline]
    pub fn get(&self, pool: EnzymePool) -> f64 {
        match pool {
            EnzymePool::Pka => self.pka_M,
            EnzymePool::Pkc => self.pkc_M,
            EnzymePool::Pp1 => self.pp1_M,
            EnzymePool::Pp2a => self.pp2a_M,
            EnzymePool::Rsk2 => self.rsk2_M,
        }
    }

    pub fn set(&mut self, pool: EnzymePool, value_M: f64) {
        match pool {
            EnzymePool::Pka => self.pka_M = value_M,
            EnzymePool::Pkc => self.pkc_M = value_M,
            EnzymePool::Pp1 => self.pp1_M = value_M,
            EnzymePool::Pp2a => self.pp2a_M = value_M,
            EnzymePool::Rsk2 => self.rsk2_M = value_M,
        }
    }

    /// Copy with one pool replaced
    pub fn with(mut self, pool: EnzymePool, value_M: f64) -> Self {
        self.set(pool, value_M);
        self
    }
}

/// Conversion of one species into another by a single reaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conversion {
    pub substrate: Species,
    pub product: Species,
}

impl Conversion {
    pub const fn new(substrate: Species, product: Species) -> Self {
        Self { substrate, product }
    }

    /// Apply a flux to a derivatives vector
    #[inline]
    pub fn apply(&self, layout: StateLayout, dydt: &mut [f64], rate_M_per_sec: f64) {
        if let Some(i) = layout.index(self.substrate) {
            dydt[i] -= rate_M_per_sec;
        }
        if let Some(i) = layout.index(self.product) {
            dydt[i] += rate_M_per_sec;
        }
    }
}

/// Competitive Michaelis-Menten rate for one substrate of a shared enzyme
///
/// v = kcat * [E] * [S] / (Km * (1 + κ - [S]/Km) + [S])
///
/// No clamping is applied: negative substrate concentrations produced by an
/// overshooting step must remain visible to the integrator.
///
/// # Arguments
/// * `kcat_per_sec` - Turnover number (1/s)
/// * `enzyme_M` - Enzyme concentration (M)
/// * `s_M` - Substrate concentration (M)
/// * `km_M` - Michaelis constant (M)
/// * `kappa` - Competition term of the enzyme pool (dimensionless)
#[inline]
pub fn competitive_michaelis_menten(
    kcat_per_sec: f64,
    enzyme_M: f64,
    s_M: f64,
    km_M: f64,
    kappa: f64,
) -> f64 {
    kcat_per_sec * enzyme_M * s_M / (km_M * (1.0 + kappa - s_M / km_M) + s_M)
}

/// RSK2 rate law with a single competing substrate
///
/// v = kcat * [E] * [S] / (Km + [C]/Kc + [S])
///
/// This is the saturation form used for RSK2 acting on P0 and D, where the
/// other substrate enters the denominator divided by its own Km.
#[inline]
pub fn rsk2_saturation(
    kcat_per_sec: f64,
    enzyme_M: f64,
    s_M: f64,
    km_M: f64,
    competitor_M: f64,
    km_competitor_M: f64,
) -> f64 {
    kcat_per_sec * enzyme_M * s_M / (km_M + competitor_M / km_competitor_M + s_M)
}

/// First-order conversion, used for the structural isomerization of alpha
#[inline]
pub fn first_order(k_per_sec: f64, s_M: f64) -> f64 {
    k_per_sec * s_M
}
