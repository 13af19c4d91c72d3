//! Reaction network for cMyBP-C phosphorylation.
//!
//! Thirty competitive Michaelis-Menten reactions connect the eight core
//! phosphorylation states. PKA modifies the alpha, beta and gamma sites in
//! order, PKC the delta site, and PP1/PP2A remove them again. Reaction `r`
//! (numbered from 1) uses `kcat[r-1]` and `km[r-1]` of the parameter set.
//!
//! Model variants extend the core network:
//!
//! | Variant | Species | Auxiliary parameters |
//! |---------|---------|----------------------|
//! | `MichaelisMenten` | 8 | none |
//! | `PhenomenologicalActivation` | 8 | `factor, ka` |
//! | `AllostericActivation` | 8 | `lambda, kcat_a, ka` |
//! | `Isomerization` | 9 | `k2_fast, Km2_fast, k_iso_f, k_iso_r` |
//! | `IsomerizationFull` | 9 | above + `k3_fast, Km3_fast` |
//! | `Final` | 9 | as `IsomerizationFull`, PKA gated by a signal |
//! | `FinalRsk2` | 9 | as `Final` + `k31, k32, Km31, Km32` |
//!
//! Every reaction converts exactly one species into another, so the sum of
//! all derivatives is zero and total cMyBP-C is conserved.
//!
//! Reference: Kampourakis T, Ponnam S, Koch D. bioRxiv 2023.02.24.529959

use super::enzyme::{
    competitive_michaelis_menten, first_order, rsk2_saturation, Conversion, EnzymeLevels,
    EnzymePool,
};
use super::integrator::OdeSystem;
use super::signal::Signal;
use super::species::{Species, StateLayout};
use crate::error::{Result, SimulationError};

/// Number of reactions in the core network
pub const REACTION_COUNT: usize = 30;

/// One reaction of the core network
#[derive(Debug, Clone, Copy)]
pub struct Reaction {
    pub enzyme: EnzymePool,
    pub conversion: Conversion,
}

const fn rx(enzyme: EnzymePool, substrate: Species, product: Species) -> Reaction {
    Reaction {
        enzyme,
        conversion: Conversion::new(substrate, product),
    }
}

use EnzymePool::{Pka, Pkc, Pp1, Pp2a};
use Species::{ABD, ABG, ABGD, AD, AB, A, D, P0};

/// Core reactions, indexed by reaction number minus one
pub const REACTIONS: [Reaction; REACTION_COUNT] = [
    rx(Pka, P0, A),      // 1
    rx(Pp1, A, P0),      // 2
    rx(Pp2a, A, P0),     // 3
    rx(Pka, A, AB),      // 4
    rx(Pp1, AB, A),      // 5
    rx(Pp2a, AB, A),     // 6
    rx(Pka, AB, ABG),    // 7
    rx(Pp1, ABG, AB),    // 8
    rx(Pp2a, ABG, AB),   // 9
    rx(Pkc, P0, D),      // 10
    rx(Pp1, D, P0),      // 11
    rx(Pp2a, D, P0),     // 12
    rx(Pkc, A, AD),      // 13
    rx(Pp1, AD, A),      // 14
    rx(Pp2a, AD, A),     // 15
    rx(Pkc, AB, ABD),    // 16
    rx(Pp1, ABD, AB),    // 17
    rx(Pp2a, ABD, AB),   // 18
    rx(Pkc, ABG, ABGD),  // 19
    rx(Pp1, ABGD, ABG),  // 20
    rx(Pp2a, ABGD, ABG), // 21
    rx(Pka, D, AD),      // 22
    rx(Pp1, AD, D),      // 23
    rx(Pp2a, AD, D),     // 24
    rx(Pka, AD, ABD),    // 25
    rx(Pp1, ABD, AD),    // 26
    rx(Pp2a, ABD, AD),   // 27
    rx(Pka, ABD, ABGD),  // 28
    rx(Pp1, ABGD, ABD),  // 29
    rx(Pp2a, ABGD, ABD), // 30
];

// Reaction indices with variant-specific behaviour
const R2: usize = 1;
const R4: usize = 3;
const R5: usize = 4;
const R6: usize = 5;
const R13: usize = 12;
const R14: usize = 13;
const R15: usize = 14;

/// Model family, each a fixed network topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ModelVariant {
    /// Competitive Michaelis-Menten kinetics only (model 1)
    MichaelisMenten,
    /// Reaction 2 activated by the 2P/3P fraction (model 2)
    PhenomenologicalActivation,
    /// Reaction 2 allosterically activated by AB and AD (model 3)
    AllostericActivation,
    /// PP1 removal of beta yields a fast-dephosphorylated alpha conformer (model 4)
    Isomerization,
    /// As `Isomerization`, for both PP1 and PP2A
    IsomerizationFull,
    /// As `IsomerizationFull` with time-varying PKA and kinase access to Atr
    Final,
    /// As `Final` with RSK2 phosphorylating P0 and D
    FinalRsk2,
}

impl ModelVariant {
    pub const ALL: [ModelVariant; 7] = [
        ModelVariant::MichaelisMenten,
        ModelVariant::PhenomenologicalActivation,
        ModelVariant::AllostericActivation,
        ModelVariant::Isomerization,
        ModelVariant::IsomerizationFull,
        ModelVariant::Final,
        ModelVariant::FinalRsk2,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ModelVariant::MichaelisMenten => "michaelis-menten",
            ModelVariant::PhenomenologicalActivation => "phenomenological-activation",
            ModelVariant::AllostericActivation => "allosteric-activation",
            ModelVariant::Isomerization => "isomerization",
            ModelVariant::IsomerizationFull => "isomerization-full",
            ModelVariant::Final => "final",
            ModelVariant::FinalRsk2 => "final-rsk2",
        }
    }

    pub fn layout(self) -> StateLayout {
        match self {
            ModelVariant::MichaelisMenten
            | ModelVariant::PhenomenologicalActivation
            | ModelVariant::AllostericActivation => StateLayout::Eight,
            _ => StateLayout::Nine,
        }
    }

    /// Number of auxiliary parameters appended after kcat and Km
    pub fn auxiliary_len(self) -> usize {
        match self {
            ModelVariant::MichaelisMenten => 0,
            ModelVariant::PhenomenologicalActivation => 2,
            ModelVariant::AllostericActivation => 3,
            ModelVariant::Isomerization => 4,
            ModelVariant::IsomerizationFull | ModelVariant::Final => 6,
            ModelVariant::FinalRsk2 => 10,
        }
    }

    /// Number of enzyme pools read by the model
    pub fn enzyme_count(self) -> usize {
        match self {
            ModelVariant::FinalRsk2 => 5,
            _ => 4,
        }
    }

    /// Whether PKA activity is modulated by an exogenous signal
    pub fn is_non_autonomous(self) -> bool {
        matches!(self, ModelVariant::Final | ModelVariant::FinalRsk2)
    }

    /// Whether reaction `r` (zero-based) produces Atr instead of A
    fn yields_alpha_tr(self, r: usize) -> bool {
        match self {
            ModelVariant::Isomerization => matches!(r, R5 | R14),
            ModelVariant::IsomerizationFull | ModelVariant::Final | ModelVariant::FinalRsk2 => {
                matches!(r, R5 | R6 | R14 | R15)
            }
            _ => false,
        }
    }
}

impl std::fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Positional kinetic parameters of one fitted parameter set
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ParameterSet {
    /// Turnover numbers (1/s), reaction r at index r-1
    pub kcat: Vec<f64>,
    /// Michaelis constants (M), aligned with `kcat`
    pub km: Vec<f64>,
    /// Variant-specific constants appended positionally
    pub auxiliary: Vec<f64>,
}

impl ParameterSet {
    pub fn new(kcat: Vec<f64>, km: Vec<f64>, auxiliary: Vec<f64>) -> Result<Self> {
        check_len("kcat", REACTION_COUNT, kcat.len())?;
        check_len("km", REACTION_COUNT, km.len())?;
        Ok(Self {
            kcat,
            km,
            auxiliary,
        })
    }

    /// Same kcat and Km for every core reaction
    pub fn uniform(kcat_per_sec: f64, km_M: f64, auxiliary: Vec<f64>) -> Self {
        Self {
            kcat: vec![kcat_per_sec; REACTION_COUNT],
            km: vec![km_M; REACTION_COUNT],
            auxiliary,
        }
    }

    /// Split a flat `kcat ++ km ++ auxiliary` row for the given variant
    pub fn from_flat(row: &[f64], variant: ModelVariant) -> Result<Self> {
        let expected = 2 * REACTION_COUNT + variant.auxiliary_len();
        check_len("parameter row", expected, row.len())?;
        Ok(Self {
            kcat: row[..REACTION_COUNT].to_vec(),
            km: row[REACTION_COUNT..2 * REACTION_COUNT].to_vec(),
            auxiliary: row[2 * REACTION_COUNT..].to_vec(),
        })
    }

    /// Append the RSK2 constants to a `Final` parameter set
    pub fn with_rsk2(mut self, rsk2: Rsk2Constants) -> Self {
        self.auxiliary.extend_from_slice(&[
            rsk2.kcat31_per_sec,
            rsk2.kcat32_per_sec,
            rsk2.km31_M,
            rsk2.km32_M,
        ]);
        self
    }
}

fn check_len(name: &'static str, expected: usize, got: usize) -> Result<()> {
    if expected == got {
        Ok(())
    } else {
        Err(SimulationError::InvalidParameterLength {
            name,
            expected,
            got,
        })
    }
}

/// Constants of the alpha isomerization sub-network
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IsomerizationConstants {
    /// PP1 turnover on Atr (1/s)
    pub k2_fast_per_sec: f64,
    pub km2_fast_M: f64,
    /// Atr -> A (1/s)
    pub k_iso_f_per_sec: f64,
    /// A -> Atr (1/s)
    pub k_iso_r_per_sec: f64,
    /// PP2A turnover on Atr (1/s), absent in the PP1-only model
    pub pp2a_fast: Option<(f64, f64)>,
}

/// RSK2 constants for reactions 31 (P0 -> A) and 32 (D -> AD)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rsk2Constants {
    pub kcat31_per_sec: f64,
    pub kcat32_per_sec: f64,
    pub km31_M: f64,
    pub km32_M: f64,
}

/// Measured RSK2 kinetics
pub const RSK2_MEASURED: Rsk2Constants = Rsk2Constants {
    kcat31_per_sec: 1.8,
    kcat32_per_sec: 1.8,
    km31_M: 1.3e-6,
    km32_M: 1.3e-6,
};

/// Variant-specific kinetics decoded from the auxiliary parameters
#[derive(Debug, Clone, Copy, PartialEq)]
enum ExtraKinetics {
    None,
    /// v2 *= 1 + factor * f / (ka + f)
    Activation { factor: f64, ka: f64 },
    /// v2 replaced by the allosteric rate law
    Allosteric { lambda: f64, kcat_a: f64, ka: f64 },
    Isomerization {
        constants: IsomerizationConstants,
        /// PKA and PKC also phosphorylate Atr
        kinase_access: bool,
        rsk2: Option<Rsk2Constants>,
    },
}

impl ExtraKinetics {
    fn decode(variant: ModelVariant, aux: &[f64]) -> Self {
        let iso = |pp2a_fast| IsomerizationConstants {
            k2_fast_per_sec: aux[0],
            km2_fast_M: aux[1],
            k_iso_f_per_sec: aux[2],
            k_iso_r_per_sec: aux[3],
            pp2a_fast,
        };
        match variant {
            ModelVariant::MichaelisMenten => ExtraKinetics::None,
            ModelVariant::PhenomenologicalActivation => ExtraKinetics::Activation {
                factor: aux[0],
                ka: aux[1],
            },
            ModelVariant::AllostericActivation => ExtraKinetics::Allosteric {
                lambda: aux[0],
                kcat_a: aux[1],
                ka: aux[2],
            },
            ModelVariant::Isomerization => ExtraKinetics::Isomerization {
                constants: iso(None),
                kinase_access: false,
                rsk2: None,
            },
            ModelVariant::IsomerizationFull => ExtraKinetics::Isomerization {
                constants: iso(Some((aux[4], aux[5]))),
                kinase_access: false,
                rsk2: None,
            },
            ModelVariant::Final => ExtraKinetics::Isomerization {
                constants: iso(Some((aux[4], aux[5]))),
                kinase_access: true,
                rsk2: None,
            },
            ModelVariant::FinalRsk2 => ExtraKinetics::Isomerization {
                constants: iso(Some((aux[4], aux[5]))),
                kinase_access: true,
                rsk2: Some(Rsk2Constants {
                    kcat31_per_sec: aux[6],
                    kcat32_per_sec: aux[7],
                    km31_M: aux[8],
                    km32_M: aux[9],
                }),
            },
        }
    }
}

/// Competition terms κ of the four competitive enzyme pools
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CompetitionTerms {
    pub pka: f64,
    pub pkc: f64,
    pub pp1: f64,
    pub pp2a: f64,
}

impl CompetitionTerms {
    #[inline]
    pub fn get(&self, pool: EnzymePool) -> f64 {
        match pool {
            EnzymePool::Pka => self.pka,
            EnzymePool::Pkc => self.pkc,
            EnzymePool::Pp1 => self.pp1,
            EnzymePool::Pp2a => self.pp2a,
            EnzymePool::Rsk2 => 0.0,
        }
    }

    #[inline]
    fn add(&mut self, pool: EnzymePool, value: f64) {
        match pool {
            EnzymePool::Pka => self.pka += value,
            EnzymePool::Pkc => self.pkc += value,
            EnzymePool::Pp1 => self.pp1 += value,
            EnzymePool::Pp2a => self.pp2a += value,
            EnzymePool::Rsk2 => {}
        }
    }
}

/// Derivative evaluator for one parameter set and enzyme configuration
#[derive(Debug, Clone)]
pub struct PhosphoNetwork {
    variant: ModelVariant,
    layout: StateLayout,
    kcat: [f64; REACTION_COUNT],
    km: [f64; REACTION_COUNT],
    extra: ExtraKinetics,
    enzymes: EnzymeLevels,
    signal: Option<Signal>,
}

impl PhosphoNetwork {
    /// Build a network, validating the parameter and signal contract.
    ///
    /// Non-autonomous variants (`Final`, `FinalRsk2`) require a signal gating
    /// PKA; all other variants reject one.
    pub fn new(
        variant: ModelVariant,
        params: &ParameterSet,
        enzymes: EnzymeLevels,
        signal: Option<Signal>,
    ) -> Result<Self> {
        check_len("kcat", REACTION_COUNT, params.kcat.len())?;
        check_len("km", REACTION_COUNT, params.km.len())?;
        check_len("auxiliary", variant.auxiliary_len(), params.auxiliary.len())?;

        match (variant.is_non_autonomous(), signal.is_some()) {
            (true, false) => {
                return Err(SimulationError::SignalMismatch {
                    model: variant.name(),
                    reason: "requires a signal for PKA",
                })
            }
            (false, true) => {
                return Err(SimulationError::SignalMismatch {
                    model: variant.name(),
                    reason: "is autonomous and does not accept a signal",
                })
            }
            _ => {}
        }

        let mut kcat = [0.0; REACTION_COUNT];
        let mut km = [0.0; REACTION_COUNT];
        kcat.copy_from_slice(&params.kcat);
        km.copy_from_slice(&params.km);

        Ok(Self {
            variant,
            layout: variant.layout(),
            kcat,
            km,
            extra: ExtraKinetics::decode(variant, &params.auxiliary),
            enzymes,
            signal,
        })
    }

    /// Build a network from a raw enzyme vector whose length must match the variant
    pub fn from_enzyme_slice(
        variant: ModelVariant,
        params: &ParameterSet,
        enzymes: &[f64],
        signal: Option<Signal>,
    ) -> Result<Self> {
        if enzymes.len() != variant.enzyme_count() {
            return Err(SimulationError::InvalidEnzymeCount {
                expected: variant.enzyme_count(),
                got: enzymes.len(),
            });
        }
        Self::new(variant, params, EnzymeLevels::from_slice(enzymes)?, signal)
    }

    pub fn variant(&self) -> ModelVariant {
        self.variant
    }

    pub fn layout(&self) -> StateLayout {
        self.layout
    }

    pub fn enzymes(&self) -> &EnzymeLevels {
        &self.enzymes
    }

    pub fn signal(&self) -> Option<&Signal> {
        self.signal.as_ref()
    }

    /// Fail fast on a state vector of the wrong length
    pub fn check_state(&self, state: &[f64]) -> Result<()> {
        if state.len() == self.layout.len() {
            Ok(())
        } else {
            Err(SimulationError::InvalidStateLength {
                expected: self.layout.len(),
                got: state.len(),
            })
        }
    }

    /// Enzyme concentration at time `t`, applying the PKA signal
    #[inline]
    fn enzyme_at(&self, pool: EnzymePool, t: f64) -> f64 {
        let level = self.enzymes.get(pool);
        match (pool, &self.signal) {
            (EnzymePool::Pka, Some(signal)) => level * signal.value(t),
            _ => level,
        }
    }

    #[inline]
    fn conc(&self, y: &[f64], species: Species) -> f64 {
        self.layout.index(species).map_or(0.0, |i| y[i])
    }

    /// Competition terms κ for the given state
    pub fn competition_terms(&self, y: &[f64]) -> CompetitionTerms {
        let mut kappa = CompetitionTerms::default();
        for (r, reaction) in REACTIONS.iter().enumerate() {
            kappa.add(reaction.enzyme, self.conc(y, reaction.conversion.substrate) / self.km[r]);
        }

        if let ExtraKinetics::Isomerization {
            constants,
            kinase_access,
            ..
        } = self.extra
        {
            let atr = self.conc(y, Species::Atr);
            kappa.pp1 += atr / constants.km2_fast_M;
            if let Some((_, km3_fast)) = constants.pp2a_fast {
                kappa.pp2a += atr / km3_fast;
            }
            if kinase_access {
                kappa.pka += atr / self.km[R4];
                kappa.pkc += atr / self.km[R13];
            }
        }
        kappa
    }

    /// Rates of the 30 core reactions, including variant modifications of reaction 2
    pub fn reaction_rates(&self, t: f64, y: &[f64]) -> [f64; REACTION_COUNT] {
        let kappa = self.competition_terms(y);
        self.core_rates(t, y, &kappa)
    }

    fn core_rates(&self, t: f64, y: &[f64], kappa: &CompetitionTerms) -> [f64; REACTION_COUNT] {
        let mut rates = [0.0; REACTION_COUNT];
        for (r, reaction) in REACTIONS.iter().enumerate() {
            rates[r] = competitive_michaelis_menten(
                self.kcat[r],
                self.enzyme_at(reaction.enzyme, t),
                self.conc(y, reaction.conversion.substrate),
                self.km[r],
                kappa.get(reaction.enzyme),
            );
        }

        match self.extra {
            ExtraKinetics::Activation { factor, ka } => {
                let total: f64 = y.iter().sum();
                let occupied = self.conc(y, Species::AB)
                    + self.conc(y, Species::ABG)
                    + self.conc(y, Species::AD)
                    + self.conc(y, Species::ABD);
                let fraction = if total != 0.0 { occupied / total } else { 0.0 };
                rates[R2] *= 1.0 + factor * fraction / (ka + fraction);
            }
            ExtraKinetics::Allosteric { lambda, kcat_a, ka } => {
                rates[R2] = self.allosteric_r2(y, kappa.pp1, lambda, kcat_a, ka);
            }
            _ => {}
        }
        rates
    }

    /// PP1 dephosphorylation of A accelerated by AB/AD binding an allosteric site
    fn allosteric_r2(&self, y: &[f64], kappa_pp1: f64, lambda: f64, kcat_a: f64, ka: f64) -> f64 {
        let a = self.conc(y, Species::A);
        let effector = self.conc(y, Species::AD) + self.conc(y, Species::AB);
        let pp1 = self.enzymes.pp1_M;
        let (k2, km2) = (self.kcat[R2], self.km[R2]);

        let numerator = k2 * pp1 * a + kcat_a * pp1 * a * effector / (lambda * ka);
        let denominator = km2
            + effector * km2 / ka
            + a * effector / (lambda * ka)
            + km2 * (kappa_pp1 - a / km2)
            + a;
        numerator / denominator
    }
}

impl OdeSystem for PhosphoNetwork {
    fn state_len(&self) -> Option<usize> {
        Some(self.layout.len())
    }

    fn derivatives(&self, t: f64, y: &[f64], dydt: &mut [f64]) {
        let layout = self.layout;
        dydt.iter_mut().for_each(|d| *d = 0.0);

        let kappa = self.competition_terms(y);
        let rates = self.core_rates(t, y, &kappa);

        for (r, (reaction, rate)) in REACTIONS.iter().zip(rates).enumerate() {
            let conversion = if self.variant.yields_alpha_tr(r) {
                Conversion::new(reaction.conversion.substrate, Species::Atr)
            } else {
                reaction.conversion
            };
            conversion.apply(layout, dydt, rate);
        }

        let ExtraKinetics::Isomerization {
            constants,
            kinase_access,
            rsk2,
        } = self.extra
        else {
            return;
        };

        let atr = self.conc(y, Species::Atr);
        let pp1 = self.enzymes.pp1_M;

        // Fast dephosphorylation of the structured conformer
        let v2_fast = competitive_michaelis_menten(
            constants.k2_fast_per_sec,
            pp1,
            atr,
            constants.km2_fast_M,
            kappa.pp1,
        );
        Conversion::new(Species::Atr, Species::P0).apply(layout, dydt, v2_fast);

        if let Some((k3_fast, km3_fast)) = constants.pp2a_fast {
            let v3_fast =
                competitive_michaelis_menten(k3_fast, self.enzymes.pp2a_M, atr, km3_fast, kappa.pp2a);
            Conversion::new(Species::Atr, Species::P0).apply(layout, dydt, v3_fast);
        }

        // Isomerization Atr <-> A
        let v_iso_f = first_order(constants.k_iso_f_per_sec, atr);
        let v_iso_r = first_order(constants.k_iso_r_per_sec, self.conc(y, Species::A));
        Conversion::new(Species::Atr, Species::A).apply(layout, dydt, v_iso_f);
        Conversion::new(Species::A, Species::Atr).apply(layout, dydt, v_iso_r);

        if kinase_access {
            let v4_tr = competitive_michaelis_menten(
                self.kcat[R4],
                self.enzyme_at(EnzymePool::Pka, t),
                atr,
                self.km[R4],
                kappa.pka,
            );
            let v13_tr = competitive_michaelis_menten(
                self.kcat[R13],
                self.enzymes.pkc_M,
                atr,
                self.km[R13],
                kappa.pkc,
            );
            Conversion::new(Species::Atr, Species::AB).apply(layout, dydt, v4_tr);
            Conversion::new(Species::Atr, Species::AD).apply(layout, dydt, v13_tr);
        }

        if let Some(rsk2) = rsk2 {
            let enzyme = self.enzymes.rsk2_M;
            let p0 = self.conc(y, Species::P0);
            let d = self.conc(y, Species::D);
            let v31 = rsk2_saturation(rsk2.kcat31_per_sec, enzyme, p0, rsk2.km31_M, d, rsk2.km32_M);
            let v32 = rsk2_saturation(rsk2.kcat32_per_sec, enzyme, d, rsk2.km32_M, p0, rsk2.km31_M);
            Conversion::new(Species::P0, Species::A).apply(layout, dydt, v31);
            Conversion::new(Species::D, Species::AD).apply(layout, dydt, v32);
        }
    }
}
