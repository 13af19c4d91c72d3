//! cMyBP-C phosphorylation states and their position in the state vector.
//!
//! The M-domain of cMyBP-C carries four phospho-sites that are modified in a
//! fixed order by PKA (alpha, beta, gamma) and PKC (delta). Each state vector
//! entry is the concentration (mol/L) of one combination of modified sites:
//!
//! | Layout | Order |
//! |--------|-------|
//! | 8 species | `P0, A, AB, ABG, D, AD, ABD, ABGD` |
//! | 9 species | `P0, A, Atr, AB, ABG, D, AD, ABD, ABGD` |
//!
//! `Atr` is the transiently structured alpha-phosphorylated form produced by
//! dephosphorylation of the beta site in the structural-transition models.
//!
//! Reference: Kampourakis T, Ponnam S, Koch D. bioRxiv 2023.02.24.529959

/// Phosphorylation state of a single cMyBP-C molecule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Species {
    /// Unphosphorylated
    P0,
    /// alpha
    A,
    /// alpha, transiently structured
    Atr,
    /// alpha + beta
    AB,
    /// alpha + beta + gamma
    ABG,
    /// delta
    D,
    /// alpha + delta
    AD,
    /// alpha + beta + delta
    ABD,
    /// all four sites
    ABGD,
}

impl Species {
    /// Number of phosphorylated sites
    pub fn phospho_count(self) -> usize {
        match self {
            Species::P0 => 0,
            Species::A | Species::Atr | Species::D => 1,
            Species::AB | Species::AD => 2,
            Species::ABG | Species::ABD => 3,
            Species::ABGD => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Species::P0 => "P0",
            Species::A => "A",
            Species::Atr => "Atr",
            Species::AB => "AB",
            Species::ABG => "ABG",
            Species::D => "D",
            Species::AD => "AD",
            Species::ABD => "ABD",
            Species::ABGD => "ABGD",
        }
    }
}

/// Ordering of species in the state vector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateLayout {
    /// `P0, A, AB, ABG, D, AD, ABD, ABGD`
    Eight,
    /// `P0, A, Atr, AB, ABG, D, AD, ABD, ABGD`
    Nine,
}

const EIGHT: [Species; 8] = [
    Species::P0,
    Species::A,
    Species::AB,
    Species::ABG,
    Species::D,
    Species::AD,
    Species::ABD,
    Species::ABGD,
];

const NINE: [Species; 9] = [
    Species::P0,
    Species::A,
    Species::Atr,
    Species::AB,
    Species::ABG,
    Species::D,
    Species::AD,
    Species::ABD,
    Species::ABGD,
];

impl StateLayout {
    /// Layout for a state vector of the given length, if any
    pub fn from_len(len: usize) -> Option<Self> {
        match len {
            8 => Some(StateLayout::Eight),
            9 => Some(StateLayout::Nine),
            _ => None,
        }
    }

    /// Length of the state vector
    pub fn len(self) -> usize {
        self.species().len()
    }

    /// Species in state-vector order
    pub fn species(self) -> &'static [Species] {
        match self {
            StateLayout::Eight => &EIGHT,
            StateLayout::Nine => &NINE,
        }
    }

    /// Position of a species in the state vector.
    ///
    /// Returns `None` for `Atr` in the 8-species layout.
    #[inline]
    pub fn index(self, species: Species) -> Option<usize> {
        let offset = match self {
            StateLayout::Eight => 0,
            StateLayout::Nine => 1,
        };
        match species {
            Species::P0 => Some(0),
            Species::A => Some(1),
            Species::Atr => match self {
                StateLayout::Eight => None,
                StateLayout::Nine => Some(2),
            },
            Species::AB => Some(2 + offset),
            Species::ABG => Some(3 + offset),
            Species::D => Some(4 + offset),
            Species::AD => Some(5 + offset),
            Species::ABD => Some(6 + offset),
            Species::ABGD => Some(7 + offset),
        }
    }

    /// State vector with all mass in the unphosphorylated form
    pub fn unphosphorylated(self, total_M: f64) -> Vec<f64> {
        let mut state = vec![0.0; self.len()];
        state[0] = total_M;
        state
    }

    /// Rows that make up one phosphorylation level
    pub fn level_rows(self, level: PhosphoLevel) -> Vec<usize> {
        self.species()
            .iter()
            .enumerate()
            .filter(|(_, s)| s.phospho_count() == level.count())
            .map(|(i, _)| i)
            .collect()
    }
}

/// Aggregate phosphorylation level (number of modified sites)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhosphoLevel {
    Zero,
    One,
    Two,
    Three,
    Four,
}

impl PhosphoLevel {
    /// All levels from unphosphorylated to fully phosphorylated
    pub const ALL: [PhosphoLevel; 5] = [
        PhosphoLevel::Zero,
        PhosphoLevel::One,
        PhosphoLevel::Two,
        PhosphoLevel::Three,
        PhosphoLevel::Four,
    ];

    pub fn count(self) -> usize {
        match self {
            PhosphoLevel::Zero => 0,
            PhosphoLevel::One => 1,
            PhosphoLevel::Two => 2,
            PhosphoLevel::Three => 3,
            PhosphoLevel::Four => 4,
        }
    }

    /// Level with `n` modified sites
    pub fn from_count(n: usize) -> Option<Self> {
        Self::ALL.get(n).copied()
    }

    /// Short label used in exports ("0P" ... "4P")
    pub fn label(self) -> &'static str {
        match self {
            PhosphoLevel::Zero => "0P",
            PhosphoLevel::One => "1P",
            PhosphoLevel::Two => "2P",
            PhosphoLevel::Three => "3P",
            PhosphoLevel::Four => "4P",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_matches_species_order() {
        for layout in [StateLayout::Eight, StateLayout::Nine] {
            for (i, species) in layout.species().iter().enumerate() {
                assert_eq!(layout.index(*species), Some(i), "{:?} in {:?}", species, layout);
            }
        }
        assert_eq!(StateLayout::Eight.index(Species::Atr), None);
    }

    #[test]
    fn test_level_rows_eight() {
        let layout = StateLayout::Eight;
        assert_eq!(layout.level_rows(PhosphoLevel::Zero), vec![0]);
        assert_eq!(layout.level_rows(PhosphoLevel::One), vec![1, 4]);
        assert_eq!(layout.level_rows(PhosphoLevel::Two), vec![2, 5]);
        assert_eq!(layout.level_rows(PhosphoLevel::Three), vec![3, 6]);
        assert_eq!(layout.level_rows(PhosphoLevel::Four), vec![7]);
    }

    #[test]
    fn test_level_rows_nine() {
        let layout = StateLayout::Nine;
        assert_eq!(layout.level_rows(PhosphoLevel::Zero), vec![0]);
        assert_eq!(layout.level_rows(PhosphoLevel::One), vec![1, 2, 5]);
        assert_eq!(layout.level_rows(PhosphoLevel::Two), vec![3, 6]);
        assert_eq!(layout.level_rows(PhosphoLevel::Three), vec![4, 7]);
        assert_eq!(layout.level_rows(PhosphoLevel::Four), vec![8]);
    }

    #[test]
    fn test_from_len() {
        assert_eq!(StateLayout::from_len(8), Some(StateLayout::Eight));
        assert_eq!(StateLayout::from_len(9), Some(StateLayout::Nine));
        assert_eq!(StateLayout::from_len(7), None);
    }
}
