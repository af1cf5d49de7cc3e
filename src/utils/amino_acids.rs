//! Amino acid property table and Grantham substitution distances
//!
//! Every mechanism scorer judges chemical severity through this one module so
//! that LOF, DN and GOF never disagree about how drastic a substitution is.
//!
//! **Per-residue properties**:
//!   - size class (1 = Gly .. 6 = Trp)
//!   - formal side-chain charge at physiological pH (His counted as +0.5)
//!   - hydrophobic flag and Kyte-Doolittle hydropathy
//!   - backbone flexibility class (rigid / low / medium / high)
//!   - conservation tier used by the LOF conservation-class axis
//!   - stability class used by the GOF allosteric screen
//!   - side-chain volume (Å³, Zamyatnin)
//!
//! Grantham (1974) distances are stored as the upper triangle of the
//! canonical matrix; lookups are symmetric and never fail.

use serde::{Deserialize, Serialize};

/// Backbone flexibility class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flexibility {
    Rigid,
    Low,
    Medium,
    High,
}

impl Flexibility {
    pub fn rank(self) -> i32 {
        match self {
            Flexibility::Rigid => 0,
            Flexibility::Low => 1,
            Flexibility::Medium => 2,
            Flexibility::High => 3,
        }
    }
}

/// How often a residue type sits at functionally critical positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConservationTier {
    Critical,
    High,
    Medium,
    Low,
}

impl ConservationTier {
    pub fn score(self) -> f64 {
        match self {
            ConservationTier::Critical => 1.0,
            ConservationTier::High => 0.8,
            ConservationTier::Medium => 0.5,
            ConservationTier::Low => 0.2,
        }
    }

    pub fn is_high_or_critical(self) -> bool {
        matches!(self, ConservationTier::Critical | ConservationTier::High)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StabilityClass {
    Low,
    Medium,
    High,
}

/// Static properties of one standard residue
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResidueProperties {
    pub code: char,
    pub three_letter: &'static str,
    pub size: u8,
    pub charge: f64,
    pub hydrophobic: bool,
    pub hydropathy: f64,
    pub flexibility: Flexibility,
    pub conservation: ConservationTier,
    pub stability: StabilityClass,
    pub volume: f64,
}

impl ResidueProperties {
    pub fn is_aromatic(&self) -> bool {
        matches!(self.code, 'F' | 'W' | 'Y')
    }

    pub fn is_charged(&self) -> bool {
        self.charge.abs() >= 1.0
    }
}

macro_rules! residue {
    ($code:literal, $three:literal, $size:literal, $charge:literal, $hyd:literal, $kd:literal,
     $flex:ident, $cons:ident, $stab:ident, $vol:literal) => {
        ResidueProperties {
            code: $code,
            three_letter: $three,
            size: $size,
            charge: $charge,
            hydrophobic: $hyd,
            hydropathy: $kd,
            flexibility: Flexibility::$flex,
            conservation: ConservationTier::$cons,
            stability: StabilityClass::$stab,
            volume: $vol,
        }
    };
}

static RESIDUES: [ResidueProperties; 20] = [
    residue!('A', "Ala", 2, 0.0, true, 1.8, Medium, Medium, Medium, 88.6),
    residue!('R', "Arg", 5, 1.0, false, -4.5, High, High, Low, 173.4),
    residue!('N', "Asn", 3, 0.0, false, -3.5, High, Medium, Low, 114.1),
    residue!('D', "Asp", 3, -1.0, false, -3.5, High, High, Low, 111.1),
    residue!('C', "Cys", 2, 0.0, false, 2.5, Medium, Critical, Medium, 108.5),
    residue!('Q', "Gln", 4, 0.0, false, -3.5, High, Medium, Low, 143.8),
    residue!('E', "Glu", 4, -1.0, false, -3.5, High, High, Low, 138.4),
    residue!('G', "Gly", 1, 0.0, false, -0.4, High, Critical, Low, 60.1),
    residue!('H', "His", 4, 0.5, false, -3.2, High, High, Medium, 153.2),
    residue!('I', "Ile", 4, 0.0, true, 4.5, Low, Medium, High, 166.7),
    residue!('L', "Leu", 4, 0.0, true, 3.8, Low, Medium, High, 166.7),
    residue!('K', "Lys", 4, 1.0, false, -3.9, High, High, Low, 168.6),
    residue!('M', "Met", 4, 0.0, true, 1.9, Medium, Medium, Medium, 162.9),
    residue!('F', "Phe", 5, 0.0, true, 2.8, Low, High, High, 189.9),
    residue!('P', "Pro", 3, 0.0, false, -1.6, Rigid, Critical, High, 112.7),
    residue!('S', "Ser", 2, 0.0, false, -0.8, High, Low, Low, 89.0),
    residue!('T', "Thr", 3, 0.0, false, -0.7, Medium, Low, Medium, 116.1),
    residue!('W', "Trp", 6, 0.0, true, -0.9, Low, High, High, 227.8),
    residue!('Y', "Tyr", 5, 0.0, false, -1.3, Medium, High, High, 193.6),
    residue!('V', "Val", 3, 0.0, true, 4.2, Low, Medium, High, 140.0),
];

const MIN_VOLUME: f64 = 60.1;
const MAX_VOLUME: f64 = 227.8;
const HYDROPATHY_RANGE: f64 = 9.0;

/// Look up a standard residue (case-insensitive)
pub fn properties(aa: char) -> Option<&'static ResidueProperties> {
    let aa = aa.to_ascii_uppercase();
    RESIDUES.iter().find(|r| r.code == aa)
}

pub fn is_standard(aa: char) -> bool {
    properties(aa).is_some()
}

/// Map a three-letter code ("Arg", "ARG") to its one-letter code
pub fn from_three_letter(code: &str) -> Option<char> {
    RESIDUES
        .iter()
        .find(|r| r.three_letter.eq_ignore_ascii_case(code))
        .map(|r| r.code)
}

/// Physicochemical change between reference and alternate residue
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SubstitutionDelta {
    pub abs_charge_change: f64,
    /// |ΔKyte-Doolittle| / 9.0, clamped to [0, 1]
    pub abs_hydropathy_change: f64,
    /// |Δvolume| over the residue volume range, [0, 1]
    pub abs_volume_change: f64,
    pub abs_size_change: f64,
    pub abs_flexibility_change: i32,
    /// Positive when the alternate is less flexible than the reference
    pub flexibility_loss: i32,
    pub hydrophobicity_flip: bool,
    pub charge_class_flip: bool,
    pub proline_introduced: bool,
    pub proline_lost: bool,
    pub glycine_lost: bool,
    pub cysteine_gained: bool,
    pub cysteine_lost: bool,
    pub aromatic_gained: bool,
    pub aromatic_lost: bool,
}

impl SubstitutionDelta {
    pub fn involves_proline(&self) -> bool {
        self.proline_introduced || self.proline_lost
    }

    pub fn involves_cysteine(&self) -> bool {
        self.cysteine_gained || self.cysteine_lost
    }

    pub fn aromatic_change(&self) -> bool {
        self.aromatic_gained || self.aromatic_lost
    }
}

/// Compute the substitution delta. Non-standard residues give an all-zero delta.
pub fn delta(reference: char, alternate: char) -> SubstitutionDelta {
    let (Some(r), Some(a)) = (properties(reference), properties(alternate)) else {
        return SubstitutionDelta::default();
    };

    SubstitutionDelta {
        abs_charge_change: (r.charge - a.charge).abs(),
        abs_hydropathy_change: ((r.hydropathy - a.hydropathy).abs() / HYDROPATHY_RANGE).min(1.0),
        abs_volume_change: ((r.volume - a.volume).abs() / (MAX_VOLUME - MIN_VOLUME)).min(1.0),
        abs_size_change: (r.size as f64 - a.size as f64).abs(),
        abs_flexibility_change: (r.flexibility.rank() - a.flexibility.rank()).abs(),
        flexibility_loss: r.flexibility.rank() - a.flexibility.rank(),
        hydrophobicity_flip: r.hydrophobic != a.hydrophobic,
        charge_class_flip: r.is_charged() != a.is_charged(),
        proline_introduced: a.code == 'P' && r.code != 'P',
        proline_lost: r.code == 'P' && a.code != 'P',
        glycine_lost: r.code == 'G' && a.code != 'G',
        cysteine_gained: a.code == 'C' && r.code != 'C',
        cysteine_lost: r.code == 'C' && a.code != 'C',
        aromatic_gained: a.is_aromatic() && !r.is_aromatic(),
        aromatic_lost: r.is_aromatic() && !a.is_aromatic(),
    }
}

// Canonical Grantham row order; each row lists distances to the residues after it
const GRANTHAM_ORDER: [char; 20] = [
    'S', 'R', 'L', 'P', 'T', 'A', 'V', 'G', 'I', 'F', 'Y', 'C', 'H', 'Q', 'N', 'K', 'D', 'E', 'M', 'W',
];

const GRANTHAM_UPPER: [&[u16]; 19] = [
    &[110, 145, 74, 58, 99, 124, 56, 142, 155, 144, 112, 89, 68, 46, 121, 65, 80, 135, 177],
    &[102, 103, 71, 112, 96, 125, 97, 97, 77, 180, 29, 43, 86, 26, 96, 54, 91, 101],
    &[98, 92, 96, 32, 138, 5, 22, 36, 198, 99, 113, 153, 107, 172, 138, 15, 61],
    &[38, 27, 68, 42, 95, 114, 110, 169, 77, 76, 91, 103, 108, 93, 87, 147],
    &[58, 69, 59, 89, 103, 92, 149, 47, 42, 65, 78, 85, 65, 81, 128],
    &[64, 60, 94, 113, 112, 195, 86, 91, 111, 106, 126, 107, 84, 148],
    &[109, 29, 50, 55, 192, 84, 96, 133, 97, 152, 121, 21, 88],
    &[135, 153, 147, 159, 98, 87, 80, 127, 94, 98, 127, 184],
    &[21, 33, 198, 94, 109, 149, 102, 168, 134, 10, 61],
    &[22, 205, 100, 116, 158, 102, 177, 140, 28, 40],
    &[194, 83, 99, 143, 85, 160, 122, 36, 37],
    &[174, 154, 139, 202, 154, 170, 196, 215],
    &[24, 68, 32, 81, 40, 87, 115],
    &[46, 53, 61, 29, 101, 130],
    &[94, 23, 42, 142, 174],
    &[101, 56, 95, 110],
    &[45, 160, 181],
    &[126, 152],
    &[67],
];

/// Distance reported for pairs outside the table (non-standard residues)
pub const GRANTHAM_DEFAULT: u16 = 100;

/// Grantham distance, 0..=215. Symmetric, 0 on identity, never fails.
pub fn grantham(a: char, b: char) -> u16 {
    let a = a.to_ascii_uppercase();
    let b = b.to_ascii_uppercase();
    let (Some(i), Some(j)) = (
        GRANTHAM_ORDER.iter().position(|&c| c == a),
        GRANTHAM_ORDER.iter().position(|&c| c == b),
    ) else {
        return GRANTHAM_DEFAULT;
    };

    if i == j {
        return 0;
    }
    let (lo, hi) = if i < j { (i, j) } else { (j, i) };
    GRANTHAM_UPPER[lo][hi - lo - 1]
}

/// Shared severity tiering of a Grantham distance
pub fn grantham_severity(distance: u16) -> f64 {
    match distance {
        d if d >= 150 => 0.6,
        d if d >= 100 => 0.4,
        d if d >= 50 => 0.2,
        d if d >= 20 => 0.1,
        _ => 0.05,
    }
}
