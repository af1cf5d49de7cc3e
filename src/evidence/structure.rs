//! Per-residue structure model supplied by a collaborator
//!
//! Holds Cα coordinates and the per-residue confidence (pLDDT, 0-100) for one
//! chain. Parsing model files happens upstream; this type only answers
//! neighbourhood queries for the DN complex-poisoning score.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// One residue's Cα position and model confidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResidueCoord {
    /// 1-based residue number
    pub number: usize,
    pub residue: char,
    pub ca: [f64; 3],
    pub plddt: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<ResidueCoord>", into = "Vec<ResidueCoord>")]
pub struct StructureModel {
    residues: Vec<ResidueCoord>,
    index: FxHashMap<usize, usize>,
}

impl From<Vec<ResidueCoord>> for StructureModel {
    fn from(residues: Vec<ResidueCoord>) -> Self {
        let index = residues
            .iter()
            .enumerate()
            .map(|(i, r)| (r.number, i))
            .collect();
        Self { residues, index }
    }
}

impl From<StructureModel> for Vec<ResidueCoord> {
    fn from(model: StructureModel) -> Self {
        model.residues
    }
}

/// Counts around one residue used as surface/interface proxies
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Neighbourhood {
    pub within_8a: usize,
    pub charged_within_12a: usize,
    pub hydrophobic_within_12a: usize,
}

fn distance(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    (dx * dx + dy * dy + dz * dz).sqrt()
}

impl StructureModel {
    pub fn residue(&self, number: usize) -> Option<&ResidueCoord> {
        self.index.get(&number).map(|&i| &self.residues[i])
    }

    pub fn plddt(&self, number: usize) -> Option<f64> {
        self.residue(number).map(|r| r.plddt)
    }

    pub fn len(&self) -> usize {
        self.residues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }

    /// Neighbour counts around residue `number`; `None` if it is not modelled
    pub fn neighbourhood(&self, number: usize) -> Option<Neighbourhood> {
        let centre = self.residue(number)?;
        let mut counts = Neighbourhood::default();

        for other in self.residues.iter().filter(|r| r.number != number) {
            let d = distance(&centre.ca, &other.ca);
            if d <= 8.0 {
                counts.within_8a += 1;
            }
            if d <= 12.0 {
                let props = crate::utils::properties(other.residue);
                if props.is_some_and(|p| p.is_charged()) {
                    counts.charged_within_12a += 1;
                }
                if props.is_some_and(|p| p.hydrophobic) {
                    counts.hydrophobic_within_12a += 1;
                }
            }
        }
        Some(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(n: usize, residue: char, x: f64) -> ResidueCoord {
        ResidueCoord { number: n, residue, ca: [x, 0.0, 0.0], plddt: 80.0 }
    }

    #[test]
    fn test_neighbourhood_counts() {
        let model = StructureModel::from(vec![
            line(1, 'K', 0.0),
            line(2, 'L', 3.8),
            line(3, 'E', 7.6),
            line(4, 'V', 11.4),
            line(5, 'R', 40.0),
        ]);
        let n = model.neighbourhood(1).unwrap();
        assert_eq!(n.within_8a, 2);
        assert_eq!(n.charged_within_12a, 1);
        assert_eq!(n.hydrophobic_within_12a, 2);
        assert!(model.neighbourhood(9).is_none());
    }

    #[test]
    fn test_deserialize_from_residue_list() {
        let json = r#"[{"number": 7, "residue": "G", "ca": [1.0, 2.0, 3.0], "plddt": 91.5}]"#;
        let model: StructureModel = serde_json::from_str(json).unwrap();
        assert_eq!(model.plddt(7), Some(91.5));
        assert_eq!(model.len(), 1);
    }
}
