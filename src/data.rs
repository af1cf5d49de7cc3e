//! Evidence table loading
//!
//! CSV-backed collaborators loaded eagerly with Polars:
//! - [`ConservationTable`]: chrom, pos, phylop, phastcons
//! - [`FrequencyTable`]: chrom, pos, ref, alt, af, af_<POP>...
//! - [`load_variant_requests`]: one scoring request per row
//!
//! Every column is read as a string and parsed per field, so a stray "NA" or
//! empty cell stays a missing value instead of failing type inference for the
//! whole column.

use anyhow::{Context, Result};
use polars::prelude::*;
use rustc_hash::FxHashMap;
use std::path::Path;

use crate::amplifiers::conservation::ConservationSource;
use crate::amplifiers::frequency::{FrequencySource, POPULATIONS};
use crate::evidence::{ConservationScores, EvidenceContext, FrequencyRecord};
use crate::scorer::VariantRequest;
use crate::types::GenomicCoordinate;

fn read_csv(path: &Path) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .with_context(|| format!("Failed to create CSV reader: {:?}", path))?
        .finish()
        .with_context(|| format!("Failed to load CSV: {:?}", path))
}

fn required<'a>(df: &'a DataFrame, name: &str) -> Result<&'a StringChunked> {
    df.column(name)
        .with_context(|| format!("Column '{}' not found", name))?
        .str()
        .with_context(|| format!("Column '{}' is not string type", name))
}

fn optional<'a>(df: &'a DataFrame, name: &str) -> Option<&'a StringChunked> {
    df.column(name).ok().and_then(|c| c.str().ok())
}

/// Trimmed, non-empty, not an NA marker
fn cell<'a>(column: Option<&'a StringChunked>, idx: usize) -> Option<&'a str> {
    column
        .and_then(|c| c.get(idx))
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("na") && *s != ".")
}

fn parse_f64(column: Option<&StringChunked>, idx: usize, name: &str) -> Result<Option<f64>> {
    cell(column, idx)
        .map(|s| {
            s.parse::<f64>()
                .with_context(|| format!("row {}: '{}' is not a number in column '{}'", idx + 1, s, name))
        })
        .transpose()
}

fn parse_pos(column: &StringChunked, idx: usize) -> Result<u64> {
    let raw = cell(Some(column), idx).with_context(|| format!("row {}: missing pos", idx + 1))?;
    raw.replace(',', "")
        .parse::<u64>()
        .with_context(|| format!("row {}: '{}' is not a genomic position", idx + 1, raw))
}

/// In-memory phyloP / phastCons table keyed by normalized site
#[derive(Debug, Default)]
pub struct ConservationTable {
    rows: FxHashMap<(String, u64), ConservationScores>,
}

impl ConservationTable {
    pub fn load_csv(path: &Path) -> Result<Self> {
        let df = read_csv(path)?;
        let chrom = required(&df, "chrom")?;
        let pos = required(&df, "pos")?;
        let phylop = optional(&df, "phylop");
        let phastcons = optional(&df, "phastcons");

        let mut rows = FxHashMap::default();
        for idx in 0..df.height() {
            let Some(c) = cell(Some(chrom), idx) else {
                continue;
            };
            let site = GenomicCoordinate::new(c, parse_pos(pos, idx)?);
            let scores = ConservationScores {
                phylop: parse_f64(phylop, idx, "phylop")?,
                phastcons: parse_f64(phastcons, idx, "phastcons")?,
            };
            rows.insert((site.chrom, site.pos), scores);
        }
        tracing::info!(path = ?path, rows = rows.len(), "loaded conservation table");
        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl ConservationSource for ConservationTable {
    fn conservation(&self, chrom: &str, pos: u64) -> Option<ConservationScores> {
        let site = GenomicCoordinate::new(chrom, pos);
        self.rows.get(&(site.chrom, site.pos)).copied()
    }
}

struct FrequencyRow {
    site: GenomicCoordinate,
    record: FrequencyRecord,
}

/// Allele frequencies from one named database (gnomad, clinvar, local_vcf...)
pub struct FrequencyTable {
    name: String,
    rows: FxHashMap<(String, u64), Vec<FrequencyRow>>,
}

impl FrequencyTable {
    pub fn load_csv(path: &Path, name: &str) -> Result<Self> {
        let df = read_csv(path)?;
        let chrom = required(&df, "chrom")?;
        let pos = required(&df, "pos")?;
        let af = required(&df, "af")?;
        let ref_allele = optional(&df, "ref");
        let alt_allele = optional(&df, "alt");
        let population_columns: Vec<(&str, &StringChunked)> = POPULATIONS
            .iter()
            .filter_map(|pop| optional(&df, &format!("af_{}", pop.to_ascii_lowercase())).map(|c| (*pop, c)))
            .collect();

        let mut rows: FxHashMap<(String, u64), Vec<FrequencyRow>> = FxHashMap::default();
        let mut count = 0usize;
        for idx in 0..df.height() {
            let (Some(c), Some(global_af)) = (cell(Some(chrom), idx), parse_f64(Some(af), idx, "af")?) else {
                continue;
            };
            let mut site = GenomicCoordinate::new(c, parse_pos(pos, idx)?);
            if let (Some(r), Some(a)) = (cell(ref_allele, idx), cell(alt_allele, idx)) {
                site = site.with_alleles(r, a);
            }
            let mut record = FrequencyRecord::new(global_af);
            record.source = Some(name.to_string());
            for (pop, column) in &population_columns {
                if let Some(value) = parse_f64(Some(*column), idx, pop)? {
                    record.population_af.insert(pop.to_string(), value);
                }
            }
            rows.entry((site.chrom.clone(), site.pos)).or_default().push(FrequencyRow { site, record });
            count += 1;
        }
        tracing::info!(path = ?path, source = name, rows = count, "loaded frequency table");
        Ok(Self { name: name.to_ascii_lowercase(), rows })
    }
}

impl FrequencySource for FrequencyTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn frequency(&self, site: &GenomicCoordinate) -> Option<FrequencyRecord> {
        self.rows
            .get(&(site.chrom.clone(), site.pos))?
            .iter()
            .find(|row| row.site.matches(site))
            .map(|row| row.record.clone())
    }
}

/// Parse one evidence cell; `Err` carries the reason it is unusable
fn evidence_cell(
    column: Option<&StringChunked>,
    idx: usize,
    name: &str,
    unit_interval: bool,
) -> std::result::Result<Option<f64>, String> {
    let Some(raw) = cell(column, idx) else {
        return Ok(None);
    };
    match raw.parse::<f64>() {
        Ok(v) if !v.is_finite() => Err(format!("{} '{}' is not finite", name, raw)),
        Ok(v) if unit_interval && !(0.0..=1.0).contains(&v) => {
            Err(format!("{} {} outside [0, 1]", name, v))
        }
        Ok(v) => Ok(Some(v)),
        Err(_) => Err(format!("{} '{}' is not a number", name, raw)),
    }
}

/// Load a batch of scoring requests
///
/// Required columns: gene, protein_change, sequence. Optional: id, chrom,
/// pos, protein_id, transcript, phylop, phastcons, af, subunits, go_terms
/// (pipe-separated), weights (JSON object).
///
/// An unusable evidence cell only degrades its own row: conservation or
/// frequency becomes `Unknown` with the reason, a bad subunit count or
/// position is dropped. Malformed weight overrides still stop the load.
pub fn load_variant_requests(path: &Path) -> Result<Vec<VariantRequest>> {
    let df = read_csv(path)?;
    let gene = required(&df, "gene")?;
    let change = required(&df, "protein_change")?;
    let sequence = required(&df, "sequence")?;
    let id = optional(&df, "id");
    let chrom = optional(&df, "chrom");
    let pos = optional(&df, "pos");
    let protein_id = optional(&df, "protein_id");
    let transcript = optional(&df, "transcript");
    let phylop = optional(&df, "phylop");
    let phastcons = optional(&df, "phastcons");
    let af = optional(&df, "af");
    let subunits = optional(&df, "subunits");
    let go_terms = optional(&df, "go_terms");
    let weights = optional(&df, "weights");

    let mut requests = Vec::with_capacity(df.height());
    let mut degraded = 0usize;
    for idx in 0..df.height() {
        let row = idx + 1;
        let mut problems = Vec::new();
        let mut builder = EvidenceContext::builder();
        if let Some(p) = cell(protein_id, idx) {
            builder = builder.protein_id(p);
        }

        match (evidence_cell(phylop, idx, "phylop", false), evidence_cell(phastcons, idx, "phastcons", true)) {
            (Ok(None), Ok(None)) => {}
            (Ok(p), Ok(c)) => builder = builder.conservation(p, c),
            (Err(reason), _) | (_, Err(reason)) => {
                builder = builder.conservation_unknown(format!("unusable input: {}", reason));
                problems.push(reason);
            }
        }
        match evidence_cell(af, idx, "af", true) {
            Ok(Some(af)) => builder = builder.allele_frequency(af),
            Ok(None) => {}
            Err(reason) => {
                builder = builder.frequency_unknown(format!("unusable input: {}", reason));
                problems.push(reason);
            }
        }
        if let Some(k) = cell(subunits, idx) {
            match k.parse::<u32>() {
                Ok(k) if k >= 1 => builder = builder.subunits(k),
                _ => problems.push(format!("subunits '{}' is not a positive count", k)),
            }
        }
        if let Some(terms) = cell(go_terms, idx) {
            builder = builder.go_terms(terms.split('|').map(str::trim).filter(|t| !t.is_empty()));
        }
        if let Some(json) = cell(weights, idx) {
            let overrides: FxHashMap<String, f64> = serde_json::from_str(json)
                .with_context(|| format!("row {}: weights is not a JSON object of numbers", row))?;
            for (key, value) in overrides {
                builder = builder.weight(key, value);
            }
        }
        let context = builder.build().with_context(|| format!("row {}: invalid weight overrides", row))?;

        let coordinate = match (cell(chrom, idx), pos) {
            (Some(c), Some(p)) if cell(Some(p), idx).is_some() => match parse_pos(p, idx) {
                Ok(p) => Some(GenomicCoordinate::new(c, p)),
                Err(e) => {
                    problems.push(e.to_string());
                    None
                }
            },
            _ => None,
        };

        if !problems.is_empty() {
            degraded += 1;
            tracing::warn!(row, problems = ?problems, "unusable evidence cells; row kept without them");
        }

        requests.push(VariantRequest {
            id: cell(id, idx).map_or_else(|| format!("row{}", row), str::to_string),
            gene: cell(Some(gene), idx).unwrap_or_default().to_string(),
            protein_change: cell(Some(change), idx).unwrap_or_default().to_string(),
            sequence: cell(Some(sequence), idx).unwrap_or_default().to_string(),
            transcript: cell(transcript, idx).map(str::to_string),
            coordinate,
            context,
        });
    }
    tracing::info!(path = ?path, requests = requests.len(), degraded, "loaded variant requests");
    Ok(requests)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("vms_{}_{}.csv", std::process::id(), name));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_conservation_table_normalizes_chrom() {
        let path = write_temp("cons", "chrom,pos,phylop,phastcons\n17,7674220,7.5,1.0\nchr1,100,NA,0.2\n");
        let table = ConservationTable::load_csv(&path).unwrap();
        assert_eq!(table.len(), 2);
        let hit = table.conservation("chr17", 7674220).unwrap();
        assert_eq!(hit.phylop, Some(7.5));
        assert_eq!(table.conservation("1", 100).unwrap().phylop, None);
        assert!(table.conservation("chr2", 1).is_none());
    }

    #[test]
    fn test_frequency_table_matches_alleles() {
        let path = write_temp(
            "freq",
            "chrom,pos,ref,alt,af,af_nfe\nchr17,7674220,C,T,0.00002,0.00003\nchr17,7674220,C,A,0.2,\n",
        );
        let table = FrequencyTable::load_csv(&path, "gnomAD").unwrap();
        assert_eq!(table.name(), "gnomad");

        let site = GenomicCoordinate::new("17", 7674220).with_alleles("C", "T");
        let record = table.frequency(&site).unwrap();
        assert_eq!(record.global_af, 0.00002);
        assert_eq!(record.population_af.get("NFE"), Some(&0.00003));
        assert_eq!(record.source.as_deref(), Some("gnomAD"));

        let other = GenomicCoordinate::new("17", 7674220).with_alleles("C", "A");
        assert_eq!(table.frequency(&other).unwrap().global_af, 0.2);
    }

    #[test]
    fn test_variant_requests_build_context() {
        let path = write_temp(
            "req",
            "id,gene,protein_change,sequence,chrom,pos,phylop,af,subunits,go_terms\n\
             v1,TP53,R3H,MARK,17,7674220,6.1,0.00001,4,DNA binding|protein tetramerization\n\
             v2,X,bogus,MAK,,,,,,\n",
        );
        let requests = load_variant_requests(&path).unwrap();
        assert_eq!(requests.len(), 2);
        let first = &requests[0];
        assert_eq!(first.id, "v1");
        assert_eq!(first.coordinate.as_ref().map(|c| c.chrom.as_str()), Some("chr17"));
        assert_eq!(first.context.stoichiometry().explicit_k, Some(4));
        assert_eq!(first.context.go_terms().len(), 2);
        assert!(requests[1].coordinate.is_none());
    }

    #[test]
    fn test_bad_evidence_cell_keeps_row() {
        let path = write_temp(
            "bad",
            "id,gene,protein_change,sequence,af,phylop,subunits\n\
             good,X,A2V,MAK,0.0001,3.1,2\n\
             high_af,X,A2V,MAK,1.5,inf,zero\n\
             text_af,X,A2V,MAK,abc,,\n",
        );
        let requests = load_variant_requests(&path).unwrap();
        assert_eq!(requests.len(), 3);

        assert_eq!(requests[0].context.frequency().known().map(|r| r.global_af), Some(0.0001));
        assert_eq!(requests[0].context.stoichiometry().explicit_k, Some(2));

        let high = &requests[1].context;
        assert!(high.frequency().unknown_reason().unwrap().contains("outside [0, 1]"));
        assert!(high.conservation().unknown_reason().unwrap().contains("not finite"));
        assert_eq!(high.stoichiometry().explicit_k, None);

        let text = &requests[2].context;
        assert!(text.frequency().unknown_reason().unwrap().contains("not a number"));
        assert!(text.conservation().known().is_none());
    }

    #[test]
    fn test_bad_weights_fail_load() {
        let path = write_temp("weights", "gene,protein_change,sequence,weights\nX,A2V,MAK,\"{\"\"lof.bogus\"\": 1}\"\n");
        let err = load_variant_requests(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("row 1"));
    }
}
