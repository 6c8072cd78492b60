use super::selection::AtomScheme;

/// Fixed-width atom records that define atom order and the non-coordinate
/// payload reused for every projected frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Template {
    /// Upper-cased file stem, used as the ensemble header line.
    pub name: Option<String>,
    /// Atom records without line terminators, in file order.
    pub records: Vec<String>,
}

impl Template {
    pub fn new(name: Option<String>, records: Vec<String>) -> Self {
        Self { name, records }
    }

    #[inline]
    pub fn atom_count(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn record(&self, index: usize) -> Option<&str> {
        self.records.get(index).map(String::as_str)
    }

    /// Zero-based indices of the atoms in residue `residue_number` that the
    /// scheme admits. Residue numbers come from columns [22,26), atom names
    /// from columns [12,16).
    pub fn select(&self, residue_number: i32, scheme: AtomScheme) -> Vec<usize> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, rec)| {
                rec.get(22..26)
                    .and_then(|s| s.trim().parse::<i32>().ok())
                    .is_some_and(|n| n == residue_number)
            })
            .filter(|(_, rec)| scheme.includes(rec.get(12..16).unwrap_or("")))
            .map(|(i, _)| i)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Template {
        Template::new(
            Some("GLY".into()),
            vec![
                "ATOM      1  N   GLY A   1      -0.966   0.493   1.500  1.00  0.00           N"
                    .into(),
                "ATOM      2  CA  GLY A   1       0.257   0.418   0.692  1.00  0.00           C"
                    .into(),
                "ATOM      3  C   GLY A   1      -0.094   0.017  -0.716  1.00  0.00           C"
                    .into(),
                "ATOM      4  N   ALA A   2       1.121   0.222  -1.212  1.00  0.00           N"
                    .into(),
            ],
        )
    }

    #[test]
    fn counts_records() {
        assert_eq!(sample().atom_count(), 4);
        assert!(sample().record(4).is_none());
    }

    #[test]
    fn selects_all_atoms_of_residue() {
        assert_eq!(sample().select(1, AtomScheme::All), vec![0, 1, 2]);
        assert_eq!(sample().select(2, AtomScheme::All), vec![3]);
    }

    #[test]
    fn selects_backbone_atoms_only() {
        assert_eq!(sample().select(1, AtomScheme::Backbone), vec![0, 2]);
    }

    #[test]
    fn unknown_residue_selects_nothing() {
        assert!(sample().select(9, AtomScheme::All).is_empty());
    }
}
