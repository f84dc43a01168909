//! Canonical topic taxonomy and per-backend label aliases.
//!
//! Each entry carries its own backend aliases, so a misaligned vocabulary
//! is unrepresentable; validation still rejects duplicate or empty labels
//! at startup rather than truncating silently at call time.

use crate::errors::SignalError;

/// One canonical topic with the labels the individual backends speak.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxonomyEntry {
    /// The label every backend result is translated into.
    pub canonical: String,
    /// Wording used in the numbered completion prompt.
    pub prompt_label: String,
    /// Single-word French label the zero-shot service scores against.
    pub zeste_label: String,
}

impl TaxonomyEntry {
    fn new(canonical: &str, prompt_label: &str, zeste_label: &str) -> Self {
        Self {
            canonical: canonical.to_string(),
            prompt_label: prompt_label.to_string(),
            zeste_label: zeste_label.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Taxonomy {
    entries: Vec<TaxonomyEntry>,
}

impl Taxonomy {
    /// Validates and wraps a set of entries.
    ///
    /// # Errors
    /// Returns [`SignalError::TaxonomyMismatch`] when the set is empty or
    /// any column contains an empty or duplicate label.
    pub fn new(entries: Vec<TaxonomyEntry>) -> Result<Self, SignalError> {
        if entries.is_empty() {
            return Err(SignalError::TaxonomyMismatch(
                "taxonomy must not be empty".to_string(),
            ));
        }

        let columns: [(&str, fn(&TaxonomyEntry) -> &str); 3] = [
            ("canonical", |entry| entry.canonical.as_str()),
            ("prompt", |entry| entry.prompt_label.as_str()),
            ("zeste", |entry| entry.zeste_label.as_str()),
        ];
        for (column, project) in columns {
            let mut seen = Vec::with_capacity(entries.len());
            for entry in &entries {
                let label = project(entry);
                if label.is_empty() {
                    return Err(SignalError::TaxonomyMismatch(format!(
                        "empty {column} label for canonical entry {:?}",
                        entry.canonical
                    )));
                }
                if seen.contains(&label) {
                    return Err(SignalError::TaxonomyMismatch(format!(
                        "duplicate {column} label: {label}"
                    )));
                }
                seen.push(label);
            }
        }

        Ok(Self { entries })
    }

    /// The eleven-topic French business-news taxonomy.
    ///
    /// # Errors
    /// Returns [`SignalError::TaxonomyMismatch`] if the built-in table is
    /// inconsistent.
    pub fn french_business_news() -> Result<Self, SignalError> {
        Self::new(vec![
            TaxonomyEntry::new("Rachat / Cession", "Rachat / Cession", "rachat"),
            TaxonomyEntry::new("Levée de fonds", "Levée de fonds", "bienfaisance"),
            TaxonomyEntry::new(
                "Nouvelle implantation",
                "Nouvelle implantation",
                "implantation",
            ),
            TaxonomyEntry::new(
                "Changement de Dirigeant",
                "Changement de Dirigeant",
                "passation",
            ),
            TaxonomyEntry::new(
                "Procédure de sauvegarde",
                "Procédure de sauvegarde",
                "banqueroute",
            ),
            TaxonomyEntry::new("Fermeture de site", "Fermeture de site", "fermeture"),
            TaxonomyEntry::new(
                "Création d\u{2019}emploi / recrutement",
                "Création d'emploi / recrutement",
                "recrutement",
            ),
            TaxonomyEntry::new(
                "Extension géographique",
                "Extension géographique",
                "territoire",
            ),
            TaxonomyEntry::new("Investissement", "Investissement", "investissement"),
            TaxonomyEntry::new(
                "Nouvelle activité / produit",
                "Nouvelle activité / produit",
                "innovation",
            ),
            TaxonomyEntry::new(
                "Projet d\u{2019}acquisition",
                "Projet d'acquisition",
                "acquisition",
            ),
        ])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Canonical label for a 1-indexed prompt position; `None` when out of
    /// range.
    #[must_use]
    pub fn canonical_by_number(&self, number: usize) -> Option<&str> {
        if number == 0 {
            return None;
        }
        self.entries
            .get(number - 1)
            .map(|entry| entry.canonical.as_str())
    }

    /// The numbered option list embedded in completion prompts.
    #[must_use]
    pub fn prompt_options(&self) -> String {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, entry)| format!("{}. {}", i + 1, entry.prompt_label))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[must_use]
    pub fn zeste_labels(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|entry| entry.zeste_label.clone())
            .collect()
    }

    #[must_use]
    pub fn canonical_for_zeste(&self, label: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.zeste_label == label)
            .map(|entry| entry.canonical.as_str())
    }
}
