//! Reference vaccines with their booster intervals.
//!
//! Picking a reference vaccine fills the vaccination form and lets the next
//! due date be computed instead of typed. Search is forgiving of typos:
//! substring and alias hits score 1.0, everything else is scored with
//! Jaro-Winkler similarity against the name, its words and the aliases.

use serde::{Deserialize, Serialize};
use strsim::jaro_winkler;

use crate::models::VaccineCategory;

/// Minimum similarity for a fuzzy hit.
const MIN_SCORE: f64 = 0.80;

/// A vaccine from the built-in reference list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferenceVaccine {
    pub name: String,
    pub aliases: Vec<String>,
    /// Species it is given to; empty means any
    pub species: Vec<String>,
    pub category: VaccineCategory,
    pub booster_interval: Option<String>,
}

impl ReferenceVaccine {
    fn new(
        name: &str,
        aliases: &[&str],
        species: &[&str],
        category: VaccineCategory,
        booster_interval: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            species: species.iter().map(|s| s.to_string()).collect(),
            category,
            booster_interval: Some(booster_interval.to_string()),
        }
    }

    /// Whether the vaccine is given to `species` (case-insensitive).
    pub fn applies_to(&self, species: &str) -> bool {
        let species = species.trim().to_lowercase();
        self.species.is_empty() || self.species.iter().any(|s| s.to_lowercase() == species)
    }

    /// Match quality of `query` (already lowercased) against this vaccine, 0.0 - 1.0.
    fn score(&self, query: &str) -> f64 {
        let name = self.name.to_lowercase();
        if name.contains(query) {
            return 1.0;
        }

        let aliases: Vec<String> = self.aliases.iter().map(|a| a.to_lowercase()).collect();
        if aliases.iter().any(|alias| alias.contains(query)) {
            return 1.0;
        }

        std::iter::once(name.as_str())
            .chain(name.split(|c: char| !c.is_alphanumeric()))
            .chain(aliases.iter().map(String::as_str))
            .filter(|candidate| !candidate.is_empty())
            .map(|candidate| jaro_winkler(query, candidate))
            .fold(0.0, f64::max)
    }
}

/// A vaccine search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceMatch {
    pub vaccine: ReferenceVaccine,
    pub score: f64,
}

/// Searchable list of reference vaccines.
#[derive(Debug, Clone)]
pub struct ReferenceCatalog {
    vaccines: Vec<ReferenceVaccine>,
}

impl Default for ReferenceCatalog {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ReferenceCatalog {
    /// Catalog over the given vaccines.
    pub fn new(vaccines: Vec<ReferenceVaccine>) -> Self {
        Self { vaccines }
    }

    /// Catalog with the built-in canine and feline vaccines.
    pub fn with_defaults() -> Self {
        Self::new(Self::default_vaccines())
    }

    pub fn vaccines(&self) -> &[ReferenceVaccine] {
        &self.vaccines
    }

    /// Add a vaccine, e.g. one configured by a clinic.
    pub fn add(&mut self, vaccine: ReferenceVaccine) {
        self.vaccines.push(vaccine);
    }

    /// Find a vaccine by exact name (case-insensitive).
    pub fn find(&self, name: &str) -> Option<&ReferenceVaccine> {
        let name = name.trim().to_lowercase();
        self.vaccines.iter().find(|v| v.name.to_lowercase() == name)
    }

    /// Search by name or alias, best match first.
    ///
    /// A blank query lists every vaccine for the species in catalog order.
    pub fn search(&self, query: &str, species: Option<&str>, limit: usize) -> Vec<ReferenceMatch> {
        let query = query.trim().to_lowercase();

        let mut matches: Vec<ReferenceMatch> = self
            .vaccines
            .iter()
            .filter(|v| species.map_or(true, |s| v.applies_to(s)))
            .map(|v| ReferenceMatch {
                score: if query.is_empty() { 1.0 } else { v.score(&query) },
                vaccine: v.clone(),
            })
            .filter(|m| m.score >= MIN_SCORE)
            .collect();

        // Sort by score descending; stable so ties keep catalog order
        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(limit);
        matches
    }

    fn default_vaccines() -> Vec<ReferenceVaccine> {
        use VaccineCategory::{Core, Lifestyle, NonCore};

        vec![
            // Both species
            ReferenceVaccine::new("Rabies (1-year)", &["rabies"], &["canine", "feline"], Core, "12 months"),
            ReferenceVaccine::new("Rabies (3-year)", &["rabies"], &["canine", "feline"], Core, "3 years"),
            // Canine
            ReferenceVaccine::new("DHPP", &["da2pp", "dapp", "distemper", "parvovirus", "parvo"], &["canine"], Core, "3 years"),
            ReferenceVaccine::new("Bordetella", &["kennel cough"], &["canine"], Lifestyle, "12 months"),
            ReferenceVaccine::new("Leptospirosis", &["lepto"], &["canine"], NonCore, "12 months"),
            ReferenceVaccine::new("Lyme Disease", &["borrelia", "lyme"], &["canine"], NonCore, "12 months"),
            ReferenceVaccine::new("Canine Influenza", &["civ", "dog flu", "h3n2", "h3n8"], &["canine"], Lifestyle, "12 months"),
            // Feline
            ReferenceVaccine::new("FVRCP", &["feline distemper", "panleukopenia", "calicivirus"], &["feline"], Core, "3 years"),
            ReferenceVaccine::new("FeLV", &["feline leukemia"], &["feline"], NonCore, "12 months"),
        ]
    }
}
