//! Software version catalog: known versions per factory part number, and
//! comparison of a scanned module against the catalog

use std::collections::HashMap;

use log::info;

/// Outcome of comparing a module's software version against the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VersionComparison {
    /// The module already runs the highest version the catalog knows
    UpToDate {
        /// Highest catalog version for the part
        highest: String,
    },
    /// A newer version exists in the catalog
    UpdateAvailable {
        /// Highest catalog version for the part
        highest: String,
    },
    /// The module runs a version newer than anything in the catalog,
    /// usually meaning the catalog needs updating
    NewerThanCatalog {
        /// Highest catalog version for the part
        highest: String,
    },
    /// The part number is not in the catalog
    Unknown,
}

/// Known software versions keyed by factory part number.
///
/// Versions compare numerically when both sides are plain digit strings
/// (VAG flash versions usually are), falling back to lexical order for
/// alphanumeric version labels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VersionCatalog {
    entries: HashMap<String, Vec<String>>,
}

impl VersionCatalog {
    /// Creates an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog from (part number, version) pairs
    pub fn from_entries<I, P, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (P, V)>,
        P: Into<String>,
        V: Into<String>,
    {
        let mut catalog = Self::new();
        for (part, version) in entries {
            catalog.merge_observation(&part.into(), &version.into());
        }
        catalog
    }

    /// Returns the known versions for a part number, sorted ascending
    /// (numerically where possible)
    pub fn known_versions(&self, part_number: &str) -> Vec<String> {
        let mut versions = self
            .entries
            .get(part_number)
            .cloned()
            .unwrap_or_default();
        versions.sort_by(|a, b| match (a.parse::<u64>(), b.parse::<u64>()) {
            (Ok(x), Ok(y)) => x.cmp(&y),
            _ => a.cmp(b),
        });
        versions
    }

    /// Records a version observed on a vehicle. Returns true if the catalog
    /// did not know this part/version pair yet.
    pub fn merge_observation(&mut self, part_number: &str, version: &str) -> bool {
        if part_number.is_empty() || version.is_empty() {
            return false;
        }
        let versions = self.entries.entry(part_number.to_string()).or_default();
        if versions.iter().any(|v| v == version) {
            return false;
        }
        info!("Catalog learned version {version} for part {part_number}");
        versions.push(version.to_string());
        true
    }

    /// Compares a module's current version against the catalog for its part
    pub fn compare(&self, part_number: &str, current: &str) -> VersionComparison {
        let versions = self.known_versions(part_number);
        let Some(highest) = versions.last().cloned() else {
            return VersionComparison::Unknown;
        };
        let newer = match (current.parse::<u64>(), highest.parse::<u64>()) {
            (Ok(cur), Ok(high)) => cur.cmp(&high),
            _ => current.cmp(&highest),
        };
        match newer {
            std::cmp::Ordering::Greater => VersionComparison::NewerThanCatalog { highest },
            std::cmp::Ordering::Less => VersionComparison::UpdateAvailable { highest },
            std::cmp::Ordering::Equal => VersionComparison::UpToDate { highest },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> VersionCatalog {
        VersionCatalog::from_entries([
            ("5G0906259B", "8351"),
            ("5G0906259B", "9970"),
            ("5G0906259B", "0561"),
            ("3Q0907530K", "ZDC-1.2"),
            ("3Q0907530K", "ZDC-1.4"),
        ])
    }

    #[test]
    fn numeric_versions_sort_numerically() {
        assert_eq!(
            catalog().known_versions("5G0906259B"),
            vec!["0561", "8351", "9970"]
        );
    }

    #[test]
    fn compare_numeric() {
        let c = catalog();
        assert_eq!(
            c.compare("5G0906259B", "8351"),
            VersionComparison::UpdateAvailable {
                highest: "9970".into()
            }
        );
        assert_eq!(
            c.compare("5G0906259B", "9970"),
            VersionComparison::UpToDate {
                highest: "9970".into()
            }
        );
        assert_eq!(
            c.compare("5G0906259B", "9999"),
            VersionComparison::NewerThanCatalog {
                highest: "9970".into()
            }
        );
    }

    #[test]
    fn compare_lexical_fallback() {
        let c = catalog();
        assert_eq!(
            c.compare("3Q0907530K", "ZDC-1.2"),
            VersionComparison::UpdateAvailable {
                highest: "ZDC-1.4".into()
            }
        );
    }

    #[test]
    fn unknown_part() {
        assert_eq!(catalog().compare("0000000000", "1"), VersionComparison::Unknown);
    }

    #[test]
    fn merge_observation_dedupes() {
        let mut c = catalog();
        assert!(!c.merge_observation("5G0906259B", "9970"));
        assert!(c.merge_observation("5G0906259B", "9999"));
        assert!(!c.merge_observation("", "1"));
    }
}
