//! Compound bet type catalog.
//!
//! Every named bet (Single up to Goliath) is a row of data: how many
//! selections it needs and which fold sizes it is built from. One generic
//! settlement path consumes the table, so adding a bet type is a data change.

use serde::Serialize;

use super::combinations::binomial;
use super::error::SettlementError;

/// Immutable catalog entry for one compound bet type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BetTypeDefinition {
    /// Canonical lowercase key, e.g. `lucky15`.
    pub key: &'static str,
    /// Display name, e.g. `Lucky 15`.
    pub name: &'static str,
    /// Number of selections the bet must carry.
    pub required_selection_count: usize,
    /// Subset sizes that make up the bet, ascending.
    pub fold_sizes: &'static [usize],
    /// Total number of sub-bets (lines).
    pub expected_sub_bet_count: usize,
}

impl BetTypeDefinition {
    /// Sub-bet count implied by the fold sizes: sum of C(n, k).
    pub fn computed_sub_bet_count(&self) -> usize {
        self.fold_sizes
            .iter()
            .map(|&k| binomial(self.required_selection_count, k))
            .sum()
    }

    /// Whether the bet includes single-selection lines (Patent, Lucky 15, ...).
    pub fn includes_singles(&self) -> bool {
        self.fold_sizes.contains(&1)
    }
}

impl std::fmt::Display for BetTypeDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

const fn entry(
    key: &'static str,
    name: &'static str,
    required_selection_count: usize,
    fold_sizes: &'static [usize],
    expected_sub_bet_count: usize,
) -> BetTypeDefinition {
    BetTypeDefinition {
        key,
        name,
        required_selection_count,
        fold_sizes,
        expected_sub_bet_count,
    }
}

/// The full catalog, ordered by selection count then line count.
pub static CATALOG: [BetTypeDefinition; 14] = [
    entry("single", "Single", 1, &[1], 1),
    entry("double", "Double", 2, &[2], 1),
    entry("treble", "Treble", 3, &[3], 1),
    entry("accumulator", "Accumulator", 4, &[4], 1),
    entry("trixie", "Trixie", 3, &[2, 3], 4),
    entry("patent", "Patent", 3, &[1, 2, 3], 7),
    entry("yankee", "Yankee", 4, &[2, 3, 4], 11),
    entry("lucky15", "Lucky 15", 4, &[1, 2, 3, 4], 15),
    entry("canadian", "Canadian", 5, &[2, 3, 4, 5], 26),
    entry("lucky31", "Lucky 31", 5, &[1, 2, 3, 4, 5], 31),
    entry("heinz", "Heinz", 6, &[2, 3, 4, 5, 6], 57),
    entry("lucky63", "Lucky 63", 6, &[1, 2, 3, 4, 5, 6], 63),
    entry("superheinz", "Super Heinz", 7, &[2, 3, 4, 5, 6, 7], 120),
    entry("goliath", "Goliath", 8, &[2, 3, 4, 5, 6, 7, 8], 247),
];

/// Looks up a bet type by key.
///
/// Matching ignores case, spaces, underscores and hyphens, so
/// "Lucky 15", "lucky-15" and "LUCKY15" all resolve to `lucky15`.
///
/// # Errors
/// Returns `SettlementError::UnknownBetType` if no entry matches.
pub fn definition_for(key: &str) -> Result<&'static BetTypeDefinition, SettlementError> {
    let normalized: String = key
        .chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .map(|c| c.to_ascii_lowercase())
        .collect();

    CATALOG
        .iter()
        .find(|def| def.key == normalized)
        .ok_or_else(|| SettlementError::UnknownBetType(key.to_string()))
}

/// All catalog keys in catalog order.
pub fn all_keys() -> impl Iterator<Item = &'static str> {
    CATALOG.iter().map(|def| def.key)
}

/// Conventional name of a fold by its size.
pub fn fold_name(size: usize) -> &'static str {
    match size {
        1 => "Single",
        2 => "Double",
        3 => "Treble",
        4 => "Four-fold",
        5 => "Five-fold",
        6 => "Six-fold",
        7 => "Seven-fold",
        8 => "Eight-fold",
        _ => "Multiple",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_counts_match_binomials() {
        for def in &CATALOG {
            assert_eq!(
                def.computed_sub_bet_count(),
                def.expected_sub_bet_count,
                "{} sub-bet count disagrees with its fold sizes",
                def.name
            );
        }
    }

    #[test]
    fn test_known_counts() {
        assert_eq!(definition_for("yankee").unwrap().expected_sub_bet_count, 11);
        assert_eq!(definition_for("lucky15").unwrap().expected_sub_bet_count, 15);
        assert_eq!(definition_for("heinz").unwrap().expected_sub_bet_count, 57);
        assert_eq!(definition_for("goliath").unwrap().expected_sub_bet_count, 247);
    }

    #[test]
    fn test_key_normalization() {
        assert_eq!(definition_for("Lucky 15").unwrap().key, "lucky15");
        assert_eq!(definition_for("super_heinz").unwrap().key, "superheinz");
        assert_eq!(definition_for("TRIXIE").unwrap().key, "trixie");
    }

    #[test]
    fn test_unknown_key() {
        assert_eq!(
            definition_for("round robin"),
            Err(SettlementError::UnknownBetType("round robin".to_string()))
        );
    }

    #[test]
    fn test_fold_sizes_within_selection_count() {
        for def in &CATALOG {
            assert!(def.fold_sizes.windows(2).all(|w| w[0] < w[1]));
            assert!(def.fold_sizes.iter().all(|&k| k >= 1 && k <= def.required_selection_count));
        }
    }

    #[test]
    fn test_all_keys_unique() {
        let keys: Vec<_> = all_keys().collect();
        let mut sorted = keys.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(keys.len(), sorted.len());
        assert_eq!(keys.len(), 14);
    }

    #[test]
    fn test_includes_singles() {
        assert!(definition_for("patent").unwrap().includes_singles());
        assert!(!definition_for("trixie").unwrap().includes_singles());
    }

    #[test]
    fn test_fold_names() {
        assert_eq!(fold_name(2), "Double");
        assert_eq!(fold_name(8), "Eight-fold");
    }
}
