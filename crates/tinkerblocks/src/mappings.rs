//! Alias rewriting applied to every grid cell before parsing.
//!
//! Children (and the AI tutor) use alternative spellings for some blocks;
//! the alias table maps them to the canonical token the parser expects.
//! Lookup is case-insensitive on the trimmed cell text, and the rewrite
//! preserves the cell's original case convention and surrounding whitespace,
//! so a cell containing `" MOV "` becomes `" MOVE "`.

use ahash::AHashMap;

use crate::types::Grid;

/// User-extensible map from alternative tokens to canonical tokens.
///
/// The default table is installed at construction; hosts may add or remove
/// mappings at configuration time. The table is consulted (read-only) during
/// parsing; concurrent mutation must be synchronised by the host.
#[derive(Debug, Clone)]
pub struct AliasTable {
    map: AHashMap<String, String>,
}

impl Default for AliasTable {
    fn default() -> Self {
        let mut map = AHashMap::new();
        for (alternative, canonical) in [
            ("mov", "move"),
            ("pen_on", "pen_down"),
            ("pen_off", "pen_up"),
            ("black_on", "black_detected"),
            ("black_off", "black_lost"),
        ] {
            map.insert(alternative.to_string(), canonical.to_string());
        }
        Self { map }
    }
}

impl AliasTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty table with no mappings at all.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            map: AHashMap::new(),
        }
    }

    /// Adds or replaces a mapping. Both sides are stored lowercase.
    pub fn add_mapping(&mut self, alternative: &str, canonical: &str) {
        self.map
            .insert(alternative.to_lowercase(), canonical.to_lowercase());
    }

    /// Removes a mapping, returning true if it existed.
    pub fn remove_mapping(&mut self, alternative: &str) -> bool {
        self.map.remove(&alternative.to_lowercase()).is_some()
    }

    /// Iterates over `(alternative, canonical)` pairs.
    pub fn mappings(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Rewrites a whole grid, replacing aliased cells with canonical tokens.
    ///
    /// Cells without a mapping are passed through unchanged. Idempotent on
    /// canonical tokens, which are never alias keys.
    #[must_use]
    pub fn preprocess(&self, grid: &Grid) -> Grid {
        grid.iter()
            .map(|row| row.iter().map(|cell| self.rewrite_cell(cell)).collect())
            .collect()
    }

    /// Rewrites a single cell, preserving case style and whitespace padding.
    #[must_use]
    pub fn rewrite_cell(&self, cell: &str) -> String {
        let trimmed = cell.trim();
        if trimmed.is_empty() {
            return cell.to_string();
        }
        let Some(canonical) = self.map.get(&trimmed.to_lowercase()) else {
            return cell.to_string();
        };

        let replacement = if is_upper_style(trimmed) {
            canonical.to_uppercase()
        } else if is_title_style(trimmed) {
            to_title(canonical)
        } else {
            canonical.clone()
        };

        let leading = &cell[..cell.len() - cell.trim_start().len()];
        let trailing = &cell[cell.trim_end().len()..];
        format!("{leading}{replacement}{trailing}")
    }
}

/// True if the token has at least one letter and every letter is uppercase.
fn is_upper_style(token: &str) -> bool {
    let mut has_alpha = false;
    for c in token.chars() {
        if c.is_alphabetic() {
            has_alpha = true;
            if !c.is_uppercase() {
                return false;
            }
        }
    }
    has_alpha
}

/// True if each alphabetic run starts uppercase and continues lowercase,
/// e.g. `Pen_On` or `Mov`.
fn is_title_style(token: &str) -> bool {
    let mut has_alpha = false;
    let mut at_word_start = true;
    for c in token.chars() {
        if c.is_alphabetic() {
            has_alpha = true;
            let ok = if at_word_start {
                c.is_uppercase()
            } else {
                c.is_lowercase()
            };
            if !ok {
                return false;
            }
            at_word_start = false;
        } else {
            at_word_start = true;
        }
    }
    has_alpha
}

/// Title-cases each alphabetic run: `pen_down` → `Pen_Down`.
fn to_title(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    let mut at_word_start = true;
    for c in token.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_has_required_mappings() {
        let table = AliasTable::new();
        assert_eq!(table.rewrite_cell("mov"), "move");
        assert_eq!(table.rewrite_cell("pen_on"), "pen_down");
        assert_eq!(table.rewrite_cell("pen_off"), "pen_up");
        assert_eq!(table.rewrite_cell("black_on"), "black_detected");
        assert_eq!(table.rewrite_cell("black_off"), "black_lost");
    }

    #[test]
    fn rewrite_preserves_upper_case_style() {
        let table = AliasTable::new();
        assert_eq!(table.rewrite_cell("MOV"), "MOVE");
        assert_eq!(table.rewrite_cell("PEN_ON"), "PEN_DOWN");
    }

    #[test]
    fn rewrite_preserves_title_case_style() {
        let table = AliasTable::new();
        assert_eq!(table.rewrite_cell("Mov"), "Move");
        assert_eq!(table.rewrite_cell("Pen_On"), "Pen_Down");
    }

    #[test]
    fn rewrite_preserves_whitespace_padding() {
        let table = AliasTable::new();
        assert_eq!(table.rewrite_cell("  MOV "), "  MOVE ");
    }

    #[test]
    fn rewrite_is_idempotent_on_canonical_tokens() {
        let table = AliasTable::new();
        assert_eq!(table.rewrite_cell("move"), "move");
        assert_eq!(table.rewrite_cell("PEN_DOWN"), "PEN_DOWN");
    }

    #[test]
    fn mappings_can_be_added_and_removed() {
        let mut table = AliasTable::empty();
        assert_eq!(table.mappings().count(), 0);
        assert_eq!(table.rewrite_cell("mov"), "mov");

        table.add_mapping("fwd", "move");
        assert_eq!(table.rewrite_cell("FWD"), "MOVE");
        assert!(table.remove_mapping("fwd"));
        assert!(!table.remove_mapping("fwd"));
        assert_eq!(table.rewrite_cell("FWD"), "FWD");
    }

    #[test]
    fn mappings_iterates_the_stored_pairs() {
        let table = AliasTable::new();
        let mut pairs: Vec<(&str, &str)> = table.mappings().collect();
        pairs.sort_unstable();
        assert_eq!(
            pairs,
            vec![
                ("black_off", "black_lost"),
                ("black_on", "black_detected"),
                ("mov", "move"),
                ("pen_off", "pen_up"),
                ("pen_on", "pen_down"),
            ]
        );
    }
}
