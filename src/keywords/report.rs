//! Grouping the frequency table by category and rendering it.
//!
//! # Category Order
//!
//! 1. The preferred categories, in [`PREFERRED_CATEGORY_ORDER`], when present
//! 2. Any other category, in the order it is first met while walking the
//!    keywords from most to least frequent
//! 3. [`UNCATEGORIZED`], always last
//!
//! Within a category keywords are ranked by count, highest first; ties keep
//! discovery order. Only the top [`DISPLAY_LIMIT`] of each category are kept
//! in the report. The frequency table itself is never truncated.

use super::aggregate::FrequencyTable;
use itertools::Itertools;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::fmt::Write;

pub const PREFERRED_CATEGORY_ORDER: [&str; 7] = [
    "Technology",
    "Company",
    "Person",
    "Economy",
    "Product",
    "Location",
    "Other",
];

/// Category of any keyword the ledger has no entry for.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Keywords shown per category.
pub const DISPLAY_LIMIT: usize = 10;

/// One category's slice of the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySection {
    pub category: String,
    /// Number of keywords in this category before the display cap.
    pub total_keywords: usize,
    /// The highest-count keywords, at most [`DISPLAY_LIMIT`].
    pub top: Vec<(String, u64)>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupedReport {
    pub sections: Vec<CategorySection>,
}

impl GroupedReport {
    #[cfg(test)]
    pub fn section(&self, category: &str) -> Option<&CategorySection> {
        self.sections.iter().find(|s| s.category == category)
    }

    #[cfg(test)]
    pub fn categories(&self) -> Vec<&str> {
        self.sections.iter().map(|s| s.category.as_str()).collect()
    }

    /// Render the report as the text block printed to the terminal.
    pub fn render(&self) -> String {
        let rule = "=".repeat(50);
        let mut out = String::new();
        let _ = writeln!(out, "\n{rule}");
        let _ = writeln!(out, "AGGREGATED KEYWORDS REPORT");
        let _ = writeln!(out, "{rule}");

        for section in &self.sections {
            let _ = writeln!(out, "\n[{}]", section.category);
            let _ = writeln!(out, "{}", "-".repeat(30));
            for (keyword, count) in &section.top {
                let _ = writeln!(out, " • {:<25} : {} times", keyword, count);
            }
            if section.total_keywords > section.top.len() {
                let _ = writeln!(
                    out,
                    "   ... and {} more",
                    section.total_keywords - section.top.len()
                );
            }
        }

        let _ = writeln!(out, "\n{rule}");
        out
    }
}

/// Group `table` by the category each keyword resolves to in `resolved`.
///
/// Keywords missing from `resolved` fall under [`UNCATEGORIZED`].
pub fn build_report(table: &FrequencyTable, resolved: &HashMap<String, String>) -> GroupedReport {
    // Stable sort: equal counts keep discovery order.
    let ranked = table.iter().sorted_by_key(|(_, count)| Reverse(*count));

    let mut groups: Vec<(&str, Vec<(String, u64)>)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for (keyword, count) in ranked {
        let category = resolved
            .get(keyword)
            .map(String::as_str)
            .unwrap_or(UNCATEGORIZED);
        let slot = *index.entry(category).or_insert_with(|| {
            groups.push((category, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push((keyword.to_string(), count));
    }

    let preferred = PREFERRED_CATEGORY_ORDER
        .iter()
        .filter_map(|name| index.get(name).copied());
    let discovered = groups.iter().enumerate().filter_map(|(slot, (name, _))| {
        let special = PREFERRED_CATEGORY_ORDER.contains(name) || *name == UNCATEGORIZED;
        (!special).then_some(slot)
    });
    let uncategorized = index.get(UNCATEGORIZED).copied();
    let order: Vec<usize> = preferred.chain(discovered).chain(uncategorized).collect();

    let sections = order
        .into_iter()
        .map(|slot| {
            let (category, members) = &groups[slot];
            CategorySection {
                category: category.to_string(),
                total_keywords: members.len(),
                top: members.iter().take(DISPLAY_LIMIT).cloned().collect(),
            }
        })
        .collect();

    GroupedReport { sections }
}
