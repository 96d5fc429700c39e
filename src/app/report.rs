//! Lists which entries a rule bundle (or one rule) activates, and why.

use crate::core::rules::{FilterRule, RuleBundle};
use crate::core::Entry;

/// One activated entry with the labels of the rules that fired for it.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivationRow<'a> {
    pub entry: &'a Entry,
    pub labels: Vec<&'a str>,
}

/// Entries activated by `bundle`, in input order.
///
/// With `filter` set, only that rule is evaluated (regardless of its own
/// `active` flag, so a rule can be previewed before it is switched on).
pub fn activation_report<'a>(
    bundle: &'a RuleBundle,
    entries: &'a [Entry],
    filter: Option<&'a dyn FilterRule>,
) -> Vec<ActivationRow<'a>> {
    let rows: Vec<ActivationRow<'a>> = match filter {
        Some(rule) => {
            let pattern = rule.compile();
            if pattern.is_never() {
                return Vec::new();
            }
            entries
                .iter()
                .filter(|entry| rule.subject_matches(&pattern, entry))
                .map(|entry| ActivationRow {
                    entry,
                    labels: vec![rule.label()],
                })
                .collect()
        }
        None => {
            let matcher = bundle.matcher();
            entries
                .iter()
                .filter_map(|entry| {
                    let labels = matcher.activated_by(entry);
                    (!labels.is_empty()).then_some(ActivationRow { entry, labels })
                })
                .collect()
        }
    };

    tracing::debug!("{} of {} entries activated", rows.len(), entries.len());
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rules::{FrontMatterRule, PathRule, TagRule, TargetType};
    use crate::core::PatternType;
    use serde_json::json;

    fn create_bundle() -> RuleBundle {
        let mut bundle = RuleBundle::default();
        let mut archive = PathRule::new("^archive/", PatternType::Regex, TargetType::FilesAndDirectories);
        archive.base.name = "archive".into();
        bundle.paths.push(archive);
        bundle.tags.push(TagRule::new("old", PatternType::Strict));
        bundle
            .front_matter
            .push(FrontMatterRule::new("status", "done", PatternType::Strict));
        bundle
    }

    fn create_entries() -> Vec<Entry> {
        vec![
            Entry::file("archive/2020.md").with_tags(["old"]),
            Entry::file("inbox.md"),
            Entry::file("task.md").with_front_matter(json!({"status": "done"})),
        ]
    }

    #[test]
    fn test_report_lists_labels_per_entry() {
        let bundle = create_bundle();
        let entries = create_entries();

        let rows = activation_report(&bundle, &entries, None);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].entry.path, "archive/2020.md");
        assert_eq!(rows[0].labels, vec!["archive", "old"]);
        assert_eq!(rows[1].entry.path, "task.md");
        assert_eq!(rows[1].labels, vec!["done"]);
    }

    #[test]
    fn test_report_for_single_rule_ignores_active_flag() {
        let mut bundle = create_bundle();
        bundle.tags[0].base.active = false;
        let entries = create_entries();

        assert_eq!(activation_report(&bundle, &entries, None)[0].labels, vec!["archive"]);

        let rule = bundle.tags[0].clone();
        let rows = activation_report(&bundle, &entries, Some(&rule));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].labels, vec!["old"]);
    }

    #[test]
    fn test_inactive_bundle_reports_nothing() {
        let mut bundle = create_bundle();
        bundle.active = false;
        let entries = create_entries();
        assert!(activation_report(&bundle, &entries, None).is_empty());
    }
}
