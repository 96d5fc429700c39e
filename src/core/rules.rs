//! Rule types and rule-set evaluation.
//!
//! A rule pairs a pattern with the attribute it is tested against: the entry
//! path ([`PathRule`]), each of its tags ([`TagRule`]), or one front-matter
//! value ([`FrontMatterRule`]). A [`RuleBundle`] groups the three kinds under a
//! single activation flag; an entry is activated by a bundle when any active
//! rule of any kind matches it.

use super::paths;
use super::pattern::{Pattern, PatternType};
use super::{Entry, EntryKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;

fn default_active() -> bool {
    true
}

/// Fields shared by every rule kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleBase {
    /// Optional label. Rules sharing a non-empty name toggle together.
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub pattern: String,
    #[serde(default)]
    pub pattern_type: PatternType,
}

impl RuleBase {
    pub fn new(pattern: impl Into<String>, pattern_type: PatternType) -> Self {
        Self {
            name: String::new(),
            active: true,
            pattern: pattern.into(),
            pattern_type,
        }
    }
}

impl Default for RuleBase {
    fn default() -> Self {
        Self::new("", PatternType::Strict)
    }
}

/// Which entry kinds a path rule considers at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetType {
    Files,
    Directories,
    #[default]
    FilesAndDirectories,
}

impl TargetType {
    pub fn admits(self, kind: EntryKind) -> bool {
        match self {
            TargetType::Files => kind == EntryKind::File,
            TargetType::Directories => kind == EntryKind::Folder,
            TargetType::FilesAndDirectories => true,
        }
    }

    /// The narrow target used by auto-created STRICT rules for one entry.
    pub fn for_kind(kind: EntryKind) -> Self {
        match kind {
            EntryKind::File => TargetType::Files,
            EntryKind::Folder => TargetType::Directories,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathRule {
    #[serde(flatten)]
    pub base: RuleBase,
    #[serde(rename = "type", default)]
    pub target: TargetType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRule {
    #[serde(flatten)]
    pub base: RuleBase,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontMatterRule {
    #[serde(flatten)]
    pub base: RuleBase,
    /// Dotted key path into the entry's front matter.
    #[serde(rename = "path", default)]
    pub key_path: String,
}

impl PathRule {
    pub fn new(pattern: impl Into<String>, pattern_type: PatternType, target: TargetType) -> Self {
        Self {
            base: RuleBase::new(pattern, pattern_type),
            target,
        }
    }

    /// The rule created by a "pin/hide this file or folder" shortcut.
    pub fn strict(path: impl Into<String>, kind: EntryKind) -> Self {
        Self::new(path, PatternType::Strict, TargetType::for_kind(kind))
    }

    pub fn is_strict(&self) -> bool {
        self.base.pattern_type == PatternType::Strict
    }
}

impl TagRule {
    pub fn new(pattern: impl Into<String>, pattern_type: PatternType) -> Self {
        Self {
            base: RuleBase::new(pattern, pattern_type),
        }
    }
}

impl FrontMatterRule {
    pub fn new(
        key_path: impl Into<String>,
        pattern: impl Into<String>,
        pattern_type: PatternType,
    ) -> Self {
        Self {
            base: RuleBase::new(pattern, pattern_type),
            key_path: key_path.into(),
        }
    }
}

/// Behaviour shared by the three rule kinds.
pub trait FilterRule {
    fn base(&self) -> &RuleBase;

    fn base_mut(&mut self) -> &mut RuleBase;

    /// Tests the rule's attribute of `entry` against an already compiled pattern.
    fn subject_matches(&self, pattern: &Pattern, entry: &Entry) -> bool;

    fn compile(&self) -> Pattern {
        let base = self.base();
        Pattern::compile_or_never(&base.pattern, base.pattern_type)
    }

    /// Tests this rule against `entry`, ignoring its `active` flag.
    fn matches(&self, entry: &Entry) -> bool {
        self.subject_matches(&self.compile(), entry)
    }

    /// The name shown for this rule: its name, or its pattern when unnamed.
    fn label(&self) -> &str {
        let base = self.base();
        if base.name.is_empty() {
            &base.pattern
        } else {
            &base.name
        }
    }
}

impl FilterRule for PathRule {
    fn base(&self) -> &RuleBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut RuleBase {
        &mut self.base
    }

    fn subject_matches(&self, pattern: &Pattern, entry: &Entry) -> bool {
        self.target.admits(entry.kind) && pattern.is_match(&entry.path)
    }

    /// STRICT paths are compared in normalized form, so `"archive/"` names
    /// the folder `archive`.
    fn compile(&self) -> Pattern {
        if self.is_strict() {
            Pattern::compile_or_never(&paths::normalize(&self.base.pattern), PatternType::Strict)
        } else {
            Pattern::compile_or_never(&self.base.pattern, self.base.pattern_type)
        }
    }
}

impl FilterRule for TagRule {
    fn base(&self) -> &RuleBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut RuleBase {
        &mut self.base
    }

    fn subject_matches(&self, pattern: &Pattern, entry: &Entry) -> bool {
        entry.tags.iter().any(|tag| pattern.is_match(tag))
    }
}

impl FilterRule for FrontMatterRule {
    fn base(&self) -> &RuleBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut RuleBase {
        &mut self.base
    }

    fn subject_matches(&self, pattern: &Pattern, entry: &Entry) -> bool {
        entry
            .front_matter_value(&self.key_path)
            .is_some_and(|value| value_matches(pattern, value))
    }
}

/// Scalars are compared in their string form; a collection matches when any
/// of its elements does. `null` and nested objects never match.
fn value_matches(pattern: &Pattern, value: &Value) -> bool {
    match value {
        Value::String(s) => pattern.is_match(s),
        Value::Number(n) => pattern.is_match(&n.to_string()),
        Value::Bool(b) => pattern.is_match(if *b { "true" } else { "false" }),
        Value::Array(items) => items.iter().any(|item| value_matches(pattern, item)),
        Value::Null | Value::Object(_) => false,
    }
}

/// Any-of evaluation over one ordered rule list. Inactive rules are skipped.
pub fn any_matches<R: FilterRule>(rules: &[R], entry: &Entry) -> bool {
    rules
        .iter()
        .filter(|rule| rule.base().active)
        .any(|rule| rule.matches(entry))
}

/// An owned rule of any kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    Path(PathRule),
    Tag(TagRule),
    FrontMatter(FrontMatterRule),
}

impl FilterRule for Rule {
    fn base(&self) -> &RuleBase {
        match self {
            Rule::Path(rule) => rule.base(),
            Rule::Tag(rule) => rule.base(),
            Rule::FrontMatter(rule) => rule.base(),
        }
    }

    fn base_mut(&mut self) -> &mut RuleBase {
        match self {
            Rule::Path(rule) => rule.base_mut(),
            Rule::Tag(rule) => rule.base_mut(),
            Rule::FrontMatter(rule) => rule.base_mut(),
        }
    }

    fn subject_matches(&self, pattern: &Pattern, entry: &Entry) -> bool {
        match self {
            Rule::Path(rule) => rule.subject_matches(pattern, entry),
            Rule::Tag(rule) => rule.subject_matches(pattern, entry),
            Rule::FrontMatter(rule) => rule.subject_matches(pattern, entry),
        }
    }
}

/// The path, tag and front-matter rule lists of one action (pin or hide),
/// gated by a bundle-level `active` flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleBundle {
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub tags: Vec<TagRule>,
    #[serde(default)]
    pub paths: Vec<PathRule>,
    #[serde(default)]
    pub front_matter: Vec<FrontMatterRule>,
}

impl Default for RuleBundle {
    fn default() -> Self {
        Self {
            active: true,
            tags: Vec::new(),
            paths: Vec::new(),
            front_matter: Vec::new(),
        }
    }
}

impl RuleBundle {
    /// An active bundle holding one blank (inert) rule of each kind, ready
    /// to be filled in from a settings form.
    pub fn with_blank_rules() -> Self {
        Self {
            active: true,
            tags: vec![TagRule::new("", PatternType::Strict)],
            paths: vec![PathRule::new(
                "",
                PatternType::Wildcard,
                TargetType::FilesAndDirectories,
            )],
            front_matter: vec![FrontMatterRule::new("", "", PatternType::Strict)],
        }
    }

    /// `true` if the bundle is active and any of its active rules matches `entry`.
    pub fn any_matches(&self, entry: &Entry) -> bool {
        self.active
            && (any_matches(&self.paths, entry)
                || any_matches(&self.tags, entry)
                || any_matches(&self.front_matter, entry))
    }

    /// Compiles the active rules once for a whole resolution pass.
    pub fn matcher(&self) -> RuleSetMatcher<'_> {
        RuleSetMatcher::new(self)
    }

    /// Flips `active` on every rule named `name`, across all three kinds.
    ///
    /// Returns the toggled rules in their new state. Empty names never match.
    pub fn toggle_named(&mut self, name: &str) -> Vec<Rule> {
        let mut toggled = Vec::new();
        if name.is_empty() {
            return toggled;
        }

        for rule in self.tags.iter_mut().filter(|r| r.base.name == name) {
            rule.base.active = !rule.base.active;
            toggled.push(Rule::Tag(rule.clone()));
        }
        for rule in self.paths.iter_mut().filter(|r| r.base.name == name) {
            rule.base.active = !rule.base.active;
            toggled.push(Rule::Path(rule.clone()));
        }
        for rule in self.front_matter.iter_mut().filter(|r| r.base.name == name) {
            rule.base.active = !rule.base.active;
            toggled.push(Rule::FrontMatter(rule.clone()));
        }

        toggled
    }

    /// `Some(true)` if any rule named `name` is active, `Some(false)` if rules
    /// with that name exist but all are inactive, `None` if none exist.
    pub fn is_named_active(&self, name: &str) -> Option<bool> {
        if name.is_empty() {
            return None;
        }

        let states: Vec<bool> = self
            .tags
            .iter()
            .map(|r| &r.base)
            .chain(self.paths.iter().map(|r| &r.base))
            .chain(self.front_matter.iter().map(|r| &r.base))
            .filter(|base| base.name == name)
            .map(|base| base.active)
            .collect();

        if states.is_empty() {
            None
        } else {
            Some(states.into_iter().any(|active| active))
        }
    }

    /// Distinct non-empty rule names, in first-seen order.
    pub fn named_filters(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        let all_names = self
            .tags
            .iter()
            .map(|r| r.base.name.as_str())
            .chain(self.paths.iter().map(|r| r.base.name.as_str()))
            .chain(self.front_matter.iter().map(|r| r.base.name.as_str()));
        for name in all_names {
            if !name.is_empty() && !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    /// Path rules as listed in a settings table, optionally hiding STRICT rules
    /// created by pin/hide shortcuts.
    pub fn listed_path_rules(&self, hide_strict: bool) -> impl Iterator<Item = &PathRule> {
        self.paths
            .iter()
            .filter(move |rule| !(hide_strict && rule.is_strict()))
    }
}

struct Compiled<'a, R> {
    rule: &'a R,
    pattern: Pattern,
}

fn compile_active<R: FilterRule>(rules: &[R]) -> Vec<Compiled<'_, R>> {
    rules
        .iter()
        .filter(|rule| rule.base().active)
        .map(|rule| Compiled {
            rule,
            pattern: rule.compile(),
        })
        .filter(|compiled| !compiled.pattern.is_never())
        .collect()
}

/// A bundle with its active rules compiled, for repeated evaluation.
pub struct RuleSetMatcher<'a> {
    paths: Vec<Compiled<'a, PathRule>>,
    tags: Vec<Compiled<'a, TagRule>>,
    front_matter: Vec<Compiled<'a, FrontMatterRule>>,
}

impl<'a> RuleSetMatcher<'a> {
    /// Compiles `bundle`. An inactive bundle yields a matcher that never activates.
    pub fn new(bundle: &'a RuleBundle) -> Self {
        if !bundle.active {
            return Self {
                paths: Vec::new(),
                tags: Vec::new(),
                front_matter: Vec::new(),
            };
        }

        Self {
            paths: compile_active(&bundle.paths),
            tags: compile_active(&bundle.tags),
            front_matter: compile_active(&bundle.front_matter),
        }
    }

    /// `true` if any compiled rule matches `entry`.
    pub fn is_activated(&self, entry: &Entry) -> bool {
        self.paths
            .iter()
            .any(|c| c.rule.subject_matches(&c.pattern, entry))
            || self
                .tags
                .iter()
                .any(|c| c.rule.subject_matches(&c.pattern, entry))
            || self
                .front_matter
                .iter()
                .any(|c| c.rule.subject_matches(&c.pattern, entry))
    }

    /// Labels of every rule that matches `entry`: path rules, then tag rules,
    /// then front-matter rules.
    pub fn activated_by(&self, entry: &Entry) -> Vec<&'a str> {
        let mut labels = Vec::new();
        labels.extend(
            self.paths
                .iter()
                .filter(|c| c.rule.subject_matches(&c.pattern, entry))
                .map(|c| c.rule.label()),
        );
        labels.extend(
            self.tags
                .iter()
                .filter(|c| c.rule.subject_matches(&c.pattern, entry))
                .map(|c| c.rule.label()),
        );
        labels.extend(
            self.front_matter
                .iter()
                .filter(|c| c.rule.subject_matches(&c.pattern, entry))
                .map(|c| c.rule.label()),
        );
        labels
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty() && self.tags.is_empty() && self.front_matter.is_empty()
    }
}
