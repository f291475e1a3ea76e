//! Section tree builder
//!
//! Section catalogs are stored as flat records tagged with a level
//! (`main`, `sub`, `sub-sub`), a parent id and a sort key. This module turns
//! such a list into a nested outline:
//!
//! - records are partitioned by level and stably sorted by `order`
//! - subs attach to mains and sub-subs attach to subs through `parentId`
//! - a node's body is its own content, or empty when it has children, or
//!   otherwise its title
//!
//! Records that cannot be attached are left out of the tree and reported as
//! [`Diagnostic::OrphanedSection`].

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;

use crate::config::MAX_ENTRIES;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::{check_input_size, EngineError, Result};

/// Hierarchy level of a section record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionLevel {
    #[serde(rename = "main")]
    Main,
    #[serde(rename = "sub")]
    Sub,
    #[serde(rename = "sub-sub", alias = "sub_sub", alias = "subsub", alias = "subSub")]
    SubSub,
}

impl SectionLevel {
    /// Nesting depth, 0 for main sections.
    pub fn depth(&self) -> usize {
        match self {
            SectionLevel::Main => 0,
            SectionLevel::Sub => 1,
            SectionLevel::SubSub => 2,
        }
    }

    /// Level a parent must have, if any.
    pub fn parent_level(&self) -> Option<SectionLevel> {
        match self {
            SectionLevel::Main => None,
            SectionLevel::Sub => Some(SectionLevel::Main),
            SectionLevel::SubSub => Some(SectionLevel::Sub),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionLevel::Main => "main",
            SectionLevel::Sub => "sub",
            SectionLevel::SubSub => "sub-sub",
        }
    }
}

impl fmt::Display for SectionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of a section catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionRecord {
    #[serde(deserialize_with = "scalar_id")]
    pub id: String,
    #[serde(default, deserialize_with = "text_or_null")]
    pub title: String,
    #[serde(default, deserialize_with = "text_or_null")]
    pub content: String,
    pub level: SectionLevel,
    #[serde(
        default,
        rename = "parentId",
        alias = "parent_id",
        deserialize_with = "optional_scalar_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub parent_id: Option<String>,
    #[serde(default, alias = "order_index", alias = "orderIndex")]
    pub order: f64,
    /// Party whose gender profile applies to this section
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    /// Context variable that must be truthy for the section to be emitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

impl SectionRecord {
    /// Create a record with empty text.
    pub fn new(id: impl Into<String>, level: SectionLevel) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            content: String::new(),
            level,
            parent_id: None,
            order: 0.0,
            actor: None,
            condition: None,
        }
    }

    /// A main section.
    pub fn main(id: impl Into<String>, order: f64) -> Self {
        Self::new(id, SectionLevel::Main).with_order(order)
    }

    /// A sub section under `parent`.
    pub fn sub(id: impl Into<String>, parent: impl Into<String>, order: f64) -> Self {
        Self::new(id, SectionLevel::Sub)
            .with_parent(parent)
            .with_order(order)
    }

    /// A sub-sub section under `parent`.
    pub fn sub_sub(id: impl Into<String>, parent: impl Into<String>, order: f64) -> Self {
        Self::new(id, SectionLevel::SubSub)
            .with_parent(parent)
            .with_order(order)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent_id = Some(parent.into());
        self
    }

    pub fn with_order(mut self, order: f64) -> Self {
        self.order = order;
        self
    }

    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    /// Parse a record list from JSON (a list, or an object with `sections`).
    pub fn list_from_json_str(json: &str) -> Result<Vec<Self>> {
        check_input_size(json, "Section records")?;
        let file: RecordFile = serde_json::from_str(json)?;
        file.into_records()
    }

    /// Parse a record list from YAML (a list, or a mapping with `sections`).
    pub fn list_from_yaml_str(yaml: &str) -> Result<Vec<Self>> {
        check_input_size(yaml, "Section records")?;
        let file: RecordFile = serde_yaml_ng::from_str(yaml)?;
        file.into_records()
    }

    /// Load a record list; `.json` files are read as JSON, everything else as YAML.
    pub fn list_from_path(path: &Path) -> Result<Vec<Self>> {
        let content = std::fs::read_to_string(path)?;
        if path.extension().is_some_and(|ext| ext == "json") {
            Self::list_from_json_str(&content)
        } else {
            Self::list_from_yaml_str(&content)
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RecordFile {
    List(Vec<SectionRecord>),
    Wrapped { sections: Vec<SectionRecord> },
}

impl RecordFile {
    fn into_records(self) -> Result<Vec<SectionRecord>> {
        let records = match self {
            RecordFile::List(records) | RecordFile::Wrapped { sections: records } => records,
        };
        if records.len() > MAX_ENTRIES {
            return Err(EngineError::LoadError(format!(
                "Too many section records ({}, max {MAX_ENTRIES})",
                records.len()
            )));
        }
        Ok(records)
    }
}

/// Accepts ids written as strings or numbers.
struct ScalarIdVisitor;

impl<'de> Visitor<'de> for ScalarIdVisitor {
    type Value = Option<String>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string or number id")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Self::Value, E> {
        Ok((!v.is_empty()).then(|| v.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(
        self,
        deserializer: D,
    ) -> std::result::Result<Self::Value, D::Error> {
        deserializer.deserialize_any(ScalarIdVisitor)
    }
}

fn scalar_id<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    deserializer
        .deserialize_any(ScalarIdVisitor)?
        .ok_or_else(|| de::Error::custom("section id must not be empty"))
}

fn optional_scalar_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error> {
    deserializer.deserialize_any(ScalarIdVisitor)
}

fn text_or_null<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A section placed in the outline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionNode {
    pub id: String,
    pub level: SectionLevel,
    pub title: String,
    pub content: String,
    /// Text emitted under the title
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SectionNode>,
}

impl SectionNode {
    fn from_record(record: &SectionRecord) -> Self {
        Self {
            id: record.id.clone(),
            level: record.level,
            title: record.title.clone(),
            content: record.content.clone(),
            body: String::new(),
            actor: record.actor.clone(),
            condition: record.condition.clone(),
            children: Vec::new(),
        }
    }

    /// Apply the body rule to this node and its descendants.
    fn finish(&mut self) {
        for child in &mut self.children {
            child.finish();
        }
        self.body = if !self.content.is_empty() {
            self.content.clone()
        } else if !self.children.is_empty() {
            String::new()
        } else {
            self.title.clone()
        };
    }

    /// Check if the body is the title standing in for a missing content.
    pub fn body_is_title(&self) -> bool {
        self.content.is_empty() && self.children.is_empty()
    }

    fn count(&self) -> usize {
        1 + self.children.iter().map(SectionNode::count).sum::<usize>()
    }

    fn find(&self, id: &str) -> Option<&SectionNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }
}

/// Ordered outline of main sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SectionTree {
    pub sections: Vec<SectionNode>,
}

impl SectionTree {
    /// Number of main sections.
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Check if the tree has no sections.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Main sections in order.
    pub fn iter(&self) -> std::slice::Iter<'_, SectionNode> {
        self.sections.iter()
    }

    /// Number of nodes at every level.
    pub fn node_count(&self) -> usize {
        self.sections.iter().map(SectionNode::count).sum()
    }

    /// First node with the given id, depth first.
    pub fn find(&self, id: &str) -> Option<&SectionNode> {
        self.sections.iter().find_map(|node| node.find(id))
    }
}

/// A built outline plus what was left out of it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BuiltTree {
    pub tree: SectionTree,
    pub diagnostics: Diagnostics,
}

/// Build the outline from flat records.
///
/// # Example
///
/// ```
/// use nusach_engine::{build_tree, SectionRecord};
///
/// let records = vec![
///     SectionRecord::main("1", 2.0),
///     SectionRecord::main("2", 1.0),
///     SectionRecord::sub("3", "2", 1.0),
/// ];
/// let built = build_tree(&records);
/// let ids: Vec<&str> = built.tree.iter().map(|n| n.id.as_str()).collect();
/// assert_eq!(ids, vec!["2", "1"]);
/// assert_eq!(built.tree.sections[0].children[0].id, "3");
/// ```
pub fn build_tree(records: &[SectionRecord]) -> BuiltTree {
    let mut diagnostics = Diagnostics::new();

    // Input position of the first record carrying each id, per level
    let mut seen: HashSet<&str> = HashSet::new();
    let mut first: HashMap<(SectionLevel, &str), usize> = HashMap::new();
    for (i, record) in records.iter().enumerate() {
        if !seen.insert(record.id.as_str()) {
            diagnostics.push(Diagnostic::DuplicateSectionId {
                id: record.id.clone(),
            });
        }
        first.entry((record.level, record.id.as_str())).or_insert(i);
    }

    let by_level = |level: SectionLevel| -> Vec<usize> {
        let mut indices: Vec<usize> = (0..records.len())
            .filter(|&i| records[i].level == level)
            .collect();
        // Stable: equal keys keep input order
        indices.sort_by(|&a, &b| records[a].order.total_cmp(&records[b].order));
        indices
    };

    let mut sections: Vec<SectionNode> = Vec::new();
    let mut main_slot: HashMap<usize, usize> = HashMap::new();
    for i in by_level(SectionLevel::Main) {
        main_slot.insert(i, sections.len());
        sections.push(SectionNode::from_record(&records[i]));
    }

    // Resolve a child's parent to the input index of an attached record
    let parent_of = |i: usize, attached: &HashSet<usize>| -> Option<usize> {
        let record = &records[i];
        let expected = record.level.parent_level()?;
        let parent = record.parent_id.as_deref()?;
        let &p = first.get(&(expected, parent))?;
        attached.contains(&p).then_some(p)
    };

    let mut attached: HashSet<usize> = main_slot.keys().copied().collect();
    let mut sub_slot: HashMap<usize, (usize, usize)> = HashMap::new();
    let orphan = |i: usize, diagnostics: &mut Diagnostics| {
        let record = &records[i];
        tracing::warn!(
            id = %record.id,
            level = %record.level,
            parent = ?record.parent_id,
            "Orphaned section record excluded"
        );
        diagnostics.push(Diagnostic::OrphanedSection {
            id: record.id.clone(),
            level: record.level,
            parent_id: record.parent_id.clone(),
        });
    };

    for i in by_level(SectionLevel::Sub) {
        match parent_of(i, &attached).and_then(|p| main_slot.get(&p).copied()) {
            Some(m) => {
                let children = &mut sections[m].children;
                sub_slot.insert(i, (m, children.len()));
                children.push(SectionNode::from_record(&records[i]));
            }
            None => orphan(i, &mut diagnostics),
        }
    }
    attached.extend(sub_slot.keys().copied());

    for i in by_level(SectionLevel::SubSub) {
        match parent_of(i, &attached).and_then(|p| sub_slot.get(&p).copied()) {
            Some((m, s)) => sections[m].children[s]
                .children
                .push(SectionNode::from_record(&records[i])),
            None => orphan(i, &mut diagnostics),
        }
    }

    for node in &mut sections {
        node.finish();
    }

    tracing::debug!(
        records = records.len(),
        main = sections.len(),
        orphans = diagnostics.orphan_count(),
        "Built section tree"
    );

    BuiltTree {
        tree: SectionTree { sections },
        diagnostics,
    }
}
