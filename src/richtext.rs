//! Rich-text tree model and the extract / reinject walker
//!
//! Rich-text fields are stored as a JSON tree with a single `root` node.
//! Every node carries a `type` tag; `text` nodes carry a `text` payload and
//! container nodes an ordered `children` array. Any other attribute
//! (`format`, `version`, `direction`, link targets, ...) is kept verbatim in
//! [`Node::attributes`], so a tree survives a deserialize/serialize round
//! trip unchanged.
//!
//! Parsing is lenient: a node without a string `type`, a non-string `text`
//! or a `children` value that is not an array of objects keeps the raw value
//! in its attributes. Such a node is never translated, its siblings still are.
//!
//! [`extract`] and [`reinject`] walk the tree in the same depth-first,
//! left-to-right order and derive the same [`NodePath`] for every leaf, so
//! any path produced by `extract` resolves under `reinject` against a tree
//! of the same shape.
//!
//! # Example
//!
//! ```ignore
//! use autolocale::richtext::{Node, RichText, extract, reinject};
//!
//! let tree = RichText::new(vec![Node::element("paragraph", vec![Node::text("Hello world")])]);
//! let mut unit = extract(&tree);
//! for text in unit.values_mut() {
//!     *text = "Bonjour le monde".to_string();
//! }
//! let translated = reinject(&tree, &unit);
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;

/// Deepest node level (root = 0) that the walker descends into
pub const MAX_DEPTH: usize = 10;

/// Kind tag of the only nodes whose text is translated
pub const TEXT_KIND: &str = "text";

/// One node of a rich-text tree
///
/// `kind` is empty when the stored node has no string `type`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Node>>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Node {
    /// A `text` leaf
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: Some(text.into()),
            children: None,
            attributes: Map::new(),
        }
    }

    /// A container node of the given kind
    pub fn element(kind: impl Into<String>, children: Vec<Node>) -> Self {
        Self {
            kind: kind.into(),
            text: None,
            children: Some(children),
            attributes: Map::new(),
        }
    }

    /// Whether the walker translates this node's text
    ///
    /// Only `text` nodes qualify; other leaves with a `text` payload
    /// (`code-highlight`, custom blocks) are left alone.
    pub fn is_text_leaf(&self) -> bool {
        self.kind == TEXT_KIND && self.text.is_some()
    }

    fn from_object(mut attributes: Map<String, Value>) -> Self {
        let kind = match attributes.remove("type") {
            Some(Value::String(kind)) => kind,
            Some(other) => {
                attributes.insert("type".to_string(), other);
                String::new()
            }
            None => String::new(),
        };

        let text = match attributes.remove("text") {
            Some(Value::String(text)) => Some(text),
            Some(other) => {
                attributes.insert("text".to_string(), other);
                None
            }
            None => None,
        };

        let children = match attributes.remove("children") {
            Some(Value::Array(items)) if items.iter().all(Value::is_object) => Some(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::Object(object) => Some(Node::from_object(object)),
                        _ => None,
                    })
                    .collect(),
            ),
            Some(other) => {
                warn!(kind = %kind, "Malformed rich-text children, subtree left untranslated");
                attributes.insert("children".to_string(), other);
                None
            }
            None => None,
        };

        Self {
            kind,
            text,
            children,
            attributes,
        }
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Map::<String, Value>::deserialize(deserializer).map(Node::from_object)
    }
}

/// A rich-text field value: `{ "root": { ... } }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichText {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<Node>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RichText {
    /// A tree whose `root` node holds `children`
    pub fn new(children: Vec<Node>) -> Self {
        Self {
            root: Some(Node::element("root", children)),
            extra: Map::new(),
        }
    }

    /// Interpret a stored field value as a rich-text tree
    ///
    /// Only objects with a `root` key qualify; anything else (plain strings,
    /// relations, locale-keyed objects) yields `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        if !object.contains_key("root") {
            return None;
        }
        serde_json::from_value(value.clone()).ok()
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Whether `extract` would find at least one translatable leaf
    pub fn has_translatable_text(&self) -> bool {
        !extract(self).is_empty()
    }

    /// Total number of nodes, root included
    pub fn node_count(&self) -> usize {
        fn count(node: &Node) -> usize {
            1 + node
                .children
                .iter()
                .flatten()
                .map(count)
                .sum::<usize>()
        }
        self.root.as_ref().map_or(0, count)
    }

    /// Pre-order `(depth, kind)` sequence, used to compare tree shapes
    pub fn shape(&self) -> Vec<(usize, &str)> {
        fn visit<'a>(node: &'a Node, depth: usize, out: &mut Vec<(usize, &'a str)>) {
            out.push((depth, node.kind.as_str()));
            for child in node.children.iter().flatten() {
                visit(child, depth + 1, out);
            }
        }
        let mut out = Vec::new();
        if let Some(root) = &self.root {
            visit(root, 0, &mut out);
        }
        out
    }
}

/// Position of a node as the sequence of child indices from the root
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    pub fn new(indices: Vec<usize>) -> Self {
        Self(indices)
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }
}

impl Borrow<[usize]> for NodePath {
    fn borrow(&self) -> &[usize] {
        &self.0
    }
}

/// Dot-joined diagnostic form: `root.children.0.children.1.text`
impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "root")?;
        for index in &self.0 {
            write!(f, ".children.{}", index)?;
        }
        write!(f, ".text")
    }
}

/// Leaf texts keyed by path. Iteration order is the depth-first,
/// left-to-right traversal order, since index paths sort in pre-order.
pub type TextMap = BTreeMap<NodePath, String>;

/// Collect every non-blank `text` node of `tree`
pub fn extract(tree: &RichText) -> TextMap {
    extract_with_limit(tree, MAX_DEPTH)
}

/// [`extract`] with an explicit depth ceiling
pub fn extract_with_limit(tree: &RichText, max_depth: usize) -> TextMap {
    let mut out = TextMap::new();
    if let Some(root) = &tree.root {
        collect(root, &mut Vec::new(), 0, max_depth, &mut out);
    }
    out
}

fn collect(node: &Node, path: &mut Vec<usize>, depth: usize, max_depth: usize, out: &mut TextMap) {
    if depth > max_depth {
        warn!(
            path = %NodePath(path.clone()),
            max_depth, "Rich-text depth ceiling reached, subtree left untranslated"
        );
        return;
    }

    if node.is_text_leaf() {
        if let Some(text) = node.text.as_ref().filter(|t| !t.trim().is_empty()) {
            out.insert(NodePath(path.clone()), text.clone());
        }
        return;
    }

    for (index, child) in node.children.iter().flatten().enumerate() {
        path.push(index);
        collect(child, path, depth + 1, max_depth, out);
        path.pop();
    }
}

/// Copy `tree` and overwrite every leaf whose path appears in `texts`
///
/// The input is never mutated. Leaves missing from `texts` keep their
/// original value, which is what allows partial translation.
pub fn reinject(tree: &RichText, texts: &TextMap) -> RichText {
    reinject_with_limit(tree, texts, MAX_DEPTH)
}

/// [`reinject`] with an explicit depth ceiling
pub fn reinject_with_limit(tree: &RichText, texts: &TextMap, max_depth: usize) -> RichText {
    let mut copy = tree.clone();
    if let Some(root) = copy.root.as_mut() {
        apply(root, &mut Vec::new(), 0, max_depth, texts);
    }
    copy
}

fn apply(node: &mut Node, path: &mut Vec<usize>, depth: usize, max_depth: usize, texts: &TextMap) {
    if depth > max_depth {
        return;
    }

    if node.is_text_leaf() {
        if let Some(translated) = texts.get(path.as_slice()) {
            node.text = Some(translated.clone());
        }
        return;
    }

    for (index, child) in node.children.iter_mut().flatten().enumerate() {
        path.push(index);
        apply(child, path, depth + 1, max_depth, texts);
        path.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lexical_sample() -> Value {
        json!({
            "root": {
                "type": "root",
                "format": "",
                "indent": 0,
                "version": 1,
                "direction": "ltr",
                "children": [
                    {
                        "type": "heading",
                        "tag": "h2",
                        "version": 1,
                        "children": [
                            {"type": "text", "text": "Our approach", "format": 1, "mode": "normal", "style": "", "detail": 0, "version": 1}
                        ]
                    },
                    {
                        "type": "paragraph",
                        "version": 1,
                        "children": [
                            {"type": "text", "text": "Hello ", "format": 0, "version": 1},
                            {
                                "type": "link",
                                "fields": {"url": "https://example.com", "newTab": true},
                                "children": [{"type": "text", "text": "world", "format": 0, "version": 1}]
                            },
                            {"type": "text", "text": "   ", "format": 0, "version": 1}
                        ]
                    },
                    {
                        "type": "list",
                        "listType": "bullet",
                        "children": [
                            {"type": "listitem", "value": 1, "children": [{"type": "text", "text": "First"}]},
                            {"type": "listitem", "value": 2, "children": [{"type": "text", "text": "Second"}]}
                        ]
                    },
                    {"type": "horizontalrule", "version": 1}
                ]
            }
        })
    }

    fn sample() -> RichText {
        RichText::from_value(&lexical_sample()).unwrap()
    }

    fn swap_case(text: &str) -> String {
        text.chars()
            .map(|c| {
                if c.is_uppercase() {
                    c.to_lowercase().collect::<String>()
                } else {
                    c.to_uppercase().collect::<String>()
                }
            })
            .collect()
    }

    /// A chain of nested paragraphs `levels` deep ending in one text leaf
    fn deep_tree(levels: usize) -> RichText {
        let mut node = Node::text("bottom");
        for _ in 0..levels {
            node = Node::element("paragraph", vec![node]);
        }
        RichText::new(vec![node, Node::element("paragraph", vec![Node::text("top")])])
    }

    #[test]
    fn test_serde_round_trip_keeps_attributes() {
        let value = lexical_sample();
        let tree = RichText::from_value(&value).unwrap();
        assert_eq!(tree.to_value(), value);
    }

    #[test]
    fn test_from_value_rejects_non_trees() {
        assert!(RichText::from_value(&json!("plain")).is_none());
        assert!(RichText::from_value(&json!({"en": "Hello", "fr": "Bonjour"})).is_none());
        assert!(RichText::from_value(&json!({"root": "not a node"})).is_none());
        assert!(RichText::from_value(&json!(42)).is_none());
    }

    #[test]
    fn test_extract_order_and_paths() {
        let texts = extract(&sample());
        let entries: Vec<(String, &str)> = texts
            .iter()
            .map(|(path, text)| (path.to_string(), text.as_str()))
            .collect();

        assert_eq!(
            entries,
            vec![
                ("root.children.0.children.0.text".to_string(), "Our approach"),
                ("root.children.1.children.0.text".to_string(), "Hello "),
                ("root.children.1.children.1.children.0.text".to_string(), "world"),
                ("root.children.2.children.0.children.0.text".to_string(), "First"),
                ("root.children.2.children.1.children.0.text".to_string(), "Second"),
            ]
        );
    }

    #[test]
    fn test_code_blocks_are_not_translated() {
        let value = json!({
            "root": {
                "type": "root",
                "children": [
                    {"type": "paragraph", "children": [{"type": "text", "text": "Run this"}]},
                    {
                        "type": "code",
                        "language": "javascript",
                        "children": [
                            {"type": "code-highlight", "text": "const x = 1;", "highlightType": "keyword"},
                            {"type": "linebreak"},
                            {"type": "code-highlight", "text": "x + 1"}
                        ]
                    }
                ]
            }
        });
        let tree = RichText::from_value(&value).unwrap();
        let texts = extract(&tree);
        assert_eq!(texts.values().collect::<Vec<_>>(), vec!["Run this"]);

        // A path pointing at a code leaf is ignored as well
        let mut forced = TextMap::new();
        forced.insert(NodePath::new(vec![0, 0]), "Lancez ceci".to_string());
        forced.insert(NodePath::new(vec![1, 0]), "garbage".to_string());
        let translated = reinject(&tree, &forced).to_value();
        assert_eq!(translated["root"]["children"][0]["children"][0]["text"], "Lancez ceci");
        assert_eq!(translated["root"]["children"][1], value["root"]["children"][1]);
    }

    #[test]
    fn test_malformed_nodes_skip_only_their_subtree() {
        let value = json!({
            "root": {
                "type": "root",
                "children": [
                    {"type": "paragraph", "children": [{"type": "text", "text": "Hello"}]},
                    {"type": "paragraph", "children": [{"text": "untyped"}]},
                    {"type": "paragraph", "children": [{"type": "text", "text": 42}]},
                    {"type": "paragraph", "children": "not a list"},
                    {"type": "list", "children": [{"type": "text", "text": "mixed"}, null]},
                    {"type": "paragraph", "children": [{"type": "text", "text": "World"}]}
                ]
            }
        });
        let tree = RichText::from_value(&value).expect("tree with malformed nodes still parses");
        assert_eq!(tree.to_value(), value);

        let texts = extract(&tree);
        assert_eq!(texts.values().collect::<Vec<_>>(), vec!["Hello", "World"]);

        let upper: TextMap = texts
            .into_iter()
            .map(|(path, text)| (path, text.to_uppercase()))
            .collect();
        let translated = reinject(&tree, &upper).to_value();
        assert_eq!(translated["root"]["children"][0]["children"][0]["text"], "HELLO");
        assert_eq!(translated["root"]["children"][5]["children"][0]["text"], "WORLD");
        for index in 1..5 {
            assert_eq!(
                translated["root"]["children"][index],
                value["root"]["children"][index]
            );
        }
    }

    #[test]
    fn test_extract_skips_blank_leaves() {
        let texts = extract(&sample());
        assert!(!texts.values().any(|t| t.trim().is_empty()));
        assert!(!texts.contains_key([1usize, 2].as_slice()));
    }

    #[test]
    fn test_round_trip_identity() {
        let tree = sample();
        let restored = reinject(&tree, &extract(&tree));
        assert_eq!(restored, tree);
    }

    #[test]
    fn test_shape_preserved_under_translation() {
        let tree = sample();
        let translated_texts: TextMap = extract(&tree)
            .into_iter()
            .map(|(path, text)| (path, swap_case(&text)))
            .collect();

        let translated = reinject(&tree, &translated_texts);

        assert_eq!(translated.node_count(), tree.node_count());
        assert_eq!(translated.shape(), tree.shape());
        assert_ne!(translated, tree);

        let leaves: Vec<String> = extract(&translated).into_values().collect();
        assert_eq!(leaves, vec!["oUR APPROACH", "hELLO ", "WORLD", "fIRST", "sECOND"]);

        // Non-text attributes are untouched
        let value = translated.to_value();
        assert_eq!(value["root"]["children"][1]["children"][1]["fields"]["url"], "https://example.com");
        assert_eq!(value["root"]["children"][0]["children"][0]["format"], 1);
    }

    #[test]
    fn test_reinject_does_not_mutate_input() {
        let tree = sample();
        let before = tree.clone();
        let texts: TextMap = extract(&tree)
            .into_keys()
            .map(|path| (path, "X".to_string()))
            .collect();
        let _ = reinject(&tree, &texts);
        assert_eq!(tree, before);
    }

    #[test]
    fn test_partial_mapping_leaves_other_leaves() {
        let tree = sample();
        let mut texts = TextMap::new();
        texts.insert(NodePath::new(vec![2, 1, 0]), "Antras".to_string());

        let translated = reinject(&tree, &texts);
        let leaves: Vec<String> = extract(&translated).into_values().collect();
        assert_eq!(leaves, vec!["Our approach", "Hello ", "world", "First", "Antras"]);
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let tree = sample();
        let first = extract(&tree);
        let noop = reinject(&tree, &TextMap::new());
        let second = extract(&noop);
        assert_eq!(
            first.keys().collect::<Vec<_>>(),
            second.keys().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_blank_leaf_never_overwritten() {
        let tree = sample();
        let texts: TextMap = extract(&tree)
            .into_iter()
            .map(|(path, text)| (path, swap_case(&text)))
            .collect();
        let translated = reinject(&tree, &texts);

        let blank = &translated.to_value()["root"]["children"][1]["children"][2]["text"];
        assert_eq!(blank, "   ");
    }

    #[test]
    fn test_empty_trees_are_noops() {
        let no_root = RichText {
            root: None,
            extra: Map::new(),
        };
        assert!(extract(&no_root).is_empty());
        assert_eq!(reinject(&no_root, &TextMap::new()), no_root);

        let no_children = RichText::new(Vec::new());
        assert!(extract(&no_children).is_empty());
        assert_eq!(reinject(&no_children, &TextMap::new()), no_children);
        assert!(!no_children.has_translatable_text());
    }

    #[test]
    fn test_depth_ceiling_leaves_deep_subtree() {
        let tree = deep_tree(60);
        let texts = extract(&tree);

        // Only the shallow leaf is reachable
        assert_eq!(texts.values().collect::<Vec<_>>(), vec!["top"]);

        let translated_texts: TextMap = texts
            .into_iter()
            .map(|(path, text)| (path, text.to_uppercase()))
            .collect();
        let translated = reinject(&tree, &translated_texts);

        assert_eq!(translated.shape(), tree.shape());
        let deep_branch = &translated.root.as_ref().unwrap().children.as_ref().unwrap()[0];
        let original_branch = &tree.root.as_ref().unwrap().children.as_ref().unwrap()[0];
        assert_eq!(deep_branch, original_branch);
    }

    #[test]
    fn test_custom_limit_is_symmetric() {
        let tree = deep_tree(3);
        assert_eq!(extract_with_limit(&tree, 10).len(), 2);
        assert_eq!(extract_with_limit(&tree, 2).len(), 1);

        let all: TextMap = extract_with_limit(&tree, 10)
            .into_iter()
            .map(|(path, _)| (path, "T".to_string()))
            .collect();
        let limited = reinject_with_limit(&tree, &all, 2);
        assert_eq!(
            extract_with_limit(&limited, 10).into_values().collect::<Vec<_>>(),
            vec!["bottom", "T"]
        );
    }

    #[test]
    fn test_node_path_display() {
        assert_eq!(NodePath::default().to_string(), "root.text");
        assert_eq!(
            NodePath::new(vec![0, 3]).to_string(),
            "root.children.0.children.3.text"
        );
    }
}
