//! Documents and the shapes their translatable fields can take

use crate::richtext::RichText;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key under which the publication status is stored and serialized
pub const STATUS_KEY: &str = "_status";

/// Publication status of one locale record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Draft,
    Published,
}

/// One locale variant of a stored document
///
/// Field values are kept as raw JSON; their meaning comes from the
/// collection's [`FieldDescriptor`]s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(rename = "_status", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<DocumentStatus>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: None,
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn with_status(mut self, status: DocumentStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Field value as a string slice, when it is one
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Merge a partial record into this one
    ///
    /// A `_status` entry sets the status (`null` clears it) instead of
    /// becoming a field. An unrecognised status value is ignored.
    pub fn merge(&mut self, mut data: Map<String, Value>) {
        if let Some(status) = data.remove(STATUS_KEY)
            && let Ok(status) = serde_json::from_value(status)
        {
            self.status = status;
        }
        self.fields.extend(data);
    }
}

/// How a configured field is translated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// A scalar string, translated in one call
    PlainText,
    /// A rich-text tree, translated leaf by leaf in one batch
    RichText,
    /// Copied as-is (relations, media, locale-keyed objects)
    Opaque,
}

/// A translatable field of a collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: FieldKind,
}

impl FieldDescriptor {
    pub fn plain_text(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::PlainText,
        }
    }

    pub fn rich_text(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::RichText,
        }
    }

    pub fn opaque(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Opaque,
        }
    }
}

/// A stored value viewed through its field descriptor
///
/// A value that does not actually have the configured shape (a number in a
/// plain-text field, a locale-keyed object in a rich-text field) is treated
/// as opaque and copied untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldShape {
    PlainText(String),
    RichText(RichText),
    Opaque(Value),
}

impl FieldShape {
    pub fn resolve(kind: FieldKind, value: &Value) -> Self {
        match (kind, value) {
            (FieldKind::PlainText, Value::String(text)) => FieldShape::PlainText(text.clone()),
            (FieldKind::RichText, _) => match RichText::from_value(value) {
                Some(tree) => FieldShape::RichText(tree),
                None => FieldShape::Opaque(value.clone()),
            },
            _ => FieldShape::Opaque(value.clone()),
        }
    }
}

/// Whether a stored value counts as missing for the only-missing policy
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(value @ Value::Object(object)) => match RichText::from_value(value) {
            Some(tree) => !tree.has_translatable_text(),
            None => object.is_empty(),
        },
        Some(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_moves_status_out_of_fields() {
        let mut doc = Document::new("42")
            .with_field("title", json!("Hello"))
            .with_status(DocumentStatus::Draft);
        let data = json!({"title": "Bonjour", "_status": "published"});
        doc.merge(data.as_object().cloned().unwrap());

        assert_eq!(doc.status, Some(DocumentStatus::Published));
        assert!(doc.get(STATUS_KEY).is_none());
        assert_eq!(
            serde_json::to_value(&doc).unwrap(),
            json!({"id": "42", "_status": "published", "title": "Bonjour"})
        );

        doc.merge(json!({"_status": "archived"}).as_object().cloned().unwrap());
        assert_eq!(doc.status, Some(DocumentStatus::Published));
        doc.merge(json!({"_status": null}).as_object().cloned().unwrap());
        assert_eq!(doc.status, None);
    }

    #[test]
    fn test_document_serde_flattens_fields() {
        let doc = Document::new("42")
            .with_field("title", json!("Hello"))
            .with_status(DocumentStatus::Draft);
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value, json!({"id": "42", "_status": "draft", "title": "Hello"}));

        let back: Document = serde_json::from_value(value).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn test_resolve_shapes() {
        assert_eq!(
            FieldShape::resolve(FieldKind::PlainText, &json!("Hi")),
            FieldShape::PlainText("Hi".to_string())
        );
        assert!(matches!(
            FieldShape::resolve(FieldKind::RichText, &json!({"root": {"type": "root", "children": []}})),
            FieldShape::RichText(_)
        ));
        assert_eq!(
            FieldShape::resolve(FieldKind::PlainText, &json!(7)),
            FieldShape::Opaque(json!(7))
        );
        assert_eq!(
            FieldShape::resolve(FieldKind::RichText, &json!({"en": "Hello"})),
            FieldShape::Opaque(json!({"en": "Hello"}))
        );
        assert_eq!(
            FieldShape::resolve(FieldKind::Opaque, &json!("media-17")),
            FieldShape::Opaque(json!("media-17"))
        );
    }

    #[test]
    fn test_is_blank() {
        assert!(is_blank(None));
        assert!(is_blank(Some(&Value::Null)));
        assert!(is_blank(Some(&json!("  "))));
        assert!(is_blank(Some(&json!({"root": {"type": "root", "children": []}}))));
        assert!(is_blank(Some(&json!({}))));
        assert!(!is_blank(Some(&json!("Labas"))));
        assert!(!is_blank(Some(&json!(0))));
        assert!(!is_blank(Some(&json!({
            "root": {"type": "root", "children": [{"type": "text", "text": "x"}]}
        }))));
    }
}
