//! Per-field translation for one target locale
//!
//! Each configured field is resolved into a [`FieldShape`] and translated
//! according to it. Gateway failures never escape: the field keeps its
//! source value and the outcome records why.

use crate::document::{Document, FieldDescriptor, FieldKind, FieldShape, is_blank};
use crate::richtext::{self, RichText, TextMap};
use autolocale_mt::{MachineTranslator, MtResult, TranslationSettings};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// What happened to one field in one locale
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldOutcome {
    Translated,
    /// Left as it was under the only-missing policy
    Skipped,
    /// Copied without translation (opaque or empty)
    Copied,
    /// The gateway failed; the source value was used instead
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldReport {
    pub field: String,
    pub outcome: FieldOutcome,
}

/// Everything needed to translate fields into one locale
pub struct FieldContext<'a> {
    pub translator: &'a dyn MachineTranslator,
    pub collection: &'a str,
    pub document_id: &'a str,
    pub source_locale: &'a str,
    pub target_locale: &'a str,
    pub settings: &'a TranslationSettings,
}

/// Result of resolving all fields for one locale
#[derive(Debug, Default)]
pub struct ResolvedFields {
    /// Values to write, skipped fields excluded
    pub values: Map<String, Value>,
    pub reports: Vec<FieldReport>,
}

/// Whether the only-missing policy leaves `field` alone
///
/// A field is kept when the target record exists and already holds a
/// non-blank value that differs from the source. A missing target record
/// never skips.
pub fn keep_existing(target: Option<&Document>, field: &str, source_value: &Value) -> bool {
    match target.map(|doc| doc.get(field)) {
        Some(existing) => !is_blank(existing) && existing != Some(source_value),
        None => false,
    }
}

/// Translate every configured field present on `source`
pub async fn resolve_fields(
    ctx: &FieldContext<'_>,
    fields: &[FieldDescriptor],
    source: &Document,
    target: Option<&Document>,
    only_missing: bool,
) -> ResolvedFields {
    let mut resolved = ResolvedFields::default();

    for descriptor in fields {
        let Some(source_value) = source.get(&descriptor.name) else {
            continue;
        };

        if only_missing && keep_existing(target, &descriptor.name, source_value) {
            debug!(
                field = %descriptor.name,
                locale = ctx.target_locale,
                "Keeping existing value"
            );
            resolved.reports.push(FieldReport {
                field: descriptor.name.clone(),
                outcome: FieldOutcome::Skipped,
            });
            continue;
        }

        let (value, outcome) = translate_field(ctx, descriptor, source_value).await;
        resolved.values.insert(descriptor.name.clone(), value);
        resolved.reports.push(FieldReport {
            field: descriptor.name.clone(),
            outcome,
        });
    }

    resolved
}

/// Translate a single value, falling back to the source value on failure
pub async fn translate_field(
    ctx: &FieldContext<'_>,
    descriptor: &FieldDescriptor,
    source_value: &Value,
) -> (Value, FieldOutcome) {
    let shape = FieldShape::resolve(descriptor.kind, source_value);
    if descriptor.kind == FieldKind::RichText
        && matches!(shape, FieldShape::Opaque(_))
        && source_value.get("root").is_some()
    {
        warn!(
            collection = ctx.collection,
            id = ctx.document_id,
            locale = ctx.target_locale,
            field = %descriptor.name,
            "Malformed rich-text root, keeping source value"
        );
        return (
            source_value.clone(),
            FieldOutcome::Failed("malformed rich-text root".to_string()),
        );
    }

    let result = match shape {
        FieldShape::PlainText(text) if text.trim().is_empty() => Ok(None),
        FieldShape::PlainText(text) => translate_plain(ctx, &text).await.map(Some),
        FieldShape::RichText(tree) => translate_tree(ctx, &tree).await,
        FieldShape::Opaque(_) => Ok(None),
    };

    match result {
        Ok(Some(value)) => (value, FieldOutcome::Translated),
        Ok(None) => (source_value.clone(), FieldOutcome::Copied),
        Err(e) => {
            warn!(
                collection = ctx.collection,
                id = ctx.document_id,
                locale = ctx.target_locale,
                field = %descriptor.name,
                error = %e,
                "Field translation failed, keeping source value"
            );
            (source_value.clone(), FieldOutcome::Failed(e.to_string()))
        }
    }
}

async fn translate_plain(ctx: &FieldContext<'_>, text: &str) -> MtResult<Value> {
    let translated = ctx
        .translator
        .translate(text, Some(ctx.source_locale), ctx.target_locale, ctx.settings)
        .await?;
    Ok(Value::String(translated))
}

/// Extract, batch-translate and reinject one tree; `None` when it has no text
async fn translate_tree(ctx: &FieldContext<'_>, tree: &RichText) -> MtResult<Option<Value>> {
    let extracted = richtext::extract(tree);
    if extracted.is_empty() {
        return Ok(None);
    }

    let texts: Vec<String> = extracted.values().cloned().collect();
    let translated = ctx
        .translator
        .translate_batch(&texts, Some(ctx.source_locale), ctx.target_locale, ctx.settings)
        .await?;

    let mapping: TextMap = extracted.into_keys().zip(translated).collect();
    Ok(Some(richtext::reinject(tree, &mapping).to_value()))
}
