//! Per-request formatting options understood by the translation vendor
//!
//! Settings can be supplied by an HTTP caller and by the collection
//! configuration. [`TranslationSettings::overlay`] merges the two, with the
//! collection values winning wherever both are set.

use serde::{Deserialize, Serialize};

/// Formality level of the translated text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Formality {
    More,
    Less,
    PreferMore,
    PreferLess,
}

impl Formality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Formality::More => "more",
            Formality::Less => "less",
            Formality::PreferMore => "prefer_more",
            Formality::PreferLess => "prefer_less",
        }
    }
}

impl std::str::FromStr for Formality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "more" => Ok(Formality::More),
            "less" => Ok(Formality::Less),
            "prefer_more" => Ok(Formality::PreferMore),
            "prefer_less" => Ok(Formality::PreferLess),
            other => Err(format!("Unknown formality: {}", other)),
        }
    }
}

/// How markup inside the text is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagHandling {
    Xml,
    Html,
}

impl TagHandling {
    pub fn as_str(&self) -> &'static str {
        match self {
            TagHandling::Xml => "xml",
            TagHandling::Html => "html",
        }
    }
}

/// Sentence splitting behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitSentences {
    #[serde(rename = "0")]
    Off,
    #[serde(rename = "1")]
    On,
    #[serde(rename = "nonewlines")]
    NoNewlines,
}

impl SplitSentences {
    pub fn as_str(&self) -> &'static str {
        match self {
            SplitSentences::Off => "0",
            SplitSentences::On => "1",
            SplitSentences::NoNewlines => "nonewlines",
        }
    }
}

/// Optional formatting settings sent along with every translation request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formality: Option<Formality>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preserve_formatting: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_handling: Option<TagHandling>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split_sentences: Option<SplitSentences>,
}

impl TranslationSettings {
    /// Merge `priority` on top of `self`; every field set in `priority` wins.
    pub fn overlay(&self, priority: &TranslationSettings) -> TranslationSettings {
        TranslationSettings {
            formality: priority.formality.or(self.formality),
            preserve_formatting: priority.preserve_formatting.or(self.preserve_formatting),
            tag_handling: priority.tag_handling.or(self.tag_handling),
            split_sentences: priority.split_sentences.or(self.split_sentences),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == TranslationSettings::default()
    }
}
