//! Ranked result types fed into the view.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;

/// Stable result identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultId(pub String);

impl From<String> for ResultId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ResultId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for ResultId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResultId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Key used to decide where group labels start.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupKey(pub String);

impl From<&str> for GroupKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for GroupKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// What kind of result this is.
///
/// The view never renders anything itself; the kind only matters to
/// placement policies (continuations, heuristic suppression).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResultKind {
    /// A search engine result, optionally a query suggestion.
    Search {
        #[serde(default)]
        suggestion: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        engine: Option<String>,
    },

    /// A history or bookmark URL.
    #[default]
    Url,

    /// A keyword bookmark.
    Keyword,

    /// A tab from another device.
    RemoteTab,

    /// An already open tab.
    TabSwitch,

    /// A tip; tips are never suppressed as heuristics.
    Tip,

    /// A provider-defined result with its own layout.
    Dynamic { provider: String },
}

impl ResultKind {
    /// Whether this is a search suggestion.
    pub fn is_search_suggestion(&self) -> bool {
        matches!(self, ResultKind::Search { suggestion: true, .. })
    }
}

/// A placement request overriding pure rank order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedIndex {
    /// Non-negative values count from the start, negative from the end.
    Absolute(i32),

    /// Position inside the result's group; only known once the layout settles.
    GroupRelative(i32),
}

/// A ranked result produced by a result source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    /// Identity of the result across batches.
    pub id: ResultId,

    /// Result kind.
    #[serde(default)]
    pub kind: ResultKind,

    /// Whether this is the top/default result of its query.
    #[serde(default)]
    pub heuristic: bool,

    /// Optional placement request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_index: Option<SuggestedIndex>,

    /// Group used for section labels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupKey>,

    /// Display units occupied by this result.
    #[serde(default = "default_span")]
    pub span: usize,

    /// Whether the row showing this result can take the selection.
    #[serde(default = "default_selectable")]
    pub selectable: bool,

    /// Name of the provider that produced the result.
    #[serde(default)]
    pub provider: String,

    /// Arbitrary data for the presentation layer.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub payload: serde_json::Value,
}

fn default_span() -> usize {
    1
}

fn default_selectable() -> bool {
    true
}

impl RankedResult {
    /// Create an ordinary URL result.
    pub fn new(id: impl Into<ResultId>) -> Self {
        Self {
            id: id.into(),
            kind: ResultKind::Url,
            heuristic: false,
            suggested_index: None,
            group: None,
            span: 1,
            selectable: true,
            provider: String::new(),
            payload: serde_json::Value::Null,
        }
    }

    /// Create a heuristic result.
    pub fn heuristic(id: impl Into<ResultId>) -> Self {
        Self {
            heuristic: true,
            ..Self::new(id)
        }
    }

    pub fn with_kind(mut self, kind: ResultKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_suggested_index(mut self, index: SuggestedIndex) -> Self {
        self.suggested_index = Some(index);
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(GroupKey(group.into()));
        self
    }

    /// Set the span. Zero is treated as one.
    pub fn with_span(mut self, span: usize) -> Self {
        self.span = span.max(1);
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    pub fn unselectable(mut self) -> Self {
        self.selectable = false;
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// Display units occupied, never less than one.
    pub fn span(&self) -> usize {
        self.span.max(1)
    }

    pub fn has_suggested_index(&self) -> bool {
        self.suggested_index.is_some()
    }
}
