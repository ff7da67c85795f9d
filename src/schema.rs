use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::JournalError;
use crate::timeframe::stringify_timeframes;

/// Category of a generation request. Each task type owns its own set of
/// named prompt variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Analysis,
    Trade,
    Twitter,
}

impl TaskType {
    pub const ALL: [TaskType; 3] = [TaskType::Analysis, TaskType::Trade, TaskType::Twitter];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Analysis => "analysis",
            TaskType::Trade => "trade",
            TaskType::Twitter => "twitter",
        }
    }

    /// Picks the task for a request: an explicit type wins, then a template
    /// hint such as `"trade.v2"` or `"twitter.thread"`, then `Analysis`.
    pub fn infer(explicit: Option<TaskType>, template_hint: Option<&str>) -> TaskType {
        if let Some(task) = explicit {
            return task;
        }
        match template_hint {
            Some(hint) if hint.starts_with("trade") => TaskType::Trade,
            Some(hint) if hint.starts_with("twitter") => TaskType::Twitter,
            _ => TaskType::Analysis,
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "analysis" => Ok(TaskType::Analysis),
            "trade" => Ok(TaskType::Trade),
            "twitter" => Ok(TaskType::Twitter),
            other => Err(JournalError::UnknownTaskType(other.to_string())),
        }
    }
}

/// Journal entry discriminator. Anything that is not a trade is an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Trade,
    #[default]
    #[serde(alias = "analysis")]
    Analyse,
}

impl EntryType {
    pub fn from_label(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("trade") {
            EntryType::Trade
        } else {
            EntryType::Analyse
        }
    }

    /// Placeholder value: exactly `"trade"` or `"analyse"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Trade => "trade",
            EntryType::Analyse => "analyse",
        }
    }

    /// Tag attached to every metadata record of this type.
    pub fn tag(&self) -> &'static str {
        match self {
            EntryType::Trade => "Trade",
            EntryType::Analyse => "Analyse",
        }
    }
}

impl From<TaskType> for EntryType {
    fn from(task: TaskType) -> Self {
        match task {
            TaskType::Trade => EntryType::Trade,
            _ => EntryType::Analyse,
        }
    }
}

impl From<EntryType> for TaskType {
    fn from(entry_type: EntryType) -> Self {
        match entry_type {
            EntryType::Trade => TaskType::Trade,
            EntryType::Analyse => TaskType::Analysis,
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Variant of the JSON-producing template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StructuredVariant {
    #[default]
    Detailed,
    Summary,
}

impl StructuredVariant {
    pub const ALL: [StructuredVariant; 2] = [StructuredVariant::Detailed, StructuredVariant::Summary];

    pub fn as_str(&self) -> &'static str {
        match self {
            StructuredVariant::Detailed => "detailed",
            StructuredVariant::Summary => "summary",
        }
    }
}

impl fmt::Display for StructuredVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StructuredVariant {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "detailed" => Ok(StructuredVariant::Detailed),
            "summary" => Ok(StructuredVariant::Summary),
            other => Err(JournalError::UnknownVariant(other.to_string())),
        }
    }
}

pub const DEFAULT_VARIANT: &str = "default";
pub const ANALYSIS_VARIANT_KEY: &str = "analysis_variant";
pub const TRADE_VARIANT_KEY: &str = "trade_variant";
pub const STRUCTURED_VARIANT_KEY: &str = "structured_variant";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptVariant {
    pub task_type: TaskType,
    pub variant_name: String,
    pub template_text: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredTemplateVariant {
    pub variant_name: StructuredVariant,
    pub template_text: String,
    /// `None` for a built-in template that was never saved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveVariantSetting {
    pub setting_key: String,
    pub value: String,
}

/// Structured record attached to a journal entry. Field names are bound by
/// the UI and must stay stable.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct StructuredMetadata {
    #[serde(deserialize_with = "lenient_string")]
    #[schemars(description = "Short headline for the journal entry")]
    pub title: String,

    #[serde(deserialize_with = "lenient_string")]
    #[schemars(description = "Final result of the trade or main takeaway of the analysis")]
    pub result: String,

    #[serde(deserialize_with = "lenient_string")]
    #[schemars(description = "Quality judgement of the decision or the scenarios")]
    pub grade: String,

    #[serde(deserialize_with = "lenient_timeframe")]
    #[schemars(description = "Timeframes involved, e.g. 'W / D / H4'")]
    pub timeframe: String,

    #[serde(deserialize_with = "lenient_string")]
    #[schemars(description = "Traded instrument, e.g. 'EUR/USD' or 'NAS100'")]
    pub symbol: String,

    #[serde(deserialize_with = "lenient_string")]
    #[schemars(description = "Next actions to take")]
    pub next_steps: String,

    #[serde(deserialize_with = "lenient_string")]
    #[schemars(description = "Main risks and invalidation conditions")]
    pub risk: String,

    #[serde(deserialize_with = "lenient_tags")]
    #[schemars(description = "Free-form tags")]
    pub tags: Vec<String>,

    #[serde(deserialize_with = "lenient_string")]
    #[schemars(description = "One-line summary of the trading plan")]
    pub plan_summary: String,

    #[serde(deserialize_with = "lenient_string")]
    #[schemars(description = "Condensed outcome of the entry")]
    pub outcome: String,

    #[serde(
        deserialize_with = "lenient_adherence",
        skip_serializing_if = "Option::is_none"
    )]
    #[schemars(description = "Plan adherence score between 0 and 100")]
    pub plan_adherence: Option<u8>,
}

impl StructuredMetadata {
    /// Puts the entry-type tag in the tag list if it is missing.
    pub fn ensure_entry_tag(&mut self, entry_type: EntryType) {
        let tag = entry_type.tag();
        if !self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            self.tags.push(tag.to_string());
        }
    }
}

/// Reply of the JSON contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StructuredReply {
    #[serde(default, deserialize_with = "lenient_string")]
    #[schemars(description = "Either 'trade' or 'analyse'")]
    pub entry_type: String,

    pub metadata: StructuredMetadata,

    #[serde(default, deserialize_with = "lenient_optional_string")]
    #[schemars(description = "Optional condensed narrative")]
    pub content: Option<String>,
}

impl StructuredReply {
    /// Response schema handed to the model for forced-JSON requests:
    /// subschemas inlined, no `$schema` or `definitions` keys.
    pub fn response_schema() -> serde_json::Result<serde_json::Value> {
        let settings = schemars::gen::SchemaSettings::draft07().with(|s| {
            s.inline_subschemas = true;
            s.meta_schema = None;
        });
        let root = settings
            .into_generator()
            .into_root_schema_for::<StructuredReply>();
        clean_schema(serde_json::to_value(root)?)
    }
}

fn clean_schema(mut value: serde_json::Value) -> serde_json::Result<serde_json::Value> {
    if let Some(obj) = value.as_object_mut() {
        obj.remove("$schema");
        obj.remove("definitions");
        obj.remove("title");
    }
    Ok(value)
}

fn value_to_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(value_to_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        other @ serde_json::Value::Object(_) => other.to_string(),
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value_to_text(value))
}

fn lenient_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = lenient_string(deserializer)?;
    Ok(if text.trim().is_empty() { None } else { Some(text) })
}

fn lenient_timeframe<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(stringify_timeframes(&value))
}

fn lenient_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let tags = match value {
        serde_json::Value::Array(items) => items.into_iter().map(value_to_text).collect(),
        serde_json::Value::String(s) => s.split(',').map(str::to_string).collect(),
        serde_json::Value::Null => Vec::new(),
        other => vec![value_to_text(other)],
    };
    Ok(tags
        .into_iter()
        .map(|t: String| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect())
}

fn lenient_adherence<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let score = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(score
        .filter(|v| v.is_finite())
        .map(|v| v.round().clamp(0.0, 100.0) as u8))
}
