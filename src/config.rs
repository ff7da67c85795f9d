use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::schema::{
    ActiveVariantSetting, StructuredVariant, TaskType, ANALYSIS_VARIANT_KEY,
    STRUCTURED_VARIANT_KEY, TRADE_VARIANT_KEY,
};
use crate::store::TemplateStore;

/// Request budget of the language model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelLimits {
    pub requests_per_minute: u64,
    pub requests_per_day: u64,
    pub tokens_per_minute: u64,
}

impl Default for ModelLimits {
    fn default() -> Self {
        Self {
            requests_per_minute: 10,
            requests_per_day: 250,
            tokens_per_minute: 250_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Character bound of every summarized metadata field.
    pub summary_limit: usize,
    /// Symbol used when neither the narrative nor the plan names one.
    pub fallback_symbol: String,
    /// Tag naming the model that produced a record.
    pub model_tag: String,
    pub rate_limits: ModelLimits,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            summary_limit: 120,
            fallback_symbol: "EURUSD".to_string(),
            model_tag: "Gemini".to_string(),
            rate_limits: ModelLimits::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        debug!("Loaded pipeline configuration from {}", path.display());
        Ok(config)
    }
}

/// Variants selected by the operator when a request names none.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActiveVariants {
    pub analysis: Option<String>,
    pub trade: Option<String>,
    pub structured: Option<String>,
}

/// Partial update of the active variants; `None` leaves a value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActiveVariantsUpdate {
    pub analysis: Option<String>,
    pub trade: Option<String>,
    pub structured: Option<StructuredVariant>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl ActiveVariants {
    pub fn from_store<S: TemplateStore + ?Sized>(store: &S) -> Self {
        Self {
            analysis: non_blank(store.setting(ANALYSIS_VARIANT_KEY)),
            trade: non_blank(store.setting(TRADE_VARIANT_KEY)),
            structured: non_blank(store.setting(STRUCTURED_VARIANT_KEY)),
        }
    }

    pub fn for_task(&self, task: TaskType) -> Option<&str> {
        match task {
            TaskType::Analysis => self.analysis.as_deref(),
            TaskType::Trade => self.trade.as_deref(),
            TaskType::Twitter => None,
        }
    }

    /// The configured structured variant; unknown names resolve to `None`.
    pub fn structured_variant(&self) -> Option<StructuredVariant> {
        self.structured.as_deref().and_then(|name| name.parse().ok())
    }

    /// Writes the non-empty parts of `update` to the store and to `self`.
    pub fn apply_update<S: TemplateStore + ?Sized>(
        &mut self,
        store: &mut S,
        update: ActiveVariantsUpdate,
    ) {
        if let Some(analysis) = non_blank(update.analysis) {
            store.save_setting(ANALYSIS_VARIANT_KEY, &analysis);
            self.analysis = Some(analysis);
        }
        if let Some(trade) = non_blank(update.trade) {
            store.save_setting(TRADE_VARIANT_KEY, &trade);
            self.trade = Some(trade);
        }
        if let Some(structured) = update.structured {
            store.save_setting(STRUCTURED_VARIANT_KEY, structured.as_str());
            self.structured = Some(structured.to_string());
        }
    }

    pub fn settings(&self) -> Vec<ActiveVariantSetting> {
        [
            (ANALYSIS_VARIANT_KEY, &self.analysis),
            (TRADE_VARIANT_KEY, &self.trade),
            (STRUCTURED_VARIANT_KEY, &self.structured),
        ]
        .into_iter()
        .filter_map(|(key, value)| {
            value.as_ref().map(|v| ActiveVariantSetting {
                setting_key: key.to_string(),
                value: v.clone(),
            })
        })
        .collect()
    }
}
