use serde::{Deserialize, Serialize};

use crate::schema::{EntryType, StructuredReply, TaskType};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GenerationEvent {
    Starting,
    ResolvingPrompt { task: String, variant: String },
    RequestingNarrative,
    RequestingStructured,
    ProcessingResponse,
    Success,
    Failed { reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResponseFormat {
    #[default]
    Text,
    /// The model is asked to reply with JSON only.
    Json,
}

/// One round trip to the language model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub response_format: ResponseFormat,
    pub response_schema: Option<serde_json::Value>,
}

impl GenerationRequest {
    #[must_use]
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            response_format: ResponseFormat::Text,
            response_schema: None,
        }
    }

    #[must_use]
    pub fn json(prompt: impl Into<String>, schema: Option<serde_json::Value>) -> Self {
        Self {
            prompt: prompt.into(),
            response_format: ResponseFormat::Json,
            response_schema: schema,
        }
    }

    pub fn is_json(&self) -> bool {
        self.response_format == ResponseFormat::Json
    }
}

/// User input of a generation call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisRequest {
    pub raw_text: String,
    pub entry_type: EntryType,
    pub plan: String,
    /// Explicit task type of the narrative prompt.
    pub task: Option<TaskType>,
    /// Template name hint such as `"trade.v2"`, used when `task` is absent.
    pub template_hint: Option<String>,
    /// Explicit narrative variant.
    pub variant: Option<String>,
    /// Explicit structured variant.
    pub structured_variant: Option<String>,
}

impl AnalysisRequest {
    #[must_use]
    pub fn new(raw_text: impl Into<String>, entry_type: EntryType) -> Self {
        Self {
            raw_text: raw_text.into(),
            entry_type,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_plan(mut self, plan: impl Into<String>) -> Self {
        self.plan = plan.into();
        self
    }

    #[must_use]
    pub fn with_task(mut self, task: TaskType) -> Self {
        self.task = Some(task);
        self
    }

    #[must_use]
    pub fn with_template_hint(mut self, hint: impl Into<String>) -> Self {
        self.template_hint = Some(hint.into());
        self
    }

    #[must_use]
    pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = Some(variant.into());
        self
    }

    #[must_use]
    pub fn with_structured_variant(mut self, variant: impl Into<String>) -> Self {
        self.structured_variant = Some(variant.into());
        self
    }

    /// Task of the narrative prompt: the explicit task, then the template
    /// hint, then the task matching the entry type.
    pub fn task_type(&self) -> TaskType {
        match (self.task, self.template_hint.as_deref()) {
            (Some(task), _) => task,
            (None, Some(hint)) => TaskType::infer(None, Some(hint)),
            (None, None) => self.entry_type.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Narrative {
    pub task: TaskType,
    pub variant: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredAnalysis {
    pub variant: String,
    pub reply: StructuredReply,
}

/// Result of the combined narrative plus structured call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub narrative: Narrative,
    pub structured: StructuredAnalysis,
}
