use log::{debug, info, warn};
use serde_json::{Map, Value};
use tokio::sync::mpsc::Sender;

use crate::config::{ActiveVariants, ActiveVariantsUpdate, PipelineConfig};
use crate::error::{JournalError, Result};
use crate::extract::extract_json_object;
use crate::llm::client::LanguageModel;
use crate::llm::types::*;
use crate::resolver::PromptResolver;
use crate::schema::{EntryType, StructuredReply};
use crate::store::TemplateStore;
use crate::synthesize::{FieldSynthesizer, SynthesizedEntry};

/// Drives prompt resolution, model calls and reply structuring for journal
/// entries.
pub struct JournalAnalyzer<M, S> {
    model: M,
    store: S,
    config: PipelineConfig,
}

impl<M: LanguageModel, S: TemplateStore> JournalAnalyzer<M, S> {
    /// Active variants are read from `store` on every request, so settings
    /// written through [`JournalAnalyzer::store_mut`] apply immediately.
    pub fn new(model: M, store: S) -> Self {
        Self {
            model,
            store,
            config: PipelineConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn active_variants(&self) -> ActiveVariants {
        ActiveVariants::from_store(&self.store)
    }

    pub fn update_active_variants(&mut self, update: ActiveVariantsUpdate) {
        let mut active = self.active_variants();
        active.apply_update(&mut self.store, update);
    }

    /// Free-text narrative for the request's task type.
    pub async fn generate_narrative(
        &self,
        request: &AnalysisRequest,
        progress: Option<Sender<GenerationEvent>>,
    ) -> Result<Narrative> {
        require_raw_text(request)?;

        let task = request.task_type();
        let active = self.active_variants();
        let resolved = PromptResolver::new(&self.store, &active).resolve(
            task,
            &request.raw_text,
            &request.plan,
            request.variant.as_deref(),
        );
        self.send_event(
            &progress,
            GenerationEvent::ResolvingPrompt {
                task: task.to_string(),
                variant: resolved.variant.clone(),
            },
        )
        .await;

        self.send_event(&progress, GenerationEvent::RequestingNarrative)
            .await;
        info!(
            "Requesting {} narrative (variant '{}', {} prompt chars)",
            task,
            resolved.variant,
            resolved.prompt.chars().count()
        );
        let text = self
            .model
            .generate(&GenerationRequest::text(resolved.prompt))
            .await?;

        if text.trim().is_empty() {
            return Err(JournalError::InvalidModelResponse(
                "empty narrative reply".to_string(),
            ));
        }

        Ok(Narrative {
            task,
            variant: resolved.variant,
            text,
        })
    }

    /// Structured record through the JSON contract.
    pub async fn generate_structured(
        &self,
        request: &AnalysisRequest,
        progress: Option<Sender<GenerationEvent>>,
    ) -> Result<StructuredAnalysis> {
        require_raw_text(request)?;

        let active = self.active_variants();
        let resolved = PromptResolver::new(&self.store, &active).resolve_structured(
            &request.raw_text,
            request.entry_type,
            &request.plan,
            request.structured_variant.as_deref(),
        );
        self.send_event(
            &progress,
            GenerationEvent::ResolvingPrompt {
                task: "structured".to_string(),
                variant: resolved.variant.clone(),
            },
        )
        .await;

        let schema = StructuredReply::response_schema()?;
        self.send_event(&progress, GenerationEvent::RequestingStructured)
            .await;
        info!(
            "Requesting structured {} record (variant '{}')",
            request.entry_type, resolved.variant
        );
        let text = self
            .model
            .generate(&GenerationRequest::json(resolved.prompt, Some(schema)))
            .await?;

        self.send_event(&progress, GenerationEvent::ProcessingResponse)
            .await;
        let reply = parse_structured_reply(&text, true, request.entry_type)?;

        Ok(StructuredAnalysis {
            variant: resolved.variant,
            reply,
        })
    }

    /// Runs the narrative and the structured call concurrently. Either
    /// failure fails the whole analysis.
    pub async fn analyze(
        &self,
        request: &AnalysisRequest,
        progress: Option<Sender<GenerationEvent>>,
    ) -> Result<Analysis> {
        require_raw_text(request)?;
        self.send_event(&progress, GenerationEvent::Starting).await;

        let outcome = futures::try_join!(
            self.generate_narrative(request, progress.clone()),
            self.generate_structured(request, progress.clone()),
        );

        match outcome {
            Ok((narrative, structured)) => {
                self.send_event(&progress, GenerationEvent::Success).await;
                Ok(Analysis {
                    narrative,
                    structured,
                })
            }
            Err(e) => {
                warn!("Analysis of {} entry failed: {}", request.entry_type, e);
                self.send_event(
                    &progress,
                    GenerationEvent::Failed {
                        reason: e.to_string(),
                    },
                )
                .await;
                Err(e)
            }
        }
    }

    /// Legacy path: derives the record from a numbered narrative.
    pub fn structure_legacy(
        &self,
        narrative: &str,
        entry_type: EntryType,
        plan: &str,
    ) -> SynthesizedEntry {
        debug!("Structuring {} narrative through section parsing", entry_type);
        FieldSynthesizer::new(&self.config).structure(narrative, entry_type, plan)
    }

    async fn send_event(&self, sender: &Option<Sender<GenerationEvent>>, event: GenerationEvent) {
        if let Some(tx) = sender {
            let _ = tx.send(event).await;
        }
    }
}

fn require_raw_text(request: &AnalysisRequest) -> Result<()> {
    if request.raw_text.trim().is_empty() {
        return Err(JournalError::MissingInput(
            "raw text of the entry is empty".to_string(),
        ));
    }
    Ok(())
}

/// Decodes a JSON-contract reply.
///
/// With `json_mode` the model was forced to answer JSON and the whole reply
/// must parse; otherwise the first JSON object embedded in the text is used.
/// The entry-type tag is added to the metadata tags when missing.
pub fn parse_structured_reply(
    text: &str,
    json_mode: bool,
    entry_type: EntryType,
) -> Result<StructuredReply> {
    let object: Map<String, Value> = if json_mode {
        match serde_json::from_str::<Value>(text.trim()) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                return Err(JournalError::InvalidModelResponse(
                    "reply is not a JSON object".to_string(),
                ))
            }
            Err(e) => {
                return Err(JournalError::InvalidModelResponse(format!(
                    "reply is not valid JSON: {}",
                    e
                )))
            }
        }
    } else {
        extract_json_object(text).ok_or_else(|| {
            JournalError::InvalidModelResponse("no JSON object found in reply".to_string())
        })?
    };

    if !object.get("metadata").is_some_and(Value::is_object) {
        return Err(JournalError::InvalidModelResponse(
            "metadata field missing".to_string(),
        ));
    }

    let mut reply: StructuredReply = serde_json::from_value(Value::Object(object))
        .map_err(|e| JournalError::InvalidModelResponse(e.to_string()))?;

    reply.entry_type = if reply.entry_type.trim().is_empty() {
        entry_type.as_str().to_string()
    } else {
        EntryType::from_label(&reply.entry_type).as_str().to_string()
    };
    reply.metadata.ensure_entry_tag(entry_type);
    Ok(reply)
}
