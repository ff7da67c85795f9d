//! Template resolution.
//!
//! The variant is picked explicit → configured-active → `"default"`; the text
//! comes from the store, then the built-in table for that variant, then the
//! built-in `"default"` of the task. Resolution never fails: the worst case
//! is an empty prompt.

use log::debug;

use crate::config::ActiveVariants;
use crate::layout::SectionLayout;
use crate::prompts::{
    builtin_prompt, builtin_structured_template, structured_instruction,
};
use crate::schema::{EntryType, StructuredVariant, TaskType, DEFAULT_VARIANT};
use crate::store::TemplateStore;
use crate::template::{interpolate, Placeholders};

/// Where the template text of a resolved prompt came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateSource {
    Stored,
    BuiltIn,
    BuiltInDefault,
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPrompt {
    pub variant: String,
    pub source: TemplateSource,
    pub prompt: String,
}

pub struct PromptResolver<'a, S: TemplateStore + ?Sized> {
    store: &'a S,
    active: &'a ActiveVariants,
}

fn explicit_name(explicit: Option<&str>) -> Option<&str> {
    explicit.map(str::trim).filter(|name| !name.is_empty())
}

impl<'a, S: TemplateStore + ?Sized> PromptResolver<'a, S> {
    pub fn new(store: &'a S, active: &'a ActiveVariants) -> Self {
        Self { store, active }
    }

    pub fn effective_variant(&self, task: TaskType, explicit: Option<&str>) -> String {
        explicit_name(explicit)
            .or_else(|| self.active.for_task(task))
            .unwrap_or(DEFAULT_VARIANT)
            .to_string()
    }

    pub fn template_text(&self, task: TaskType, variant: &str) -> (String, TemplateSource) {
        if let Some(stored) = self.store.prompt_variant(task, variant) {
            if !stored.template_text.trim().is_empty() {
                return (stored.template_text, TemplateSource::Stored);
            }
        }
        if let Some(text) = builtin_prompt(task, variant) {
            return (text.to_string(), TemplateSource::BuiltIn);
        }
        if let Some(text) = builtin_prompt(task, DEFAULT_VARIANT) {
            return (text.to_string(), TemplateSource::BuiltInDefault);
        }
        (String::new(), TemplateSource::Empty)
    }

    /// Free-text prompt for `task`.
    pub fn resolve(
        &self,
        task: TaskType,
        raw_text: &str,
        plan: &str,
        explicit: Option<&str>,
    ) -> ResolvedPrompt {
        let variant = self.effective_variant(task, explicit);
        let (template, source) = self.template_text(task, &variant);
        debug!(
            "Resolved {} prompt: variant '{}' from {:?} template",
            task, variant, source
        );

        let entry_type = EntryType::from(task);
        let prompt = interpolate(
            &template,
            &base_placeholders(raw_text, plan, entry_type, StructuredVariant::default()),
        );

        ResolvedPrompt {
            variant,
            source,
            prompt,
        }
    }

    pub fn effective_structured_variant(&self, explicit: Option<&str>) -> StructuredVariant {
        explicit_name(explicit)
            .and_then(|name| name.parse().ok())
            .or_else(|| self.active.structured_variant())
            .unwrap_or_default()
    }

    /// Prompt of the JSON contract.
    pub fn resolve_structured(
        &self,
        raw_text: &str,
        entry_type: EntryType,
        plan: &str,
        explicit: Option<&str>,
    ) -> ResolvedPrompt {
        let variant = self.effective_structured_variant(explicit);
        let (template, source) = match self.store.structured_template(variant) {
            Some(stored) if !stored.template_text.trim().is_empty() => {
                (stored.template_text, TemplateSource::Stored)
            }
            _ => (
                builtin_structured_template(variant).to_string(),
                TemplateSource::BuiltIn,
            ),
        };
        debug!(
            "Resolved structured prompt: variant '{}' from {:?} template",
            variant, source
        );

        let prompt = interpolate(
            &template,
            &base_placeholders(raw_text, plan, entry_type, variant),
        );

        ResolvedPrompt {
            variant: variant.to_string(),
            source,
            prompt,
        }
    }
}

fn base_placeholders(
    raw_text: &str,
    plan: &str,
    entry_type: EntryType,
    variant: StructuredVariant,
) -> Placeholders {
    let instruction = structured_instruction(variant);
    Placeholders::new()
        .with("rawText", raw_text)
        .with("plan", plan)
        .with("entryType", entry_type.as_str())
        .with("variantTitle", instruction.title)
        .with("instruction", instruction.instruction)
        .with(
            "sections",
            SectionLayout::for_entry(entry_type).render_outline(),
        )
}

/// One-shot form of [`PromptResolver::resolve`] returning only the prompt.
pub fn resolve_prompt<S: TemplateStore + ?Sized>(
    store: &S,
    active: &ActiveVariants,
    task: TaskType,
    raw_text: &str,
    plan: &str,
    explicit: Option<&str>,
) -> String {
    PromptResolver::new(store, active)
        .resolve(task, raw_text, plan, explicit)
        .prompt
}
