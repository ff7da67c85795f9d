use chrono::Utc;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{JournalError, Result};
use crate::prompts::builtin_structured_template;
use crate::schema::{
    PromptVariant, StructuredTemplateVariant, StructuredVariant, TaskType, DEFAULT_VARIANT,
};

/// Persistence of prompt variants, structured templates and settings.
///
/// Reads take `&self` so resolution can run against a shared store; only
/// operator-driven edits need `&mut self`.
pub trait TemplateStore {
    fn prompt_variant(&self, task: TaskType, variant: &str) -> Option<PromptVariant>;

    /// Inserts or replaces a variant, stamping `updated_at`.
    fn save_prompt_variant(&mut self, task: TaskType, variant: &str, text: &str) -> PromptVariant;

    /// Returns whether a row was removed. The `default` variant is refused.
    fn delete_prompt_variant(&mut self, task: TaskType, variant: &str) -> Result<bool>;

    fn prompt_variants(&self) -> BTreeMap<TaskType, Vec<PromptVariant>>;

    fn structured_template(&self, variant: StructuredVariant) -> Option<StructuredTemplateVariant>;

    fn save_structured_template(
        &mut self,
        variant: StructuredVariant,
        text: &str,
    ) -> StructuredTemplateVariant;

    fn setting(&self, key: &str) -> Option<String>;

    fn save_setting(&mut self, key: &str, value: &str);
}

/// Every structured variant with its stored text, or the built-in text when
/// nothing has been saved yet.
pub fn structured_templates<S: TemplateStore + ?Sized>(store: &S) -> Vec<StructuredTemplateVariant> {
    StructuredVariant::ALL
        .iter()
        .map(|variant| {
            store
                .structured_template(*variant)
                .unwrap_or_else(|| StructuredTemplateVariant {
                    variant_name: *variant,
                    template_text: builtin_structured_template(*variant).to_string(),
                    updated_at: None,
                })
        })
        .collect()
}

/// In-memory store with JSON snapshot persistence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryTemplateStore {
    #[serde(default)]
    prompt_variants: Vec<PromptVariant>,
    #[serde(default)]
    structured_templates: Vec<StructuredTemplateVariant>,
    #[serde(default)]
    settings: BTreeMap<String, String>,
}

impl MemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_json(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let store: Self = serde_json::from_str(&raw)?;
        debug!(
            "Loaded template store from {} ({} prompt variants, {} structured templates, {} settings)",
            path.display(),
            store.prompt_variants.len(),
            store.structured_templates.len(),
            store.settings.len()
        );
        Ok(store)
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

impl TemplateStore for MemoryTemplateStore {
    fn prompt_variant(&self, task: TaskType, variant: &str) -> Option<PromptVariant> {
        self.prompt_variants
            .iter()
            .find(|row| row.task_type == task && row.variant_name == variant)
            .cloned()
    }

    fn save_prompt_variant(&mut self, task: TaskType, variant: &str, text: &str) -> PromptVariant {
        let row = PromptVariant {
            task_type: task,
            variant_name: variant.to_string(),
            template_text: text.to_string(),
            updated_at: Utc::now(),
        };
        match self
            .prompt_variants
            .iter_mut()
            .find(|existing| existing.task_type == task && existing.variant_name == variant)
        {
            Some(existing) => *existing = row.clone(),
            None => self.prompt_variants.push(row.clone()),
        }
        row
    }

    fn delete_prompt_variant(&mut self, task: TaskType, variant: &str) -> Result<bool> {
        if variant == DEFAULT_VARIANT {
            return Err(JournalError::ProtectedVariant {
                task: task.to_string(),
                variant: variant.to_string(),
            });
        }
        let before = self.prompt_variants.len();
        self.prompt_variants
            .retain(|row| !(row.task_type == task && row.variant_name == variant));
        Ok(self.prompt_variants.len() < before)
    }

    fn prompt_variants(&self) -> BTreeMap<TaskType, Vec<PromptVariant>> {
        let mut grouped: BTreeMap<TaskType, Vec<PromptVariant>> = BTreeMap::new();
        for row in &self.prompt_variants {
            grouped.entry(row.task_type).or_default().push(row.clone());
        }
        grouped
    }

    fn structured_template(&self, variant: StructuredVariant) -> Option<StructuredTemplateVariant> {
        self.structured_templates
            .iter()
            .find(|row| row.variant_name == variant)
            .cloned()
    }

    fn save_structured_template(
        &mut self,
        variant: StructuredVariant,
        text: &str,
    ) -> StructuredTemplateVariant {
        let row = StructuredTemplateVariant {
            variant_name: variant,
            template_text: text.to_string(),
            updated_at: Some(Utc::now()),
        };
        match self
            .structured_templates
            .iter_mut()
            .find(|existing| existing.variant_name == variant)
        {
            Some(existing) => *existing = row.clone(),
            None => self.structured_templates.push(row.clone()),
        }
        row
    }

    fn setting(&self, key: &str) -> Option<String> {
        self.settings.get(key).cloned()
    }

    fn save_setting(&mut self, key: &str, value: &str) {
        self.settings.insert(key.to_string(), value.to_string());
    }
}
