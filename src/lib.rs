//! # Trading Journal AI
//!
//! Prompt resolution and reply structuring for an AI-assisted trading
//! journal. Raw trade or analysis notes go in; a prompt is resolved from
//! stored or built-in templates, a language model answers, and the answer is
//! turned into a [`StructuredMetadata`] record the journal can persist.
//!
//! ## Core Concepts
//!
//! - **Variants**: named alternative prompt templates per task type
//!   (`analysis`, `trade`, `twitter`), with operator overrides kept in a
//!   [`TemplateStore`]
//! - **Structured contract**: the model is forced to answer JSON matching
//!   [`StructuredReply::response_schema`]
//! - **Legacy contract**: the model answers numbered markdown sections which
//!   are parsed heuristically and mapped to fields by a fixed
//!   [`SectionLayout`] per entry type
//!
//! ## Example
//!
//! ```rust,ignore
//! use trading_journal_ai::*;
//!
//! let analyzer = JournalAnalyzer::new(my_model, MemoryTemplateStore::new());
//! let request = AnalysisRequest::new("Long NAS100 at the 15230 retest", EntryType::Trade)
//!     .with_plan("Buy pullbacks above the weekly open");
//!
//! let analysis = analyzer.analyze(&request, None).await?;
//! println!("{}", analysis.structured.reply.metadata.title);
//!
//! // Older free-text replies go through the section parser instead.
//! let legacy = analyzer.structure_legacy(&analysis.narrative.text, EntryType::Trade, "");
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod layout;
pub mod llm;
pub mod prompts;
pub mod resolver;
pub mod schema;
pub mod sections;
pub mod store;
pub mod synthesize;
pub mod template;
pub mod ticker;
pub mod timeframe;

pub use config::{ActiveVariants, ActiveVariantsUpdate, ModelLimits, PipelineConfig};
pub use error::{JournalError, Result};
pub use extract::extract_json_object;
pub use layout::{MetadataField, SectionLayout, SectionSpec};
pub use llm::*;
pub use prompts::{builtin_prompt, builtin_structured_template, builtin_variant_names};
pub use resolver::{resolve_prompt, PromptResolver, ResolvedPrompt, TemplateSource};
pub use schema::*;
pub use sections::{clean_text, parse_sections, Sections};
pub use store::{structured_templates, MemoryTemplateStore, TemplateStore};
pub use synthesize::{
    first_sentence, structure_narrative, summarize_short, FieldSynthesizer, SynthesizedEntry,
};
pub use template::{interpolate, Placeholders};
pub use ticker::guess_symbol;
pub use timeframe::{normalize_timeframes, stringify_timeframes};
