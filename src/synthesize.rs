use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::layout::{MetadataField, SectionLayout};
use crate::schema::{EntryType, StructuredMetadata};
use crate::sections::{clean_text, parse_sections, Sections};
use crate::ticker::guess_symbol;

const ELLIPSIS: char = '…';
const SNIPPET_LIMIT: usize = 220;

/// Per-type texts used when a field cannot be derived.
struct FieldDefaults {
    result: &'static str,
    grade: &'static str,
    timeframe: &'static str,
    next_steps: &'static str,
    risk: &'static str,
}

fn defaults(entry_type: EntryType) -> FieldDefaults {
    match entry_type {
        EntryType::Trade => FieldDefaults {
            result: "Trade validated",
            grade: "Trade review",
            timeframe: "H1 / H4",
            next_steps: "Check stop management and prepare the daily review.",
            risk: "Stop and risk management to watch.",
        },
        EntryType::Analyse => FieldDefaults {
            result: "AI analysis",
            grade: "Crossed scenarios",
            timeframe: "D / H4",
            next_steps: "Follow the levels mentioned and refresh the signals.",
            risk: "Macro risks and invalidation by major events.",
        },
    }
}

const PLAN_FALLBACK: &str = "Plan not provided.";
const TITLE_FALLBACK: &str = "AI summary";
const OUTCOME_FALLBACK: &str = "Summary to be completed.";
const UNKNOWN_SYMBOL: &str = "Unspecified instrument";

/// Truncates to at most `limit` characters, ending with an ellipsis when cut.
pub fn clamp_chars(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    if limit == 0 {
        return String::new();
    }
    let head: String = text.chars().take(limit - 1).collect();
    let mut clamped = head.trim_end().to_string();
    clamped.push(ELLIPSIS);
    clamped
}

/// First sentence of a single-line text: everything up to the first `.`,
/// `!` or `?` followed by whitespace or the end of the text. Decimal points
/// such as `1.0900` do not end a sentence.
pub fn first_sentence(text: &str) -> &str {
    let mut chars = text.char_indices().peekable();
    while let Some((idx, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let at_boundary = chars.peek().map_or(true, |(_, next)| next.is_whitespace());
        let candidate = text[..idx + c.len_utf8()].trim();
        if at_boundary && candidate.chars().any(char::is_alphanumeric) {
            return candidate;
        }
    }
    text.lines().next().unwrap_or("").trim()
}

/// Cleans `text` and returns its first sentence bounded to `limit` characters.
pub fn summarize_short(text: &str, limit: usize) -> String {
    let normalized = clean_text(text);
    if normalized.is_empty() {
        return String::new();
    }
    let sentence = first_sentence(&normalized);
    let candidate = if sentence.is_empty() {
        normalized.as_str()
    } else {
        sentence
    };
    clamp_chars(candidate, limit)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesizedEntry {
    pub metadata: StructuredMetadata,
    /// Unbounded outcome summary; `metadata.outcome` is its bounded form.
    pub summary: String,
}

/// Builds metadata from a numbered free-text narrative.
pub struct FieldSynthesizer<'a> {
    config: &'a PipelineConfig,
}

impl<'a> FieldSynthesizer<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self { config }
    }

    fn field_text(&self, sections: &Sections, layout: &SectionLayout, field: MetadataField) -> String {
        layout
            .sources(field)
            .iter()
            .filter_map(|number| sections.get(&number.to_string()))
            .find(|text| !text.is_empty())
            .map(|text| summarize_short(text, self.config.summary_limit))
            .unwrap_or_default()
    }

    /// Never fails: every field falls back to a default text when the
    /// narrative does not provide it.
    pub fn structure(&self, narrative: &str, entry_type: EntryType, plan: &str) -> SynthesizedEntry {
        let limit = self.config.summary_limit;
        let layout = SectionLayout::for_entry(entry_type);
        let fallback = defaults(entry_type);

        let sections: Sections = parse_sections(narrative)
            .into_iter()
            .map(|(number, text)| (number, clean_text(&text)))
            .collect();
        if sections.is_empty() {
            debug!("No numbered sections found in {} narrative", entry_type);
        }

        let plan_first_line = clean_text(plan.lines().next().unwrap_or(""));
        let or_default = |text: String, default: &str| {
            if text.is_empty() {
                clamp_chars(default, limit)
            } else {
                text
            }
        };

        let title_prefix = format!("{} {} · ", entry_type.tag(), self.config.model_tag);
        let title_room = limit.saturating_sub(title_prefix.chars().count());
        let mut title_body = self.field_text(&sections, layout, MetadataField::Title);
        if title_body.is_empty() {
            title_body = plan_first_line.clone();
        }
        let title_body = or_default(clamp_chars(&title_body, title_room), TITLE_FALLBACK);
        let title = clamp_chars(&format!("{}{}", title_prefix, title_body), limit);

        let mut plan_summary = self.field_text(&sections, layout, MetadataField::PlanSummary);
        if plan_summary.is_empty() {
            plan_summary = summarize_short(&plan_first_line, limit);
        }

        let symbol = {
            let guessed = guess_symbol(narrative);
            let guessed = if guessed.is_empty() { guess_symbol(plan) } else { guessed };
            if guessed.is_empty() {
                debug!(
                    "No symbol found in narrative or plan, using '{}'",
                    self.config.fallback_symbol
                );
                self.config.fallback_symbol.clone()
            } else {
                guessed
            }
        };

        let pieces: Vec<String> = layout
            .summary_sections
            .iter()
            .filter_map(|number| sections.get(&number.to_string()))
            .map(|text| summarize_short(text, limit))
            .filter(|piece| !piece.is_empty())
            .collect();
        let summary = if pieces.is_empty() {
            summarize_short(narrative, limit)
        } else {
            pieces.join(" · ")
        };

        let metadata = StructuredMetadata {
            title,
            result: or_default(
                self.field_text(&sections, layout, MetadataField::Result),
                fallback.result,
            ),
            grade: or_default(
                self.field_text(&sections, layout, MetadataField::Grade),
                fallback.grade,
            ),
            timeframe: or_default(
                self.field_text(&sections, layout, MetadataField::Timeframe),
                fallback.timeframe,
            ),
            symbol: clamp_chars(&symbol, limit),
            next_steps: or_default(
                self.field_text(&sections, layout, MetadataField::NextSteps),
                fallback.next_steps,
            ),
            risk: or_default(
                self.field_text(&sections, layout, MetadataField::Risk),
                fallback.risk,
            ),
            tags: vec![self.config.model_tag.clone(), entry_type.tag().to_string()],
            plan_summary: or_default(plan_summary, PLAN_FALLBACK),
            outcome: or_default(clamp_chars(&summary, limit), OUTCOME_FALLBACK),
            plan_adherence: None,
        };

        SynthesizedEntry { metadata, summary }
    }
}

/// [`FieldSynthesizer::structure`] with the default configuration.
pub fn structure_narrative(narrative: &str, entry_type: EntryType, plan: &str) -> SynthesizedEntry {
    FieldSynthesizer::new(&PipelineConfig::default()).structure(narrative, entry_type, plan)
}

impl StructuredMetadata {
    /// Offline record for an entry saved without AI structuring.
    pub fn placeholder(entry_type: EntryType, content: &str, plan: &str) -> Self {
        let fallback = defaults(entry_type);
        let trimmed = content.trim();
        let first_line = trimmed
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} generated", entry_type.tag()));
        let snippet: String = trimmed
            .lines()
            .filter(|line| !line.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" ")
            .chars()
            .take(SNIPPET_LIMIT)
            .collect();
        let plan_summary = plan
            .lines()
            .next()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .unwrap_or(PLAN_FALLBACK)
            .to_string();

        Self {
            title: first_line,
            result: fallback.result.to_string(),
            grade: fallback.grade.to_string(),
            timeframe: fallback.timeframe.to_string(),
            symbol: UNKNOWN_SYMBOL.to_string(),
            next_steps: fallback.next_steps.to_string(),
            risk: fallback.risk.to_string(),
            tags: vec![entry_type.tag().to_string(), "AI".to_string()],
            plan_summary,
            outcome: if snippet.is_empty() {
                OUTCOME_FALLBACK.to_string()
            } else {
                snippet
            },
            plan_adherence: Some(match entry_type {
                EntryType::Trade => 85,
                EntryType::Analyse => 40,
            }),
        }
    }
}
