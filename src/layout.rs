//! Section layouts of the free-text contract.
//!
//! One declarative table per entry type describes both the numbered sections
//! the built-in templates ask the model for and which of those sections feed
//! each metadata field. The prompt builder and the field synthesizer read the
//! same table, so the numbering cannot drift between them.

use crate::schema::EntryType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataField {
    Title,
    Result,
    Grade,
    Timeframe,
    NextSteps,
    Risk,
    PlanSummary,
}

#[derive(Debug, Clone, Copy)]
pub struct SectionSpec {
    pub number: u32,
    pub heading: &'static str,
    /// Labels of the lines the model writes inside the section.
    pub lines: &'static [&'static str],
}

/// Sections feeding a field, in order of preference.
#[derive(Debug, Clone, Copy)]
pub struct FieldBinding {
    pub field: MetadataField,
    pub sections: &'static [u32],
}

#[derive(Debug)]
pub struct SectionLayout {
    pub entry_type: EntryType,
    pub sections: &'static [SectionSpec],
    pub bindings: &'static [FieldBinding],
    /// Sections whose short summaries make up the entry outcome.
    pub summary_sections: &'static [u32],
}

const TRADE_SECTIONS: &[SectionSpec] = &[
    SectionSpec {
        number: 1,
        heading: "Multi-timeframe context (Monthly / Weekly / Daily)",
        lines: &["Weekly", "Daily", "Monthly"],
    },
    SectionSpec {
        number: 2,
        heading: "Key zones & strategy (Daily and intraday)",
        lines: &["Plan", "Key zone", "Risk management"],
    },
    SectionSpec {
        number: 3,
        heading: "Intraday structure (H4 / H1 / M15) and executed order",
        lines: &["Structure", "Entry", "Management"],
    },
    SectionSpec {
        number: 4,
        heading: "Targets & execution",
        lines: &["Target", "Execution", "Levels"],
    },
    SectionSpec {
        number: 5,
        heading: "Final result",
        lines: &["Result", "Judgement"],
    },
    SectionSpec {
        number: 6,
        heading: "Trade review",
        lines: &["Strengths", "To improve", "Adjustment"],
    },
    SectionSpec {
        number: 7,
        heading: "Risks & invalidations",
        lines: &["Risk", "Invalidation"],
    },
    SectionSpec {
        number: 8,
        heading: "Lessons / quantified verdict",
        lines: &["Synthesis", "Quantified lesson"],
    },
];

const TRADE_BINDINGS: &[FieldBinding] = &[
    FieldBinding { field: MetadataField::Title, sections: &[1, 2] },
    FieldBinding { field: MetadataField::PlanSummary, sections: &[2] },
    FieldBinding { field: MetadataField::Timeframe, sections: &[3, 1] },
    FieldBinding { field: MetadataField::Result, sections: &[5] },
    FieldBinding { field: MetadataField::Grade, sections: &[6] },
    FieldBinding { field: MetadataField::Risk, sections: &[7] },
    FieldBinding { field: MetadataField::NextSteps, sections: &[8] },
];

const ANALYSIS_SECTIONS: &[SectionSpec] = &[
    SectionSpec {
        number: 1,
        heading: "Multi-timeframe context (Monthly / Weekly / Daily)",
        lines: &["Weekly", "Daily", "Monthly"],
    },
    SectionSpec {
        number: 2,
        heading: "Key zones & strategy (Daily)",
        lines: &["Key zone", "Strategy", "Validation"],
    },
    SectionSpec {
        number: 3,
        heading: "Intraday structure (H4 / H1 / M15)",
        lines: &["Intraday frame", "Trigger", "Management"],
    },
    SectionSpec {
        number: 4,
        heading: "Proposed scenarios",
        lines: &["Scenario 1", "Invalidation 1", "Scenario 2", "Invalidation 2"],
    },
    SectionSpec {
        number: 5,
        heading: "Risks & invalidations",
        lines: &["Main risk", "Plan B"],
    },
    SectionSpec {
        number: 6,
        heading: "Next steps / final synthesis",
        lines: &["Priority", "Monitoring"],
    },
];

const ANALYSIS_BINDINGS: &[FieldBinding] = &[
    FieldBinding { field: MetadataField::Title, sections: &[1, 2] },
    FieldBinding { field: MetadataField::PlanSummary, sections: &[2] },
    FieldBinding { field: MetadataField::Timeframe, sections: &[3, 1] },
    FieldBinding { field: MetadataField::Result, sections: &[4] },
    FieldBinding { field: MetadataField::Grade, sections: &[6] },
    FieldBinding { field: MetadataField::Risk, sections: &[5] },
    FieldBinding { field: MetadataField::NextSteps, sections: &[6] },
];

static TRADE_LAYOUT: SectionLayout = SectionLayout {
    entry_type: EntryType::Trade,
    sections: TRADE_SECTIONS,
    bindings: TRADE_BINDINGS,
    summary_sections: &[4, 6, 8],
};

static ANALYSIS_LAYOUT: SectionLayout = SectionLayout {
    entry_type: EntryType::Analyse,
    sections: ANALYSIS_SECTIONS,
    bindings: ANALYSIS_BINDINGS,
    summary_sections: &[4, 6],
};

impl SectionLayout {
    pub fn for_entry(entry_type: EntryType) -> &'static SectionLayout {
        match entry_type {
            EntryType::Trade => &TRADE_LAYOUT,
            EntryType::Analyse => &ANALYSIS_LAYOUT,
        }
    }

    pub fn sources(&self, field: MetadataField) -> &'static [u32] {
        self.bindings
            .iter()
            .find(|binding| binding.field == field)
            .map(|binding| binding.sections)
            .unwrap_or(&[])
    }

    /// Numbered outline the free-text templates embed, e.g.
    ///
    /// ```text
    /// TYPE : Trade
    ///
    /// 1. Multi-timeframe context (Monthly / Weekly / Daily)
    /// Weekly — ...
    /// ```
    pub fn render_outline(&self) -> String {
        let mut outline = format!("TYPE : {}\n", self.entry_type.tag());
        for section in self.sections {
            outline.push('\n');
            outline.push_str(&format!("{}. {}\n", section.number, section.heading));
            for label in section.lines {
                outline.push_str(&format!("{} — ...\n", label));
            }
        }
        outline
    }
}
