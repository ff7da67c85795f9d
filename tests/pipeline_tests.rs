use std::io::Write;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use trading_journal_ai::*;

const TRADE_NARRATIVE: &str = "TYPE : Trade\n\
    1. Context\nWeekly — bullish trend on NAS100.\n\
    2. Key zones\nPlan — buy the 15230 retest.\n\
    3. Intraday structure\nEntry — H1 break of structure.\n\
    4. Targets\nTarget — 15480 reached.\n\
    5. Final result\nResult — TP hit at +2R.\n\
    6. Trade review\nStrengths — patient entry.\n\
    7. Risks\nRisk — CPI release at 14:30.\n\
    8. Lessons\nSynthesis — wait for the retest.";

const STRUCTURED_REPLY: &str = r#"{
    "entryType": "trade",
    "metadata": {
        "title": "NAS100 retest long",
        "symbol": "NAS100",
        "timeframe": "Weekly, 1h",
        "tags": ["breakout"],
        "planAdherence": 90
    }
}"#;

/// Answers text requests with `narrative` and JSON requests with
/// `structured`, recording every request it sees.
struct ScriptedModel {
    narrative: std::result::Result<String, String>,
    structured: std::result::Result<String, String>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedModel {
    fn new(narrative: &str, structured: &str) -> Self {
        Self {
            narrative: Ok(narrative.to_string()),
            structured: Ok(structured.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn failing_narrative(structured: &str) -> Self {
        Self {
            narrative: Err("upstream timeout".to_string()),
            ..Self::new("", structured)
        }
    }

    fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl LanguageModel for ScriptedModel {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        let scripted = if request.is_json() {
            &self.structured
        } else {
            &self.narrative
        };
        scripted.clone().map_err(JournalError::ModelFailed)
    }
}

fn trade_request() -> AnalysisRequest {
    AnalysisRequest::new("Bought the NAS100 retest, closed at +2R", EntryType::Trade)
        .with_plan("Buy pullbacks above the weekly open")
}

#[tokio::test]
async fn test_analyze_returns_both_results() -> anyhow::Result<()> {
    let model = Arc::new(ScriptedModel::new(TRADE_NARRATIVE, STRUCTURED_REPLY));
    let analyzer = JournalAnalyzer::new(model.clone(), MemoryTemplateStore::new());

    let analysis = analyzer.analyze(&trade_request(), None).await?;

    assert_eq!(analysis.narrative.task, TaskType::Trade);
    assert_eq!(analysis.narrative.variant, "default");
    assert_eq!(analysis.narrative.text, TRADE_NARRATIVE);

    let metadata = &analysis.structured.reply.metadata;
    assert_eq!(analysis.structured.variant, "detailed");
    assert_eq!(metadata.title, "NAS100 retest long");
    assert_eq!(metadata.timeframe, "W / H1");
    assert_eq!(metadata.tags, vec!["breakout", "Trade"]);
    assert_eq!(metadata.plan_adherence, Some(90));

    let requests = model.requests();
    assert_eq!(requests.len(), 2);
    let text_request = requests.iter().find(|r| !r.is_json()).unwrap();
    let json_request = requests.iter().find(|r| r.is_json()).unwrap();
    assert!(text_request.prompt.contains("Bought the NAS100 retest"));
    assert!(text_request.prompt.contains("Buy pullbacks above the weekly open"));
    assert!(text_request.response_schema.is_none());
    assert!(json_request.prompt.contains("\"entryType\": \"trade\""));
    assert!(json_request.response_schema.is_some());
    for request in &requests {
        assert!(!request.prompt.contains("{{"));
    }
    Ok(())
}

#[tokio::test]
async fn test_analyze_is_all_or_nothing() {
    let model = ScriptedModel::failing_narrative(STRUCTURED_REPLY);
    let analyzer = JournalAnalyzer::new(model, MemoryTemplateStore::new());

    let err = analyzer.analyze(&trade_request(), None).await.unwrap_err();
    assert!(matches!(err, JournalError::ModelFailed(ref m) if m == "upstream timeout"));

    let model = ScriptedModel::new(TRADE_NARRATIVE, "I could not produce JSON today.");
    let analyzer = JournalAnalyzer::new(model, MemoryTemplateStore::new());

    let err = analyzer.analyze(&trade_request(), None).await.unwrap_err();
    assert!(matches!(err, JournalError::InvalidModelResponse(_)));
}

#[tokio::test]
async fn test_structured_reply_without_metadata_fails() {
    let model = ScriptedModel::new(TRADE_NARRATIVE, r#"{"entryType": "trade"}"#);
    let analyzer = JournalAnalyzer::new(model, MemoryTemplateStore::new());

    let err = analyzer
        .generate_structured(&trade_request(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, JournalError::InvalidModelResponse(_)));
}

#[tokio::test]
async fn test_empty_raw_text_is_rejected_before_any_call() {
    let model = Arc::new(ScriptedModel::new(TRADE_NARRATIVE, STRUCTURED_REPLY));
    let analyzer = JournalAnalyzer::new(model.clone(), MemoryTemplateStore::new());
    let request = AnalysisRequest::new("   \n", EntryType::Analyse);

    assert!(matches!(
        analyzer.analyze(&request, None).await,
        Err(JournalError::MissingInput(_))
    ));
    assert!(matches!(
        analyzer.generate_narrative(&request, None).await,
        Err(JournalError::MissingInput(_))
    ));
    assert!(matches!(
        analyzer.generate_structured(&request, None).await,
        Err(JournalError::MissingInput(_))
    ));
    assert!(model.requests().is_empty());
}

#[tokio::test]
async fn test_empty_narrative_reply_is_an_error() {
    let model = ScriptedModel::new("  ", STRUCTURED_REPLY);
    let analyzer = JournalAnalyzer::new(model, MemoryTemplateStore::new());

    let err = analyzer
        .generate_narrative(&trade_request(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, JournalError::InvalidModelResponse(_)));
}

#[tokio::test]
async fn test_progress_events() {
    let model = ScriptedModel::new(TRADE_NARRATIVE, STRUCTURED_REPLY);
    let analyzer = JournalAnalyzer::new(model, MemoryTemplateStore::new());
    let (tx, mut rx) = mpsc::channel(32);

    analyzer.analyze(&trade_request(), Some(tx)).await.unwrap();

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    assert!(matches!(events.first(), Some(GenerationEvent::Starting)));
    assert!(matches!(events.last(), Some(GenerationEvent::Success)));
    assert!(events
        .iter()
        .any(|e| matches!(e, GenerationEvent::RequestingNarrative)));
    assert!(events
        .iter()
        .any(|e| matches!(e, GenerationEvent::RequestingStructured)));
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, GenerationEvent::ResolvingPrompt { .. }))
            .count(),
        2
    );
}

#[tokio::test]
async fn test_failure_event_is_reported() {
    let model = ScriptedModel::failing_narrative(STRUCTURED_REPLY);
    let analyzer = JournalAnalyzer::new(model, MemoryTemplateStore::new());
    let (tx, mut rx) = mpsc::channel(32);

    assert!(analyzer.analyze(&trade_request(), Some(tx)).await.is_err());

    let mut last = None;
    while let Some(event) = rx.recv().await {
        last = Some(event);
    }
    match last {
        Some(GenerationEvent::Failed { reason }) => assert!(reason.contains("upstream timeout")),
        other => panic!("unexpected last event: {:?}", other),
    }
}

#[tokio::test]
async fn test_operator_variants_drive_prompts() -> anyhow::Result<()> {
    let model = Arc::new(ScriptedModel::new("1. ok", STRUCTURED_REPLY));
    let mut store = MemoryTemplateStore::new();
    store.save_prompt_variant(TaskType::Trade, "swing", "SWING {{entryType}}: {{rawText}}");
    store.save_structured_template(StructuredVariant::Summary, "SUMMARY {{variantTitle}}");

    let mut analyzer = JournalAnalyzer::new(model.clone(), store);
    analyzer.update_active_variants(ActiveVariantsUpdate {
        trade: Some("swing".to_string()),
        structured: Some(StructuredVariant::Summary),
        ..Default::default()
    });
    assert_eq!(analyzer.active_variants().trade.as_deref(), Some("swing"));

    let analysis = analyzer
        .analyze(&AnalysisRequest::new("Short DAX", EntryType::Trade), None)
        .await?;
    assert_eq!(analysis.narrative.variant, "swing");
    assert_eq!(analysis.structured.variant, "summary");

    let prompts: Vec<String> = model.requests().into_iter().map(|r| r.prompt).collect();
    assert!(prompts.contains(&"SWING trade: Short DAX".to_string()));
    assert!(prompts.contains(&"SUMMARY condensed version".to_string()));

    let explicit = analyzer
        .generate_narrative(
            &AnalysisRequest::new("Short DAX", EntryType::Trade).with_variant("default"),
            None,
        )
        .await?;
    assert_eq!(explicit.variant, "default");
    Ok(())
}

#[tokio::test]
async fn test_settings_written_through_store_apply_to_next_request() -> anyhow::Result<()> {
    let model = Arc::new(ScriptedModel::new("1. ok", STRUCTURED_REPLY));
    let mut analyzer = JournalAnalyzer::new(model.clone(), MemoryTemplateStore::new());
    let request = AnalysisRequest::new("Short DAX", EntryType::Trade);

    let before = analyzer.generate_narrative(&request, None).await?;
    assert_eq!(before.variant, "default");

    analyzer
        .store_mut()
        .save_prompt_variant(TaskType::Trade, "swing", "SWING {{rawText}}");
    analyzer.store_mut().save_setting("trade_variant", "swing");

    let after = analyzer.generate_narrative(&request, None).await?;
    assert_eq!(after.variant, "swing");
    assert_eq!(analyzer.active_variants().trade.as_deref(), Some("swing"));
    assert_eq!(model.requests().last().unwrap().prompt, "SWING Short DAX");
    Ok(())
}

#[tokio::test]
async fn test_twitter_task_from_template_hint() -> anyhow::Result<()> {
    let model = Arc::new(ScriptedModel::new("A punchy tweet", STRUCTURED_REPLY));
    let analyzer = JournalAnalyzer::new(model.clone(), MemoryTemplateStore::new());

    let request = AnalysisRequest::new("Gold squeezed shorts", EntryType::Analyse)
        .with_template_hint("twitter.simple")
        .with_variant("tweet.simple");
    let narrative = analyzer.generate_narrative(&request, None).await?;

    assert_eq!(narrative.task, TaskType::Twitter);
    assert_eq!(narrative.variant, "tweet.simple");
    let prompt = &model.requests()[0].prompt;
    assert!(prompt.contains("Gold squeezed shorts"));
    assert_eq!(
        prompt.trim_end(),
        interpolate(
            builtin_prompt(TaskType::Twitter, "tweet.simple").unwrap(),
            &Placeholders::new().with("rawText", "Gold squeezed shorts")
        )
        .trim_end()
    );
    Ok(())
}

#[tokio::test]
async fn test_rate_limited_model() {
    let limits = ModelLimits {
        requests_per_minute: 1,
        ..Default::default()
    };
    let model = RateLimitedModel::new(
        ScriptedModel::new(TRADE_NARRATIVE, STRUCTURED_REPLY),
        limits,
    )
    .with_key_prefix("gemini");
    let analyzer = JournalAnalyzer::new(model, MemoryTemplateStore::new());

    analyzer
        .generate_narrative(&trade_request(), None)
        .await
        .unwrap();
    let err = analyzer
        .generate_narrative(&trade_request(), None)
        .await
        .unwrap_err();

    match err {
        JournalError::RateLimited { key, .. } => assert_eq!(key, "gemini:rpm"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_token_budget_is_enforced() {
    let limits = ModelLimits {
        tokens_per_minute: 10,
        ..Default::default()
    };
    let model = RateLimitedModel::new(
        ScriptedModel::new(TRADE_NARRATIVE, STRUCTURED_REPLY),
        limits,
    );

    let err = model
        .generate(&GenerationRequest::text("x".repeat(100)))
        .await
        .unwrap_err();
    assert!(matches!(err, JournalError::RateLimited { ref key, .. } if key == "model:tpm"));
    assert!(model.inner().requests().is_empty());
}

#[test]
fn test_legacy_narrative_is_structured() {
    let analyzer = JournalAnalyzer::new(
        ScriptedModel::new(TRADE_NARRATIVE, STRUCTURED_REPLY),
        MemoryTemplateStore::new(),
    );
    let entry = analyzer.structure_legacy(TRADE_NARRATIVE, EntryType::Trade, "");
    let metadata = entry.metadata;

    assert_eq!(metadata.result, "Final result Result — TP hit at +2R.");
    assert_eq!(metadata.grade, "Trade review Strengths — patient entry.");
    assert_eq!(metadata.risk, "Risks Risk — CPI release at 14:30.");
    assert_eq!(metadata.next_steps, "Lessons Synthesis — wait for the retest.");
    assert_eq!(metadata.symbol, "NAS100");
    assert_eq!(metadata.tags, vec!["Gemini", "Trade"]);
    assert!(metadata.title.starts_with("Trade Gemini · "));
}

#[test]
fn test_legacy_structuring_follows_config_file() -> anyhow::Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    write!(
        file,
        r#"{{ "summary_limit": 60, "model_tag": "Claude", "fallback_symbol": "XAUUSD" }}"#
    )?;
    let config = PipelineConfig::from_json_file(file.path())?;

    let analyzer = JournalAnalyzer::new(
        ScriptedModel::new("", ""),
        MemoryTemplateStore::new(),
    )
    .with_config(config);
    let entry = analyzer.structure_legacy(
        "1. ctx\n2. zones\n3. intraday\n4. scenarios\n5. risks\n6. next",
        EntryType::Analyse,
        "",
    );

    assert_eq!(entry.metadata.symbol, "XAUUSD");
    assert_eq!(entry.metadata.tags, vec!["Claude", "Analyse"]);
    assert_eq!(entry.metadata.result, "scenarios");
    assert_eq!(entry.summary, "scenarios · next");
    Ok(())
}

#[test]
fn test_legacy_prompt_and_synthesizer_share_the_layout() {
    let store = MemoryTemplateStore::new();
    let active = ActiveVariants::default();

    for (task, entry_type) in [
        (TaskType::Trade, EntryType::Trade),
        (TaskType::Analysis, EntryType::Analyse),
    ] {
        let prompt = resolve_prompt(&store, &active, task, "notes", "plan", None);
        let layout = SectionLayout::for_entry(entry_type);
        for section in layout.sections {
            assert!(
                prompt.contains(&format!("\n{}. {}\n", section.number, section.heading)),
                "{} prompt misses section {}",
                task,
                section.number
            );
        }
    }
}

#[test]
fn test_store_snapshot_round_trip() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("templates.json");

    let mut store = MemoryTemplateStore::new();
    store.save_prompt_variant(TaskType::Analysis, "macro", "MACRO {{rawText}}");
    store.save_setting("analysis_variant", "macro");
    store.save_json(&path)?;

    let restored = MemoryTemplateStore::load_json(&path)?;
    let active = ActiveVariants::from_store(&restored);
    assert_eq!(active.analysis.as_deref(), Some("macro"));
    assert_eq!(
        resolve_prompt(&restored, &active, TaskType::Analysis, "CPI day", "", None),
        "MACRO CPI day"
    );

    let mut restored = restored;
    assert!(matches!(
        restored.delete_prompt_variant(TaskType::Analysis, "default"),
        Err(JournalError::ProtectedVariant { .. })
    ));
    assert!(restored.delete_prompt_variant(TaskType::Analysis, "macro")?);
    Ok(())
}

#[test]
fn test_placeholder_metadata_for_offline_save() {
    let metadata = StructuredMetadata::placeholder(
        EntryType::Analyse,
        "Gold holds the range\nWaiting for CPI",
        "Fade the extremes",
    );
    assert_eq!(metadata.title, "Gold holds the range");
    assert_eq!(metadata.plan_summary, "Fade the extremes");
    assert_eq!(metadata.plan_adherence, Some(40));
    assert!(metadata.tags.contains(&"Analyse".to_string()));
}
