use std::error::Error;
use trading_journal_ai::*;

/// Stand-in for a hosted model: replays canned answers.
struct CannedModel;

impl LanguageModel for CannedModel {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        if request.is_json() {
            return Ok(r#"{
                "entryType": "trade",
                "metadata": {
                    "title": "EUR/USD London breakout",
                    "symbol": "EUR/USD",
                    "timeframe": "daily / 1h",
                    "result": "TP hit, +1.8R",
                    "planAdherence": 80,
                    "tags": ["breakout"]
                },
                "content": "Breakout above the Asian high, TP at 1.0900."
            }"#
            .to_string());
        }
        Ok("TYPE : Trade\n\n\
            1. Multi-timeframe context\nDaily — uptrend above 1.0800.\n\n\
            2. Trading plan\nPlan — buy the London breakout of the Asian high.\n\n\
            3. Intraday structure\nH1 — higher lows since the open.\n\n\
            4. Execution\nEntry — 1.0845, stop 1.0825.\n\n\
            5. Final result\nResult — TP hit at 1.0900, +1.8R.\n\n\
            6. Trade review\nVerdict — good trade, entry slightly late.\n\n\
            7. Risks\nRisk — ECB speech in the afternoon.\n\n\
            8. Lessons\nLesson — place the order before the breakout candle closes."
            .to_string())
    }
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn Error>> {
    let model = RateLimitedModel::new(CannedModel, ModelLimits::default()).with_key_prefix("demo");
    let analyzer = JournalAnalyzer::new(model, MemoryTemplateStore::new());

    let request = AnalysisRequest::new(
        "Took the EUR/USD London breakout, TP hit at 1.0900",
        EntryType::Trade,
    )
    .with_plan("Buy breakouts of the Asian range with the daily trend");

    println!("📓 Analyzing journal entry...\n");
    let analysis = analyzer.analyze(&request, None).await?;

    println!("Narrative ({} / {}):", analysis.narrative.task, analysis.narrative.variant);
    println!("{}\n", analysis.narrative.text);

    println!("Structured record ({}):", analysis.structured.variant);
    println!(
        "{}\n",
        serde_json::to_string_pretty(&analysis.structured.reply.metadata)?
    );

    let legacy = analyzer.structure_legacy(&analysis.narrative.text, EntryType::Trade, &request.plan);
    println!("Record rebuilt from the narrative sections:");
    println!("{}", serde_json::to_string_pretty(&legacy.metadata)?);
    println!("\nSummary: {}", legacy.summary);

    Ok(())
}
