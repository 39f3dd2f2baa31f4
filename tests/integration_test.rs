use creative_insights::config::AppConfig;
use creative_insights::error::InsightsError;
use creative_insights::genai::MockModelInvoker;
use creative_insights::meta::MockAdsProvider;
use creative_insights::models::{AdMetrics, AdMetricsWithImages};
use creative_insights::pipeline::*;
use serde_json::{json, Value};
use std::sync::Arc;

fn ad(id: &str, revenue: f64, image_urls: &[&str]) -> AdMetricsWithImages {
    AdMetricsWithImages::new(
        AdMetrics {
            ad_id: id.to_string(),
            ad_name: format!("Ad {}", id),
            campaign_name: "Evergreen".to_string(),
            is_active: true,
            spend: 25.0,
            revenue,
            roas: revenue / 25.0,
            is_carousel: image_urls.len() > 1,
            image_hashes: image_urls.iter().map(|u| format!("h-{}", u)).collect(),
            video_hashes: Vec::new(),
        },
        image_urls.iter().map(|u| u.to_string()).collect(),
    )
}

fn account_ads() -> Vec<AdMetricsWithImages> {
    vec![
        ad("1", 120.0, &["https://cdn/1a", "https://cdn/1b"]),
        ad("2", 40.0, &["https://cdn/2"]),
        ad("3", 0.0, &[]),
        ad("4", 300.0, &["https://cdn/4"]),
        ad("5", 15.0, &["https://cdn/5"]),
        ad("6", 80.0, &["https://cdn/6"]),
        ad("7", 5.0, &["https://cdn/7"]),
    ]
}

fn scripted_invoker() -> Arc<MockModelInvoker> {
    Arc::new(
        MockModelInvoker::new()
            .with_structured_response(json!({"brand_type": "Fitness"}))
            .with_string_response("Top ads use before/after photos.")
            .with_string_response("Bottom ads rely on stock imagery.")
            .with_string_response("Authentic transformations beat stock photos.")
            .with_structured_response(json!({
                "whatsWorking": ["before/after photos"],
                "whatsNotWorking": ["stock imagery"],
                "recommendations": "Show real customer results."
            })),
    )
}

fn initial_context() -> PipelineContext {
    PipelineContext::new()
        .with_text(ContextKey::AccountId, "A")
        .unwrap()
        .with_text(ContextKey::AccessToken, "T")
        .unwrap()
        .with_text(ContextKey::CreatorName, "X")
        .unwrap()
}

#[tokio::test]
async fn test_full_pipeline_produces_every_key() {
    let provider = Arc::new(MockAdsProvider::new(account_ads()));
    let invoker = scripted_invoker();
    let pipeline = creative_insights::build_insights_pipeline(
        provider.clone(),
        invoker.clone(),
        &AppConfig::default(),
    )
    .unwrap();
    assert_eq!(pipeline.step_count(), 5);

    let context = pipeline.execute(initial_context()).await.unwrap();

    assert_eq!(
        context.keys(),
        vec![
            ContextKey::AccountId,
            ContextKey::AccessToken,
            ContextKey::CreatorName,
            ContextKey::Ads,
            ContextKey::BrandType,
            ContextKey::HighPerformingPatterns,
            ContextKey::LowPerformingPatterns,
            ContextKey::Recommendations,
        ]
    );

    assert_eq!(context.get_text(ContextKey::AccountId).unwrap(), "A");
    assert_eq!(context.get_text(ContextKey::AccessToken).unwrap(), "T");
    assert_eq!(context.get_text(ContextKey::CreatorName).unwrap(), "X");
    assert_eq!(context.get_text(ContextKey::BrandType).unwrap(), "fitness");

    // The ad without images is filtered out
    let ads = context.get_ads(ContextKey::Ads).unwrap();
    assert_eq!(ads.len(), 6);
    assert!(ads.iter().all(|a| a.has_images()));

    let recs = context.get_recommendations(ContextKey::Recommendations).unwrap();
    assert_eq!(recs.recommendations, "Show real customer results.");

    assert_eq!(provider.calls(), vec![("A".to_string(), "T".to_string())]);
    let calls = invoker.calls();
    assert_eq!(calls.len(), 5);
    let structured: Vec<bool> = calls.iter().map(|c| c.is_structured()).collect();
    assert_eq!(structured, vec![true, false, false, false, true]);
}

#[tokio::test]
async fn test_no_key_reverts_between_steps() {
    let invoker = scripted_invoker();
    let config = AppConfig::default().analysis;
    let steps: Vec<WorkflowStep> = vec![
        FetchAdsStep::new(Arc::new(MockAdsProvider::new(account_ads()))).into(),
        IdentifyBrandTypeStep::new(invoker.clone(), &config).into(),
        FindPatternStep::high(invoker.clone(), &config).into(),
        FindPatternStep::low(invoker.clone(), &config).into(),
        GenerateRecommendationsStep::new(invoker).into(),
    ];

    let mut context = initial_context();
    for step in &steps {
        step.validate(&context).unwrap();
        let before = serde_json::to_value(&context).unwrap();
        let before_len = context.len();

        context = step.execute(context).await.unwrap();
        let after = serde_json::to_value(&context).unwrap();

        assert_eq!(context.len(), before_len + 1, "step {}", step.name());
        for key in before.as_object().unwrap().keys() {
            if key == "metadata" {
                continue;
            }
            assert_eq!(before[key], after[key], "{} changed during {}", key, step.name());
        }
        assert!(!matches!(after[step.output_key().as_str()], Value::Null));
    }
}

#[tokio::test]
async fn test_too_few_ads_stops_before_pattern_analysis() {
    let provider = Arc::new(MockAdsProvider::new(account_ads().into_iter().take(4).collect()));
    let invoker = scripted_invoker();
    let pipeline = creative_insights::build_insights_pipeline(
        provider,
        invoker.clone(),
        &AppConfig::default(),
    )
    .unwrap();

    let err = pipeline.execute(initial_context()).await.unwrap_err();
    assert!(err.is_precondition());
    assert_eq!(err.step_name(), Some("Find High Performing Patterns"));
    assert!(err.to_string().contains("found 3"));

    // Only the brand classifier reached the model
    assert_eq!(invoker.call_count(), 1);
}

#[tokio::test]
async fn test_provider_failure_aborts_run() {
    let invoker = scripted_invoker();
    let pipeline = creative_insights::build_insights_pipeline(
        Arc::new(MockAdsProvider::failing("Invalid OAuth access token")),
        invoker.clone(),
        &AppConfig::default(),
    )
    .unwrap();

    let err = pipeline.execute(initial_context()).await.unwrap_err();
    match &err {
        InsightsError::MetaApiError(message) => {
            assert!(message.contains("Invalid OAuth access token"))
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!err.is_precondition());
    assert_eq!(invoker.call_count(), 0);
}

#[tokio::test]
async fn test_report_covers_every_step() {
    let pipeline = creative_insights::build_insights_pipeline(
        Arc::new(MockAdsProvider::new(account_ads())),
        scripted_invoker(),
        &AppConfig::default(),
    )
    .unwrap();

    let run = pipeline.execute_with_report(initial_context()).await.unwrap();
    assert_eq!(run.report.pipeline_name, "creative-insights");
    assert_eq!(run.report.step_results.len(), 5);
    assert_eq!(
        run.report.step_results[4].output_key,
        ContextKey::Recommendations
    );
    assert!(run.report.slowest_step().is_some());
}
