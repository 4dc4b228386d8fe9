//! End-to-end runs of the generation pipeline against scripted collaborators.

use proof_of_art::core::{Creator, ValidationError};
use proof_of_art::store::RecordStore;
use proof_of_art::{
    FetchError, GenerationFailure, PinError, PipelineError, PipelineWarning, PublishOptions,
    RecordStatus, Stage, StageOutcome,
};
use proof_of_art_testkit::fixtures::{
    creator, request, PinScript, PipelineFixture, ProviderScript, ScriptedPins,
    ScriptedProvider, StaticFetcher, CREATOR, DEMO_MODEL, DEMO_URL,
};
use proof_of_art_testkit::vectors::{RED_CUBE_CONTENT_HASH, RED_CUBE_PNG, RED_CUBE_PROMPT_HASH};

fn named(filename: &str) -> PublishOptions {
    PublishOptions {
        filename: Some(filename.to_string()),
        ..PublishOptions::default()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Generate
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_generate_hashes_without_pinning() {
    let fixture = PipelineFixture::new(RED_CUBE_PNG);

    let artwork = fixture
        .orchestrator
        .generate(request("  a red cube "))
        .await
        .unwrap();

    assert_eq!(artwork.content_hash.to_hex(), RED_CUBE_CONTENT_HASH);
    assert_eq!(artwork.prompt_hash.to_hex(), RED_CUBE_PROMPT_HASH);
    assert_eq!(artwork.prompt, "a red cube");
    assert_eq!(artwork.model, DEMO_MODEL);
    assert_eq!(artwork.content_url, DEMO_URL);
    assert_eq!(&artwork.bytes[..], RED_CUBE_PNG);
    assert!(!artwork.ipfs_ready);
    assert!(artwork.timing.total_ms >= artwork.timing.generation_ms);

    assert!(fixture.pins.files().is_empty());
    assert!(fixture
        .records
        .find_by_content_hash(&artwork.content_hash)
        .await
        .unwrap()
        .is_none());
    assert_eq!(
        fixture.progress.completed(),
        vec![
            Stage::Authorize,
            Stage::Validate,
            Stage::CheckProvider,
            Stage::Generate,
            Stage::Fetch,
            Stage::Hash,
        ]
    );
}

#[tokio::test]
async fn test_generate_requires_creator() {
    let fixture = PipelineFixture::new(RED_CUBE_PNG);
    let mut req = request("a red cube");
    req.creator = None;

    let err = fixture.orchestrator.generate(req).await.unwrap_err();
    assert!(matches!(err, PipelineError::Unauthorized));
    assert_eq!(fixture.provider.calls(), 0);
    assert_eq!(fixture.progress.failed(), vec![Stage::Authorize]);
}

#[tokio::test]
async fn test_generate_rejects_invalid_prompts() {
    let fixture = PipelineFixture::new(RED_CUBE_PNG);

    let err = fixture.orchestrator.generate(request("   ")).await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Validation(ValidationError::EmptyPrompt)
    ));

    let err = fixture
        .orchestrator
        .generate(request(&"x".repeat(1001)))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Validation(ValidationError::PromptTooLong { len: 1001, .. })
    ));
    assert_eq!(fixture.provider.calls(), 0);
}

#[tokio::test]
async fn test_generate_unknown_model_is_a_validation_error() {
    let fixture = PipelineFixture::new(RED_CUBE_PNG);
    let mut req = request("a red cube");
    req.model = "midjourney".to_string();

    let err = fixture.orchestrator.generate(req).await.unwrap_err();
    match err {
        PipelineError::Validation(ValidationError::UnsupportedModel(model)) => {
            assert_eq!(model, "midjourney")
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(fixture.provider.calls(), 0);
    assert_eq!(fixture.progress.failed(), vec![Stage::Validate]);
    assert!(!fixture.progress.completed().contains(&Stage::CheckProvider));
}

#[tokio::test]
async fn test_generate_unconfigured_model() {
    let fixture = PipelineFixture::builder()
        .content(RED_CUBE_PNG)
        .provider(ScriptedProvider::unconfigured())
        .build();

    let err = fixture
        .orchestrator
        .generate(request("a red cube"))
        .await
        .unwrap_err();
    match err {
        PipelineError::ProviderUnavailable { model } => assert_eq!(model, DEMO_MODEL),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(fixture.provider.calls(), 0);
    assert_eq!(fixture.progress.failed(), vec![Stage::CheckProvider]);
}

#[tokio::test]
async fn test_generate_provider_failure() {
    let fixture = PipelineFixture::builder()
        .content(RED_CUBE_PNG)
        .provider(ScriptedProvider::with_script(ProviderScript::Fail(
            "content policy".into(),
        )))
        .build();

    let err = fixture
        .orchestrator
        .generate(request("a red cube"))
        .await
        .unwrap_err();
    assert!(!err.is_timeout());
    assert!(matches!(
        err,
        PipelineError::GenerationFailed {
            cause: GenerationFailure::Provider(_),
            ..
        }
    ));
    assert!(err.to_string().contains("content policy"));
}

#[tokio::test]
async fn test_generate_timeout_reports_heartbeats() {
    let fixture = PipelineFixture::builder()
        .content(RED_CUBE_PNG)
        .provider(ScriptedProvider::with_script(ProviderScript::Hang))
        .build();

    let err = fixture
        .orchestrator
        .generate(request("a red cube"))
        .await
        .unwrap_err();
    assert!(err.is_timeout());
    match &err {
        PipelineError::GenerationFailed {
            model, elapsed_ms, ..
        } => {
            assert_eq!(model, DEMO_MODEL);
            assert!(*elapsed_ms >= 300);
        }
        other => panic!("unexpected error: {other}"),
    }

    assert!(fixture.progress.heartbeats(Stage::Generate) >= 2);
    assert_eq!(fixture.progress.failed(), vec![Stage::Generate]);
}

#[tokio::test]
async fn test_generate_download_failures() {
    let missing = PipelineFixture::builder()
        .provider(ScriptedProvider::with_script(ProviderScript::Url(
            "https://cdn.test/gone.png".into(),
        )))
        .build();
    let err = missing
        .orchestrator
        .generate(request("a red cube"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PipelineError::DownloadFailed(FetchError::Status(404))
    ));

    let slow = PipelineFixture::builder()
        .fetcher(StaticFetcher::hanging())
        .build();
    let err = slow
        .orchestrator
        .generate(request("a red cube"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PipelineError::DownloadFailed(FetchError::Timeout(300))
    ));
    assert_eq!(slow.progress.failed(), vec![Stage::Fetch]);
}

// ─────────────────────────────────────────────────────────────────────────────
// Publish
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_pins_and_persists() {
    let fixture = PipelineFixture::new(RED_CUBE_PNG);

    let created = fixture
        .orchestrator
        .create(request("a red cube"), named("artwork-0.png"))
        .await
        .unwrap();
    let published = &created.publication;

    assert!(published.is_complete());
    assert_eq!(published.record_status, RecordStatus::Persisted);
    let metadata_uri = published.metadata_uri.clone().unwrap();
    assert!(metadata_uri.starts_with("ipfs://bafyjson"));

    let files = fixture.pins.files();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].filename, "artwork-0.png");
    assert_eq!(files[0].size, RED_CUBE_PNG.len());
    assert_eq!(files[0].attributes["creator"], CREATOR);
    assert_eq!(files[0].attributes["model"], DEMO_MODEL);
    assert_eq!(files[0].attributes["contentHash"], RED_CUBE_CONTENT_HASH);
    assert_eq!(files[0].attributes["promptHash"], RED_CUBE_PROMPT_HASH);

    let package = &published.package;
    assert_eq!(package.content_hash.to_hex(), RED_CUBE_CONTENT_HASH);
    assert_eq!(package.prompt.as_deref(), Some("a red cube"));
    assert_eq!(package.ipfs_cid, published.pin.cid);
    assert_eq!(fixture.pins.documents(), vec![package.to_json()]);

    let stored = fixture
        .records
        .find_by_content_hash(&created.artwork.content_hash)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.ipfs_cid, published.pin.cid);
    assert_eq!(stored.metadata_uri.as_deref(), Some(metadata_uri.as_str()));
    assert_eq!(stored.creator_address, Creator::Wallet(creator()));
    assert_eq!(stored.model_used, DEMO_MODEL);
}

#[tokio::test]
async fn test_metadata_pin_timeout_still_persists() {
    let fixture = PipelineFixture::builder()
        .content(RED_CUBE_PNG)
        .pins(ScriptedPins::with_scripts(PinScript::Succeed, PinScript::Hang))
        .build();

    let created = fixture
        .orchestrator
        .create(request("a red cube"), named("artwork-0.png"))
        .await
        .unwrap();
    let published = created.publication;

    assert_eq!(published.metadata_uri, None);
    assert_eq!(
        published.warnings,
        vec![PipelineWarning::MetadataPinTimedOut(100)]
    );
    assert_eq!(published.record_status, RecordStatus::Persisted);
    assert_eq!(fixture.progress.degraded(), vec![Stage::PinMetadata]);

    let stored = fixture
        .records
        .find_by_content_hash(&created.artwork.content_hash)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.metadata_uri, None);
    assert_eq!(stored.ipfs_cid, published.pin.cid);
}

#[tokio::test]
async fn test_metadata_pin_failure_is_a_warning() {
    let fixture = PipelineFixture::builder()
        .content(RED_CUBE_PNG)
        .pins(ScriptedPins::with_scripts(PinScript::Succeed, PinScript::Fail))
        .build();

    let published = fixture
        .orchestrator
        .create(request("a red cube"), PublishOptions::default())
        .await
        .unwrap()
        .publication;

    assert!(matches!(
        published.warnings.as_slice(),
        [PipelineWarning::MetadataPinFailed(_)]
    ));
    assert_eq!(published.record_status, RecordStatus::Persisted);
}

#[tokio::test]
async fn test_content_pin_failure_is_fatal() {
    let fixture = PipelineFixture::builder()
        .content(RED_CUBE_PNG)
        .pins(ScriptedPins::with_scripts(PinScript::Fail, PinScript::Succeed))
        .build();

    let artwork = fixture
        .orchestrator
        .generate(request("a red cube"))
        .await
        .unwrap();
    let err = fixture
        .orchestrator
        .publish(artwork.publish_request(PublishOptions::default()))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::PinFailed(PinError::Api { status: 502, .. })
    ));
    assert!(fixture.pins.documents().is_empty());
    assert!(fixture
        .records
        .find_by_content_hash(&artwork.content_hash)
        .await
        .unwrap()
        .is_none());
    assert_eq!(fixture.progress.failed(), vec![Stage::PinContent]);
}

#[tokio::test]
async fn test_content_pin_timeout_is_fatal() {
    let fixture = PipelineFixture::builder()
        .content(RED_CUBE_PNG)
        .pins(ScriptedPins::with_scripts(PinScript::Hang, PinScript::Succeed))
        .build();

    let err = fixture
        .orchestrator
        .create(request("a red cube"), PublishOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::PinFailed(PinError::Timeout(300))));
}

#[tokio::test]
async fn test_degraded_store_skips_record() {
    let fixture = PipelineFixture::builder()
        .content(RED_CUBE_PNG)
        .records(RecordStore::unconfigured())
        .build();

    let published = fixture
        .orchestrator
        .create(request("a red cube"), PublishOptions::default())
        .await
        .unwrap()
        .publication;

    assert_eq!(published.record_status, RecordStatus::Skipped);
    assert_eq!(published.warnings, vec![PipelineWarning::RecordNotPersisted]);
    assert_eq!(published.record.ipfs_cid, published.pin.cid);
    assert!(published.metadata_uri.is_some());
    assert_eq!(fixture.progress.degraded(), vec![Stage::Persist]);
}

#[tokio::test]
async fn test_publish_rejects_mismatched_content() {
    let fixture = PipelineFixture::new(RED_CUBE_PNG);
    let artwork = fixture
        .orchestrator
        .generate(request("a red cube"))
        .await
        .unwrap();

    let mut req = artwork.publish_request(PublishOptions::default());
    req.bytes = bytes::Bytes::from_static(b"tampered");
    let err = fixture.orchestrator.publish(req).await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Validation(ValidationError::HashMismatch {
            field: "contentHash"
        })
    ));
    assert!(fixture.pins.files().is_empty());

    let mut anonymous = artwork.publish_request(PublishOptions::default());
    anonymous.creator = None;
    let err = fixture.orchestrator.publish(anonymous).await.unwrap_err();
    assert!(matches!(err, PipelineError::Unauthorized));
}

#[tokio::test]
async fn test_publish_keeps_creator_after_validation() {
    let fixture = PipelineFixture::new(RED_CUBE_PNG);
    let artwork = fixture
        .orchestrator
        .generate(request("a red cube"))
        .await
        .unwrap();

    let req = artwork.publish_request(named("artwork-1.png"));
    let published = fixture.orchestrator.publish(req).await.unwrap();

    assert_eq!(published.record.creator_address, Creator::Wallet(creator()));
    assert_eq!(fixture.pins.files()[0].attributes["creator"], CREATOR);
    let publish_stages: Vec<Stage> = fixture
        .progress
        .completed()
        .into_iter()
        .skip(6)
        .take(2)
        .collect();
    assert_eq!(publish_stages, vec![Stage::Authorize, Stage::Validate]);
}

#[tokio::test]
async fn test_publish_with_withheld_prompt() {
    let fixture = PipelineFixture::new(RED_CUBE_PNG);
    let artwork = fixture
        .orchestrator
        .generate(request("a red cube"))
        .await
        .unwrap();

    let mut req = artwork.publish_request(PublishOptions {
        private_prompt: true,
        ..PublishOptions::default()
    });
    req.prompt = None;
    let published = fixture.orchestrator.publish(req).await.unwrap();

    assert_eq!(published.package.prompt, None);
    assert_eq!(published.package.encrypted_prompt, None);
    assert_eq!(published.package.prompt_hash.to_hex(), RED_CUBE_PROMPT_HASH);
    assert_eq!(published.record.prompt_hash, artwork.prompt_hash);
}

#[tokio::test]
async fn test_republish_updates_single_record() {
    let fixture = PipelineFixture::new(RED_CUBE_PNG);

    fixture
        .orchestrator
        .create(request("a red cube"), named("first.png"))
        .await
        .unwrap();
    fixture
        .orchestrator
        .create(request("a red cube"), named("second.png"))
        .await
        .unwrap();

    let mine = fixture
        .records
        .find_by_creator(&Creator::Wallet(creator()))
        .await
        .unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(fixture.pins.files().len(), 2);
}

#[tokio::test]
async fn test_every_stage_starts_before_it_ends() {
    let fixture = PipelineFixture::new(RED_CUBE_PNG);
    fixture
        .orchestrator
        .create(request("a red cube"), PublishOptions::default())
        .await
        .unwrap();

    let events = fixture.progress.events();
    let mut open: Option<Stage> = None;
    for event in &events {
        match &event.outcome {
            StageOutcome::Started => {
                assert_eq!(open, None, "{:?} started while another was open", event.stage);
                assert_eq!(event.elapsed_ms(), 0);
                open = Some(event.stage);
            }
            StageOutcome::InProgress => assert_eq!(open, Some(event.stage)),
            outcome => {
                assert!(outcome.is_terminal());
                assert_eq!(open.take(), Some(event.stage));
            }
        }
    }
    assert_eq!(open, None);

    let last = events.last().unwrap();
    assert_eq!(last.stage, Stage::Persist);
    assert_eq!(last.outcome, StageOutcome::Completed);
}
