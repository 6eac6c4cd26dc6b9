//! Submit/poll/retrieve protocol tests against a scripted mock endpoint

mod harness;

use std::time::{Duration, Instant};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use echopod_client::{ClientError, CollectSink, JobStatus, SpeechOptions, TtsClient};
use harness::mock_endpoint::MockEndpoint;
use secrecy::SecretString;
use serde_json::json;

fn client_for(mock: &MockEndpoint) -> TtsClient {
    TtsClient::new("ep-test", SecretString::from("test-key")).with_base_url(mock.base_url())
}

fn fast_options() -> SpeechOptions {
    SpeechOptions {
        polling_interval: Duration::from_millis(10),
        timeout: Duration::from_secs(5),
        ..SpeechOptions::default()
    }
}

#[tokio::test]
async fn generation_polls_until_complete_and_saves_audio() {
    let audio = b"fake-wav-bytes".to_vec();
    let mock = MockEndpoint::start(
        json!({"id": "abc123", "status": "IN_QUEUE"}),
        vec![
            json!({"id": "abc123", "status": "IN_PROGRESS"}),
            json!({"id": "abc123", "status": "COMPLETED", "output": {
                "audio": BASE64.encode(&audio), "format": "wav", "sample_rate": 44100
            }}),
        ],
    )
    .await
    .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let save_path = dir.path().join("speech.wav");
    let options = SpeechOptions {
        save_path: Some(save_path.clone()),
        ..fast_options()
    };

    let bytes = client_for(&mock)
        .generate_speech("[S1] Hello.", &options)
        .await
        .unwrap();

    assert_eq!(bytes, audio);
    assert_eq!(std::fs::read(&save_path).unwrap(), audio);
    assert_eq!(mock.run_count(), 1);
    assert_eq!(mock.poll_count(), 2);
}

#[tokio::test]
async fn failed_job_reports_provider_error() {
    let mock = MockEndpoint::start(
        json!({"id": "abc123", "status": "IN_QUEUE"}),
        vec![json!({"id": "abc123", "status": "FAILED", "error": "OOM"})],
    )
    .await
    .unwrap();

    let err = client_for(&mock)
        .generate_speech("[S1] Hello.", &fast_options())
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Job failed: OOM");
}

#[tokio::test]
async fn submit_without_id_fails_before_any_poll() {
    let mock = MockEndpoint::start(json!({"error": "endpoint not ready"}), vec![]).await.unwrap();

    let err = client_for(&mock)
        .generate_speech("[S1] Hello.", &fast_options())
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Submission(_)));
    assert_eq!(mock.poll_count(), 0);
}

#[tokio::test]
async fn polling_respects_the_deadline() {
    let mock = MockEndpoint::start(
        json!({"id": "slow", "status": "IN_QUEUE"}),
        vec![json!({"id": "slow", "status": "IN_PROGRESS"})],
    )
    .await
    .unwrap();

    let timeout = Duration::from_millis(100);
    let interval = Duration::from_millis(25);
    let options = SpeechOptions {
        timeout,
        polling_interval: interval,
        ..SpeechOptions::default()
    };

    let started = Instant::now();
    let err = client_for(&mock)
        .generate_speech("[S1] Hello.", &options)
        .await
        .unwrap_err();
    let elapsed = started.elapsed();

    assert!(matches!(err, ClientError::Timeout(t) if t == timeout));
    // The deadline is checked before each poll, so one interval of overshoot
    // is the most the protocol allows (plus scheduling slack).
    assert!(elapsed < timeout + interval + Duration::from_millis(500), "elapsed {elapsed:?}");
    assert!(mock.poll_count() >= 1);
}

#[tokio::test]
async fn empty_text_never_reaches_the_endpoint() {
    let mock = MockEndpoint::start(json!({"id": "unused"}), vec![]).await.unwrap();

    let err = client_for(&mock).generate_speech("   ", &fast_options()).await.unwrap_err();

    assert!(matches!(err, ClientError::InvalidInput(_)));
    assert_eq!(mock.run_count(), 0);
}

#[tokio::test]
async fn unknown_status_values_keep_polling() {
    let mock = MockEndpoint::start(
        json!({"id": "abc123", "status": "IN_QUEUE"}),
        vec![
            json!({"id": "abc123", "status": "TIMED_OUT_MAYBE"}),
            json!({"id": "abc123", "status": "COMPLETED", "output": {"audio": BASE64.encode(b"x")}}),
        ],
    )
    .await
    .unwrap();

    let bytes = client_for(&mock)
        .generate_speech("[S1] Hello.", &fast_options())
        .await
        .unwrap();

    assert_eq!(bytes, b"x");
    assert_eq!(mock.poll_count(), 2);
}

#[tokio::test]
async fn job_status_decodes_the_record() {
    let mock = MockEndpoint::start(
        json!({"id": "unused"}),
        vec![json!({"id": "abc123", "status": "IN_PROGRESS"})],
    )
    .await
    .unwrap();

    let record = client_for(&mock).job_status("abc123").await.unwrap();
    assert_eq!(record.status, JobStatus::InProgress);
    assert_eq!(record.id.as_deref(), Some("abc123"));
}

#[tokio::test]
async fn refresh_model_waits_for_the_acknowledgement() {
    let mock = MockEndpoint::start(
        json!({"id": "admin-1", "status": "IN_QUEUE"}),
        vec![json!({"id": "admin-1", "status": "COMPLETED", "output": {"status": "model refreshed"}})],
    )
    .await
    .unwrap();

    let ack = client_for(&mock).refresh_model(&fast_options()).await.unwrap();
    assert_eq!(ack, "model refreshed");
}

#[tokio::test]
async fn streaming_chunks_arrive_in_order() {
    // Three chunks: 4096 + 4096 + 100 samples
    let samples: Vec<f32> = (0..8292).map(|i| f32::from(i16::try_from(i % 100).unwrap()) / 100.0).collect();
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 44_100,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut cursor = std::io::Cursor::new(Vec::new());
    let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
    for &sample in &samples {
        writer.write_sample(sample).unwrap();
    }
    writer.finalize().unwrap();
    let wav = cursor.into_inner();

    let mock = MockEndpoint::start(
        json!({"id": "abc123", "status": "IN_QUEUE"}),
        vec![json!({"id": "abc123", "status": "COMPLETED", "output": {
            "audio": BASE64.encode(&wav), "format": "wav", "sample_rate": 44100
        }})],
    )
    .await
    .unwrap();

    let options = fast_options().streaming();
    let (audio, sink) = client_for(&mock)
        .stream_speech("[S1] Hello.", &options, CollectSink::default())
        .await
        .unwrap();

    assert_eq!(audio, wav);
    assert_eq!(sink.chunks.len(), 3);
    assert_eq!(sink.chunks[0].len(), 4096);
    assert_eq!(sink.chunks[2].len(), 100);
    assert_eq!(sink.sample_rate, Some(44_100));
    let total: usize = sink.chunks.iter().map(Vec::len).sum();
    assert_eq!(total, samples.len());
}
