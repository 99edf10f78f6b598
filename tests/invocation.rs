//! Process lifecycle guarantees of the invocation cores.

#![cfg(unix)]

mod common;

use std::time::Duration;

use common::FakeGpg;
use futures::future::join_all;
use gpg_wrap::{Destination, Error, Gpg, GpgConfig, Source, StreamOptions};

const NO_SUCH_GPG: &str = "/nonexistent/path/to/gpg";

#[tokio::test]
async fn missing_executable_is_spawn_error_not_hang() {
    let gpg = Gpg::new(GpgConfig::default().executable(NO_SUCH_GPG));

    let result = tokio::time::timeout(Duration::from_secs(10), gpg.encrypt("Hello", &[])).await;

    let err = result.expect("spawn failure must not hang").unwrap_err();
    assert!(err.is_spawn_failure(), "unexpected error: {err}");
    match err {
        Error::Spawn { executable, source } => {
            assert_eq!(executable, NO_SUCH_GPG);
            assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
        }
        other => panic!("expected Spawn, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_executable_in_streaming_core() {
    let gpg = Gpg::new(GpgConfig::default().executable(NO_SUCH_GPG));
    let (writer, _reader) = tokio::io::duplex(64);

    let err = gpg
        .encrypt_to_stream(
            StreamOptions::new(Source::reader(&b"payload"[..]), Destination::writer(writer)),
            &[],
        )
        .await
        .unwrap_err();

    assert!(err.is_spawn_failure());
}

#[tokio::test]
async fn missing_source_path_spawns_nothing() {
    let fake = FakeGpg::new();
    let gpg = fake.gpg();

    let err = gpg
        .encrypt_to_file(
            fake.home().join("does-not-exist.txt"),
            fake.home().join("out.gpg"),
            &["--recipient", common::KEY_ID],
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::SourceNotFound { .. }), "got {err:?}");
    assert_eq!(fake.spawn_count(), 0);
}

#[tokio::test]
async fn unwritable_destination_spawns_nothing() {
    let fake = FakeGpg::new();
    let src = fake.home().join("plain.txt");
    tokio::fs::write(&src, b"Hello").await.unwrap();

    let err = fake
        .gpg()
        .encrypt_to_file(&src, fake.home().join("missing-dir").join("out.gpg"), &[])
        .await
        .unwrap_err();

    assert!(matches!(err, Error::DestinationUnwritable { .. }), "got {err:?}");
    assert_eq!(fake.spawn_count(), 0);
}

#[tokio::test]
async fn incomplete_stream_options_spawn_nothing() {
    let fake = FakeGpg::new();

    let err = fake
        .gpg()
        .call_streaming(StreamOptions::default(), &[])
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InvalidOptions(_)));
    assert_eq!(fake.spawn_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn one_outcome_per_invocation_under_concurrency() {
    let fake = FakeGpg::new();
    let gpg = fake.gpg();
    let broken = Gpg::new(GpgConfig::default().executable(NO_SUCH_GPG));

    let calls = (0..100).map(|i| {
        let gpg = if i % 10 == 0 { broken.clone() } else { gpg.clone() };
        async move {
            let payload = format!("payload-{i}");
            (payload.clone(), gpg.call(payload, &["--flaky"]).await)
        }
    });

    let outcomes = tokio::time::timeout(Duration::from_secs(60), join_all(calls))
        .await
        .expect("every invocation completes");

    assert_eq!(outcomes.len(), 100);

    let mut spawn_failures = 0;
    for (payload, outcome) in outcomes {
        match outcome {
            Ok(output) => assert_eq!(output.stdout_text(), payload),
            Err(Error::ProcessFailed { code, message }) => {
                assert_eq!(code, Some(1));
                assert!(message.contains("flaky failure"));
            }
            Err(e) if e.is_spawn_failure() => spawn_failures += 1,
            Err(e) => panic!("unexpected error: {e:?}"),
        }
    }

    assert_eq!(spawn_failures, 10);
    assert_eq!(fake.spawn_count(), 90);
}

#[tokio::test]
async fn timeout_is_reported_as_its_own_error() {
    let gpg = Gpg::new(
        GpgConfig::default()
            .executable("sh")
            .global_args(["-c", "sleep 30", "gpg"])
            .timeout(Duration::from_millis(250)),
    );

    let err = gpg.call("", &[]).await.unwrap_err();
    assert!(matches!(err, Error::Timeout(d) if d == Duration::from_millis(250)));
    assert_eq!(err.code(), 102);
}
