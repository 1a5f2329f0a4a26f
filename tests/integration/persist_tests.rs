use dispatch_scraper::persist::{InternetFilePersister, Persister, SaveOutcome};
use dispatch_scraper::ScraperError;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn audio_server() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/audio/2020/05/01/a.mp3"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"AAAA".to_vec()))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/audio/2020/05/01/b.mp3"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"BBBB".to_vec()))
        .mount(&server)
        .await;

    server
}

fn urls() -> Vec<String> {
    vec![
        "/audio/2020/05/01/a.mp3".to_string(),
        "/audio/2020/05/01/b.mp3".to_string(),
    ]
}

#[tokio::test]
async fn test_saves_files_mirroring_url_paths() {
    let server = audio_server().await;
    let dir = tempfile::tempdir().unwrap();

    let mut persister =
        InternetFilePersister::new(dir.path(), server.uri(), false, "TestScraper/1.0").unwrap();

    let written = persister.save_all(&urls()).await.unwrap();
    assert_eq!(written, 2);

    let a = dir.path().join("audio/2020/05/01/a.mp3");
    let b = dir.path().join("audio/2020/05/01/b.mp3");
    assert_eq!(std::fs::read(&a).unwrap(), b"AAAA");
    assert_eq!(std::fs::read(&b).unwrap(), b"BBBB");

    let saved: Vec<_> = persister.saved_files().iter().map(|f| f.path.clone()).collect();
    assert_eq!(saved, vec![a, b]);
}

#[tokio::test]
async fn test_second_pass_skips_existing() {
    let server = audio_server().await;
    let dir = tempfile::tempdir().unwrap();

    let mut persister =
        InternetFilePersister::new(dir.path(), server.uri(), false, "TestScraper/1.0").unwrap();

    assert_eq!(persister.save_all(&urls()).await.unwrap(), 2);
    assert_eq!(persister.save_all(&urls()).await.unwrap(), 0);
    assert_eq!(persister.saved_files().len(), 2);
}

#[tokio::test]
async fn test_overwrite_existing() {
    let server = audio_server().await;
    let dir = tempfile::tempdir().unwrap();

    let existing = dir.path().join("audio/2020/05/01/a.mp3");
    std::fs::create_dir_all(existing.parent().unwrap()).unwrap();
    std::fs::write(&existing, b"stale").unwrap();

    let mut persister =
        InternetFilePersister::new(dir.path(), server.uri(), true, "TestScraper/1.0").unwrap();

    let written = persister
        .save_all(&["/audio/2020/05/01/a.mp3".to_string()])
        .await
        .unwrap();

    // Replaced, not new
    assert_eq!(written, 0);
    assert_eq!(std::fs::read(&existing).unwrap(), b"AAAA");
    assert_eq!(persister.saved_files().len(), 1);
    assert!(persister.saved_files()[0].replaced);

    let outcome = persister
        .save_file_from_relative_url("/audio/2020/05/01/b.mp3")
        .await
        .unwrap();
    assert_eq!(outcome, SaveOutcome::New);
}

#[tokio::test]
async fn test_relative_url_without_leading_slash() {
    let server = audio_server().await;
    let dir = tempfile::tempdir().unwrap();

    let mut persister =
        InternetFilePersister::new(dir.path(), server.uri(), false, "TestScraper/1.0").unwrap();

    let written = persister
        .save_all(&["audio/2020/05/01/a.mp3".to_string()])
        .await
        .unwrap();

    assert_eq!(written, 1);
    assert_eq!(
        std::fs::read(dir.path().join("audio/2020/05/01/a.mp3")).unwrap(),
        b"AAAA"
    );
}

#[tokio::test]
async fn test_absolute_recording_url() {
    let server = audio_server().await;
    let dir = tempfile::tempdir().unwrap();

    // Prefix points elsewhere; the absolute URL is used as-is
    let mut persister =
        InternetFilePersister::new(dir.path(), "http://127.0.0.1:9", false, "TestScraper/1.0")
            .unwrap();

    let absolute = format!("{}/audio/2020/05/01/b.mp3", server.uri());
    let written = persister.save_all(&[absolute]).await.unwrap();

    assert_eq!(written, 1);
    assert_eq!(
        std::fs::read(dir.path().join("audio/2020/05/01/b.mp3")).unwrap(),
        b"BBBB"
    );
}

#[tokio::test]
async fn test_missing_recording_is_fatal() {
    let server = audio_server().await;
    let dir = tempfile::tempdir().unwrap();

    let mut persister =
        InternetFilePersister::new(dir.path(), server.uri(), false, "TestScraper/1.0").unwrap();

    let result = persister
        .save_all(&["/audio/2020/05/01/missing.mp3".to_string()])
        .await;

    assert!(matches!(result, Err(ScraperError::Download { .. })));
    assert!(!dir.path().join("audio/2020/05/01/missing.mp3").exists());
}
