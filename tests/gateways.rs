//! Upstream gateway tests against mock HTTP servers

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use companion_gateway::conversation::{ConversationTurn, Role};
use companion_gateway::{CompletionGateway, Error, GoogleTts, OpenAiCompletion, SpeechSynthesizer};
use secrecy::SecretString;
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn completion_for(server: &MockServer) -> OpenAiCompletion {
    OpenAiCompletion::new(SecretString::from("sk-test".to_string()))
        .unwrap()
        .with_base_url(server.uri())
}

fn tts_for(server: &MockServer) -> GoogleTts {
    GoogleTts::new(SecretString::from("tts-key".to_string()))
        .unwrap()
        .with_base_url(server.uri())
}

fn conversation() -> Vec<ConversationTurn> {
    vec![
        ConversationTurn::new(Role::System, "You are Shivani."),
        ConversationTurn::new(Role::User, "Hello"),
    ]
}

/// Read one HTTP request (head plus `content-length` body)
async fn read_request(stream: &mut TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let Ok(n) = stream.read(&mut chunk).await else {
            return;
        };
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf);
        if let Some(head_end) = text.find("\r\n\r\n") {
            let length = text[..head_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= head_end + 4 + length {
                return;
            }
        }
    }
}

/// Upstream that reads each request, optionally writes `prefix`, then
/// closes with RST. Returns its base URL and an accepted-connection count.
async fn resetting_upstream(prefix: Option<&'static str>) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&accepted);

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                read_request(&mut stream).await;
                if let Some(prefix) = prefix {
                    let _ = stream.write_all(prefix.as_bytes()).await;
                    let _ = stream.flush().await;
                    tokio::time::sleep(Duration::from_millis(50)).await;
                }
                // zero linger turns close into a reset
                #[allow(deprecated)]
                let _ = stream.set_linger(Some(Duration::ZERO));
                drop(stream);
            });
        }
    });

    (format!("http://{addr}"), accepted)
}

fn completion_at(base_url: &str) -> OpenAiCompletion {
    OpenAiCompletion::new(SecretString::from("sk-test".to_string()))
        .unwrap()
        .with_base_url(base_url)
}

#[tokio::test]
async fn completion_retries_socket_reset_three_times() {
    let (base_url, accepted) = resetting_upstream(None).await;

    let err = completion_at(&base_url)
        .complete(&conversation())
        .await
        .unwrap_err();

    assert!(err.is_transport_reset(), "unexpected error: {err}");
    assert_eq!(accepted.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn completion_retries_reset_during_body() {
    let (base_url, accepted) = resetting_upstream(Some(
        "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 512\r\n\r\n{\"choi",
    ))
    .await;

    let err = completion_at(&base_url)
        .complete(&conversation())
        .await
        .unwrap_err();

    assert!(err.is_transport_reset(), "unexpected error: {err}");
    assert_eq!(accepted.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn completion_sends_full_history() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4",
            "max_tokens": 1200,
            "messages": [
                {"role": "system", "content": "You are Shivani."},
                {"role": "user", "content": "Hello"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "Hi there!"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reply = completion_for(&server).complete(&conversation()).await.unwrap();
    assert_eq!(reply, "Hi there!");
}

#[tokio::test]
async fn completion_rejection_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .expect(1)
        .mount(&server)
        .await;

    let err = completion_for(&server)
        .complete(&conversation())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::UpstreamRejected { status: 401, .. }));
}

#[tokio::test]
async fn completion_without_choices_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let err = completion_for(&server)
        .complete(&conversation())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::MalformedResponse(_)));
}

#[tokio::test]
async fn completion_model_override() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"model": "gpt-4o-mini"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "ok"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reply = completion_for(&server)
        .with_model("gpt-4o-mini")
        .complete(&conversation())
        .await
        .unwrap();
    assert_eq!(reply, "ok");
}

#[tokio::test]
async fn tts_sends_voice_profile() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/text:synthesize"))
        .and(query_param("key", "tts-key"))
        .and(body_partial_json(json!({
            "input": {"text": "Annyeong "},
            "voice": {
                "languageCode": "ko-KR",
                "name": "ko-KR-Wavenet-B",
                "ssmlGender": "MALE"
            },
            "audioConfig": {"audioEncoding": "MP3", "speakingRate": 1.0, "pitch": 0.5}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"audioContent": "SUQz"})))
        .expect(1)
        .mount(&server)
        .await;

    let audio = tts_for(&server)
        .synthesize("Annyeong \u{1F60A}", "ko-KR")
        .await
        .unwrap();
    assert_eq!(audio, "SUQz");
}

#[tokio::test]
async fn tts_unknown_language_uses_default_voice() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "voice": {
                "languageCode": "fr-FR",
                "name": "en-US-Wavenet-F",
                "ssmlGender": "FEMALE"
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"audioContent": "AAAA"})))
        .expect(1)
        .mount(&server)
        .await;

    let audio = tts_for(&server).synthesize("Bonjour", "fr-FR").await.unwrap();
    assert_eq!(audio, "AAAA");
}

#[tokio::test]
async fn tts_upstream_failure_is_wrapped() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .mount(&server)
        .await;

    let err = tts_for(&server).synthesize("hi", "en-US").await.unwrap_err();

    match err {
        Error::Tts(inner) => {
            assert!(matches!(*inner, Error::UpstreamRejected { status: 500, .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
}
