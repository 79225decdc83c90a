//! Integration tests for the direct API client against a mock server.

use mockito::Matcher;
use qwen_hybrid::direct::{ChatMode, DirectClient};
use qwen_hybrid::{resolve, Credential, Error};
use serde_json::json;

fn client(server: &mockito::ServerGuard) -> DirectClient {
    DirectClient::new(&Credential::new("test-jwt"), Some(server.url().as_str())).unwrap()
}

#[tokio::test]
async fn create_chat_returns_the_new_id() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/v2/chats/new")
        .with_status(200)
        .with_body(json!({"data": {"id": "chat-42"}}).to_string())
        .create_async()
        .await;

    let id = client(&server).create_chat(None).await.unwrap();
    assert_eq!(id, "chat-42");
    mock.assert_async().await;
}

#[tokio::test]
async fn completion_without_chat_id_creates_a_conversation_first() {
    let mut server = mockito::Server::new_async().await;
    let create = server
        .mock("POST", "/api/v2/chats/new")
        .with_status(200)
        .with_body(json!({"data": {"id": "chat-new"}}).to_string())
        .create_async()
        .await;
    let completion = server
        .mock("POST", "/api/v2/chat/completions")
        .match_query(Matcher::UrlEncoded("chat_id".into(), "chat-new".into()))
        .with_status(200)
        .with_body(
            json!({"data": {"data": {"choices": [{"message": {"content": "hello back"}}]}}})
                .to_string(),
        )
        .create_async()
        .await;

    let cfg = resolve(Some("qwen-turbo"));
    let chat = client(&server)
        .chat_completion("hello", None, "qwen-turbo", &cfg, ChatMode::Plain, false, &[])
        .await
        .unwrap();

    assert_eq!(chat.chat_id, "chat-new");
    assert_eq!(chat.text, "hello back");
    assert!(chat.body.is_some());
    create.assert_async().await;
    completion.assert_async().await;
}

#[tokio::test]
async fn existing_chat_id_skips_conversation_creation() {
    let mut server = mockito::Server::new_async().await;
    let create = server
        .mock("POST", "/api/v2/chats/new")
        .expect(0)
        .create_async()
        .await;
    let completion = server
        .mock("POST", "/api/v2/chat/completions")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(json!({"response": "flat shape"}).to_string())
        .create_async()
        .await;

    let cfg = resolve(None);
    let chat = client(&server)
        .chat_completion("hi", Some("chat-7"), "m", &cfg, ChatMode::Plain, false, &[])
        .await
        .unwrap();

    assert_eq!(chat.chat_id, "chat-7");
    assert_eq!(chat.text, "flat shape");
    create.assert_async().await;
    completion.assert_async().await;
}

#[tokio::test]
async fn streamed_completion_accumulates_sse_deltas() {
    let mut server = mockito::Server::new_async().await;
    let body = concat!(
        "data: {\"choices\":[{\"delta\":{\"content\":\"stream\"}}]}\n\n",
        "data: not-json\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"ed\"}}]}\n\n",
        "data: {\"finish_reason\":\"stop\"}\n\n",
    );
    let completion = server
        .mock("POST", "/api/v2/chat/completions")
        .match_query(Matcher::Any)
        .match_header("accept", "text/event-stream")
        .with_status(200)
        .with_body(body)
        .create_async()
        .await;

    let cfg = resolve(None);
    let chat = client(&server)
        .chat_completion("hi", Some("chat-1"), "m", &cfg, ChatMode::Plain, true, &[])
        .await
        .unwrap();

    assert_eq!(chat.text, "streamed");
    assert!(chat.body.is_none());
    completion.assert_async().await;
}

#[tokio::test]
async fn chat_stream_yields_lazy_deltas_and_tolerates_early_drop() {
    use futures::StreamExt;

    let mut server = mockito::Server::new_async().await;
    let body = concat!(
        "data: {\"choices\":[{\"delta\":{\"content\":\"one\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"two\"}}]}\n\n",
        "data: {\"finish_reason\":\"stop\"}\n\n",
    );
    server
        .mock("POST", "/api/v2/chat/completions")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(body)
        .create_async()
        .await;

    let cfg = resolve(None);
    let (chat_id, mut deltas) = client(&server)
        .chat_stream("hi", Some("chat-1"), "m", &cfg, ChatMode::Plain, &[])
        .await
        .unwrap();

    assert_eq!(chat_id, "chat-1");
    let first = deltas.next().await.unwrap().unwrap();
    assert_eq!(first, "one");
    // Dropping mid-stream abandons the rest without error.
    drop(deltas);
}

#[tokio::test]
async fn non_2xx_maps_to_upstream_rejected() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/models")
        .with_status(503)
        .with_body("overloaded")
        .create_async()
        .await;

    let err = client(&server).list_models().await.unwrap_err();
    match err {
        Error::UpstreamRejected { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "overloaded");
        }
        other => panic!("expected UpstreamRejected, got {:?}", other),
    }
}

#[tokio::test]
async fn a_200_without_content_is_malformed_not_success() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/v2/chat/completions")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(json!({"data": {"choices": []}}).to_string())
        .create_async()
        .await;

    let cfg = resolve(None);
    let err = client(&server)
        .chat_completion("hi", Some("c"), "m", &cfg, ChatMode::Plain, false, &[])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MalformedResponse { .. }));
}

#[tokio::test]
async fn uploaded_file_ids_are_threaded_into_the_envelope() {
    let mut server = mockito::Server::new_async().await;
    let upload = server
        .mock("POST", "/api/v2/files/upload")
        .with_status(200)
        .with_body(json!({"data": {"file_id": "f-9"}}).to_string())
        .create_async()
        .await;
    let completion = server
        .mock("POST", "/api/v2/chat/completions")
        .match_query(Matcher::Any)
        .match_body(Matcher::PartialJson(json!({
            "messages": [{"files": [{"file_id": "f-9"}]}]
        })))
        .with_status(200)
        .with_body(json!({"response": "got the file"}).to_string())
        .create_async()
        .await;

    let mut attachment = tempfile::NamedTempFile::new().unwrap();
    std::io::Write::write_all(&mut attachment, b"attachment bytes").unwrap();

    let c = client(&server);
    let file_id = c.upload_file(attachment.path()).await.unwrap();

    let cfg = resolve(None);
    let chat = c
        .chat_completion(
            "see attachment",
            Some("chat-1"),
            "m",
            &cfg,
            ChatMode::Plain,
            false,
            &[file_id],
        )
        .await
        .unwrap();

    assert_eq!(chat.text, "got the file");
    upload.assert_async().await;
    completion.assert_async().await;
}

#[tokio::test]
async fn generate_image_requires_a_url() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/v2/chat/completions")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            json!({"choices": [{"message": {"content": "https://img.example/sunset.png"}}]})
                .to_string(),
        )
        .create_async()
        .await;

    let cfg = resolve(None);
    let image = client(&server)
        .generate_image("a sunset", Some("chat-1"), "m", &cfg)
        .await
        .unwrap();
    assert_eq!(image.image_url, "https://img.example/sunset.png");
    assert_eq!(image.chat_id, "chat-1");
}

#[tokio::test]
async fn generate_image_with_plain_text_body_fails() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/v2/chat/completions")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            json!({"choices": [{"message": {"content": "I cannot generate that image."}}]})
                .to_string(),
        )
        .create_async()
        .await;

    let cfg = resolve(None);
    let err = client(&server)
        .generate_image("a sunset", Some("chat-1"), "m", &cfg)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MalformedResponse { .. }));
}

#[tokio::test]
async fn listing_endpoints_hit_their_paths() {
    let mut server = mockito::Server::new_async().await;
    let models = server
        .mock("GET", "/api/models")
        .with_status(200)
        .with_body(json!({"data": [{"id": "qwen-turbo"}, {"id": "qwq-32b"}]}).to_string())
        .create_async()
        .await;
    let conversations = server
        .mock("GET", "/api/v2/chats/")
        .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
        .with_status(200)
        .with_body(json!({"data": []}).to_string())
        .create_async()
        .await;
    let folders = server
        .mock("GET", "/api/v2/folders/")
        .with_status(200)
        .with_body(json!({"data": []}).to_string())
        .create_async()
        .await;

    let c = client(&server);
    assert_eq!(c.list_models().await.unwrap().len(), 2);
    c.list_conversations(2).await.unwrap();
    c.list_folders().await.unwrap();

    models.assert_async().await;
    conversations.assert_async().await;
    folders.assert_async().await;
}

#[tokio::test]
async fn requests_carry_the_bearer_token() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v1/auths/")
        .match_header("authorization", "Bearer test-jwt")
        .with_status(200)
        .with_body(json!({"id": "user-1"}).to_string())
        .create_async()
        .await;

    client(&server).auth_status().await.unwrap();
    mock.assert_async().await;
}
