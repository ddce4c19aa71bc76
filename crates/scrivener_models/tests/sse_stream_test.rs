//! Tests for decoding streamed chat completions.

use futures::StreamExt;
use futures::stream;
use scrivener_models::text_deltas;

fn chunk(text: &str) -> String {
    format!(
        "data: {}\n\n",
        serde_json::json!({"choices": [{"delta": {"content": text}}]})
    )
}

async fn collect(parts: Vec<Result<String, std::io::Error>>) -> Vec<Result<String, String>> {
    text_deltas(stream::iter(parts))
        .map(|item| item.map_err(|e| e.to_string()))
        .collect()
        .await
}

#[tokio::test]
async fn test_multiple_events_in_one_chunk() {
    let body = format!("{}{}{}data: [DONE]\n\n", chunk("你"), chunk("好"), chunk("！"));
    let deltas = collect(vec![Ok(body)]).await;
    assert_eq!(deltas, vec![Ok("你".into()), Ok("好".into()), Ok("！".into())]);
}

#[tokio::test]
async fn test_event_split_across_chunks() {
    let body = chunk("split");
    let (a, b) = body.split_at(12);
    let deltas = collect(vec![Ok(a.to_string()), Ok(b.to_string())]).await;
    assert_eq!(deltas, vec![Ok("split".into())]);
}

#[tokio::test]
async fn test_done_stops_the_stream() {
    let body = format!("{}data: [DONE]\n\n{}", chunk("a"), chunk("ignored"));
    let deltas = collect(vec![Ok(body)]).await;
    assert_eq!(deltas, vec![Ok("a".into())]);
}

#[tokio::test]
async fn test_role_only_and_empty_deltas_are_skipped() {
    let role = "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n".to_string();
    let finish = "data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\"}]}\n\n".to_string();
    let deltas = collect(vec![Ok(role), Ok(chunk("x")), Ok(finish)]).await;
    assert_eq!(deltas, vec![Ok("x".into())]);
}

#[tokio::test]
async fn test_stream_without_done_flushes_tail() {
    let tail = chunk("tail");
    let deltas = collect(vec![Ok(tail.trim_end().to_string())]).await;
    assert_eq!(deltas, vec![Ok("tail".into())]);
}

#[tokio::test]
async fn test_malformed_event_ends_with_error() {
    let body = format!("{}data: {{not json\n\n{}", chunk("ok"), chunk("never"));
    let deltas = collect(vec![Ok(body)]).await;
    assert_eq!(deltas.len(), 2);
    assert_eq!(deltas[0], Ok("ok".into()));
    assert!(deltas[1].as_ref().unwrap_err().contains("Failed to parse chunk"));
}

#[tokio::test]
async fn test_provider_error_event() {
    let body = "data: {\"error\":{\"message\":\"quota exceeded\"}}\n\n".to_string();
    let deltas = collect(vec![Ok(body)]).await;
    assert_eq!(deltas.len(), 1);
    assert!(deltas[0].as_ref().unwrap_err().contains("quota exceeded"));
}

#[tokio::test]
async fn test_transport_error_ends_stream() {
    let parts = vec![
        Ok(chunk("a")),
        Err(std::io::Error::other("connection reset")),
        Ok(chunk("b")),
    ];
    let deltas = collect(parts).await;
    assert_eq!(deltas.len(), 2);
    assert!(deltas[1].as_ref().unwrap_err().contains("connection reset"));
}
