use assistant_cli::session::{self, ResearchPhase, SessionUpdate, ToolCallRecord};
use assistant_cli::{ChunkEvent, Message};
use bytes::Bytes;
use futures::channel::mpsc;
use futures::{stream, StreamExt};
use serde_json::{json, Value};
use std::io;

fn frame(event: Value) -> String {
    format!("data: {event}\n\n")
}

fn wire(events: &[Value]) -> Vec<u8> {
    events.iter().map(|e| frame(e.clone())).collect::<String>().into_bytes()
}

async fn run_session(chunks: Vec<Vec<u8>>) -> Vec<SessionUpdate> {
    let body = stream::iter(
        chunks
            .into_iter()
            .map(|chunk| Ok::<_, io::Error>(Bytes::from(chunk))),
    );
    let (_abort, updates) = session::start(async move { Ok(body) });
    updates.collect().await
}

fn finished(updates: &[SessionUpdate]) -> &Message {
    let finished: Vec<&Message> = updates
        .iter()
        .filter_map(|update| match update {
            SessionUpdate::Finished(message) => Some(message),
            SessionUpdate::Progress(_) => None,
        })
        .collect();
    assert_eq!(finished.len(), 1, "Expected exactly one finished message");
    assert!(
        matches!(updates.last(), Some(SessionUpdate::Finished(_))),
        "Finished message must be the last update"
    );
    finished[0]
}

#[tokio::test]
async fn test_content_fragments_concatenate() {
    let updates = run_session(vec![wire(&[
        json!({"type": "content", "content": "Hel"}),
        json!({"type": "content", "content": "lo"}),
        json!({"type": "done", "message_id": "m1"}),
    ])])
    .await;

    let message = finished(&updates);
    assert_eq!(message.content(), "Hello");
    assert_eq!(message.id(), Some("m1"));
    assert!(!message.is_error());
}

#[tokio::test]
async fn test_done_without_content_uses_placeholder() {
    let updates = run_session(vec![wire(&[json!({"type": "done"})])]).await;
    let message = finished(&updates);
    assert_eq!(message.content(), session::EMPTY_RESPONSE_PLACEHOLDER);
    assert!(!message.content().is_empty());
}

#[tokio::test]
async fn test_tool_call_and_result_logged_in_order() {
    let updates = run_session(vec![wire(&[
        json!({"type": "tool_call", "tool": "search", "params": {"q": "AAPL"}}),
        json!({"type": "tool_result", "tool": "search", "status": "success", "result": {"price": 189.5}}),
        json!({"type": "done"}),
    ])])
    .await;

    let log = finished(&updates).tool_calls();
    assert_eq!(log.len(), 2);
    assert_eq!(
        log[0],
        ToolCallRecord::Call {
            tool: "search".to_string(),
            params: json!({"q": "AAPL"}),
            call_id: None,
        }
    );
    assert_eq!(
        log[1],
        ToolCallRecord::Result {
            tool: "search".to_string(),
            status: "success".to_string(),
            result: json!({"price": 189.5}),
            call_id: None,
        }
    );
}

#[tokio::test]
async fn test_interleaved_side_channels_keep_order_and_count() {
    let updates = run_session(vec![wire(&[
        json!({"type": "thinking", "agent": "planner", "text": "split the question"}),
        json!({"type": "tool_call", "tool": "quote", "params": {"s": "MSFT"}, "call_id": "c1"}),
        json!({"type": "content", "content": "MSFT "}),
        json!({"type": "thinking", "agent": "analyst"}),
        json!({"type": "tool_call", "tool": "quote", "params": {"s": "AAPL"}, "call_id": "c2"}),
        json!({"type": "tool_result", "tool": "quote", "status": "success", "result": 2, "call_id": "c2"}),
        json!({"type": "thinking", "agent": "analyst", "text": "compare"}),
        json!({"type": "tool_result", "tool": "quote", "status": "success", "result": 1, "call_id": "c1"}),
        json!({"type": "content", "content": "vs AAPL"}),
        json!({"type": "done"}),
    ])])
    .await;

    let message = finished(&updates);
    assert_eq!(message.content(), "MSFT vs AAPL");

    let tools: Vec<(&str, bool)> = message
        .tool_calls()
        .iter()
        .map(|record| (record.call_id().unwrap(), record.is_call()))
        .collect();
    assert_eq!(tools, vec![("c1", true), ("c2", true), ("c2", false), ("c1", false)]);

    let first_call = &message.tool_calls()[0];
    match message.tool_result_for(first_call) {
        Some(ToolCallRecord::Result { result, .. }) => assert_eq!(result, &json!(1)),
        other => panic!("Expected result for c1, got: {other:?}"),
    }

    let thinking: Vec<(&str, &str)> = message
        .thinking()
        .iter()
        .map(|trace| (trace.agent.as_str(), trace.text.as_str()))
        .collect();
    assert_eq!(
        thinking,
        vec![("planner", "split the question"), ("analyst", "compare")]
    );
}

#[tokio::test]
async fn test_progress_updates_arrive_in_wire_order() {
    let updates = run_session(vec![wire(&[
        json!({"type": "content", "content": "a"}),
        json!({"type": "heartbeat"}),
        json!({"type": "tool_call", "tool": "search"}),
        json!({"type": "content", "content": "b"}),
        json!({"type": "done"}),
    ])])
    .await;

    let kinds: Vec<&str> = updates
        .iter()
        .map(|update| match update {
            SessionUpdate::Progress(event) => event.kind(),
            SessionUpdate::Finished(_) => "finished",
        })
        .collect();
    assert_eq!(kinds, vec!["content", "tool_call", "content", "finished"]);
}

#[tokio::test]
async fn test_split_points_do_not_change_the_result() {
    let bytes = wire(&[
        json!({"type": "thinking", "agent": "écrivain", "text": "résumé ✓"}),
        json!({"type": "content", "content": "Prix: 189 € "}),
        json!({"type": "tool_call", "tool": "search", "params": {"q": "日本株"}}),
        json!({"type": "content", "content": "— fin 🚀"}),
        json!({"type": "done", "message_id": "m7"}),
    ]);

    let whole = run_session(vec![bytes.clone()]).await;
    let expected = finished(&whole);

    for split in 0..=bytes.len() {
        let updates = run_session(vec![bytes[..split].to_vec(), bytes[split..].to_vec()]).await;
        let message = finished(&updates);
        assert_eq!(message.content(), expected.content(), "split at byte {split}");
        assert_eq!(message.id(), expected.id(), "split at byte {split}");
        assert_eq!(message.tool_calls(), expected.tool_calls(), "split at byte {split}");
        assert_eq!(message.thinking().len(), 1, "split at byte {split}");
        assert_eq!(message.thinking()[0].text, "résumé ✓", "split at byte {split}");
    }
    assert_eq!(expected.content(), "Prix: 189 € — fin 🚀");
}

#[tokio::test]
async fn test_byte_at_a_time_delivery() {
    let bytes = wire(&[
        json!({"type": "content", "content": "naïve "}),
        json!({"type": "content", "content": "café"}),
        json!({"type": "done"}),
    ]);
    let chunks = bytes.iter().map(|b| vec![*b]).collect();
    let updates = run_session(chunks).await;
    assert_eq!(finished(&updates).content(), "naïve café");
}

#[tokio::test]
async fn test_malformed_frame_is_skipped() {
    let mut bytes = frame(json!({"type": "content", "content": "one "})).into_bytes();
    bytes.extend_from_slice(b"data: {\"type\":\"content\",\"content\":\n\n");
    bytes.extend_from_slice(b"data: not json at all\n\n");
    bytes.extend(wire(&[
        json!({"type": "content", "content": "two"}),
        json!({"type": "done"}),
    ]));

    let updates = run_session(vec![bytes]).await;
    assert_eq!(finished(&updates).content(), "one two");
}

#[tokio::test]
async fn test_research_progress_is_merged_not_replaced() {
    let updates = run_session(vec![wire(&[
        json!({"type": "research_phase", "phase": "planning"}),
        json!({"type": "research_plan", "sub_questions": ["revenue?", "margins?"]}),
        json!({"type": "research_phase", "phase": "researching"}),
        json!({"type": "research_progress", "completed": 1}),
        json!({"type": "research_progress", "total_units": 2}),
        json!({"type": "research_complete", "notes_found": 6}),
        json!({"type": "research_phase", "phase": "writing"}),
        json!({"type": "content", "content": "Report"}),
        json!({"type": "done"}),
    ])])
    .await;

    let phases: Vec<&ResearchPhase> = updates
        .iter()
        .filter_map(|update| match update {
            SessionUpdate::Progress(ChunkEvent::ResearchPhase { phase }) => Some(phase),
            _ => None,
        })
        .collect();
    assert_eq!(
        phases,
        vec![
            &ResearchPhase::Planning,
            &ResearchPhase::Researching,
            &ResearchPhase::Writing
        ]
    );

    let stats = finished(&updates).research().expect("research stats");
    assert_eq!(stats.completed_units, Some(1));
    assert_eq!(stats.total_units, Some(2));
    assert_eq!(stats.sources_found, Some(6));
    assert_eq!(stats.sub_questions, vec!["revenue?".to_string(), "margins?".to_string()]);
}

#[tokio::test]
async fn test_done_statistics_and_references() {
    let updates = run_session(vec![wire(&[
        json!({"type": "research_progress", "total_units": 3}),
        json!({"type": "content", "content": "Answer"}),
        json!({
            "type": "done",
            "message_id": "m2",
            "references": [{"title": "Annual report", "url": "https://example.com/10k"}],
            "research_stats": {"total_units": 3, "completed_units": 3, "sources_found": 12}
        }),
    ])])
    .await;

    let message = finished(&updates);
    assert_eq!(message.references().len(), 1);
    assert_eq!(message.references()[0].title.as_deref(), Some("Annual report"));
    let stats = message.research().unwrap();
    assert_eq!(stats.completed_units, Some(3));
    assert_eq!(stats.sources_found, Some(12));
}

#[tokio::test]
async fn test_partial_done_statistics_keep_merged_progress() {
    let updates = run_session(vec![wire(&[
        json!({"type": "research_progress", "total_units": 3, "completed": 3}),
        json!({"type": "done", "research_stats": {"sources_found": 12}}),
    ])])
    .await;

    let stats = finished(&updates).research().expect("research stats");
    assert_eq!(stats.total_units, Some(3));
    assert_eq!(stats.completed_units, Some(3));
    assert_eq!(stats.sources_found, Some(12));
}

#[tokio::test]
async fn test_null_fields_do_not_drop_events() {
    let updates = run_session(vec![wire(&[
        json!({"type": "content", "content": null}),
        json!({"type": "thinking", "agent": null, "content": "scoping"}),
        json!({"type": "research_progress", "completed": 1.0}),
        json!({"type": "tool_result", "tool": "search", "status": null, "result": null}),
        json!({"type": "content", "content": "Answer"}),
        json!({"type": "done"}),
    ])])
    .await;

    assert_eq!(updates.len(), 6);
    let message = finished(&updates);
    assert_eq!(message.content(), "Answer");
    assert_eq!(message.thinking().len(), 1);
    assert_eq!(message.tool_calls().len(), 1);
    assert_eq!(message.research().and_then(|r| r.completed_units), Some(1));
}

#[tokio::test]
async fn test_error_event_finalizes_error_message() {
    let updates = run_session(vec![wire(&[
        json!({"type": "content", "content": "partial"}),
        json!({"type": "error", "error": "rate limited"}),
        json!({"type": "content", "content": "ignored"}),
        json!({"type": "done"}),
    ])])
    .await;

    let message = finished(&updates);
    assert!(message.is_error());
    assert!(message.content().contains("rate limited"));
}

#[tokio::test]
async fn test_events_after_done_are_not_delivered() {
    let updates = run_session(vec![wire(&[
        json!({"type": "content", "content": "x"}),
        json!({"type": "done"}),
        json!({"type": "content", "content": "late"}),
        json!({"type": "error", "error": "late"}),
    ])])
    .await;

    assert_eq!(updates.len(), 2);
    assert_eq!(finished(&updates).content(), "x");
}

#[tokio::test]
async fn test_transport_error_finalizes_error_message() {
    let body = stream::iter(vec![
        Ok(Bytes::from(wire(&[
            json!({"type": "tool_call", "tool": "search"}),
            json!({"type": "content", "content": "half"}),
        ]))),
        Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset by peer")),
    ]);
    let (_abort, updates) = session::start(async move { Ok(body) });
    let updates: Vec<SessionUpdate> = updates.collect().await;

    let message = finished(&updates);
    assert!(message.is_error());
    assert!(message.content().contains("connection reset by peer"));
    assert_eq!(message.tool_calls().len(), 1);
}

#[tokio::test]
async fn test_abort_stops_dispatch_and_suppresses_error() {
    let (tx, rx) = mpsc::unbounded::<Result<Bytes, io::Error>>();
    let (abort, mut updates) = session::start(async move { Ok(rx) });

    tx.unbounded_send(Ok(Bytes::from(frame(json!({"type": "content", "content": "Hel"})))))
        .unwrap();
    assert!(matches!(
        updates.next().await,
        Some(SessionUpdate::Progress(ChunkEvent::Content { .. }))
    ));

    abort.abort();
    tx.unbounded_send(Ok(Bytes::from(frame(json!({"type": "content", "content": "lo"})))))
        .unwrap();
    tx.unbounded_send(Err(io::Error::new(io::ErrorKind::ConnectionAborted, "aborted")))
        .unwrap();

    assert!(updates.next().await.is_none());
}

#[tokio::test]
async fn test_abort_while_waiting_for_bytes() {
    let (_tx, rx) = mpsc::unbounded::<Result<Bytes, io::Error>>();
    let (abort, updates) = session::start(async move { Ok(rx) });

    let reader = tokio::spawn(updates.collect::<Vec<SessionUpdate>>());
    tokio::task::yield_now().await;
    abort.abort();

    let updates = reader.await.unwrap();
    assert!(updates.is_empty());
}

#[tokio::test]
async fn test_abort_after_done_is_noop() {
    let (abort, mut updates) = session::start(async move {
        Ok(stream::iter(vec![Ok::<_, io::Error>(Bytes::from(wire(&[
            json!({"type": "content", "content": "ok"}),
            json!({"type": "done"}),
        ])))]))
    });

    assert!(matches!(updates.next().await, Some(SessionUpdate::Progress(_))));
    match updates.next().await {
        Some(SessionUpdate::Finished(message)) => assert_eq!(message.content(), "ok"),
        other => panic!("Expected finished message, got: {other:?}"),
    }

    abort.abort();
    assert!(updates.next().await.is_none());
}

#[tokio::test]
async fn test_concurrent_sessions_are_independent() {
    let first = run_session(vec![wire(&[
        json!({"type": "content", "content": "first"}),
        json!({"type": "done", "message_id": "a"}),
    ])]);
    let second = run_session(vec![wire(&[
        json!({"type": "content", "content": "second"}),
        json!({"type": "error", "error": "boom"}),
    ])]);

    let (first, second) = tokio::join!(first, second);
    assert_eq!(finished(&first).content(), "first");
    assert!(finished(&second).is_error());
}
