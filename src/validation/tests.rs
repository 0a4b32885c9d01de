use super::*;
use serde_json::json;

const NOW: i64 = 1_800_000_000_000;

fn chat(raw: Value) -> Result<ChatMessage, ValidationError> {
    normalize_chat_payload(&raw, &ChatConfig::default(), NOW)
}

fn mv(raw: Value) -> Result<MoveCommand, ValidationError> {
    normalize_move_payload(&raw, NOW)
}

#[test]
fn test_valid_chat_payload() {
    let result = chat(json!({
        "id": "msg-1",
        "clientId": "client-1",
        "nickname": "Alice",
        "text": "Hello world",
        "createdAt": 1700000000000i64
    }))
    .unwrap();

    assert_eq!(
        result,
        ChatMessage {
            id: "msg-1".to_string(),
            client_id: Some("client-1".to_string()),
            nickname: "Alice".to_string(),
            text: "Hello world".to_string(),
            created_at: 1_700_000_000_000,
        }
    );
}

#[test]
fn test_chat_payload_not_object_fails() {
    assert_eq!(chat(json!(null)), Err(ValidationError::PayloadNotObject));
    assert_eq!(chat(json!("string")), Err(ValidationError::PayloadNotObject));
    assert_eq!(chat(json!([1, 2])), Err(ValidationError::PayloadNotObject));
}

#[test]
fn test_chat_missing_fields_fail() {
    assert_eq!(
        chat(json!({"nickname": "A", "text": "B"})),
        Err(ValidationError::MissingId)
    );
    assert_eq!(
        chat(json!({"id": "1", "text": "B"})),
        Err(ValidationError::MissingNickname)
    );
    assert_eq!(
        chat(json!({"id": "1", "nickname": "A"})),
        Err(ValidationError::MissingText)
    );
    // Whitespace-only counts as empty after trimming
    assert_eq!(
        chat(json!({"id": "1", "nickname": "A", "text": "   "})),
        Err(ValidationError::MissingText)
    );
}

#[test]
fn test_chat_fields_are_trimmed() {
    let result = chat(json!({
        "id": "  msg-1  ",
        "clientId": "  c-1  ",
        "nickname": "  Bob  ",
        "text": "  hi  ",
        "createdAt": 1700000000000i64
    }))
    .unwrap();

    assert_eq!(result.id, "msg-1");
    assert_eq!(result.client_id.as_deref(), Some("c-1"));
    assert_eq!(result.nickname, "Bob");
    assert_eq!(result.text, "hi");
}

#[test]
fn test_chat_truncation() {
    let result = chat(json!({"id": "1", "nickname": "VeryLongNickname", "text": "a".repeat(500)})).unwrap();
    assert_eq!(result.nickname, "VeryLongNick");
    assert_eq!(result.text.chars().count(), 220);

    let limits = ChatConfig {
        max_message_length: 50,
        max_nickname_length: 8,
        ..ChatConfig::default()
    };
    let custom = normalize_chat_payload(
        &json!({"id": "1", "nickname": "VeryLongNickname", "text": "a".repeat(100)}),
        &limits,
        NOW,
    )
    .unwrap();
    assert_eq!(custom.text.len(), 50);
    assert_eq!(custom.nickname, "VeryLong");
}

#[test]
fn test_chat_truncation_counts_characters() {
    let result = chat(json!({"id": "1", "nickname": "한글닉네임입니다아주길어요", "text": "ok"})).unwrap();
    assert_eq!(result.nickname.chars().count(), 12);
}

#[test]
fn test_chat_created_at_defaults_to_now() {
    let missing = chat(json!({"id": "1", "nickname": "A", "text": "B"})).unwrap();
    assert_eq!(missing.created_at, NOW);

    let garbage = chat(json!({"id": "1", "nickname": "A", "text": "B", "createdAt": "soon"})).unwrap();
    assert_eq!(garbage.created_at, NOW);

    let numeric_string =
        chat(json!({"id": "1", "nickname": "A", "text": "B", "createdAt": "1700000000000"})).unwrap();
    assert_eq!(numeric_string.created_at, 1_700_000_000_000);
}

#[test]
fn test_chat_scalar_coercion() {
    let result = chat(json!({"id": 42, "nickname": "A", "text": true})).unwrap();
    assert_eq!(result.id, "42");
    assert_eq!(result.text, "true");
    assert_eq!(result.client_id, None);

    // Falsy and structured values do not count as text
    assert_eq!(
        chat(json!({"id": 0, "nickname": "A", "text": "B"})),
        Err(ValidationError::MissingId)
    );
    assert_eq!(
        chat(json!({"id": "1", "nickname": {"n": "A"}, "text": "B"})),
        Err(ValidationError::MissingNickname)
    );
}

#[test]
fn test_valid_move_payload() {
    let result = mv(json!({
        "clientId": "c-1",
        "x": 100,
        "y": 200,
        "dir": "left",
        "updatedAt": 1700000000000i64
    }))
    .unwrap();

    assert_eq!(
        result,
        MoveCommand {
            client_id: "c-1".to_string(),
            x: 100.0,
            y: 200.0,
            dir: "left".to_string(),
            updated_at: 1_700_000_000_000,
        }
    );
}

#[test]
fn test_move_payload_not_object_fails() {
    assert_eq!(mv(json!(null)), Err(ValidationError::PayloadNotObject));
    assert_eq!(mv(json!(42)), Err(ValidationError::PayloadNotObject));
}

#[test]
fn test_move_missing_client_id_fails() {
    assert_eq!(mv(json!({"x": 1, "y": 2})), Err(ValidationError::MissingClientId));
    assert_eq!(
        mv(json!({"clientId": "   ", "x": 1, "y": 2})),
        Err(ValidationError::MissingClientId)
    );
}

#[test]
fn test_move_invalid_coordinates_fail() {
    assert_eq!(
        mv(json!({"clientId": "c", "x": "abc", "y": 2})),
        Err(ValidationError::InvalidCoordinate("x"))
    );
    assert_eq!(
        mv(json!({"clientId": "c", "x": 1, "y": null})),
        Err(ValidationError::InvalidCoordinate("y"))
    );
    assert_eq!(
        mv(json!({"clientId": "c", "x": 1})),
        Err(ValidationError::InvalidCoordinate("y"))
    );
    assert_eq!(
        mv(json!({"clientId": "c", "x": "inf", "y": 2})),
        Err(ValidationError::InvalidCoordinate("x"))
    );
}

#[test]
fn test_move_defaults_and_coercion() {
    let result = mv(json!({"clientId": "c", "x": "50", "y": "100"})).unwrap();
    assert_eq!(result.client_id, "c");
    assert_eq!(result.x, 50.0);
    assert_eq!(result.y, 100.0);
    assert_eq!(result.dir, "down");
    assert_eq!(result.updated_at, NOW);

    let fractional = mv(json!({"clientId": "c", "x": " 12.5 ", "y": -3})).unwrap();
    assert_eq!(fractional.x, 12.5);
    assert_eq!(fractional.y, -3.0);
}

#[test]
fn test_validation_error_display() {
    assert_eq!(ValidationError::MissingId.to_string(), "id is required");
    assert_eq!(
        ValidationError::InvalidCoordinate("x").to_string(),
        "x must be a finite number"
    );
}
