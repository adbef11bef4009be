//! JSON codecs for request and response bodies.
//!
//! The HTTP transport carries one JSON document per body. The socket
//! transport carries one JSON document per line, so the line encoders
//! emit a single trailing `\n` and no embedded newlines.

use crate::error::{ProtocolError, ProtocolResult};
use crate::messages::{SyncRequest, SyncResponse};

/// Decodes a request body.
pub fn decode_request(bytes: &[u8]) -> ProtocolResult<SyncRequest> {
    serde_json::from_slice(bytes).map_err(ProtocolError::Malformed)
}

/// Encodes a request body.
pub fn encode_request(request: &SyncRequest) -> ProtocolResult<Vec<u8>> {
    serde_json::to_vec(request).map_err(ProtocolError::Encode)
}

/// Decodes a response body.
pub fn decode_response(bytes: &[u8]) -> ProtocolResult<SyncResponse> {
    serde_json::from_slice(bytes).map_err(ProtocolError::Malformed)
}

/// Encodes a response body.
pub fn encode_response(response: &SyncResponse) -> ProtocolResult<Vec<u8>> {
    serde_json::to_vec(response).map_err(ProtocolError::Encode)
}

/// Decodes one line of the socket form. A trailing `\r` is tolerated.
pub fn decode_request_line(line: &str) -> ProtocolResult<SyncRequest> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    decode_request(line.as_bytes())
}

/// Encodes a response as exactly one newline-terminated line.
pub fn encode_response_line(response: &SyncResponse) -> ProtocolResult<Vec<u8>> {
    // Compact serde_json output never contains a raw newline.
    let mut bytes = encode_response(response)?;
    bytes.push(b'\n');
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionToSync;
    use crate::messages::TodoView;

    #[test]
    fn decode_full_request() {
        let body = br#"{
            "resetModel": true,
            "deviceUid": "A",
            "actionsToSync": [
                {"id": 1, "type": "TODOS/ADD_TODO", "todoIdMaybeTemp": -1, "title": "title", "completed": true},
                {"id": 2, "type": "TODO/UPDATE_TODO", "todoIdMaybeTemp": -1, "completed": false}
            ]
        }"#;

        let request = decode_request(body).unwrap();
        assert!(request.reset_model);
        assert_eq!(request.device_uid, "A");
        assert_eq!(request.actions_to_sync.len(), 2);
        assert_eq!(request.actions_to_sync[0], ActionToSync {
            id: 1,
            kind: "TODOS/ADD_TODO".into(),
            todo_id_maybe_temp: -1,
            title: Some("title".into()),
            completed: Some(true),
        });
        assert_eq!(request.actions_to_sync[1].title, None);
    }

    #[test]
    fn decode_rejects_malformed_json() {
        let result = decode_request(b"{\"deviceUid\": ");
        assert!(matches!(result, Err(ProtocolError::Malformed(_))));

        let result = decode_request(br#"{"deviceUid": 42}"#);
        assert!(matches!(result, Err(ProtocolError::Malformed(_))));
    }

    #[test]
    fn request_line_tolerates_carriage_return() {
        let request = decode_request_line("{\"deviceUid\":\"B\"}\r").unwrap();
        assert_eq!(request.device_uid, "B");
    }

    #[test]
    fn response_line_is_single_line() {
        let response = SyncResponse {
            device_id: 3,
            action_to_sync_id_to_output: Default::default(),
            todos: vec![TodoView {
                id: 9,
                title: "line\nbreak".into(),
                completed: false,
            }],
        };

        let line = encode_response_line(&response).unwrap();
        assert_eq!(line.last(), Some(&b'\n'));
        assert_eq!(line.iter().filter(|b| **b == b'\n').count(), 1);

        let decoded = decode_response(&line).unwrap();
        assert_eq!(decoded, response);
    }
}
