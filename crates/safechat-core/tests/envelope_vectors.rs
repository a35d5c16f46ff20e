//! Envelope wire vectors.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use safechat_core::message::ChatMessage;
use safechat_core::protocol::{decode, encode, Envelope};

use vector_loader::load;

#[test]
fn envelope_vectors() {
    let files = [
        "join.json",
        "message_with_attachment.json",
        "new_message.json",
        "user_typing.json",
        "unknown_type.json",
        "join_missing_group.json",
        "not_json.json",
    ];

    for f in files {
        let v = load(f);
        let res = decode(&v.frame);

        if let Some(err) = v.expect_error {
            let e = res.expect_err("expected error");
            assert_eq!(e.client_code().as_str(), err.code, "vector={}", v.description);
            continue;
        }

        let env = res.expect("expected ok envelope");
        let ty = v.expect_type.expect("missing expect_type");
        assert_eq!(env.kind().as_str(), ty, "vector={}", v.description);
    }
}

#[test]
fn join_carries_group_id() {
    let env = decode(&load("join.json").frame).unwrap();
    assert_eq!(env, Envelope::join("g1"));
}

#[test]
fn message_maps_wire_names() {
    let env = decode(&load("message_with_attachment.json").frame).unwrap();
    match env {
        Envelope::Message {
            content,
            attachment_url,
        } => {
            assert_eq!(content, "mira esto");
            assert_eq!(attachment_url.as_deref(), Some("/uploads/a.png"));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn new_message_embeds_persisted_message() {
    let env = decode(&load("new_message.json").frame).unwrap();
    let Envelope::NewMessage { message } = env else {
        panic!("expected new_message");
    };
    assert_eq!(message.id, 7);
    assert_eq!(message.group_id, "g1");
    assert_eq!(message.sender_id, "user:a");
    assert_eq!(message.content, "hola");
    assert!(message.attachment_url.is_none());
}

#[test]
fn server_frames_use_wire_field_names() {
    let msg = ChatMessage {
        id: 1,
        group_id: "g1".into(),
        sender_id: "user:a".into(),
        content: "hola".into(),
        attachment_url: None,
        created_at: 5,
    };
    let v: serde_json::Value =
        serde_json::from_str(&encode(&Envelope::NewMessage { message: msg }).unwrap()).unwrap();
    assert_eq!(v["type"], "new_message");
    assert_eq!(v["mensaje"]["content"], "hola");
    assert_eq!(v["mensaje"]["groupId"], "g1");
    assert_eq!(v["mensaje"]["senderId"], "user:a");
    assert!(v["mensaje"].get("attachmentUrl").is_none());

    let v: serde_json::Value = serde_json::from_str(
        &encode(&Envelope::UserLeft {
            user_id: "user:b".into(),
        })
        .unwrap(),
    )
    .unwrap();
    assert_eq!(v, serde_json::json!({"type": "user_left", "usuarioId": "user:b"}));

    assert_eq!(encode(&Envelope::Pong).unwrap(), r#"{"type":"pong"}"#);
    assert_eq!(
        encode(&Envelope::error("nope")).unwrap(),
        r#"{"type":"error","message":"nope"}"#
    );
}
