//! Tests for wire encoding and decoding.

use super::*;
use serde_json::json;

fn json_args(value: Value) -> InvokePayload {
    InvokePayload::Json(value)
}

// -- Invoke --

#[test]
fn encode_invoke_matches_wire_format() {
    let wire = encode_invoke(1, "add", &json_args(json!([2, 3]))).unwrap();
    // base64("[2,3]")
    assert_eq!(wire, "ipc;1;add;WzIsM10=");
}

#[test]
fn invoke_round_trips_json_arguments() {
    let cases = [
        json!([2, 3]),
        json!({"path": "/tmp/a b", "flags": [true, null]}),
        json!("plain string; with semicolon"),
        json!([{"nested": {"deep": 1.5}}]),
        json!("snowman \u{2603} and emoji \u{1F600}"),
    ];
    for (i, args) in cases.into_iter().enumerate() {
        let seq = i as Sequence + 1;
        let wire = encode_invoke(seq, "doWork", &json_args(args.clone())).unwrap();
        let invoke = decode_invoke(&wire).unwrap();
        assert_eq!(invoke.sequence, seq);
        assert_eq!(invoke.name, "doWork");
        assert_eq!(invoke.payload, InvokePayload::Json(args));
    }
}

#[test]
fn context_menu_uses_pair_flattening() {
    let pairs = vec![
        ("Copy".to_string(), "Cmd+C".to_string()),
        ("---".to_string(), String::new()),
        ("Paste".to_string(), "Cmd+V".to_string()),
    ];
    let wire = encode_invoke(7, CONTEXT_MENU_BINDING, &InvokePayload::Pairs(pairs.clone())).unwrap();
    assert_eq!(wire, "ipc;7;contextMenu;Copy:Cmd+C_---:_Paste:Cmd+V");

    let invoke = decode_invoke(&wire).unwrap();
    assert_eq!(invoke.sequence, 7);
    assert_eq!(invoke.payload, InvokePayload::Pairs(pairs));
}

#[test]
fn context_menu_pairs_are_order_sensitive() {
    let a = decode_invoke("ipc;1;contextMenu;B:2_A:1").unwrap();
    let b = decode_invoke("ipc;1;contextMenu;A:1_B:2").unwrap();
    assert_ne!(a.payload, b.payload);
    assert_eq!(
        a.payload,
        InvokePayload::Pairs(vec![
            ("B".into(), "2".into()),
            ("A".into(), "1".into())
        ])
    );
}

#[test]
fn context_menu_item_without_colon_has_empty_value() {
    let invoke = decode_invoke("ipc;3;contextMenu;Copy:Cmd+C_---_Paste:Cmd+V").unwrap();
    assert_eq!(
        invoke.payload,
        InvokePayload::Pairs(vec![
            ("Copy".into(), "Cmd+C".into()),
            ("---".into(), String::new()),
            ("Paste".into(), "Cmd+V".into()),
        ])
    );
}

#[test]
fn context_menu_rejects_non_object_json() {
    let err = encode_invoke(1, CONTEXT_MENU_BINDING, &json_args(json!([1, 2]))).unwrap_err();
    assert!(matches!(err, CodecError::Json(_)));
}

#[test]
fn context_menu_json_object_is_flattened() {
    let wire = encode_invoke(
        2,
        CONTEXT_MENU_BINDING,
        &json_args(json!({"Open": "Cmd+O", "count": 3, "none": null})),
    )
    .unwrap();
    let invoke = decode_invoke(&wire).unwrap();
    let pairs = match invoke.payload {
        InvokePayload::Pairs(p) => p,
        other => panic!("expected pairs, got {other:?}"),
    };
    assert_eq!(
        pairs,
        vec![
            ("Open".to_string(), "Cmd+O".to_string()),
            ("count".to_string(), "3".to_string()),
            ("none".to_string(), String::new()),
        ]
    );
}

#[test]
fn context_menu_object_keeps_insertion_order() {
    let wire = encode_invoke(
        1,
        CONTEXT_MENU_BINDING,
        &json_args(json!({"Paste": "Cmd+V", "---": "", "Copy": "Cmd+C"})),
    )
    .unwrap();
    assert_eq!(wire, "ipc;1;contextMenu;Paste:Cmd+V_---:_Copy:Cmd+C");
}

#[test]
fn pairs_keep_order_as_json() {
    let payload = InvokePayload::Pairs(parse_pairs("Zoom:Z_Apply:A"));
    let keys: Vec<String> = payload
        .to_value()
        .as_object()
        .unwrap()
        .keys()
        .cloned()
        .collect();
    assert_eq!(keys, ["Zoom", "Apply"]);
}

#[test]
fn binding_name_with_separator_is_rejected() {
    let err = encode_invoke(1, "a;b", &json_args(json!([1]))).unwrap_err();
    assert_eq!(err, CodecError::InvalidName("a;b".into()));
    assert!(check_binding_name("a;b").is_err());
    assert!(check_binding_name("add").is_ok());
}

#[test]
fn empty_invoke_payload_is_null() {
    let invoke = decode_invoke("ipc;4;ping;").unwrap();
    assert_eq!(invoke.payload, InvokePayload::Json(Value::Null));
}

#[test]
fn malformed_invoke_fails_explicitly() {
    assert_eq!(
        decode_invoke("ipc;1;add").unwrap_err(),
        CodecError::Malformed {
            expected: 4,
            found: 3
        }
    );
    assert_eq!(
        decode_invoke("").unwrap_err(),
        CodecError::Malformed {
            expected: 4,
            found: 1
        }
    );
    assert_eq!(
        decode_invoke("ipc").unwrap_err(),
        CodecError::Malformed {
            expected: 4,
            found: 1
        }
    );
}

#[test]
fn invoke_with_wrong_tag_is_rejected() {
    let err = decode_invoke("rpc;1;add;WzIsM10=").unwrap_err();
    assert_eq!(err, CodecError::UnexpectedTag("rpc".into()));
}

#[test]
fn invoke_with_bad_sequence_is_rejected() {
    let err = decode_invoke("ipc;one;add;WzIsM10=").unwrap_err();
    assert_eq!(err, CodecError::InvalidSequence("one".into()));

    let err = decode_invoke("ipc;-1;add;WzIsM10=").unwrap_err();
    assert!(matches!(err, CodecError::InvalidSequence(_)));
}

#[test]
fn invoke_with_bad_payload_reports_layer() {
    let err = decode_invoke("ipc;1;add;***").unwrap_err();
    assert!(matches!(err, CodecError::Base64(_)));

    // base64("not json")
    let err = decode_invoke("ipc;1;add;bm90IGpzb24=").unwrap_err();
    assert!(matches!(err, CodecError::Json(_)));
}

// -- Resolve --

#[test]
fn encode_external_resolve() {
    let wire = encode_resolve(&Resolve {
        sequence: 1,
        status: 0,
        payload: "5".into(),
        internal: false,
    });
    assert_eq!(wire, "external;0;1;NQ==");
}

#[test]
fn encode_internal_resolve_keeps_raw_payload() {
    let wire = encode_resolve(&Resolve {
        sequence: 9,
        status: 0,
        payload: "2".into(),
        internal: true,
    });
    assert_eq!(wire, "internal;0;9;2");
}

#[test]
fn resolve_round_trips() {
    let cases = [
        Resolve {
            sequence: 12,
            status: 0,
            payload: r#"{"ok":true,"items":[1,2,3]}"#.into(),
            internal: false,
        },
        Resolve {
            sequence: 13,
            status: 1,
            payload: r#"{"error":"boom"}"#.into(),
            internal: false,
        },
        Resolve {
            sequence: 14,
            status: 0,
            payload: "0".into(),
            internal: true,
        },
    ];
    for resolve in cases {
        let decoded = decode_resolve(&encode_resolve(&resolve)).unwrap();
        assert_eq!(decoded, resolve);
    }
}

#[test]
fn split_resolve_keeps_payload_undecoded() {
    let frame = split_resolve("external;1;42;%%%").unwrap();
    assert_eq!(frame.scope, Scope::External);
    assert_eq!(frame.status, 1);
    assert_eq!(frame.sequence, 42);
    assert_eq!(frame.payload, "%%%");
}

#[test]
fn split_resolve_trims_surrounding_whitespace() {
    let frame = split_resolve("  internal;0;3;1\n").unwrap();
    assert_eq!(frame.scope, Scope::Internal);
    assert_eq!(frame.payload, "1");
}

#[test]
fn malformed_resolve_fails_explicitly() {
    assert!(matches!(
        decode_resolve("external;0;1").unwrap_err(),
        CodecError::Malformed { found: 3, .. }
    ));
    assert_eq!(
        decode_resolve("sideways;0;1;NQ==").unwrap_err(),
        CodecError::UnexpectedTag("sideways".into())
    );
    assert_eq!(
        decode_resolve("external;ok;1;NQ==").unwrap_err(),
        CodecError::InvalidStatus("ok".into())
    );
}

#[test]
fn external_resolve_with_invalid_json_fails() {
    // base64("{oops")
    let err = decode_resolve("external;0;1;e29vcHM=").unwrap_err();
    assert!(matches!(err, CodecError::Json(_)));
}

// -- ControlMessage --

#[test]
fn control_message_decode_dispatches_on_tag() {
    let msg = ControlMessage::decode("ipc;1;add;WzIsM10=").unwrap();
    assert!(matches!(msg, ControlMessage::Invoke(ref i) if i.name == "add"));
    assert_eq!(msg.sequence(), Some(1));

    let msg = ControlMessage::decode("external;0;1;NQ==").unwrap();
    assert!(matches!(msg, ControlMessage::Resolve(ref r) if r.payload == "5"));
}

#[test]
fn events_and_menu_selections_have_no_framing() {
    let event = ControlMessage::Event(EventMessage {
        name: "ready".into(),
        detail: None,
    });
    assert_eq!(event.encode().unwrap(), None);
    assert_eq!(event.sequence(), None);

    let menu = ControlMessage::MenuSelection(MenuSelection {
        sequence: Some(0),
        title: "Quit".into(),
        parent: "File".into(),
        state: String::new(),
    });
    assert_eq!(menu.encode().unwrap(), None);
    assert_eq!(menu.sequence(), None);
}

#[test]
fn encode_json_helpers_are_atob_compatible() {
    assert_eq!(encode_json(&json!(5)).unwrap(), "NQ==");
    assert_eq!(decode_json("NQ==").unwrap(), json!(5));
    assert_eq!(decode_text(&encode_text("héllo")).unwrap(), "héllo");
}

#[test]
fn flatten_then_parse_pairs() {
    let pairs = vec![
        ("title".to_string(), "Save As".to_string()),
        ("key".to_string(), "Cmd+Shift+S".to_string()),
    ];
    assert_eq!(flatten_pairs(&pairs), "title:Save As_key:Cmd+Shift+S");
    assert_eq!(parse_pairs(&flatten_pairs(&pairs)), pairs);
    assert!(parse_pairs("").is_empty());
}

#[test]
fn scope_parse_and_display() {
    assert_eq!(Scope::parse("internal").unwrap(), Scope::Internal);
    assert_eq!(Scope::External.as_str(), "external");
    assert!(Scope::parse("INTERNAL").is_err());
}
