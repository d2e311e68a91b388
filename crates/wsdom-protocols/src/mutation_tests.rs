use super::*;
use serde_json::json;

fn all_variants() -> Vec<Mutation> {
    vec![
        Mutation::CreateElement {
            tag_name: "button".to_string(),
            id: 0,
            is: None,
        },
        Mutation::CreateElement {
            tag_name: "ul".to_string(),
            id: 9,
            is: Some("fancy-list".to_string()),
        },
        Mutation::CreateTextNode {
            data: "Test Button".to_string(),
            id: 1,
        },
        Mutation::CreateDocumentFragment { id: 2 },
        Mutation::RemoveElement {
            target: NodeRef::xpath("/html/body/div[1]"),
        },
        Mutation::AppendChild {
            parent: NodeRef::body(),
            child: 0,
        },
        Mutation::RemoveChild {
            parent: NodeRef::body(),
            child: NodeRef::xpath("/html/body/p[2]"),
        },
        Mutation::SetAttribute {
            target: NodeRef::stashed(0),
            name: "class".to_string(),
            value: "primary".to_string(),
        },
        Mutation::SetProperty {
            target: NodeRef::xpath(r#"//*[@id="name"]"#),
            name: "value".to_string(),
            value: "abc".to_string(),
        },
        Mutation::CloneNode {
            target: NodeRef::xpath("/html/body/template[1]"),
            clone_id: 4,
            deep: true,
        },
        Mutation::InsertAdjacentElement {
            target: NodeRef::body(),
            position: InsertPosition::AfterBegin,
            element: 5,
        },
        Mutation::InsertAdjacentHtml {
            target: NodeRef::body(),
            position: InsertPosition::BeforeEnd,
            html: "<b>hi</b>".to_string(),
        },
        Mutation::InsertAdjacentText {
            target: NodeRef::xpath("/html/body/p[1]"),
            position: InsertPosition::BeforeBegin,
            text: "a < b".to_string(),
        },
        Mutation::PrependChild {
            parent: NodeRef::body(),
            child: PrependItem::Stashed(6),
        },
        Mutation::PrependChild {
            parent: NodeRef::body(),
            child: PrependItem::Text("lead".to_string()),
        },
        Mutation::Normalize {
            target: NodeRef::body(),
        },
    ]
}

#[test]
fn test_every_variant_round_trips() {
    for mutation in all_variants() {
        let json = serde_json::to_string(&mutation).unwrap();
        let decoded: Mutation = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, mutation, "round trip of {}", json);
    }
}

#[test]
fn test_every_kind_covered() {
    let kinds: Vec<MutationKind> = all_variants().iter().map(Mutation::kind).collect();
    for kind in MutationKind::ALL {
        assert!(kinds.contains(&kind), "missing {}", kind);
    }
}

#[test]
fn test_positional_layout() {
    let mutation = Mutation::AppendChild {
        parent: NodeRef::stashed(0),
        child: 1,
    };
    assert_eq!(
        serde_json::to_value(&mutation).unwrap(),
        json!(["appendChild", {"type": "stashed-id", "id": 0}, 1])
    );
}

#[test]
fn test_create_element_always_has_four_slots() {
    let mutation = Mutation::CreateElement {
        tag_name: "div".to_string(),
        id: 3,
        is: None,
    };
    assert_eq!(
        serde_json::to_value(&mutation).unwrap(),
        json!(["createElement", "div", 3, null])
    );
}

#[test]
fn test_create_element_without_is_slot() {
    let decoded: Mutation = serde_json::from_value(json!(["createElement", "div", 3])).unwrap();
    assert_eq!(
        decoded,
        Mutation::CreateElement {
            tag_name: "div".to_string(),
            id: 3,
            is: None,
        }
    );
}

#[test]
fn test_insert_adjacent_html_tag_spelling() {
    let mutation = Mutation::InsertAdjacentHtml {
        target: NodeRef::body(),
        position: InsertPosition::AfterEnd,
        html: String::new(),
    };
    let value = serde_json::to_value(&mutation).unwrap();
    assert_eq!(value[0], "insertAdjacentHTML");
    assert_eq!(value[2], "afterend");
}

#[test]
fn test_trailing_fields_ignored() {
    let decoded: Mutation =
        serde_json::from_value(json!(["normalize", {"type": "xpath", "xpath": "/html/body"}, "extra", 1]))
            .unwrap();
    assert_eq!(
        decoded,
        Mutation::Normalize {
            target: NodeRef::body()
        }
    );
}

#[test]
fn test_missing_field_rejected() {
    let result = serde_json::from_value::<Mutation>(json!(["setAttribute", {"type": "stashed-id", "id": 1}, "id"]));
    assert!(result.is_err());
}

#[test]
fn test_unknown_tag_rejected() {
    let result = serde_json::from_value::<Mutation>(json!(["teleport", 1]));
    assert!(result.is_err());

    let err = Mutation::decode(json!(["teleport", 1])).unwrap_err();
    assert!(matches!(err, ProtocolError::UnknownTag { .. }));
}

#[test]
fn test_decode_requires_tag() {
    let err = Mutation::decode(json!({"tag": "normalize"})).unwrap_err();
    assert!(matches!(err, ProtocolError::InvalidMessage(_)));
}

#[test]
fn test_batch_skips_unknown_entries() {
    let raw = json!([
        ["createDocumentFragment", 1],
        ["teleport", 2],
        ["appendChild"],
        ["normalize", {"type": "xpath", "xpath": "/html/body"}]
    ]);
    let batch: MutationBatch = serde_json::from_value(raw).unwrap();
    assert_eq!(batch.len(), 2);
    assert_eq!(batch.0[0], Mutation::CreateDocumentFragment { id: 1 });
    assert_eq!(batch.0[1].kind(), MutationKind::Normalize);
}

#[test]
fn test_batch_preserves_order() {
    let batch = MutationBatch::new(all_variants());
    let json = serde_json::to_string(&batch).unwrap();
    let decoded: MutationBatch = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, batch);
}

#[test]
fn test_created_id() {
    assert_eq!(Mutation::CreateDocumentFragment { id: 4 }.created_id(), Some(4));
    assert_eq!(
        Mutation::Normalize {
            target: NodeRef::body()
        }
        .created_id(),
        None
    );
}

#[test]
fn test_body_snapshot() {
    let mutation = Mutation::body_snapshot("<p>Hi</p>");
    assert_eq!(
        serde_json::to_value(&mutation).unwrap(),
        json!(["setProperty", {"type": "xpath", "xpath": "/html/body"}, "innerHTML", "<p>Hi</p>"])
    );
}

#[test]
fn test_insert_position_parse() {
    assert_eq!(InsertPosition::parse("BeforeEnd"), Some(InsertPosition::BeforeEnd));
    assert_eq!(InsertPosition::parse("middle"), None);
    assert_eq!(InsertPosition::AfterBegin.as_str(), "afterbegin");
}
