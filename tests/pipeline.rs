use jsonmold::{
    parse, parse_to_any, ArrayRule, Condition, ErrorKind, ObjectRule, Parser, ParserConfig,
    PrimitiveType, PropertyRule, Rule, StageOrder,
};
use serde::Deserialize;
use serde_json::json;

fn video_rule() -> Rule {
    ObjectRule::new()
        .property("videoId", PropertyRule::string().alias("id"))
        .property("title", PropertyRule::string().default_value("untitled"))
        .property(
            "owner",
            ObjectRule::new()
                .property("name", PrimitiveType::String)
                .property("verified", PropertyRule::boolean().required(false)),
        )
        .property(
            "thumbnails",
            ArrayRule::new(
                ObjectRule::new()
                    .strict(false)
                    .property("url", PrimitiveType::String)
                    .property("width", PrimitiveType::Number),
            )
            .limit(2),
        )
        .remap("videoId", "id")
        .flatten(true)
        .into()
}

#[test]
fn test_full_pipeline() {
    let input = json!({
        "id": "abc",
        "owner": {"name": "Alice", "verified": "yes"},
        "thumbnails": [
            {"url": "a.jpg", "width": 120},
            "not an object",
            {"url": "b.jpg", "width": 480},
            {"url": "c.jpg", "width": 960}
        ],
        "unrelated": {"deep": true}
    });

    let output = parse_to_any(&input, &video_rule()).unwrap();
    assert_eq!(
        output,
        json!({
            "id": "abc",
            "title": "untitled",
            "owner-name": "Alice",
            "thumbnails": [{"url": "a.jpg", "width": 120}]
        })
    );
}

#[test]
fn test_inputs_are_not_mutated() {
    let input = json!({"videoId": "x", "owner": {"name": "A"}, "thumbnails": [{"url": "u"}]});
    let rule = video_rule();
    let (input_before, rule_before) = (input.clone(), rule.clone());

    let _ = parse_to_any(&input, &rule);
    let _ = parse_to_any(&json!([]), &rule);

    assert_eq!(input, input_before);
    assert_eq!(rule, rule_before);
}

#[test]
fn test_required_default_policy() {
    let required: Rule = ObjectRule::new()
        .property("n", PropertyRule::number().required(true))
        .into();
    let err = parse_to_any(&json!({}), &required).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Mismatch);

    let optional: Rule = ObjectRule::new()
        .property("n", PropertyRule::number().required(false))
        .into();
    assert_eq!(parse_to_any(&json!({}), &optional).unwrap(), json!({}));

    let defaulted: Rule = ObjectRule::new()
        .property("n", PropertyRule::number().default_value(7))
        .into();
    assert_eq!(parse_to_any(&json!({}), &defaulted).unwrap(), json!({"n": 7}));
}

#[test]
fn test_aliases_are_equally_acceptable() {
    let rule: Rule = ObjectRule::new()
        .property("a", PropertyRule::number().alias("b").alias("c"))
        .into();

    for key in ["a", "b", "c"] {
        let output = parse_to_any(&json!({ key: 1 }), &rule).unwrap();
        assert_eq!(output, json!({ key: 1 }), "source key {key}");
    }

    let colliding: Rule = ObjectRule::new()
        .property("a", PropertyRule::number().alias("existingKey"))
        .property("existingKey", PrimitiveType::Number)
        .into();
    let err = parse_to_any(&json!({"a": 1}), &colliding).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Schema);
    assert!(err.message().contains("alias collision"));
}

#[test]
fn test_array_strictness() {
    let lenient: Rule = ArrayRule::new(PrimitiveType::Number).strict(false).into();
    assert_eq!(parse_to_any(&json!([1, "x", 2]), &lenient).unwrap(), json!([1, 2]));

    let strict: Rule = ArrayRule::new(PrimitiveType::Number).strict(true).into();
    assert!(parse_to_any(&json!([1, "x", 2]), &strict).is_err());
}

#[test]
fn test_flatten_with_and_without_keymap() {
    let plain: Rule = ObjectRule::new()
        .flatten(true)
        .property("test", ObjectRule::new().property("test", PrimitiveType::String))
        .into();
    let value = json!({"test": {"test": "v"}});
    assert_eq!(parse_to_any(&value, &plain).unwrap(), json!({"test-test": "v"}));

    let mapped: Rule = ObjectRule::new()
        .flatten(true)
        .property("test", ObjectRule::new().property("test", PrimitiveType::String))
        .remap("test-test", "t2")
        .into();
    for stage_order in [StageOrder::RemapThenFlatten, StageOrder::FlattenThenRemap] {
        let parser = Parser::new(ParserConfig {
            stage_order,
            ..ParserConfig::default()
        });
        assert_eq!(parser.parse_to_any(&value, &mapped).unwrap(), json!({"t2": "v"}));
    }
}

#[test]
fn test_error_trace_three_levels_deep() {
    let rule: Rule = ObjectRule::new()
        .property(
            "a",
            ObjectRule::new().property(
                "b",
                ObjectRule::new().property("c", ObjectRule::new().property("n", PrimitiveType::Number)),
            ),
        )
        .into();

    let err = parse_to_any(&json!({"a": {"b": {"c": {"n": "seven"}}}}), &rule).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Mismatch);
    assert_eq!(err.message(), "expected number at property \"n\", found string");
    assert_eq!(
        err.locations(),
        &[
            "subrule at property \"c\"",
            "subrule at property \"b\"",
            "subrule at property \"a\"",
        ]
    );
    assert_eq!(
        err.to_string(),
        "expected number at property \"n\", found string\n  at subrule at property \"c\"\n  at subrule at property \"b\"\n  at subrule at property \"a\""
    );
}

#[test]
fn test_conditions_filter_items() {
    let rule: Rule = ArrayRule::new(ObjectRule::new().property("kind", PrimitiveType::String))
        .condition(Condition::try_new(|item| {
            let kind = item
                .get("kind")
                .and_then(|kind| kind.as_str())
                .ok_or_else(|| anyhow::anyhow!("no kind"))?;
            Ok(kind != "ad")
        }))
        .into();

    let input = json!([{"kind": "video"}, {"kind": "ad"}, {"other": 1}, {"kind": "short"}]);
    assert_eq!(
        parse_to_any(&input, &rule).unwrap(),
        json!([{"kind": "video"}, {"kind": "short"}])
    );
}

#[test]
fn test_panicking_condition_drops_item() {
    let rule: Rule = ArrayRule::new(PrimitiveType::Any)
        .condition(Condition::new(|item| item["k"].as_str().unwrap() != "ad"))
        .into();

    let input = json!([{"k": "v"}, {"x": 1}, {"k": "ad"}]);
    assert_eq!(parse_to_any(&input, &rule).unwrap(), json!([{"k": "v"}]));
}

#[test]
fn test_rule_documents() {
    let rule = Rule::from_value(json!({
        "type": "object",
        "flatten": true,
        "keymap": {"stats-views": "views"},
        "properties": {
            "id": {"type": "string", "aliases": ["videoId"]},
            "continuation": "string",
            "stats": {
                "type": "object",
                "required": false,
                "properties": {"views": {"type": "number", "default": 0}}
            }
        }
    }))
    .unwrap();

    let input = json!({"videoId": "v1", "continuation": "tok", "stats": {}});
    assert_eq!(
        parse_to_any(&input, &rule).unwrap(),
        json!({"videoId": "v1", "continuation": "tok", "views": 0})
    );
}

#[derive(Debug, Deserialize, PartialEq)]
struct Channel {
    name: String,
    subscribers: Option<u64>,
}

#[test]
fn test_typed_parse() {
    let rule: Rule = ObjectRule::new()
        .property("name", PrimitiveType::String)
        .property("subscribers", PropertyRule::number().required(false))
        .into();

    let channel: Channel = parse(&json!({"name": "c", "subscribers": 10}), &rule).unwrap();
    assert_eq!(channel, Channel { name: "c".into(), subscribers: Some(10) });

    let lenient: Rule = ObjectRule::new()
        .strict(false)
        .property("name", PrimitiveType::String)
        .into();
    let err = parse::<Channel>(&json!({"subscribers": 10}), &lenient).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);
}
