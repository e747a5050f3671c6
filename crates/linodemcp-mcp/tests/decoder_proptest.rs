//! The argument decoder is total: any argument map yields a typed request or
//! exactly one error, and decoding never reaches the upstream.

mod common;

use common::Fixture;
use linodemcp_client::fake::FakeClient;
use linodemcp_mcp::Arguments;
use proptest::prelude::*;
use serde_json::{Map, Value, json};

const FIELDS: &[&str] = &[
    "linode_id",
    "config_id",
    "region",
    "type",
    "label",
    "image",
    "tags",
    "booted",
    "domain",
    "soa_email",
    "rules",
    "inbound",
    "action",
    "protocol",
    "category",
    "images",
    "mine",
    "engine",
    "status",
];

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        any::<f64>().prop_filter("finite", |f| f.is_finite()).prop_map(|f| json!(f)),
        "[a-zA-Z0-9 _./-]{0,12}".prop_map(Value::String),
    ]
}

fn value() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map(prop::sample::select(FIELDS), inner, 0..4).prop_map(
                |entries| {
                    Value::Object(entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
                }
            ),
        ]
    })
}

fn argument_map() -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::btree_map(prop::sample::select(FIELDS), value(), 0..6)
        .prop_map(|entries| entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn decoder_errors_name_a_field(map in argument_map()) {
        let args = Arguments::new(map);
        for field in FIELDS {
            if let Err(err) = args.required_id(field) {
                prop_assert!(err.field.ends_with(field));
            }
            if let Err(err) = args.string_list(field) {
                prop_assert!(err.field.ends_with(field));
            }
            if let Err(err) = args.object_list(field) {
                prop_assert!(!err.field.is_empty());
            }
            let _ = args.optional_bool(field);
            let _ = args.one_of(field, &["ACCEPT", "DROP"]);
        }
    }

    #[test]
    fn invalid_arguments_never_reach_upstream(map in argument_map()) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async {
            let fixture = Fixture::with_account(FakeClient::new()).await;
            let names: Vec<String> = fixture
                .dispatcher
                .registry()
                .names()
                .into_iter()
                .map(str::to_string)
                .collect();
            for name in names {
                let before = fixture.fake.mutations().len();
                let result = fixture.call(&name, Value::Object(map.clone())).await;
                let Some(payload) = result.error else { continue };
                if payload.kind == "invalid_arguments" {
                    prop_assert!(payload.field.is_some());
                    prop_assert!(payload.reason.is_some());
                    prop_assert_eq!(fixture.fake.mutations().len(), before);
                }
            }
            Ok(())
        })?;
    }
}
