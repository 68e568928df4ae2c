use bytes::BytesMut;
use mcp_relay::bridge::codec::{Frame, McpCodec};
use mcp_relay::dispatch::Dispatcher;
use mcp_relay::protocol::negotiation::ServerInfo;
use mcp_relay::protocol::{JsonRpcRequest, RequestId};
use mcp_relay::tools::builtin_registry;
use proptest::prelude::*;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::runtime::Runtime;
use tokio_util::codec::Decoder;

fn dispatcher() -> Dispatcher {
    Dispatcher::new(
        Arc::new(builtin_registry().unwrap()),
        ServerInfo::new("Property Server", "1.0.0"),
    )
}

fn request_id() -> impl Strategy<Value = RequestId> {
    prop_oneof![
        any::<i64>().prop_map(RequestId::from),
        any::<u64>().prop_map(|n| RequestId::Number(n.into())),
        (-1.0e12f64..1.0e12).prop_filter_map("finite", |f| {
            serde_json::Number::from_f64(f).map(RequestId::Number)
        }),
        "[a-zA-Z0-9-]{1,16}".prop_map(RequestId::String),
    ]
}

proptest! {
    #[test]
    fn test_unknown_methods_echo_id(
        id in request_id(),
        method in "[a-z]{1,8}/[a-z]{1,8}"
    ) {
        prop_assume!(method != "tools/list" && method != "tools/call");
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            let req = JsonRpcRequest::new(Some(id.clone()), method.clone(), None);
            let resp = dispatcher().dispatch(req).await.unwrap().unwrap();

            assert_eq!(resp.id, Some(id));
            let err = resp.error().unwrap();
            assert_eq!(err.code, -32601);
            assert_eq!(err.message, format!("Method '{}' not found", method));
        });
    }

    #[test]
    fn test_decoded_ids_are_echoed_verbatim(
        id in prop_oneof![
            any::<u64>().prop_map(Value::from),
            any::<i64>().prop_map(Value::from),
            (-1.0e9f64..1.0e9).prop_map(Value::from),
        ]
    ) {
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            let raw = json!({"jsonrpc": "2.0", "id": id.clone(), "method": "nope/x"});
            let req: JsonRpcRequest = serde_json::from_value(raw).unwrap();
            let resp = dispatcher().dispatch(req).await.unwrap().unwrap();

            assert_eq!(resp.error().unwrap().code, -32601);
            assert_eq!(serde_json::to_value(&resp).unwrap()["id"], id);
        });
    }

    #[test]
    fn test_initialize_never_fails(
        id in request_id(),
        version in "\\PC{0,20}"
    ) {
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            let params = json!({"protocolVersion": version, "clientInfo": {"name": "prop"}});
            let req = JsonRpcRequest::new(Some(id), "initialize", Some(params));
            let resp = dispatcher().dispatch(req).await.unwrap().unwrap();

            let result = resp.result().unwrap();
            assert_eq!(result["protocolVersion"], "2024-11-05");
            assert_eq!(result["serverInfo"]["name"], "Property Server");
        });
    }

    #[test]
    fn test_add_numbers_matches_integer_sum(
        a in -1_000_000i64..1_000_000,
        b in -1_000_000i64..1_000_000
    ) {
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            let params = json!({"name": "add_numbers", "arguments": {"a": a, "b": b}});
            let req = JsonRpcRequest::new(Some(RequestId::from(1)), "tools/call", Some(params));
            let resp = dispatcher().dispatch(req).await.unwrap().unwrap();

            let text = resp.result().unwrap()["content"][0]["text"].as_str().unwrap().to_string();
            assert_eq!(text, (a + b).to_string());
        });
    }

    #[test]
    fn test_codec_never_panics_on_garbage(data in proptest::collection::vec(any::<u8>(), 0..512)) {
        let mut codec = McpCodec::new();
        let mut buf = BytesMut::from(&data[..]);
        // Every call must either consume input or stop
        for _ in 0..data.len() + 1 {
            match codec.decode(&mut buf) {
                Ok(Some(_)) => continue,
                Ok(None) | Err(_) => break,
            }
        }
    }

    #[test]
    fn test_codec_newline_frames_keep_order(ids in proptest::collection::vec(0i64..10_000, 1..20)) {
        let mut codec = McpCodec::new();
        let mut buf = BytesMut::new();
        for id in &ids {
            buf.extend_from_slice(json!({"jsonrpc": "2.0", "id": id, "method": "ping"}).to_string().as_bytes());
            buf.extend_from_slice(b"\n");
        }

        let mut decoded = Vec::new();
        while let Some(frame) = codec.decode(&mut buf).unwrap() {
            match frame {
                Frame::Message(_, value) => decoded.push(value["id"].as_i64().unwrap()),
                Frame::Malformed(_, detail) => panic!("unexpected malformed frame: {}", detail),
            }
        }
        prop_assert_eq!(decoded, ids);
    }
}

#[tokio::test]
async fn test_list_is_stable_across_calls() {
    let d = dispatcher();
    let first = d.list_tools();
    for _ in 0..5 {
        assert_eq!(d.list_tools(), first);
    }
}
