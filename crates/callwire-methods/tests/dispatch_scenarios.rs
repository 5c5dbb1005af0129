//! End-to-end dispatch scenarios: the full demo registry driven through the
//! JSON-RPC dispatcher, exercising the wire-level contract.

use callwire_json_rpc::{DispatchOutput, Dispatcher};
use serde_json::{Value, json};

fn dispatcher() -> Dispatcher {
    Dispatcher::new(callwire_methods::registry())
}

async fn dispatch(d: &Dispatcher, body: &str) -> Value {
    match d.dispatch_text(body).await {
        DispatchOutput::Single(message) => serde_json::to_value(&message).unwrap(),
        DispatchOutput::Batch(messages) => serde_json::to_value(&messages).unwrap(),
        DispatchOutput::Empty => panic!("expected a response body"),
    }
}

#[tokio::test]
async fn ping_round_trip() {
    let d = dispatcher();
    let response = dispatch(&d, r#"{"jsonrpc":"2.0","method":"ping","id":1}"#).await;

    assert_eq!(response["jsonrpc"], "2.0");
    assert_eq!(response["id"], json!(1));
    assert_eq!(response["result"]["message"], "pong");
    assert!(response["result"]["timestamp"].is_string());
}

#[tokio::test]
async fn add_with_named_params() {
    let d = dispatcher();
    let response = dispatch(
        &d,
        r#"{"jsonrpc":"2.0","method":"add","params":{"a":10,"b":5},"id":2}"#,
    )
    .await;

    assert_eq!(response["id"], json!(2));
    assert_eq!(response["result"]["operation"], "addition");
    assert_eq!(response["result"]["operands"], json!([10, 5]));
    assert_eq!(response["result"]["result"], json!(15));
}

#[tokio::test]
async fn wrong_version_yields_invalid_request() {
    let d = dispatcher();
    let response = dispatch(&d, r#"{"jsonrpc":"1.0","method":"ping","id":3}"#).await;

    assert_eq!(response["error"]["code"], json!(-32600));
    assert_eq!(response["id"], json!(3));
}

#[tokio::test]
async fn unknown_method_yields_method_not_found() {
    let d = dispatcher();
    let response = dispatch(&d, r#"{"jsonrpc":"2.0","method":"nope","id":4}"#).await;

    assert_eq!(response["error"]["code"], json!(-32601));
    assert_eq!(response["id"], json!(4));
}

#[tokio::test]
async fn batch_drops_notification_keeps_call() {
    let d = dispatcher();
    let response = dispatch(
        &d,
        r#"[{"jsonrpc":"2.0","method":"ping"},
            {"jsonrpc":"2.0","method":"add","params":{"a":1,"b":2},"id":5}]"#,
    )
    .await;

    let entries = response.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["id"], json!(5));
    assert_eq!(entries[0]["result"]["result"], json!(3));
}

#[tokio::test]
async fn divide_by_zero_surfaces_as_error_envelope() {
    let d = dispatcher();
    let response = dispatch(
        &d,
        r#"{"jsonrpc":"2.0","method":"divide","params":{"a":1,"b":0},"id":6}"#,
    )
    .await;

    assert_eq!(response["error"]["code"], json!(-32603));
    assert!(
        response["error"]["message"]
            .as_str()
            .unwrap()
            .contains("Division by zero")
    );
    assert_eq!(response["id"], json!(6));
}

#[tokio::test]
async fn id_types_echo_verbatim() {
    let d = dispatcher();

    let response = dispatch(&d, r#"{"jsonrpc":"2.0","method":"ping","id":"alpha"}"#).await;
    assert_eq!(response["id"], json!("alpha"));

    let response = dispatch(&d, r#"{"jsonrpc":"2.0","method":"ping","id":7}"#).await;
    assert_eq!(response["id"], json!(7));

    let response = dispatch(&d, r#"{"jsonrpc":"2.0","method":"ping","id":null}"#).await;
    assert_eq!(response["id"], Value::Null);
    assert!(response["result"].is_object());
}

#[tokio::test]
async fn notifications_produce_no_body_even_on_failure() {
    let d = dispatcher();

    for body in [
        r#"{"jsonrpc":"2.0","method":"ping"}"#,
        r#"{"jsonrpc":"2.0","method":"divide","params":{"a":1,"b":0}}"#,
        r#"{"jsonrpc":"2.0","method":"get_user_by_id","params":{"user_id":99}}"#,
    ] {
        assert!(d.dispatch_text(body).await.is_empty(), "{body}");
    }
}

#[tokio::test]
async fn user_lifecycle_over_the_wire() {
    let d = dispatcher();

    let created = dispatch(
        &d,
        r#"{"jsonrpc":"2.0","method":"create_user","params":{"name":"Alice","email":"alice@example.com","age":30},"id":1}"#,
    )
    .await;
    assert_eq!(created["result"]["id"], json!(1));
    assert_eq!(created["result"]["age"], json!(30));

    let duplicate = dispatch(
        &d,
        r#"{"jsonrpc":"2.0","method":"create_user","params":{"name":"Clone","email":"alice@example.com"},"id":2}"#,
    )
    .await;
    assert_eq!(duplicate["error"]["code"], json!(-32603));

    let updated = dispatch(
        &d,
        r#"{"jsonrpc":"2.0","method":"update_user","params":{"user_id":1,"age":31},"id":3}"#,
    )
    .await;
    assert_eq!(updated["result"]["age"], json!(31));
    assert_eq!(updated["result"]["name"], "Alice");

    let listed = dispatch(&d, r#"{"jsonrpc":"2.0","method":"list_users","id":4}"#).await;
    assert_eq!(listed["result"].as_array().unwrap().len(), 1);

    let deleted = dispatch(
        &d,
        r#"{"jsonrpc":"2.0","method":"delete_user","params":{"user_id":1},"id":5}"#,
    )
    .await;
    assert_eq!(
        deleted["result"]["message"],
        "User 1 deleted successfully"
    );

    let missing = dispatch(
        &d,
        r#"{"jsonrpc":"2.0","method":"get_user_by_id","params":{"user_id":1},"id":6}"#,
    )
    .await;
    assert_eq!(missing["error"]["code"], json!(-32603));
}

#[tokio::test]
async fn positional_params_match_named_params() {
    let d = dispatcher();

    let positional = dispatch(
        &d,
        r#"{"jsonrpc":"2.0","method":"subtract","params":[42,23],"id":1}"#,
    )
    .await;
    let named = dispatch(
        &d,
        r#"{"jsonrpc":"2.0","method":"subtract","params":{"a":42,"b":23},"id":2}"#,
    )
    .await;

    assert_eq!(positional["result"]["result"], json!(19));
    assert_eq!(
        positional["result"]["result"],
        named["result"]["result"]
    );
}

#[tokio::test]
async fn bad_param_shape_yields_invalid_params() {
    let d = dispatcher();
    let response = dispatch(
        &d,
        r#"{"jsonrpc":"2.0","method":"calculate_tax","params":{"income":"lots"},"id":1}"#,
    )
    .await;

    assert_eq!(response["error"]["code"], json!(-32602));
}

#[tokio::test]
async fn server_info_lists_all_methods() {
    let d = dispatcher();
    let response = dispatch(&d, r#"{"jsonrpc":"2.0","method":"get_server_info","id":1}"#).await;

    let methods = response["result"]["supported_methods"].as_array().unwrap();
    assert_eq!(methods.len(), 15);
    assert!(methods.contains(&json!("calculate_progressive_tax")));
    assert!(methods.contains(&json!("ping")));
}

#[tokio::test]
async fn idempotent_for_pure_methods_modulo_time_fields() {
    let d = dispatcher();
    let body = r#"{"jsonrpc":"2.0","method":"add","params":{"a":2,"b":2},"id":1}"#;

    let mut first = dispatch(&d, body).await;
    let mut second = dispatch(&d, body).await;

    // Strip the time-varying fields before comparing.
    for response in [&mut first, &mut second] {
        let result = response["result"].as_object_mut().unwrap();
        result.remove("calculation_id");
        result.remove("calculated_at");
    }
    assert_eq!(first, second);
}
