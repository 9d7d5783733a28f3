use jbl4305p::{
    client::{Client, DeviceApi},
    config::Config,
    nsdk::Scalar,
};
use mockito::{Matcher, Mock, Server, ServerGuard};
use rstest::rstest;
use serde_json::{json, Value};

const BT_PATH: &str = "/org/bluez/hci0/dev_64_E7_D8_6D_AD_C3";

fn client(server: &ServerGuard) -> Client {
    let config = Config::with_host(&server.host_with_port()).unwrap();
    Client::new(&config).unwrap()
}

async fn get_data(server: &mut ServerGuard, path: &str, body: Value) -> Mock {
    server
        .mock("GET", "/api/getData")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("path".into(), path.into()),
            Matcher::UrlEncoded("roles".into(), "value".into()),
        ]))
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create_async()
        .await
}

/// Answers every other read the way the speaker answers unknown paths.
async fn unsupported_paths(server: &mut ServerGuard) -> Mock {
    server
        .mock("GET", "/api/getData")
        .match_query(Matcher::Any)
        .with_body(json!({"error": {"message": "path not found"}}).to_string())
        .create_async()
        .await
}

fn bluetooth_playing() -> Value {
    json!([{
        "state": "playing",
        "mediaRoles": {
            "title": "Phone",
            "value": {"string_": BT_PATH},
            "mediaData": {"metaData": {"serviceID": "bluetooth"}}
        }
    }])
}

#[rstest]
#[case::typed(json!([{"type": "string_", "string_": "Lounge"}]), Some("Lounge"))]
#[case::bare(json!(["Lounge"]), Some("Lounge"))]
#[case::untyped_object(json!([{"string_": "Lounge"}]), None)]
#[case::empty(json!([]), None)]
#[case::error_object(json!({"error": {"message": "nope"}}), None)]
#[case::not_a_list(json!({"name": "Lounge"}), None)]
#[case::unknown_shape(json!([{"value": 42}]), None)]
#[tokio::test]
async fn device_name(#[case] body: Value, #[case] expected: Option<&str>) {
    let mut server = Server::new_async().await;
    let mock = get_data(&mut server, "settings:/deviceName", body).await;

    let name = client(&server).get_device_name().await.unwrap();
    assert_eq!(name.as_deref(), expected);
    mock.assert_async().await;
}

#[tokio::test]
async fn http_error_is_connectivity_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/getData")
        .match_query(Matcher::Any)
        .with_status(500)
        .create_async()
        .await;

    let err = client(&server).get_player_state().await.unwrap_err();
    assert!(err.is_connectivity(), "{err}");
}

#[tokio::test]
async fn non_json_body_is_absent() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/getData")
        .match_query(Matcher::Any)
        .with_body("<html>busy</html>")
        .create_async()
        .await;

    assert_eq!(client(&server).get_player_state().await.unwrap(), None);
}

#[rstest]
#[case::googlecast(
    json!([{"state": "playing", "mediaRoles": {"mediaData": {"metaData": {"serviceID": "googlecast"}}}}]),
    Some("googlecast")
)]
#[case::bluetooth(bluetooth_playing(), Some("bluetooth_64_e7_d8_6d_ad_c3"))]
#[case::bluetooth_without_path(
    json!([{"state": "paused", "mediaRoles": {"mediaData": {"metaData": {"serviceID": "bluetooth"}}}}]),
    Some("bluetooth")
)]
#[case::stopped(
    json!([{"state": "stopped", "mediaRoles": {"mediaData": {"metaData": {"serviceID": "airplay"}}}}]),
    None
)]
#[case::no_state(json!([]), None)]
#[tokio::test]
async fn current_input(#[case] body: Value, #[case] expected: Option<&str>) {
    let mut server = Server::new_async().await;
    let _player = get_data(&mut server, "player:player/data", body).await;

    let input = client(&server).get_current_input().await.unwrap();
    assert_eq!(input.as_deref(), expected);
}

#[tokio::test]
async fn discovers_playing_bluetooth_device() {
    let mut server = Server::new_async().await;
    let _player = get_data(&mut server, "player:player/data", bluetooth_playing()).await;

    let devices = client(&server).discover_bluetooth_devices().await.unwrap();
    assert_eq!(devices.len(), 1);

    let device = &devices[BT_PATH];
    assert_eq!(device.name, "Phone");
    assert_eq!(device.mac.as_str(), "64:e7:d8:6d:ad:c3");
    assert_eq!(device.path, BT_PATH);
}

#[tokio::test]
async fn discovers_available_inputs() {
    let mut server = Server::new_async().await;
    let _player = get_data(&mut server, "player:player/data", bluetooth_playing()).await;
    let _airplay = get_data(
        &mut server,
        "settings:/airplay",
        json!([{"type": "bool_", "bool_": true}]),
    )
    .await;
    let _roon = get_data(&mut server, "settings:/roon", json!([])).await;
    let _other = unsupported_paths(&mut server).await;

    let inputs = client(&server).discover_available_inputs().await.unwrap();
    let ids: Vec<_> = inputs.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, ["airplay", "bluetooth_64_e7_d8_6d_ad_c3", "googlecast"]);

    let bluetooth = inputs.get("bluetooth_64_e7_d8_6d_ad_c3").unwrap();
    assert_eq!(bluetooth.name, "Bluetooth - Phone");
    assert_eq!(bluetooth.device_path.as_deref(), Some(BT_PATH));
    assert_eq!(inputs.get("airplay").unwrap().name, "AirPlay");
}

#[tokio::test]
async fn offers_generic_bluetooth_without_active_peer() {
    let mut server = Server::new_async().await;
    let _player = get_data(&mut server, "player:player/data", json!([{"state": "stopped"}])).await;
    let _other = unsupported_paths(&mut server).await;

    let inputs = client(&server).discover_available_inputs().await.unwrap();
    assert_eq!(inputs.options(), ["Bluetooth", "Google Cast"]);
}

async fn set_data(server: &mut ServerGuard, path: &str, role: &str, value: &str) -> Mock {
    server
        .mock("GET", "/api/setData")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("path".into(), path.into()),
            Matcher::UrlEncoded("role".into(), role.into()),
            Matcher::UrlEncoded("value".into(), value.into()),
            Matcher::Regex("_nocache=[0-9]+".into()),
        ]))
        .create_async()
        .await
}

#[rstest]
#[case::spotify(
    "spotify",
    None,
    r#"{"control":"play","mediaRoles":{"type":"audio","audioType":"audioBroadcast","mediaData":{"metaData":{"serviceID":"spotify"}}}}"#
)]
#[case::bluetooth_peer(
    "bluetooth",
    Some(BT_PATH),
    r#"{"control":"play","mediaRoles":{"type":"audio","audioType":"audioBroadcast","mediaData":{"metaData":{"serviceID":"bluetooth","playLogicPath":"bluetooth:playlogic"}},"doNotTrack":true,"value":{"string_":"/org/bluez/hci0/dev_64_E7_D8_6D_AD_C3","type":"string_"}}}"#
)]
#[tokio::test]
async fn switch_input_sends_control(
    #[case] service_id: &str,
    #[case] device_path: Option<&str>,
    #[case] payload: &str,
) {
    let mut server = Server::new_async().await;
    let mock = set_data(&mut server, "player:player/control", "activate", payload).await;

    assert!(client(&server).switch_input(service_id, device_path).await);
    mock.assert_async().await;
}

#[tokio::test]
async fn set_device_name_writes_typed_string() {
    let mut server = Server::new_async().await;
    let mock = set_data(
        &mut server,
        "settings:/deviceName",
        "value",
        r#"{"string_":"Kitchen","type":"string_"}"#,
    )
    .await;

    assert!(client(&server).set_device_name("Kitchen").await);
    mock.assert_async().await;
}

#[tokio::test]
async fn rejected_write_returns_false() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/setData")
        .match_query(Matcher::Any)
        .with_status(500)
        .create_async()
        .await;

    let client = client(&server);
    assert!(!client.switch_input("bluetooth", Some(BT_PATH)).await);
    assert!(!client.set_device_name("Lounge").await);
}

#[tokio::test]
async fn system_info_is_best_effort() {
    let mut server = Server::new_async().await;
    let _mac = get_data(
        &mut server,
        "settings:/system/primaryMacAddress",
        json!([{"type": "string_", "string_": "00:11:22:33:44:55"}]),
    )
    .await;
    let _uptime = get_data(
        &mut server,
        "settings:/system/deviceUptime",
        json!([{"type": "i64_", "i64_": 86400}]),
    )
    .await;
    let _serial = server
        .mock("GET", "/api/getData")
        .match_query(Matcher::UrlEncoded(
            "path".into(),
            "settings:/system/serialNumber".into(),
        ))
        .with_status(503)
        .create_async()
        .await;
    let _other = unsupported_paths(&mut server).await;

    let info = client(&server).get_system_info().await;
    assert_eq!(info.len(), 2);
    assert_eq!(info.get("mac"), Some(&Scalar::from("00:11:22:33:44:55")));
    assert_eq!(info.get("uptime"), Some(&Scalar::Integer(86400)));
    assert_eq!(info.get("serial"), None);
}

#[tokio::test]
async fn versions_and_network_from_status_page() {
    let mut server = Server::new_async().await;
    let _page = server
        .mock("GET", "/index.fcgi")
        .with_body(
            "<html>Device version: 1.4.2.3851<br>AirPlay version: 377.40.00<br>\
             IP: 192.168.1.75/24<br>Gateway: 192.168.1.1<br>DNS: 192.168.1.1,8.8.8.8<br></html>",
        )
        .create_async()
        .await;

    let versions = client(&server).get_versions_and_network().await;
    assert_eq!(versions.device_version.as_deref(), Some("1.4.2.3851"));
    assert_eq!(versions.ip_cidr.as_deref(), Some("192.168.1.75/24"));
    assert_eq!(versions.dns.as_deref(), Some("192.168.1.1, 8.8.8.8"));
}

#[tokio::test]
async fn unreachable_status_page_is_empty() {
    let config = Config::with_host("127.0.0.1:1").unwrap();
    let versions = Client::new(&config)
        .unwrap()
        .get_versions_and_network()
        .await;
    assert!(versions.is_empty());
}
