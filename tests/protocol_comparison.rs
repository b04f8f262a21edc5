//! Confirms the step-program client and the suspension-style client are
//! byte-for-byte identical on the wire and produce identical decoded
//! results, since both are built from the same `wire::frame`/`wire::decode`
//! functions.

mod common;

use common::{spawn_scripted_server, Exchange};
use tyrant_client::client::TyrantClient;
use tyrant_client::suspension::SuspensionClient;

fn get_script() -> (Vec<u8>, Vec<u8>) {
    let request = vec![0xC8, 0x30, 0x00, 0x00, 0x00, 0x03, b'k', b'e', b'y'];
    let response = vec![0x00, 0x00, 0x00, 0x00, 0x05, b'v', b'a', b'l', b'u', b'e'];
    (request, response)
}

#[tokio::test]
async fn get_produces_identical_bytes_and_value_on_both_clients() {
    let (request, response) = get_script();

    let (step_addr, mut step_recorded) =
        spawn_scripted_server(vec![Exchange::new(request.len(), response.clone())]).await;
    let (susp_addr, mut susp_recorded) =
        spawn_scripted_server(vec![Exchange::new(request.len(), response.clone())]).await;

    let step_client = TyrantClient::connect(step_addr).await.unwrap();
    let step_value = step_client.get("key").await.unwrap();

    let susp_client = SuspensionClient::connect(susp_addr).await.unwrap();
    let susp_value = susp_client.get("key").await.unwrap();

    let step_bytes = step_recorded.recv().await.unwrap();
    let susp_bytes = susp_recorded.recv().await.unwrap();

    assert_eq!(step_bytes, request);
    assert_eq!(susp_bytes, request);
    assert_eq!(step_bytes, susp_bytes);
    assert_eq!(step_value, susp_value);
}

#[tokio::test]
async fn put_produces_identical_bytes_on_both_clients() {
    let request = vec![
        0xC8, 0x10, 0x00, 0x00, 0x00, 0x03, 0x00, 0x00, 0x00, 0x05, b'k', b'e', b'y', b'v', b'a',
        b'l', b'u', b'e',
    ];

    let (step_addr, mut step_recorded) =
        spawn_scripted_server(vec![Exchange::new(request.len(), [0x00])]).await;
    let (susp_addr, mut susp_recorded) =
        spawn_scripted_server(vec![Exchange::new(request.len(), [0x00])]).await;

    let step_client = TyrantClient::connect(step_addr).await.unwrap();
    step_client.put("key", "value").await.unwrap();

    let susp_client = SuspensionClient::connect(susp_addr).await.unwrap();
    susp_client.put("key", "value").await.unwrap();

    assert_eq!(step_recorded.recv().await.unwrap(), request);
    assert_eq!(susp_recorded.recv().await.unwrap(), request);
}
