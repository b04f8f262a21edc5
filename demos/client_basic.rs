//! Basic example of using the tyrant-client library against a running
//! Tokyo Tyrant server.

use std::time::Duration;
use tyrant_client::{ClientBuilder, ClientConfigBuilder, TyrantClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("tyrant_client=debug")
        .init();

    println!("Connecting to tyrant server...");
    let client = TyrantClient::connect("127.0.0.1:1978").await?;
    println!("Connected!");

    println!("\n=== Basic put/get ===");
    client.put("user:123", "alice").await?;
    let value = client.get("user:123").await?;
    println!("user:123 = {}", String::from_utf8_lossy(&value));

    println!("\n=== Record count and stats ===");
    println!("rnum = {}", client.rnum().await?);
    println!("size = {} bytes", client.size().await?);
    println!("stat = {}", String::from_utf8_lossy(&client.stat().await?));

    println!("\n=== Multi-get ===");
    client.put("a", "1").await?;
    client.put("b", "2").await?;
    let pairs = client.mget(["a", "b", "missing"]).await?;
    for (k, v) in &pairs {
        println!("{} = {}", String::from_utf8_lossy(k), String::from_utf8_lossy(v));
    }

    println!("\n=== Custom client configuration ===");
    let config = ClientConfigBuilder::new()
        .connect_timeout(Duration::from_secs(10))
        .request_timeout(Duration::from_secs(2))
        .tcp_nodelay(true)
        .build();
    let custom_client = ClientBuilder::new().config(config).connect("127.0.0.1:1978").await?;
    println!("max_frame_len = {}", custom_client.max_frame_len());

    println!("\n=== Pipelined concurrent requests ===");
    let mut handles = vec![];
    for i in 0..5 {
        let client = client.clone();
        handles.push(tokio::spawn(async move {
            let key = format!("concurrent:test:{i}");
            client.put(&key, "v").await?;
            let value = client.get(&key).await?;
            println!("{key} = {}", String::from_utf8_lossy(&value));
            Ok::<_, anyhow::Error>(())
        }));
    }
    for handle in handles {
        handle.await??;
    }

    println!("\nFinal rnum = {}", client.rnum().await?);
    Ok(())
}
