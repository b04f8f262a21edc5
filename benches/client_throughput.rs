use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::runtime::Runtime;
use tyrant_client::client::TyrantClient;

const GET_REQUEST_LEN: usize = 2 + 4 + b"bench_key".len();
const GET_RESPONSE: &[u8] = &[0x00, 0x00, 0x00, 0x00, 0x05, b'v', b'a', b'l', b'u', b'e'];

/// Bind a loopback server that replies to every well-formed `get` request
/// with the same canned value, indefinitely, for as long as the benchmark
/// keeps the connection open.
async fn spawn_echo_server() -> std::net::SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut buf = vec![0u8; GET_REQUEST_LEN];
        loop {
            if stream.read_exact(&mut buf).await.is_err() {
                return;
            }
            if stream.write_all(GET_RESPONSE).await.is_err() {
                return;
            }
        }
    });
    addr
}

fn setup_client(rt: &Runtime) -> TyrantClient {
    rt.block_on(async {
        let addr = spawn_echo_server().await;
        TyrantClient::connect(addr).await.unwrap()
    })
}

fn benchmark_single_get(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let client = setup_client(&rt);

    c.bench_function("client_single_get", |b| {
        b.to_async(&rt)
            .iter(|| async { client.get("bench_key").await.unwrap() });
    });
}

fn benchmark_pipelined_gets(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let client = setup_client(&rt);

    let mut group = c.benchmark_group("client_pipelined_get");
    for depth in [1, 5, 10, 20].iter() {
        group.throughput(Throughput::Elements(*depth as u64));
        group.bench_with_input(format!("depth_{depth}"), depth, |b, &depth| {
            b.to_async(&rt).iter(|| async {
                let mut handles = Vec::with_capacity(depth);
                for _ in 0..depth {
                    let client = client.clone();
                    handles.push(tokio::spawn(async move { client.get("bench_key").await }));
                }
                for handle in handles {
                    handle.await.unwrap().unwrap();
                }
            });
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_single_get, benchmark_pipelined_gets);
criterion_main!(benches);
