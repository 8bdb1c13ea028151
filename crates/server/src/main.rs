#[tokio::main]
async fn main() -> anyhow::Result<()> {
    chirpy_server::run().await
}
