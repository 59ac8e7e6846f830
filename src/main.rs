#[tokio::main]
async fn main() -> anyhow::Result<()> {
    textguard_lib::run().await
}
