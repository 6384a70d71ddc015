#[tokio::main]
async fn main() -> anyhow::Result<()> {
    feedback::start_server().await
}
