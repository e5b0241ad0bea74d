#[tokio::main]
async fn main() -> anyhow::Result<()> {
    avm_loader::cli::run_cli().await
}
