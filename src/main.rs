#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = examsecure_rust::run().await {
        eprintln!("examsecure-rust fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
