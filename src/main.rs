#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = pdp_lms::run().await {
        eprintln!("pdp-lms fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
