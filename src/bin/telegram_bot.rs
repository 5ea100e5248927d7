#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = pdp_lms::run_telegram_bot().await {
        eprintln!("pdp-lms-telegram-bot fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
