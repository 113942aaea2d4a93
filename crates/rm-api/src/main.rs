#[tokio::main]
async fn main() {
    if let Err(err) = rm_api::run().await {
        tracing::error!(error = %err, "rm-api failed");
        eprintln!("rm-api failed: {err}");
        std::process::exit(1);
    }
}
