#[tokio::main]
async fn main() {
    if let Err(err) = brewguide::cli::run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
