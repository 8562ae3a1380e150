#[tokio::main]
async fn main() {
    let code = plugview::app::startup::startup().await;
    std::process::exit(code);
}
