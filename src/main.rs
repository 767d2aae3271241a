#[tokio::main]
async fn main() {
    onboarding_backend::run().await;
}
