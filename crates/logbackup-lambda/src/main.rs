// AWS Lambda binary entry point
//
// Build with: cargo lambda build -p logbackup-lambda --release
//
// The lambda_runtime crate drives the tokio runtime, so we use #[tokio::main]

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    logbackup_lambda::run().await
}
