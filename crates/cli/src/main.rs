use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    roster_cli::run().await
}
