use std::process::ExitCode;

// the router and startup live in the library crate so integration tests can drive them
use ecommerce_catalog::start_server;

#[tokio::main]
async fn main() -> ExitCode
 {
    match start_server().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("catalog server failed: {e}");
            ExitCode::FAILURE
        }
    }
}
