//! Contract Tracker - binary entry point
//! Delegates to the library for all app logic.

#[tokio::main]
async fn main() {
    if let Err(e) = contract_tracker::run().await {
        eprintln!("contract-tracker: {}", e);
        std::process::exit(1);
    }
}
