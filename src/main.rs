//! Registry Purger - main entry point
//!
//! Deletes or archives old tags and dangling manifests of a container registry
//! repository, and restores archived manifests.

use registry_purger::cli::{Args, Runner};
use std::process;

#[tokio::main]
async fn main() {
    let args = Args::parse_args().from_env();

    let runner = match Runner::new(args) {
        Ok(runner) => runner,
        Err(e) => {
            eprintln!("❌ {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = runner.run().await {
        runner.output().error(&e.to_string());
        process::exit(1);
    }
}
