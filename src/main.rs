//! Support Mesh binary entry point.

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    support_mesh::cli::run().await
}
