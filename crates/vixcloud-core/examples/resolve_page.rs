//! Resolves a catalog page and prints the playable links
//!
//! ```text
//! RUST_LOG=vixcloud_core=debug cargo run --example resolve_page -- <page-url> [referer]
//! ```

use tracing_subscriber::EnvFilter;
use vixcloud_core::{ManifestResolver, PageReference};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let Some(url) = args.next() else {
        eprintln!("usage: resolve_page <page-url> [referer]");
        std::process::exit(2);
    };

    let mut page = PageReference::new(url);
    if let Some(referer) = args.next() {
        page = page.with_referer(referer);
    }

    let resolver = ManifestResolver::new()?;
    println!("Resolving {}...\n", page.url);

    let mut found = 0;
    resolver
        .resolve(&page, |_| {}, |link| {
            found += 1;
            println!("[{}] {}", link.source_label, link.display_name);
            println!("  URL:     {}", link.url);
            println!("  Referer: {}", link.referer_header);
            for (name, value) in &link.extra_headers {
                println!("  {}: {}", name, value);
            }
        })
        .await;

    if found == 0 {
        println!("No playable links found (run with RUST_LOG=vixcloud_core=debug for details)");
    }

    Ok(())
}
