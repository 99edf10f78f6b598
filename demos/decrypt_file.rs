//! # Decrypt File Demo
//!
//! Decrypts a file into memory and prints the plaintext along with the key
//! information gpg reports on stderr.
//!
//! ## Run
//!
//! ```bash
//! cargo run --example decrypt_file -- <input>
//! ```

use gpg_wrap::{Gpg, GpgConfig};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gpg_wrap=debug".into()),
        )
        .init();

    let Some(input) = std::env::args().nth(1) else {
        eprintln!("usage: decrypt_file <input>");
        std::process::exit(2);
    };

    println!("=================================================");
    println!("            GPG-WRAP DECRYPT FILE DEMO");
    println!("=================================================\n");

    let gpg = Gpg::new(GpgConfig::from_env());
    match gpg.decrypt_file(&input, &[]).await {
        Ok(output) => {
            println!("1. Key information (stderr):\n");
            for line in output.stderr.lines() {
                println!("   {}", line);
            }
            println!();
            println!("2. Plaintext:\n");
            println!("{}", output.stdout_text());
        }
        Err(e) => {
            eprintln!("   Decryption failed (code {}): {}", e.code(), e);
            std::process::exit(1);
        }
    }
}
