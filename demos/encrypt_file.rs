//! # Encrypt File Demo
//!
//! Encrypts a file for one recipient through the streaming core:
//! 1. Read configuration from the environment (`GPG_WRAP_EXECUTABLE`,
//!    `GPG_WRAP_TIMEOUT_SECS`, `GNUPGHOME`)
//! 2. Pipe the plaintext file through `gpg --encrypt` into the output file
//!
//! ## Run
//!
//! ```bash
//! cargo run --example encrypt_file -- <recipient> <input> <output>
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

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [recipient, input, output] = args.as_slice() else {
        eprintln!("usage: encrypt_file <recipient> <input> <output>");
        std::process::exit(2);
    };

    println!("=================================================");
    println!("            GPG-WRAP ENCRYPT FILE DEMO");
    println!("=================================================\n");

    let config = GpgConfig::from_env();
    println!("   Executable: {}", config.executable);
    println!("   Global args: {:?}", config.global_args);
    println!();

    let gpg = Gpg::new(config);
    match gpg
        .encrypt_to_file(input, output, &["--recipient", recipient.as_str(), "--armor"])
        .await
    {
        Ok(()) => println!("   Encrypted {} -> {}", input, output),
        Err(e) => {
            eprintln!("   Encryption failed (code {}): {}", e.code(), e);
            std::process::exit(1);
        }
    }
}
