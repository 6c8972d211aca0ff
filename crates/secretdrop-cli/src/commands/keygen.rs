//! System key generation.

use secretdrop_secrets::SystemKey;

/// Print a fresh hex-encoded system key on stdout.
pub fn run() -> anyhow::Result<()> {
    let key = SystemKey::generate();
    println!("{}", key.to_hex());
    eprintln!("Store this in SECRETDROP_SYSTEM_KEY. Records sealed under it cannot be read without it.");
    Ok(())
}
