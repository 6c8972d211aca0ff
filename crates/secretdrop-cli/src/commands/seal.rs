//! Offline `seal` and `open`.
//!
//! These run the dual-encryption layer directly, with no store. The sealed
//! output is a JSON object holding the envelope and the password hash.

use std::io::Read;

use clap::Args;
use secretdrop_core::Config;
use secretdrop_secrets::crypto::{decrypt_dual, encrypt_dual, verify_password, Envelope};
use secretdrop_secrets::resolve_system_key;
use serde::Serialize;

use super::read_password;

#[derive(Args)]
pub struct SealArgs {
    /// Secret to seal; read from stdin when omitted
    #[arg(long)]
    pub text: Option<String>,

    /// Password; prompted for when omitted
    #[arg(long)]
    pub password: Option<String>,
}

#[derive(Args)]
pub struct OpenArgs {
    /// Envelope printed by `seal` (`iv:tag:ciphertext`)
    pub envelope: String,

    /// Password hash printed by `seal`; checked before decrypting
    #[arg(long)]
    pub hash: Option<String>,

    /// Password; prompted for when omitted
    #[arg(long)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Sealed {
    pub envelope: String,
    pub password_hash: String,
}

pub fn seal(args: SealArgs, config: &Config) -> anyhow::Result<()> {
    let system_key = resolve_system_key(config).map_err(|e| anyhow::anyhow!("{}", e))?;

    let secret = match args.text {
        Some(text) => text,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf.trim_end_matches(['\r', '\n']).to_string()
        }
    };
    if secret.is_empty() {
        anyhow::bail!("Secret must not be empty");
    }
    if secret.len() > config.policy.max_secret_bytes {
        anyhow::bail!("Secret exceeds the maximum of {} bytes", config.policy.max_secret_bytes);
    }

    let password = read_password(args.password, true)?;
    let chars = password.chars().count();
    if chars < config.policy.min_password_len || chars > config.policy.max_password_len {
        anyhow::bail!(
            "Password must be between {} and {} characters",
            config.policy.min_password_len,
            config.policy.max_password_len
        );
    }

    let sealed = encrypt_dual(secret.as_bytes(), password.as_bytes(), &system_key)
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    let out = Sealed {
        envelope: sealed.envelope.to_string(),
        password_hash: sealed.password_hash.to_string(),
    };
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

pub fn open(args: OpenArgs, config: &Config) -> anyhow::Result<()> {
    let system_key = resolve_system_key(config).map_err(|e| anyhow::anyhow!("{}", e))?;
    let envelope: Envelope = args
        .envelope
        .trim()
        .parse()
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    let password = read_password(args.password, false)?;

    if let Some(hash) = args.hash {
        let ok = verify_password(password.as_bytes(), hash.trim())
            .map_err(|e| anyhow::anyhow!("{}", e))?;
        if !ok {
            anyhow::bail!("Invalid password");
        }
    }

    let plaintext = decrypt_dual(&envelope, password.as_bytes(), &system_key)
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    let text = std::str::from_utf8(&plaintext).map_err(|_| anyhow::anyhow!("Unable to decrypt secret"))?;
    println!("{}", text);
    Ok(())
}
