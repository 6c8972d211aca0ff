//! End-to-end self test against an in-memory store.

use std::sync::Arc;
use std::time::Instant;

use console::{style, Emoji};
use secretdrop_core::env::{self, SYSTEM_KEY_VAR};
use secretdrop_core::Config;
use secretdrop_secrets::{
    resolve_system_key, LifecyclePolicy, MemoryTtlStore, RetentionPolicy, SecretError,
    SecretLifecycleManager, SystemKey,
};

static CHECK: Emoji = Emoji("✓", "+");
static CROSS: Emoji = Emoji("✗", "x");

const SECRET: &str = "selftest-secret";
const PASSWORD: &str = "Selftest!Pass1234";
const WRONG_PASSWORD: &str = "Wrong!Pass123456";

struct Report {
    failures: usize,
}

impl Report {
    fn check(&mut self, label: &str, ok: bool, detail: impl std::fmt::Display) {
        if ok {
            println!("  {} {} ({})", style(CHECK).green(), label, detail);
        } else {
            println!("  {} {} ({})", style(CROSS).red(), label, detail);
            self.failures += 1;
        }
    }
}

/// Run the create/retrieve/exhaust scenario and report each step.
pub async fn run(config: &Config) -> anyhow::Result<()> {
    println!("SecretDrop self test\n");

    let system_key = if config.system_key.is_none() && env::get_var(SYSTEM_KEY_VAR).is_none() {
        println!("  No system key configured; using an ephemeral one.\n");
        SystemKey::generate()
    } else {
        resolve_system_key(config).map_err(|e| anyhow::anyhow!("{}", e))?
    };
    let policy = LifecyclePolicy::from_config(config).map_err(|e| anyhow::anyhow!("{}", e))?;
    let floor = policy.min_response_time;
    let manager = SecretLifecycleManager::new(Arc::new(MemoryTtlStore::new()), system_key, policy);

    let mut report = Report { failures: 0 };

    let record = manager
        .create(SECRET, PASSWORD, RetentionPolicy::ViewLimited(2))
        .await
        .map_err(|e| anyhow::anyhow!("create failed: {}", e))?;
    report.check("create view-limited record", true, "2 views");

    let started = Instant::now();
    let wrong = manager.retrieve(&record.id, WRONG_PASSWORD).await;
    let elapsed = started.elapsed();
    report.check(
        "wrong password rejected",
        matches!(wrong, Err(SecretError::InvalidPassword)),
        describe(&wrong),
    );
    report.check(
        "response floor honoured",
        elapsed >= floor,
        format!("{} ms", elapsed.as_millis()),
    );

    for expected in [1u32, 0] {
        let result = manager.retrieve(&record.id, PASSWORD).await;
        let ok = matches!(
            &result,
            Ok(r) if r.plaintext.expose_secret() == SECRET && r.views_remaining == Some(expected)
        );
        report.check(
            &format!("retrieve leaves {expected} view(s)"),
            ok,
            describe(&result),
        );
    }

    let gone = manager.retrieve(&record.id, PASSWORD).await;
    report.check(
        "exhausted record is gone",
        matches!(gone, Err(SecretError::NotFound)),
        describe(&gone),
    );

    println!();
    if report.failures > 0 {
        anyhow::bail!("{} check(s) failed", report.failures);
    }
    println!("All checks passed");
    Ok(())
}

fn describe<T>(result: &Result<T, SecretError>) -> String {
    match result {
        Ok(_) => "ok".to_string(),
        Err(e) => e.to_string(),
    }
}
