use sha2::{Digest, Sha256};
use std::path::Path;

/// Hex-encoded SHA-256 digest of written role content, recorded in the
/// audit log and setup reports.
pub fn content_digest(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Append one audit event to `<user-home>/audit.jsonl`. Best-effort: audit
/// logging never fails the command that triggered it.
pub fn audit(user_home: &Path, action: &str, data: serde_json::Value) {
    if std::fs::create_dir_all(user_home).is_err() {
        return;
    }
    let event = serde_json::json!({
        "ts": chrono::Utc::now().to_rfc3339(),
        "action": action,
        "data": data
    });
    let line = format!("{event}\n");
    let _ = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(user_home.join("audit.jsonl"))
        .and_then(|mut f| std::io::Write::write_all(&mut f, line.as_bytes()));
}
