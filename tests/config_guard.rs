use regex::Regex;
use std::fs;
use std::path::Path;

/// Fail CI if a config file carries a real private key. Pool and hook ids
/// are 32-byte hex too, so only key-like fields are checked.
#[test]
fn no_committed_private_keys_in_configs() {
    let re = Regex::new(r#"(?i)^\s*[a-z0-9_]*(key|secret)\s*=\s*"(0x)?[a-fA-F0-9]{64}""#).unwrap();
    let candidates = [
        "config.toml",
        "config.example.toml",
        "config.local.toml",
        "config.dev.toml",
    ];
    for file in candidates {
        if !Path::new(file).exists() {
            continue;
        }
        let body = fs::read_to_string(file).expect("read config");
        for (idx, line) in body.lines().enumerate() {
            assert!(
                !re.is_match(line),
                "Secret-looking hex in {} at line {}",
                file,
                idx + 1
            );
        }
    }
}

/// The shipped example config documents the key slot with a placeholder,
/// never hex. 64-hex values elsewhere in it (pool ids) are legitimate.
#[test]
fn example_config_keeps_a_placeholder_wallet_key() {
    let body = fs::read_to_string("config.example.toml").expect("read example config");
    let key_line = body
        .lines()
        .find(|l| l.trim_start().starts_with("wallet_key"))
        .expect("wallet_key line");
    assert!(key_line.contains("YOUR_PRIVATE_KEY"));
}
