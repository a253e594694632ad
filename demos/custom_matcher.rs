//! Example: Using custom matchers for codes that are not plain 6 digits.
//!
//! This example demonstrates how to create custom matchers using:
//! - `RegexMatcher` for pattern-based extraction
//! - `LabeledCodeMatcher` for alphanumeric codes after a label
//! - `FirstOf` to try several matchers in order
//! - `ClosureMatcher` for arbitrary logic
//!
//! # Usage
//!
//! ```bash
//! export MAILPOOL_BASE_URL="http://mail-pool.internal:8000"
//! export MAILPOOL_MAILBOX="someone@outlook.com"
//! cargo run --example custom_matcher
//! ```

use mailpool_client::matcher::{
    ClosureMatcher, FirstOf, LabeledCodeMatcher, Matcher, OtpMatcher, RegexMatcher,
};
use mailpool_client::{MailPoolClient, MailPoolConfig};
use std::borrow::Cow;
use std::env;

/// Extracts a magic-link token such as `?token=3f9a...`
fn magic_link_matcher() -> RegexMatcher {
    RegexMatcher::with_description(r"[?&]token=([A-Za-z0-9_-]{16,})", "Magic link token")
        .expect("valid regex")
}

/// Extracts a `"code": "..."` field from a JSON snippet embedded in a message
fn json_field_matcher(field_name: &str) -> impl Matcher {
    let pattern = format!(r#""{field_name}"\s*:\s*"([^"]*)""#);
    let re = regex::Regex::new(&pattern).expect("valid regex");
    ClosureMatcher::new(
        move |text| {
            re.captures(text)
                .and_then(|caps| caps.get(1))
                .map(|m| Cow::Borrowed(m.as_str()))
        },
        format!("JSON field: {field_name}"),
    )
}

fn entry(label: &'static str, matcher: impl Matcher + 'static) -> (&'static str, Box<dyn Matcher>) {
    (label, Box::new(matcher))
}

#[tokio::main]
async fn main() -> mailpool_client::Result<()> {
    let base_url =
        env::var("MAILPOOL_BASE_URL").expect("MAILPOOL_BASE_URL environment variable required");
    let mailbox =
        env::var("MAILPOOL_MAILBOX").expect("MAILPOOL_MAILBOX environment variable required");

    let config = MailPoolConfig::builder().base_url(base_url).build()?;

    let fallback = FirstOf::new()
        .or(LabeledCodeMatcher::new(4, 8))
        .or(OtpMatcher::six_digit());

    let matchers = vec![
        entry("magic link", magic_link_matcher()),
        entry("JSON code field", json_field_matcher("code")),
        entry("labelled code, then 6 digits", fallback),
        entry("4-digit PIN", OtpMatcher::n_digit(4)),
    ];

    println!("Scanning {mailbox} with custom matchers...\n");

    for (i, (label, matcher)) in matchers.into_iter().enumerate() {
        let mut client = MailPoolClient::builder(config.clone())
            .matcher(matcher)
            .build()?;
        client.use_mailbox(&mailbox)?;

        println!("{}. {label}", i + 1);
        match client.fetch_verification_code(None).await? {
            Some(value) => println!("   Found: {value}"),
            None => println!("   Not found"),
        }
    }

    println!("\nDone!");
    Ok(())
}
