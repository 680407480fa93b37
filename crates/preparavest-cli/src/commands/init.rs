//! The `preparavest init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    if Path::new("preparavest.toml").exists() {
        println!("preparavest.toml already exists, skipping.");
    } else {
        std::fs::write("preparavest.toml", SAMPLE_CONFIG)?;
        println!("Created preparavest.toml");
    }

    std::fs::create_dir_all("banks")?;
    let example_path = Path::new("banks/example.toml");
    if example_path.exists() {
        println!("banks/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_BANK)?;
        println!("Created banks/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit preparavest.toml with your API address");
    println!("  2. Run: preparavest profile set --id 1 --name <name> --email <email>");
    println!("  3. Run: preparavest play --bank banks/example.toml --scoring local");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# preparavest configuration

# "delegated": the API grades submitted answers (recommended)
# "local": answers are graded here and the count is sent to the API
scoring_mode = "delegated"
session_limit = 10
ranking_size = 5

# Uncomment to take questions from a local bank instead of the API
# question_bank = "banks/example.toml"

# PREPARAVEST_API_URL overrides base_url; "${VAR}" references are expanded
[api]
base_url = "http://localhost:3000"
timeout_ms = 5000
"#;

const EXAMPLE_BANK: &str = r#"[bank]
id = "example"
name = "Example Bank"
description = "A few warm-up questions to get started"

[[questions]]
id = 1
prompt = "What is the chemical symbol for sodium?"
a = "S"
b = "Na"
c = "So"
d = "N"
e = "Sd"
correct = "B"

[[questions]]
id = 2
prompt = "Which planet is closest to the sun?"
a = "Mercury"
b = "Venus"
c = "Earth"
d = "Mars"
e = "Jupiter"
correct = "A"

[[questions]]
id = 3
prompt = "What is 15% of 200?"
a = "15"
b = "20"
c = "30"
d = "35"
e = "300"
correct = "C"
"#;
