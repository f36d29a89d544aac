/// Common functions for CLI.
use std::collections::BTreeSet;

use crate::{
    boxes::BoxConfig,
    cli::command::COMMANDS,
    vars::{display_value, ExtraVars},
};

/// List all boxes.
pub fn list_boxes<'a>(boxes: impl Iterator<Item = &'a BoxConfig>) {
    let boxes: Vec<&BoxConfig> = boxes.collect();
    if boxes.is_empty() {
        println!("📝 No boxes registered");
        return;
    }

    println!("\n📦 Registered Boxes ({})", boxes.len());
    println!("{}", "─".repeat(50));

    for b in boxes {
        let auth_type = if b.remote_pwd.is_some() {
            "🔐 Password"
        } else {
            "🔑 Key"
        };

        println!(
            "  {} - {} [{}] ({}) -> {}",
            b.name, b, b.transport, auth_type, b.playbook
        );
    }

    println!("{}", "─".repeat(50));
}

pub fn list_vars(vars: &ExtraVars) {
    if vars.is_empty() {
        println!("📝 No extra variables set");
        return;
    }

    println!("\n🧩 Extra Variables ({})", vars.len());
    println!("{}", "─".repeat(50));
    for (name, value) in vars.iter() {
        println!("  {} = {}", name, display_value(value));
    }
    println!("{}", "─".repeat(50));
}

pub fn list_tags(box_name: &str, tags: &BTreeSet<String>) {
    if tags.is_empty() {
        println!("📝 No tags in the playbook of '{}'", box_name);
        return;
    }

    println!("\n🏷️  Tags of '{}' ({})", box_name, tags.len());
    for tag in tags {
        println!("  • {}", tag);
    }
}

pub fn print_help() {
    println!("\n📖 Commands");
    println!("{}", "═".repeat(50));
    for c in COMMANDS {
        println!("  {}", c.usage);
        println!("      {}", c.help);
    }
    println!("{}", "═".repeat(50));
    println!("  Tab completes commands and box names, Ctrl-D leaves the shell.");
}
