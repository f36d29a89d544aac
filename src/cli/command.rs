use anyhow::{anyhow, Context, Result};

use crate::boxes::{BoxConfig, Transport};

pub const DEFAULT_FACTS_FILTER: &str = "*";

#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Help,
    List,
    Register(BoxConfig),
    Unregister(String),
    Password(String),
    Provision { name: String, tags: Vec<String> },
    Tags(String),
    Facts { name: String, filter: String },
    CreateUser(String),
    Set { name: String, value: String },
    Unset(String),
    Vars(Option<String>),
    Verbose(Option<u8>),
    Exit,
}

pub struct CommandInfo {
    pub name: &'static str,
    pub usage: &'static str,
    pub help: &'static str,
    /// Second word is a box name.
    pub takes_box: bool,
}

pub const COMMANDS: &[CommandInfo] = &[
    CommandInfo {
        name: "register",
        usage: "register <name> <playbook> <hostname> <ip|inventory> [user] [transport] [port]",
        help: "Register a box, replacing one with the same name",
        takes_box: false,
    },
    CommandInfo {
        name: "unregister",
        usage: "unregister <box>",
        help: "Forget a box",
        takes_box: true,
    },
    CommandInfo {
        name: "list",
        usage: "list",
        help: "List registered boxes",
        takes_box: false,
    },
    CommandInfo {
        name: "password",
        usage: "password <box>",
        help: "Ask and store the box SSH password, empty for key auth",
        takes_box: true,
    },
    CommandInfo {
        name: "provision",
        usage: "provision <box> [tag,...]",
        help: "Run the box playbook, optionally only the given tags",
        takes_box: true,
    },
    CommandInfo {
        name: "tags",
        usage: "tags <box>",
        help: "List the tags used in the box playbook",
        takes_box: true,
    },
    CommandInfo {
        name: "facts",
        usage: "facts <box> [filter]",
        help: "Show facts of a box matching the filter",
        takes_box: true,
    },
    CommandInfo {
        name: "create_user",
        usage: "create_user <box>",
        help: "Create the box remote user with sudo rights, connecting as root",
        takes_box: true,
    },
    CommandInfo {
        name: "set",
        usage: "set <name> <value>",
        help: "Set an extra variable for playbook runs",
        takes_box: false,
    },
    CommandInfo {
        name: "unset",
        usage: "unset <name>",
        help: "Remove an extra variable",
        takes_box: false,
    },
    CommandInfo {
        name: "vars",
        usage: "vars [file]",
        help: "Load extra variables from a YAML file, or show them",
        takes_box: false,
    },
    CommandInfo {
        name: "verbose",
        usage: "verbose [0-4]",
        help: "Set or show the playbook verbosity",
        takes_box: false,
    },
    CommandInfo {
        name: "help",
        usage: "help",
        help: "Show this help",
        takes_box: false,
    },
    CommandInfo {
        name: "exit",
        usage: "exit",
        help: "Leave the shell",
        takes_box: false,
    },
];

pub fn command_info(name: &str) -> Option<&'static CommandInfo> {
    COMMANDS.iter().find(|c| c.name == name)
}

fn usage_error(name: &str) -> anyhow::Error {
    match command_info(name) {
        Some(info) => anyhow!("Usage: {}", info.usage),
        None => anyhow!("Invalid arguments for '{}'", name),
    }
}

fn single_arg(name: &str, rest: &str) -> Result<String> {
    let mut words = rest.split_whitespace();
    match (words.next(), words.next()) {
        (Some(arg), None) => Ok(arg.to_string()),
        _ => Err(usage_error(name)),
    }
}

/// Parse one shell line. Blank lines and `#` comments yield None.
pub fn parse_line(line: &str) -> Result<Option<ShellCommand>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (name, rest) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };

    let command = match name {
        "help" | "?" => ShellCommand::Help,
        "list" | "ls" => ShellCommand::List,
        "exit" | "quit" | "EOF" => ShellCommand::Exit,
        "register" => ShellCommand::Register(parse_register(rest)?),
        "unregister" => ShellCommand::Unregister(single_arg(name, rest)?),
        "password" => ShellCommand::Password(single_arg(name, rest)?),
        "tags" => ShellCommand::Tags(single_arg(name, rest)?),
        "create_user" => ShellCommand::CreateUser(single_arg(name, rest)?),
        "unset" => ShellCommand::Unset(single_arg(name, rest)?),
        "provision" => {
            let mut words = rest.split_whitespace();
            let box_name = words.next().ok_or_else(|| usage_error(name))?;
            let tags = words
                .flat_map(|w| w.split(','))
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect();
            ShellCommand::Provision {
                name: box_name.to_string(),
                tags,
            }
        }
        "facts" => {
            let (box_name, filter) = match rest.split_once(char::is_whitespace) {
                Some((box_name, filter)) => (box_name, filter.trim()),
                None => (rest, DEFAULT_FACTS_FILTER),
            };
            if box_name.is_empty() {
                return Err(usage_error(name));
            }
            ShellCommand::Facts {
                name: box_name.to_string(),
                filter: filter.to_string(),
            }
        }
        "set" => {
            let (var_name, value) = rest
                .split_once(char::is_whitespace)
                .ok_or_else(|| usage_error(name))?;
            ShellCommand::Set {
                name: var_name.to_string(),
                value: value.trim_start().to_string(),
            }
        }
        "vars" => ShellCommand::Vars(Some(rest.to_string()).filter(|f| !f.is_empty())),
        "verbose" => {
            if rest.is_empty() {
                ShellCommand::Verbose(None)
            } else {
                let level = rest
                    .parse::<u8>()
                    .with_context(|| format!("Invalid verbosity '{}'", rest))?;
                ShellCommand::Verbose(Some(level))
            }
        }
        other => {
            return Err(anyhow!(
                "Unknown command '{}', type 'help' for the command list",
                other
            ))
        }
    };

    Ok(Some(command))
}

fn parse_register(rest: &str) -> Result<BoxConfig> {
    let args = shell_words::split(rest).context("Invalid quoting")?;
    if !(4..=7).contains(&args.len()) {
        return Err(usage_error("register"));
    }

    let mut b = BoxConfig::new(&args[0], &args[1], &args[2], &args[3]);
    if let Some(user) = args.get(4) {
        b.remote_user = user.clone();
    }
    if let Some(transport) = args.get(5) {
        b.transport = transport.parse::<Transport>()?;
    }
    if let Some(port) = args.get(6) {
        b.port = Some(
            port.parse::<u16>()
                .with_context(|| format!("Invalid port '{}'", port))?,
        );
    }
    b.validate()?;

    Ok(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> ShellCommand {
        parse_line(line).unwrap().unwrap()
    }

    #[test]
    fn test_blank_and_comments() {
        assert!(parse_line("").unwrap().is_none());
        assert!(parse_line("   ").unwrap().is_none());
        assert!(parse_line("# provision web").unwrap().is_none());
    }

    #[test]
    fn test_set_keeps_value_spaces() {
        assert_eq!(
            parse("set var_n2 var v2 spaced"),
            ShellCommand::Set {
                name: "var_n2".to_string(),
                value: "var v2 spaced".to_string()
            }
        );
        assert!(parse_line("set lonely").is_err());
        assert!(parse_line("set").is_err());
    }

    #[test]
    fn test_provision_tags() {
        assert_eq!(
            parse("provision web"),
            ShellCommand::Provision {
                name: "web".to_string(),
                tags: vec![]
            }
        );
        assert_eq!(
            parse("provision web nginx,deploy  ssl"),
            ShellCommand::Provision {
                name: "web".to_string(),
                tags: vec!["nginx".into(), "deploy".into(), "ssl".into()]
            }
        );
        assert!(parse_line("provision").is_err());
    }

    #[test]
    fn test_facts_default_filter() {
        assert_eq!(
            parse("facts web"),
            ShellCommand::Facts {
                name: "web".to_string(),
                filter: "*".to_string()
            }
        );
        assert_eq!(
            parse("facts web ansible_eth*"),
            ShellCommand::Facts {
                name: "web".to_string(),
                filter: "ansible_eth*".to_string()
            }
        );
        assert!(parse_line("facts").is_err());
    }

    #[test]
    fn test_register() {
        match parse("register web '/srv/play books/web.yml' web01 10.0.0.5 deploy paramiko 2222") {
            ShellCommand::Register(b) => {
                assert_eq!(b.name, "web");
                assert_eq!(b.playbook, "/srv/play books/web.yml");
                assert_eq!(b.remote_user, "deploy");
                assert_eq!(b.transport, Transport::Paramiko);
                assert_eq!(b.port, Some(2222));
            }
            other => panic!("unexpected {:?}", other),
        }

        match parse("register db db.yml db01 ./inventories/db") {
            ShellCommand::Register(b) => {
                assert_eq!(b.remote_user, "root");
                assert!(b.uses_inventory_file());
            }
            other => panic!("unexpected {:?}", other),
        }

        assert!(parse_line("register web web.yml").is_err());
        assert!(parse_line("register web web.yml h 1.2.3.4 u telnet").is_err());
        assert!(parse_line("register web web.yml h 1.2.3.4 u ssh notaport").is_err());
    }

    #[test]
    fn test_verbose_and_vars() {
        assert_eq!(parse("verbose"), ShellCommand::Verbose(None));
        assert_eq!(parse("verbose 3"), ShellCommand::Verbose(Some(3)));
        assert!(parse_line("verbose loud").is_err());

        assert_eq!(parse("vars"), ShellCommand::Vars(None));
        assert_eq!(
            parse("vars ./vars.yml"),
            ShellCommand::Vars(Some("./vars.yml".to_string()))
        );
    }

    #[test]
    fn test_single_box_commands() {
        assert_eq!(parse("tags web"), ShellCommand::Tags("web".to_string()));
        assert_eq!(
            parse("create_user web"),
            ShellCommand::CreateUser("web".to_string())
        );
        assert!(parse_line("unregister a b").is_err());
        assert_eq!(parse("quit"), ShellCommand::Exit);
        assert_eq!(parse("?"), ShellCommand::Help);
    }

    #[test]
    fn test_unknown_command() {
        let err = parse_line("destroy web").unwrap_err();
        assert!(err.to_string().contains("Unknown command 'destroy'"));
    }
}
