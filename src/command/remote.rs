//! `remote` commands: manage the configured appliances

use crate::config::Config;
use crate::error::CommandResult;
use crate::output::{render_table, Console};
use crate::resource::{ColumnDef, Formatter};
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteAction {
    List,
    Add {
        name: String,
        url: String,
        token: Option<String>,
        make_active: bool,
    },
    Use {
        name: String,
    },
    Remove {
        name: String,
    },
    Current,
}

impl RemoteAction {
    /// Whether the action changes the config file
    pub fn modifies_config(&self) -> bool {
        matches!(
            self,
            RemoteAction::Add { .. } | RemoteAction::Use { .. } | RemoteAction::Remove { .. }
        )
    }
}

/// Apply `action` to `config`; the caller saves the config afterwards
pub fn run(config: &mut Config, action: &RemoteAction, console: &mut Console) -> CommandResult<()> {
    match action {
        RemoteAction::List => {
            if config.remotes.is_empty() {
                console.print("No remotes configured.")?;
                return Ok(());
            }

            let rows: Vec<_> = config
                .remotes
                .iter()
                .map(|(name, remote)| {
                    let active = config.active_remote.as_deref() == Some(name.as_str());
                    json!({
                        "active": if active { "=>" } else { "" },
                        "name": name,
                        "url": remote.url,
                        "token": remote.access_token.is_some(),
                    })
                })
                .collect();
            let columns = [
                ColumnDef::labelled("", "active"),
                ColumnDef::labelled("Name", "name"),
                ColumnDef::labelled("URL", "url"),
                ColumnDef {
                    format: Some(Formatter::YesNo),
                    ..ColumnDef::labelled("Token", "token")
                },
            ];
            console.print(render_table(&columns, &rows))?;
        }
        RemoteAction::Add {
            name,
            url,
            token,
            make_active,
        } => {
            config.add_remote(name, url, token.clone())?;
            if *make_active {
                config.use_remote(name)?;
            }
            tracing::info!("added remote {} ({})", name, url);
            console.print(format!("Added remote {}", name))?;
        }
        RemoteAction::Use { name } => {
            config.use_remote(name)?;
            console.print(format!("Using remote {}", name))?;
        }
        RemoteAction::Remove { name } => {
            config.remove_remote(name)?;
            console.print(format!("Removed remote {}", name))?;
        }
        RemoteAction::Current => match config.active_remote.as_deref() {
            Some(name) => {
                let url = config
                    .remotes
                    .get(name)
                    .map(|r| r.url.as_str())
                    .unwrap_or("-");
                console.print(format!("{} {}", name, url))?;
            }
            None => console.print("No active remote.")?,
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_then_list_marks_active() {
        let mut config = Config::default();
        let (mut console, out, _) = Console::captured();
        let add = RemoteAction::Add {
            name: "prod".into(),
            url: "https://morpheus.example.com".into(),
            token: None,
            make_active: false,
        };
        assert!(add.modifies_config());
        run(&mut config, &add, &mut console).unwrap();
        run(&mut config, &RemoteAction::List, &mut console).unwrap();

        let printed = out.contents();
        assert!(printed.contains("Added remote prod"));
        assert!(printed.contains("=>"));
        assert!(printed.contains("https://morpheus.example.com/"));
    }

    #[test]
    fn test_use_unknown_remote_fails() {
        let mut config = Config::default();
        let (mut console, _, _) = Console::captured();
        let action = RemoteAction::Use {
            name: "nope".into(),
        };
        assert!(run(&mut config, &action, &mut console).is_err());
    }

    #[test]
    fn test_current_without_remote() {
        let mut config = Config::default();
        let (mut console, out, _) = Console::captured();
        run(&mut config, &RemoteAction::Current, &mut console).unwrap();
        assert_eq!(out.contents(), "No active remote.\n");
    }
}
