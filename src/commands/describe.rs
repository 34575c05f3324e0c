use morgen_core::MorgenResult;
use morgen_core::protocol::{Command, CommandHints};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct CommandInfo {
    name: &'static str,
    #[serde(flatten)]
    hints: CommandHints,
}

/// Every command the bridge accepts, with its behavioural hints.
pub fn handle() -> MorgenResult<serde_json::Value> {
    let commands: Vec<CommandInfo> = Command::ALL
        .iter()
        .map(|command| CommandInfo {
            name: command.name(),
            hints: command.hints(),
        })
        .collect();
    Ok(serde_json::json!({ "commands": commands }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lists_every_command() {
        let data = handle().unwrap();
        let commands = data["commands"].as_array().unwrap();
        assert_eq!(commands.len(), Command::ALL.len());

        let delete = commands
            .iter()
            .find(|c| c["name"] == "batch_delete_events")
            .unwrap();
        assert_eq!(delete["destructive"], true);
        assert_eq!(delete["read_only"], false);
        assert_eq!(delete["timeout_secs"], 120);
    }
}
