//! Hosts command: alias discovery from the ssh client configuration.

use gpubar_core::{AliasCandidate, AppSettings};

use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::util::{format_port, truncate_str};

/// Lists aliases found by the configured resolver
pub fn cmd_hosts(settings: &AppSettings, format: OutputFormat) -> Result<(), CliError> {
    let aliases = settings.ssh_config.resolver().discover();
    tracing::debug!(count = aliases.len(), "Discovered ssh aliases");

    match format {
        OutputFormat::Table => print!("{}", render_table(&aliases)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&aliases)?),
    }
    Ok(())
}

fn render_table(aliases: &[AliasCandidate]) -> String {
    if aliases.is_empty() {
        return "No host aliases found.\n".to_string();
    }

    let name_width = aliases
        .iter()
        .map(|a| a.name.chars().count())
        .max()
        .unwrap_or(0)
        .clamp(5, 30);
    let target_width = aliases
        .iter()
        .map(|a| a.target.chars().count())
        .max()
        .unwrap_or(0)
        .clamp(6, 40);

    let mut out = format!("{:<name_width$}  {:<target_width$}  PORT\n", "ALIAS", "TARGET");
    out.push_str(&format!(
        "{:-<name_width$}  {:-<target_width$}  {:-<7}\n",
        "", "", ""
    ));
    for alias in aliases {
        out.push_str(&format!(
            "{:<name_width$}  {:<target_width$}  {}\n",
            truncate_str(&alias.name, name_width),
            truncate_str(&alias.target, target_width),
            format_port(alias.port),
        ));
    }
    out
}
