use clap::CommandFactory;

use crate::Cli;

fn cli_command() -> clap::Command {
    Cli::command()
}

fn completion_script(shell: clap_complete::Shell) -> Vec<u8> {
    let mut cmd = cli_command();
    let mut out = Vec::new();
    clap_complete::generate(shell, &mut cmd, "audiograph", &mut out);
    out
}

pub(crate) fn handle_completions(
    shell: clap_complete::Shell,
) -> Result<(), Box<dyn std::error::Error>> {
    let out = completion_script(shell);
    use std::io::Write;
    std::io::stdout().write_all(&out)?;
    Ok(())
}
