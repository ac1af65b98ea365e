use std::process::ExitCode;

fn main() -> ExitCode {
    mailbot_cli::run()
}
