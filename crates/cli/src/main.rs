use std::process::ExitCode;

fn main() -> ExitCode {
    freightdesk_cli::run()
}
