use std::process::ExitCode;

fn main() -> ExitCode {
    leadguard_cli::run()
}
