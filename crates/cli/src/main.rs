use std::process::ExitCode;

fn main() -> ExitCode {
    threadwise_cli::run()
}
