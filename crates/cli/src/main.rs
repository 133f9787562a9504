use std::process::ExitCode;

fn main() -> ExitCode {
    tablescout_cli::run()
}
