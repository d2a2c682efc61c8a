use std::process::ExitCode;

fn main() -> ExitCode {
    comexflow_cli::run()
}
