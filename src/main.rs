use std::process::ExitCode;

fn main() -> ExitCode {
    diagbridge_lib::run()
}
