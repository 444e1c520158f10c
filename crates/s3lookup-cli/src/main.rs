use std::process::ExitCode;

fn main() -> ExitCode {
    s3lookup_cli::run()
}
