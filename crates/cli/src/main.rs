use std::process::ExitCode;

fn main() -> ExitCode {
    pricetier_cli::run()
}
