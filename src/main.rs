//! Process entry point: parses flags, initializes logging, dispatches into
//! `modhoist::run`, and maps the result onto the exit codes of §6/§7. Stays
//! thin, as the teacher's own `main.rs` does -- all the work lives in `lib.rs`.

use std::env;
use std::process::ExitCode;

use modhoist::error::AppError;

fn main() -> ExitCode {
  let root = env::current_dir().expect("could not determine current directory");
  let parsed = modhoist::args::parse(root, env::args());

  env_logger::Builder::new().filter_level(parsed.log_level).format_timestamp(None).init();

  let runtime = tokio::runtime::Runtime::new().expect("could not start async runtime");
  match runtime.block_on(modhoist::run(parsed.context, parsed.mode)) {
    Ok(code) => ExitCode::from(code as u8),
    Err(err) => {
      log_and_exit_code(&err);
      ExitCode::from(err.exit_code() as u8)
    }
  }
}

fn log_and_exit_code(err: &AppError) {
  match err {
    AppError::Uncritical(message) => log::info!("{message}"),
    other => log::error!("{other}"),
  }
}
