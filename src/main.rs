mod cli;
mod commands;
mod env_loader;
mod error;
mod history;
mod logging;

fn main() {
    env_loader::load_dotenv();

    if let Err(err) = cli::run() {
        match error::HistoryErrorCode::for_error(&err) {
            Some(code) => eprintln!("error[{}]: {err:#}", code.as_str()),
            None => eprintln!("error: {err:#}"),
        }
        std::process::exit(1);
    }
}
