mod assets;
mod cli;
mod cloud;
mod commands;
mod error;
mod fund;
mod logging;

fn main() {
    fund::paths::load_dotenv();
    logging::init();

    if let Err(err) = cli::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
