//! wodlogger main entrypoint.

use wodlogger::run;
use wodlogger::ui::messages::error;

fn main() {
    if let Err(e) = run() {
        error(format!("Error: {e}"));
        std::process::exit(e.exit_code());
    }
}
