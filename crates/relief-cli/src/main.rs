// relief CLI entry point

use relief_cli::{output, router::CommandRouter};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = CommandRouter::route().await {
        output::print_error(&e.user_message());
        std::process::exit(e.exit_code());
    }
}
