mod commands_handler;
mod print_text_command;

pub use commands_handler::*;
pub use print_text_command::*;
