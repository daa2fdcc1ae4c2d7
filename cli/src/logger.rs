use colored::*;
use console::Term;
use std::fmt::Display;

/// Coloured status lines for the terminal.
/// All methods are static; this is a namespace, not something you instantiate.
/// Brand colours: teal (0, 168, 150) for info, amber (240, 160, 40) for emphasis.
pub struct Logger;

impl Logger {
    /// Prints an info message with a teal bullet point.
    pub fn info<T: Display>(msg: T) {
        println!("{} {}", "•".truecolor(0, 168, 150).bold(), msg);
    }

    /// Prints a success message with a green checkmark.
    pub fn success<T: Display>(msg: T) {
        println!("{} {}", "✔".green().bold(), msg);
    }

    /// Prints an error message with a red X.
    /// Goes to stderr so piping a table somewhere doesn't swallow it.
    pub fn error<T: Display>(msg: T) {
        eprintln!("{} {}", "✖".red().bold(), msg);
    }

    /// Prints a warning with a yellow warning symbol.
    pub fn warn<T: Display>(msg: T) {
        eprintln!("{} {}", "⚠".yellow().bold(), msg);
    }

    /// Prints a section header in amber with underline.
    /// The leading newline keeps it off the previous output.
    pub fn header<T: Display>(msg: T) {
        println!(
            "\n{}",
            msg.to_string().truecolor(240, 160, 40).bold().underline()
        );
    }

    /// Prints a horizontal rule the width of the terminal.
    pub fn rule() {
        let width = Term::stdout().size().1 as usize;
        println!("{}", "─".repeat(width.clamp(10, 80)).dimmed());
    }

    /// Returns a string coloured in brand teal (for inline use).
    pub fn highlight<T: Display>(msg: T) -> String {
        msg.to_string().truecolor(0, 168, 150).bold().to_string()
    }

    /// Returns a string coloured in brand amber (for inline use).
    /// Used for ids and counts people will want to copy.
    pub fn brand_text<T: Display>(msg: T) -> String {
        msg.to_string().truecolor(240, 160, 40).bold().to_string()
    }

    /// Returns a dimmed string (less important text).
    pub fn dim<T: Display>(msg: T) -> String {
        msg.to_string().dimmed().to_string()
    }
}
