//! ANSI escape sequences and glyphs used by the pretty view

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";

pub const GRAY: &str = "\x1b[90m";
pub const WHITE: &str = "\x1b[37m";
pub const CYAN: &str = "\x1b[36m";
pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const DIM: &str = "\x1b[2m";

pub const SEPARATOR: &str = "━";
pub const SEPARATOR_WIDTH: usize = 50;
pub const INDENT: &str = "  ";

pub const CHECKED: &str = "☑";
pub const UNCHECKED: &str = "☐";
