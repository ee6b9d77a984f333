pub mod false_breakout;
pub mod range;
pub mod structure;
pub mod structure_break;
pub mod swing;
