//! An implementation of a CHIP-8 interpreter. The implementation follows the instruction set
//! described [here](https://en.wikipedia.org/wiki/CHIP-8#Opcode_table) with the historical
//! semantics for the carry, borrow and shift flags. The virtual machine itself is headless:
//! a host feeds it key presses, calls [`Chip::cycle`](chip::Chip::cycle) at its chosen rate,
//! ticks the timers at 60 Hz and presents the framebuffer whenever the draw flag is raised.
//! For graphical output the bundled text UI relies on the cursive text user interface library.
pub mod chip;
