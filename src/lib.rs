#![crate_name = "zjam"]

#[macro_use]
extern crate lazy_static;

pub mod config;
pub mod dictionary;
pub mod display;
pub mod display_crossterm;
pub mod display_headless;
pub mod display_trait;
pub mod error;
pub mod game;
pub mod header;
pub mod input;
pub mod library;
pub mod memory;
pub mod processor;
pub mod save;
pub mod session;
pub mod theme;
pub mod timed_input;
pub mod vm;
pub mod zobject;

#[doc(hidden)]
pub mod test_utils;

/*
Layout of a small version 3 story, as the header describes it
Dynamic	00000	header
        00040	abbreviation strings
        00042	abbreviation table
        00102	property defaults
        00140	objects
        002f0	object descriptions and properties
        006e3	global variables
        008c3	arrays
Static	00b48	grammar table
        0124d	dictionary
High	01a0a	Z-code
        05d56	static strings
        06ae6	end of file

Only the dynamic region is written to a save file.
*/
