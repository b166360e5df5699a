pub mod audio;
pub mod config;
pub mod game;
pub mod grid;
pub mod screen;
pub mod tetromino;
