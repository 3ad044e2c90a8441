mod background;
mod common;
