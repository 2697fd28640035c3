mod collection;
mod common;
mod screening;
