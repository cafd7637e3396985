mod common;
mod manager;
