#![cfg(test)]

mod backend;
mod config;
mod translate;
