// Copyright 2024 TiKV Project Authors. Licensed under Apache-2.0.

//! Minimal stand-in for the `slog-global` crate (unavailable in this
//! build's registry mirror): a process-wide `slog::Logger` plus a
//! `debug!` macro with the same calling convention
//! (`debug!("msg"; "k" => v, ...)`, no explicit logger argument).

lazy_static::lazy_static! {
    pub static ref LOGGER: slog::Logger = slog::Logger::root(slog::Discard, slog::o!());
}

macro_rules! debug {
    ($($args:tt)*) => {
        slog::debug!($crate::logging::LOGGER, $($args)*)
    };
}

pub(crate) use debug;
