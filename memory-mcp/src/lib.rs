//! Thin HTTP + STDIO JSON-RPC front-end over `memory_core`'s verb API
//! (spec.md §6). This crate owns request/response shaping and transport;
//! every verb's actual behaviour lives in `memory_core::verbs::VerbsService`.

pub mod bootstrap;
pub mod dto;
pub mod http;
pub mod jsonrpc;
