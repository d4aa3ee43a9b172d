//! # Knowledge Relay
//!
//! Two HTTP services in front of a generative-language API:
//!
//! - a **search relay** that forwards a query under a fixed system
//!   instruction, and
//! - a **knowledge chatbot** that answers questions only from documents
//!   uploaded into an in-memory knowledge base.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌────────────────┐
//! │ upload .txt  │──▶│  extract +   │──▶│ KnowledgeStore │
//! │   / .pdf     │   │   chunk      │   │  (in memory)   │
//! └──────────────┘   └──────────────┘   └───────┬────────┘
//!                                               │ keyword overlap
//!                                               ▼
//! ┌──────────────┐   ┌──────────────┐   ┌────────────────┐
//! │  /ask        │──▶│  compose     │──▶│  GeminiClient  │
//! │  /query ─────┼──────────────────────▶│ generateContent│
//! └──────────────┘   └──────────────┘   └────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! export GENAI_API_KEY=...
//! relay serve                          # start the HTTP server
//! relay search "what is a monad?"      # one-shot query
//! relay ask "what do cats do" --file notes.txt
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`extract`] | Plain-text decoding and PDF page extraction |
//! | [`ingest`] | Upload validation and storage |
//! | [`gemini`] | Generative-language API client |
//! | [`server`] | HTTP server |
//!
//! Chunking, storage, retrieval, and answer composition live in
//! [`knowledge_relay_core`].

pub mod config;
pub mod extract;
pub mod gemini;
pub mod ingest;
pub mod server;
