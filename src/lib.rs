//! Memopolis — a typed, weighted, temporally-decaying knowledge graph over a
//! directory of human-authored Markdown memory files, projected into a
//! deterministic city layout.
//!
//! The engine watches a workspace (`SOUL.md`, `MEMORY.md`, `USER.md`,
//! `AGENTS.md`, `TOOLS.md`, `MEMORY_EXTENDED.md`, plus daily notes under
//! `memory/`), extracts typed entities per paragraph, and maintains a
//! co-occurrence graph whose display weights decay by entity type:
//!
//! | Type | Half-life |
//! |------|-----------|
//! | `ticker` | 7 days |
//! | `url` | 14 days |
//! | `topic`, `header`, `concept` | 30 days |
//! | `organization` | 45 days |
//! | `person`, `decision` | 60 days |
//! | `tool` | 90 days |
//!
//! Curated files boost everything they mention (`SOUL.md` ×5, `MEMORY.md` and
//! `USER.md` ×3, `AGENTS.md` and `TOOLS.md` ×2).
//!
//! # Architecture
//!
//! - **Extraction**: regex lexicons first (tickers, tools, projects, URLs,
//!   headers, decisions), a capitalization-based proper-noun pass second
//! - **Graph**: in-memory, single-owner, rebuilt from source on every change;
//!   never persisted — the workspace is the source of truth
//! - **Publication**: immutable JSON snapshots over a latest-wins channel
//! - **Layout**: a seeded force simulation settles each entity into a city
//!   district; importance decides height, decay decides freshness
//!
//! # Modules
//!
//! - [`config`] — Configuration loading from TOML files and environment variables
//! - [`extract`] — Paragraph segmentation and typed-entity extraction
//! - [`graph`] — The graph store, snapshot types, and the decay model
//! - [`ingest`] — The watcher/debounce/reader/owner task pipeline
//! - [`hub`] — Snapshot publication seam
//! - [`layout`] — The force-directed city projector

pub mod config;
pub mod extract;
pub mod graph;
pub mod hub;
pub mod ingest;
pub mod layout;
