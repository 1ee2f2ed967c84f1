//! # mathbot
//!
//! A chat front-end that answers math and general questions through an
//! LLM agent with four tools.
//!
//! This library provides:
//! - A chat session controller holding an append-only transcript
//! - An agent loop that plans tool calls (ReAct text protocol or native
//!   function calling) against Groq
//! - Tools for web search, Wikipedia lookup, math evaluation and reasoning
//! - An HTTP API and an interactive terminal chat over the same session type
//!
//! ## Example
//!
//! ```rust,ignore
//! use mathbot::{chat::ChatSession, config::Config};
//!
//! let config = Config::from_env()?;
//! let mut session = ChatSession::from_config(&config)?;
//! session.initialize();
//! let turn = session.submit("What is 12 * (7 + 3)?").await?;
//! println!("{}", turn.answer);
//! ```

pub mod agent;
pub mod api;
pub mod chat;
pub mod config;
pub mod llm;
pub mod terminal;
pub mod tools;

pub use config::Config;
