//! Trade Assist - Conversational trade onboarding assistant
//!
//! Each user turn is routed to one of several specialized agents (risk
//! analysis, terminology quizzes, email coaching, general chat) that share
//! one session store, one response envelope and one set of model adapters.

pub mod adapters;
pub mod application;
pub mod bootstrap;
pub mod config;
pub mod domain;
pub mod ports;
