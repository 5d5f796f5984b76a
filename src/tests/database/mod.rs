//! Persistence tests
//!
//! Envelope store behaviour (`envelope`) and repository CRUD (`characters`).

mod envelope;
