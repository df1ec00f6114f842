/**
 * Routes Module
 * API route handlers
 */

pub mod analyze;
pub mod contracts;
pub mod health;
pub mod reminders;
