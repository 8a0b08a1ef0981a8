//! Scheduler tests with scripted collaborators.

mod batch_scheduler_tests;
