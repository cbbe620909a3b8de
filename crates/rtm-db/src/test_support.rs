//! Shared test utilities for rtm-db unit tests.
