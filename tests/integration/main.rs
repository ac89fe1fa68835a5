//! Integration tests driving the repository end to end.

mod helpers;
mod named_query_test;
mod postgres_test;
mod reconcile_test;
mod repository_test;
