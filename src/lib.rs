// clerk-guard: retrying, observable facade over the Clerk backend API
// Every call is run through one generic retry loop that reports its lifecycle
// to an injected observer.

pub mod backend;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod observer;
pub mod organizations;
pub mod retry;
pub mod sanitize;
pub mod types;
pub mod users;

pub use client::{create_clerk_client, ClerkClient};
pub use error::{ClerkError, Failure};
pub use observer::{ConsoleObserver, NullObserver, Observer, TracingObserver};
pub use retry::{invoke, Invoker, PolicyError, RetryPolicy, RetryableStatuses};
