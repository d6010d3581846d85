//! Server-side helpers for turbogql.
//!
//! [`exec`] runs one operation against a [`SchemaExecutor`], checking the
//! required arguments first and logging start, success and failure. The
//! execution engine itself is supplied by the caller.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use turbogql_server::{ExecRequest, SchemaExecutor, exec};
//!
//! # async fn example(schema: Arc<dyn SchemaExecutor>) -> Result<(), turbogql_server::ExecError> {
//! let response = exec(
//!     ExecRequest::new(schema)
//!         .with_query("query getHello { hello }")
//!         .with_operation_name("getHello"),
//! )
//! .await?;
//! println!("{:?}", response.data);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

mod exec;

pub use exec::{ExecError, ExecRequest, ExecResult, SchemaExecutor, exec, format_error};
