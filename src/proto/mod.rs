//! Generated protobuf bindings for the sentry `CA` service.
//!
//! **This module contains generated code. Do not edit these files manually.**
//!
//! The bindings are regenerated by `build.rs` from `proto/dapr/proto/sentry/v1/sentry.proto`.
//!
//! ## Lint Suppressions
//!
//! The generated code from `prost`/`tonic-build` does not always conform to our
//! linting standards, so the suppressions are scoped to this module only.
#![allow(clippy::all)]
#![allow(missing_docs)]
#![allow(missing_debug_implementations)]

pub mod dapr {
    pub mod proto {
        pub mod sentry {
            pub mod v1 {
                tonic::include_proto!("dapr.proto.sentry.v1");
            }
        }
    }
}

pub use dapr::proto::sentry::v1::*;
